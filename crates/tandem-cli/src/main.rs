use anyhow::Context;
use chrono::{Datelike, NaiveDate, Utc};
use clap::Parser;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tandem_cli::{
    checkpoint::FileCheckpointStore,
    config::{AlbumCommand, Cli, Command, Config, Login, YearMonth},
    drafts::{AlbumDraft, CommentDraft, PostDraft, PostEdit},
    fetch_all,
    notifications::{NotificationCenter, NotificationTracker, SystemClock},
    pagination::View,
    render,
    search::{SearchScopes, search},
    state::ViewState,
    Account, ContentKind, ContentStore, HttpContentStore,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_directive = if cli.verbose {
        "tandem_cli=debug"
    } else {
        "tandem_cli=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive)),
        )
        .with_writer(io::stderr)
        .init();

    let config = Config::load(&cli)?;
    let store = HttpContentStore::new(&config.service.url)
        .with_context(|| format!("using service URL {}", config.service.url))?;
    debug!(
        service_url = %store.base_url(),
        state_dir = %config.state_dir.display(),
        "Loaded configuration"
    );

    match cli.command {
        Command::Feed { view, page } => feed(&store, view, page).await,
        Command::Show { kind, id } => show(&store, kind, id).await,
        Command::Search { keyword, scopes } => search_journal(&store, &keyword, &scopes).await,
        Command::Calendar { month, day } => calendar(&store, month, day).await,
        Command::Post {
            login,
            kind,
            title,
            content,
        } => {
            let account = authenticate(&config, &login)?;
            let draft = PostDraft::new(kind, account, title.as_deref(), &content)?;
            let id = store.create_post(&draft).await?;
            println!("{} posted with ID: {id}", kind.label());
            Ok(())
        }
        Command::Edit {
            login,
            kind,
            id,
            title,
            content,
        } => {
            authenticate(&config, &login)?;
            let edit = PostEdit::new(kind, title.as_deref(), &content)?;
            ensure_exists(&store, kind, id).await?;
            let updated_at = store.update_post(id, &edit).await?;
            println!("{} {id} updated at {updated_at}", kind.label());
            Ok(())
        }
        Command::Delete {
            login,
            kind,
            id,
            yes,
        } => {
            authenticate(&config, &login)?;
            ensure_exists(&store, kind, id).await?;
            let prompt = format!("Delete {} {id} and all of its comments?", kind.label());
            if !yes && !confirm(&prompt)? {
                println!("Nothing deleted.");
                return Ok(());
            }
            match kind {
                ContentKind::Gallery => store.delete_album(id).await?,
                ContentKind::Thoughts | ContentKind::Articles => store.delete_post(id).await?,
            }
            println!("{} {id} deleted", kind.label());
            Ok(())
        }
        Command::Comment {
            login,
            kind,
            id,
            content,
        } => {
            let account = authenticate(&config, &login)?;
            let draft = CommentDraft::new(kind, id, account, &content)?;
            let comment = store.add_comment(&draft).await?;
            println!("Comment added with ID: {}", comment.id);
            Ok(())
        }
        Command::Album(AlbumCommand::Create {
            login,
            description,
            photos,
        }) => {
            let account = authenticate(&config, &login)?;
            let draft = AlbumDraft::from_paths(account, description.as_deref(), &photos).await?;
            let album = store.create_album(&draft).await?;
            println!(
                "Album created with ID: {} ({} photos)",
                album.id,
                album.photos.len()
            );
            Ok(())
        }
        Command::Album(AlbumCommand::Edit {
            login,
            id,
            description,
        }) => {
            authenticate(&config, &login)?;
            store.update_album(id, &description).await?;
            println!("Album {id} updated");
            Ok(())
        }
        Command::Notifications { login, open, watch } => {
            let account = authenticate(&config, &login)?;
            notifications(&config, store, account, open, watch).await
        }
    }
}

fn authenticate(config: &Config, login: &Login) -> anyhow::Result<Account> {
    if !config.credentials.verify(login.account, &login.password) {
        anyhow::bail!("wrong password for {}", login.account);
    }
    info!(account = %login.account, "Authenticated");
    Ok(login.account)
}

fn confirm(prompt: &str) -> anyhow::Result<bool> {
    print!("{prompt} [y/N] ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

async fn load_view(store: &HttpContentStore) -> anyhow::Result<ViewState> {
    let mut state = ViewState::new();
    let ticket = state.begin_fetch();
    let snapshot = fetch_all(store)
        .await
        .context("fetching the journal")?;
    state.apply(ticket, snapshot);
    Ok(state)
}

/// Posts of both types share one id space on the service, so check the id
/// belongs to the type the user named before touching it.
async fn ensure_exists(store: &HttpContentStore, kind: ContentKind, id: i64) -> anyhow::Result<()> {
    let ids: Vec<i64> = match kind {
        ContentKind::Thoughts => store.fetch_short_posts().await?.iter().map(|p| p.id).collect(),
        ContentKind::Articles => store.fetch_long_posts().await?.iter().map(|p| p.id).collect(),
        ContentKind::Gallery => store.fetch_albums().await?.iter().map(|a| a.id).collect(),
    };
    if !ids.contains(&id) {
        anyhow::bail!("no {} with ID {id}", kind.label().to_lowercase());
    }
    Ok(())
}

async fn feed(store: &HttpContentStore, view: View, page: usize) -> anyhow::Result<()> {
    let mut state = load_view(store).await?;
    if !state.paginator_mut().set_page(view, page) {
        anyhow::bail!(
            "page {page} is out of range, {view} has {} page(s)",
            state.paginator().total_pages(view)
        );
    }

    let now = Utc::now();
    let items = state.page(view);
    if items.is_empty() {
        println!("Nothing here yet.");
    }
    for item in items {
        println!("{}\n", render::render_item(item, now));
    }
    if let Some(bar) = render::render_page_bar(state.paginator(), view) {
        println!("{bar}");
    }
    Ok(())
}

async fn show(store: &HttpContentStore, kind: ContentKind, id: i64) -> anyhow::Result<()> {
    let state = load_view(store).await?;
    let item = state
        .snapshot()
        .and_then(|snapshot| {
            snapshot
                .collection(kind)
                .into_iter()
                .find(|item| item.id() == id)
        })
        .with_context(|| format!("no {} with ID {id}", kind.label().to_lowercase()))?;

    let link = |filename: &str| {
        store
            .photo_url(filename)
            .map(|url| url.to_string())
            .unwrap_or_else(|_| filename.to_string())
    };
    print!("{}", render::render_detail(&item, Utc::now(), link));
    Ok(())
}

async fn search_journal(
    store: &HttpContentStore,
    keyword: &str,
    scopes: &[ContentKind],
) -> anyhow::Result<()> {
    if keyword.trim().is_empty() {
        println!("Enter a keyword to search.");
        return Ok(());
    }

    let state = load_view(store).await?;
    let hits = state
        .snapshot()
        .map(|snapshot| search(&snapshot, keyword, SearchScopes::from_kinds(scopes)))
        .unwrap_or_default();
    if hits.is_empty() {
        println!("No results for \"{}\".", keyword.trim());
        return Ok(());
    }

    println!("{} result(s) for \"{}\"\n", hits.len(), keyword.trim());
    let now = Utc::now();
    for hit in &hits {
        println!("{}\n", render::render_hit(hit, now));
    }
    Ok(())
}

async fn calendar(
    store: &HttpContentStore,
    month: Option<YearMonth>,
    day: Option<NaiveDate>,
) -> anyhow::Result<()> {
    let state = load_view(store).await?;
    let today = render::today();
    println!("{}\n", render::render_day_counter(Utc::now()));

    if let Some(day) = day {
        print!("{}", render::render_day(state.calendar(), day, Utc::now()));
        return Ok(());
    }

    let month = month.unwrap_or(YearMonth {
        year: today.year(),
        month: today.month(),
    });
    print!("{}", render::render_month(state.calendar(), month, today));
    Ok(())
}

async fn notifications(
    config: &Config,
    store: HttpContentStore,
    account: Account,
    open: bool,
    watch: bool,
) -> anyhow::Result<()> {
    let checkpoints = Arc::new(FileCheckpointStore::in_dir(&config.state_dir));
    let mut tracker =
        NotificationTracker::new(Arc::new(store), checkpoints, Arc::new(SystemClock));

    if watch {
        return watch_notifications(config, tracker, account).await;
    }

    let unread = tracker.login(account).await?;
    if !open {
        println!("{}", render::render_badge(unread));
        return Ok(());
    }

    let items = tracker.open_panel().await?;
    if items.is_empty() {
        println!("Nothing yet from {}.", account.other());
    }
    let now = Utc::now();
    for item in &items {
        println!("{}\n", render::render_item(item, now));
    }
    Ok(())
}

async fn watch_notifications(
    config: &Config,
    tracker: NotificationTracker,
    account: Account,
) -> anyhow::Result<()> {
    let mut center = NotificationCenter::new(tracker, config.poll_interval());
    let mut updates = center.subscribe();

    let unread = center.login(account).await?;
    println!("{}", render::render_badge(unread));
    updates.mark_unchanged();

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let unread = *updates.borrow_and_update();
                println!("{}", render::render_badge(unread));
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Stopping notification watch");
                break;
            }
        }
    }

    center.logout().await;
    Ok(())
}

use anyhow::Result;
use chrono::Utc;
use reqwest::StatusCode;
use std::sync::Arc;
use tandem_cli::aggregate::merge_feed;
use tandem_cli::checkpoint::{CheckpointStore, FileCheckpointStore};
use tandem_cli::drafts::{AlbumDraft, CommentDraft, PhotoUpload, PostDraft, PostEdit};
use tandem_cli::notifications::{FixedClock, NotificationTracker};
use tandem_cli::{Account, ClientError, ContentKind, ContentStore, HttpContentStore, fetch_all};
use tempfile::TempDir;

struct Service {
    store: HttpContentStore,
    _uploads: TempDir,
}

/// Serves a fresh journal on an ephemeral port.
async fn spawn_service() -> Service {
    let uploads = tempfile::tempdir().unwrap();
    let (app, _db) = tandem_service::test_helpers::create_test_app(uploads.path());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Service {
        store: HttpContentStore::new(&format!("http://{addr}")).unwrap(),
        _uploads: uploads,
    }
}

fn photo(name: &str, bytes: &[u8]) -> PhotoUpload {
    PhotoUpload {
        file_name: name.to_string(),
        bytes: bytes.to_vec(),
    }
}

#[tokio::test]
async fn test_article_create_then_edit() -> Result<()> {
    let service = spawn_service().await;
    let store = &service.store;

    let draft = PostDraft::new(ContentKind::Articles, Account::Male, Some("A"), "B")?;
    let id = store.create_post(&draft).await?;

    let articles = store.fetch_long_posts().await?;
    assert_eq!(articles.len(), 1);
    assert_eq!(articles[0].id, id);
    assert_eq!(articles[0].title, "A");
    assert_eq!(articles[0].content, "B");
    assert_eq!(articles[0].date, articles[0].updated_at);

    let edit = PostEdit::new(ContentKind::Articles, Some("A"), "C")?;
    let updated_at = store.update_post(id, &edit).await?;

    let articles = store.fetch_long_posts().await?;
    assert_eq!(articles[0].content, "C");
    assert!(articles[0].updated_at > articles[0].date);
    assert_eq!(articles[0].updated_at, updated_at);
    Ok(())
}

#[tokio::test]
async fn test_snapshot_merges_all_collections() -> Result<()> {
    let service = spawn_service().await;
    let store = &service.store;

    store
        .create_post(&PostDraft::new(ContentKind::Thoughts, Account::Female, None, "first")?)
        .await?;
    store
        .create_post(&PostDraft::new(ContentKind::Articles, Account::Male, Some("T"), "second")?)
        .await?;
    let album = AlbumDraft::new(Account::Female, Some("third"), vec![photo("a.jpg", b"a")])?;
    store.create_album(&album).await?;

    let snapshot = fetch_all(store).await?;
    assert_eq!(snapshot.thoughts.len(), 1);
    assert_eq!(snapshot.articles.len(), 1);
    assert_eq!(snapshot.albums.len(), 1);

    let kinds: Vec<ContentKind> = merge_feed(&snapshot).iter().map(|i| i.kind()).collect();
    assert_eq!(
        kinds,
        vec![ContentKind::Gallery, ContentKind::Articles, ContentKind::Thoughts]
    );
    Ok(())
}

#[tokio::test]
async fn test_album_lifecycle() -> Result<()> {
    let service = spawn_service().await;
    let store = &service.store;

    let draft = AlbumDraft::new(
        Account::Female,
        Some("Sunday at the beach"),
        vec![photo("one.jpg", b"first"), photo("two.png", b"second")],
    )?;
    let album = store.create_album(&draft).await?;
    assert_eq!(album.photos.len(), 2);
    assert_eq!(album.description.as_deref(), Some("Sunday at the beach"));

    let url = store.photo_url(&album.photos[0].filename)?;
    let bytes = reqwest::get(url.clone()).await?.bytes().await?;
    assert_eq!(bytes.as_ref(), b"first");

    let comment = CommentDraft::new(ContentKind::Gallery, album.id, Account::Male, "lovely")?;
    store.add_comment(&comment).await?;
    store.update_album(album.id, "Beach day").await?;

    let albums = store.fetch_albums().await?;
    assert_eq!(albums[0].description.as_deref(), Some("Beach day"));
    assert_eq!(albums[0].comments.len(), 1);
    assert_eq!(albums[0].comments[0].author, Account::Male);

    store.delete_album(album.id).await?;
    assert!(store.fetch_albums().await?.is_empty());
    assert_eq!(reqwest::get(url).await?.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn test_delete_post_removes_comments() -> Result<()> {
    let service = spawn_service().await;
    let store = &service.store;

    let id = store
        .create_post(&PostDraft::new(ContentKind::Thoughts, Account::Male, None, "hello")?)
        .await?;
    store
        .add_comment(&CommentDraft::new(ContentKind::Thoughts, id, Account::Female, "hi")?)
        .await?;
    assert_eq!(store.fetch_short_posts().await?[0].comments.len(), 1);

    store.delete_post(id).await?;
    assert!(store.fetch_short_posts().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_service_errors_surface_as_status() -> Result<()> {
    let service = spawn_service().await;
    let store = &service.store;

    let edit = PostEdit::new(ContentKind::Thoughts, None, "x")?;
    match store.update_post(999, &edit).await {
        Err(ClientError::Status { status, body }) => {
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert!(!body.is_empty());
        }
        other => panic!("expected a 404, got {other:?}"),
    }

    let comment = CommentDraft::new(ContentKind::Articles, 42, Account::Male, "anyone?")?;
    assert!(matches!(
        store.add_comment(&comment).await,
        Err(ClientError::Status { status: StatusCode::NOT_FOUND, .. })
    ));
    Ok(())
}

#[tokio::test]
async fn test_notifications_against_live_service() -> Result<()> {
    let service = spawn_service().await;
    let store = Arc::new(service.store.clone());
    let state_dir = tempfile::tempdir()?;
    let checkpoints = Arc::new(FileCheckpointStore::in_dir(state_dir.path()));

    store
        .create_post(&PostDraft::new(ContentKind::Thoughts, Account::Female, None, "miss you")?)
        .await?;
    store
        .create_post(&PostDraft::new(ContentKind::Thoughts, Account::Male, None, "my own")?)
        .await?;

    let clock = Arc::new(FixedClock::new(Utc::now()));
    let mut tracker = NotificationTracker::new(store.clone(), checkpoints.clone(), clock.clone());
    assert_eq!(tracker.login(Account::Male).await?, 1);

    let panel = tracker.open_panel().await?;
    assert_eq!(panel.len(), 1);
    assert_eq!(panel[0].author(), Account::Female);
    assert_eq!(tracker.unread(), 0);
    assert!(checkpoints.load(Account::Male)?.is_some());
    tracker.logout();

    // A new session picks up the saved checkpoint.
    let mut tracker = NotificationTracker::new(store.clone(), checkpoints.clone(), clock);
    assert_eq!(tracker.login(Account::Male).await?, 0);

    store
        .create_post(&PostDraft::new(ContentKind::Articles, Account::Female, Some("Hi"), "again")?)
        .await?;
    assert_eq!(tracker.refresh().await?, 1);
    assert_eq!(tracker.badge().as_deref(), Some("1"));
    Ok(())
}

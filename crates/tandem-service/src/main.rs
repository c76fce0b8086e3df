use anyhow::Context;
use clap::Parser;
use diesel::Connection;
use diesel::sqlite::SqliteConnection;
use std::sync::{Arc, Mutex};
use tandem_service::{
    DefaultAppState,
    config::{Cli, Command},
    create_app, diagnostics, run_migrations,
    uploads::PhotoStore,
};
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("tandem_service=debug".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let photos = PhotoStore::new(&cli.uploads_dir);

    match cli.command() {
        Command::Check => check(&cli, &photos).await,
        Command::Serve => serve(&cli, photos).await,
    }
}

async fn check(cli: &Cli, photos: &PhotoStore) -> anyhow::Result<()> {
    let report = diagnostics::run_checks(&cli.database_url, photos).await;
    println!("{report}");
    if !report.is_healthy() {
        anyhow::bail!("{} check(s) failed", report.failed());
    }
    Ok(())
}

async fn serve(cli: &Cli, photos: PhotoStore) -> anyhow::Result<()> {
    photos
        .ensure_dir()
        .await
        .with_context(|| format!("creating upload directory {}", cli.uploads_dir.display()))?;
    if let Err(err) = photos.check_writable().await {
        warn!(uploads_dir = %cli.uploads_dir.display(), error = %err, "Upload directory is not writable");
    }

    let mut connection = SqliteConnection::establish(&cli.database_url).map_err(|err| {
        error!(database_url = %cli.database_url, error = %err, "Failed to connect to database");
        err
    })?;
    run_migrations(&mut connection).map_err(|err| anyhow::anyhow!("running migrations: {err}"))?;

    info!(database_url = %cli.database_url, "Connected to database");

    let app_state = DefaultAppState::new(Arc::new(Mutex::new(connection)), photos);

    let app = create_app(app_state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(TimeoutLayer::new(cli.request_timeout())),
    );

    let listener = tokio::net::TcpListener::bind(cli.bind)
        .await
        .map_err(|err| {
            error!(bind_address = %cli.bind, error = %err, "Failed to bind to address");
            err
        })?;

    info!("Server running on http://{}", cli.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Graceful shutdown completed");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown");
}

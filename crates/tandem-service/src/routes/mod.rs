use crate::AppState;
use crate::uploads::{MAX_PHOTO_BYTES, MAX_PHOTOS_PER_ALBUM};
use axum::{Router, extract::DefaultBodyLimit, routing::get};
use std::path::PathBuf;
use tower_http::services::ServeDir;

pub mod api;

/// Room for a full album upload plus the multipart framing around it.
pub const MAX_REQUEST_BYTES: usize = MAX_PHOTOS_PER_ALBUM * MAX_PHOTO_BYTES + 1024 * 1024;

async fn health() -> &'static str {
    "OK"
}

pub fn create_router<S: AppState>(uploads_dir: PathBuf) -> Router<S> {
    Router::new()
        .route("/health", get(health))
        .nest("/api", api::create_api_router())
        .nest_service("/uploads", ServeDir::new(uploads_dir))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BYTES))
}

use crate::AppState;
use axum::{
    Router,
    routing::{get, post, put},
};
use serde::Serialize;

pub mod albums;
pub mod comments;
pub mod posts;

/// Body returned by edits and deletions.
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

pub fn create_api_router<S: AppState>() -> Router<S> {
    Router::new()
        .route("/posts", post(posts::create_post::<S>))
        // One route serves both `/posts/{type}` (GET) and `/posts/{id}`
        // (PUT, DELETE); each handler extracts the segment it expects.
        .route(
            "/posts/{segment}",
            get(posts::list_posts::<S>)
                .put(posts::update_post::<S>)
                .delete(posts::delete_post::<S>),
        )
        .route("/comments", post(comments::add_comment::<S>))
        .route(
            "/albums",
            get(albums::list_albums::<S>).post(albums::create_album::<S>),
        )
        .route(
            "/albums/{id}",
            put(albums::update_album::<S>).delete(albums::delete_album::<S>),
        )
}

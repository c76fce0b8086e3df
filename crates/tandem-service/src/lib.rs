use axum::Router;
use diesel::sqlite::SqliteConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use std::sync::{Arc, Mutex};

pub mod config;
pub mod diagnostics;
pub mod errors;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod schema;
pub mod uploads;
pub mod validation;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

use repositories::{
    AlbumRepository, CommentRepository, PostRepository, SqliteAlbumRepository,
    SqliteCommentRepository, SqlitePostRepository,
};
use uploads::PhotoStore;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

/// Brings a freshly opened connection up to the current schema.
pub fn run_migrations(
    conn: &mut SqliteConnection,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    conn.run_pending_migrations(MIGRATIONS)?;
    Ok(())
}

pub trait AppState: Clone + Send + Sync + 'static {
    type Posts: PostRepository;
    type Comments: CommentRepository;
    type Albums: AlbumRepository;

    fn post_repo(&self) -> &Self::Posts;
    fn comment_repo(&self) -> &Self::Comments;
    fn album_repo(&self) -> &Self::Albums;
    fn photo_store(&self) -> &PhotoStore;
}

#[derive(Clone)]
pub struct DefaultAppState {
    posts: SqlitePostRepository,
    comments: SqliteCommentRepository,
    albums: SqliteAlbumRepository,
    photos: PhotoStore,
}

impl DefaultAppState {
    pub fn new(db: Arc<Mutex<SqliteConnection>>, photos: PhotoStore) -> Self {
        Self {
            posts: SqlitePostRepository::new(db.clone()),
            comments: SqliteCommentRepository::new(db.clone()),
            albums: SqliteAlbumRepository::new(db),
            photos,
        }
    }
}

impl AppState for DefaultAppState {
    type Posts = SqlitePostRepository;
    type Comments = SqliteCommentRepository;
    type Albums = SqliteAlbumRepository;

    fn post_repo(&self) -> &Self::Posts {
        &self.posts
    }

    fn comment_repo(&self) -> &Self::Comments {
        &self.comments
    }

    fn album_repo(&self) -> &Self::Albums {
        &self.albums
    }

    fn photo_store(&self) -> &PhotoStore {
        &self.photos
    }
}

/// The full application: JSON API, uploaded photos and health check.
pub fn create_app(state: DefaultAppState) -> Router {
    let uploads = state.photo_store().root().to_path_buf();
    routes::create_router(uploads).with_state(state)
}

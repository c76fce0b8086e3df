use crate::errors::ApiError;
use diesel::sqlite::SqliteConnection;
use std::sync::{Mutex, MutexGuard};
use tracing::error;

pub mod albums;
pub mod comments;
pub mod posts;
pub mod traits;

pub use albums::SqliteAlbumRepository;
pub use comments::SqliteCommentRepository;
pub use posts::SqlitePostRepository;
pub use traits::{AlbumRepository, AlbumWithPhotos, CommentRepository, PostRepository};

fn lock(db: &Mutex<SqliteConnection>) -> Result<MutexGuard<'_, SqliteConnection>, ApiError> {
    db.lock().map_err(|_| {
        error!("Database connection mutex poisoned");
        ApiError::InternalError
    })
}

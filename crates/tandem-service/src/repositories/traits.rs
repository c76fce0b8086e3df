use crate::errors::ApiError;
use crate::models::{
    Album, Comment, ContentKind, NewAlbum, NewComment, NewPost, Photo, Post, PostChanges,
};
use async_trait::async_trait;

/// An album together with its photos, in insertion order.
#[derive(Debug, Clone)]
pub struct AlbumWithPhotos {
    pub album: Album,
    pub photos: Vec<Photo>,
}

#[async_trait]
pub trait PostRepository: Clone + Send + Sync + 'static {
    /// Posts of one kind, newest first.
    async fn list_by_kind(&self, kind: ContentKind) -> Result<Vec<Post>, ApiError>;
    async fn create(&self, post: &NewPost) -> Result<Post, ApiError>;
    async fn find_by_id(&self, id: i32) -> Result<Option<Post>, ApiError>;
    async fn update(&self, id: i32, changes: &PostChanges) -> Result<Post, ApiError>;
    /// Removes the post and the comments attached to it. Returns false when
    /// no such post exists.
    async fn delete(&self, id: i32) -> Result<bool, ApiError>;
}

#[async_trait]
pub trait CommentRepository: Clone + Send + Sync + 'static {
    /// All comments attached to items of `kind`, oldest first.
    async fn list_by_kind(&self, kind: ContentKind) -> Result<Vec<Comment>, ApiError>;
    async fn create(&self, comment: &NewComment) -> Result<Comment, ApiError>;
    /// Whether the target of a comment exists.
    async fn target_exists(&self, kind: ContentKind, post_id: i32) -> Result<bool, ApiError>;
}

#[async_trait]
pub trait AlbumRepository: Clone + Send + Sync + 'static {
    /// Albums newest first, each with its photos.
    async fn list(&self) -> Result<Vec<AlbumWithPhotos>, ApiError>;
    async fn create(
        &self,
        album: &NewAlbum,
        filenames: &[String],
    ) -> Result<AlbumWithPhotos, ApiError>;
    async fn update_description(
        &self,
        id: i32,
        description: Option<String>,
    ) -> Result<bool, ApiError>;
    /// Removes the album, its photo rows and its comments. Returns the
    /// filenames that were attached, or `None` when no such album exists.
    async fn delete(&self, id: i32) -> Result<Option<Vec<String>>, ApiError>;
}

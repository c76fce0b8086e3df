//! Validated inputs for mutating requests. Anything built here has passed
//! the same presence checks the service applies, so obviously bad input
//! never leaves the machine.

use std::path::Path;

use crate::errors::ClientError;
use crate::models::{Account, ContentKind};

pub const MAX_PHOTOS_PER_ALBUM: usize = 20;
pub const MAX_PHOTO_BYTES: usize = 10 * 1024 * 1024;

fn required(value: &str, what: &str) -> Result<String, ClientError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ClientError::invalid(format!("{what} must not be empty")));
    }
    Ok(trimmed.to_string())
}

#[derive(Debug, Clone, PartialEq)]
pub struct PostDraft {
    kind: ContentKind,
    author: Account,
    title: Option<String>,
    content: String,
}

impl PostDraft {
    /// Articles need a title; thoughts ignore one.
    pub fn new(
        kind: ContentKind,
        author: Account,
        title: Option<&str>,
        content: &str,
    ) -> Result<Self, ClientError> {
        let title = match kind {
            ContentKind::Thoughts => None,
            ContentKind::Articles => Some(required(title.unwrap_or_default(), "title")?),
            ContentKind::Gallery => {
                return Err(ClientError::invalid(
                    "albums are created from photos, not as posts",
                ));
            }
        };
        Ok(Self {
            kind,
            author,
            title,
            content: required(content, "content")?,
        })
    }

    pub fn kind(&self) -> ContentKind {
        self.kind
    }

    pub fn author(&self) -> Account {
        self.author
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Replacement title and content for an existing post.
#[derive(Debug, Clone, PartialEq)]
pub struct PostEdit {
    title: Option<String>,
    content: String,
}

impl PostEdit {
    pub fn new(kind: ContentKind, title: Option<&str>, content: &str) -> Result<Self, ClientError> {
        let title = match kind {
            ContentKind::Articles => Some(required(title.unwrap_or_default(), "title")?),
            ContentKind::Thoughts => None,
            ContentKind::Gallery => {
                return Err(ClientError::invalid("use the album commands to edit albums"));
            }
        };
        Ok(Self {
            title,
            content: required(content, "content")?,
        })
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommentDraft {
    kind: ContentKind,
    post_id: i64,
    author: Account,
    content: String,
}

impl CommentDraft {
    pub fn new(
        kind: ContentKind,
        post_id: i64,
        author: Account,
        content: &str,
    ) -> Result<Self, ClientError> {
        Ok(Self {
            kind,
            post_id,
            author,
            content: required(content, "comment")?,
        })
    }

    pub fn kind(&self) -> ContentKind {
        self.kind
    }

    pub fn post_id(&self) -> i64 {
        self.post_id
    }

    pub fn author(&self) -> Account {
        self.author
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhotoUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlbumDraft {
    author: Account,
    description: Option<String>,
    photos: Vec<PhotoUpload>,
}

impl AlbumDraft {
    pub fn new(
        author: Account,
        description: Option<&str>,
        photos: Vec<PhotoUpload>,
    ) -> Result<Self, ClientError> {
        if photos.is_empty() {
            return Err(ClientError::invalid("an album needs at least one photo"));
        }
        if photos.len() > MAX_PHOTOS_PER_ALBUM {
            return Err(ClientError::invalid(format!(
                "an album holds at most {MAX_PHOTOS_PER_ALBUM} photos, got {}",
                photos.len()
            )));
        }
        if let Some(photo) = photos.iter().find(|p| p.bytes.len() > MAX_PHOTO_BYTES) {
            return Err(ClientError::invalid(format!(
                "photo {} is larger than {} MiB",
                photo.file_name,
                MAX_PHOTO_BYTES / (1024 * 1024)
            )));
        }

        let description = description
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string);
        Ok(Self {
            author,
            description,
            photos,
        })
    }

    /// Reads the photos from disk and validates the result.
    pub async fn from_paths<P: AsRef<Path>>(
        author: Account,
        description: Option<&str>,
        paths: &[P],
    ) -> Result<Self, ClientError> {
        if paths.len() > MAX_PHOTOS_PER_ALBUM {
            return Err(ClientError::invalid(format!(
                "an album holds at most {MAX_PHOTOS_PER_ALBUM} photos, got {}",
                paths.len()
            )));
        }

        let mut photos = Vec::with_capacity(paths.len());
        for path in paths {
            let path = path.as_ref();
            let bytes = tokio::fs::read(path)
                .await
                .map_err(|source| ClientError::PhotoRead {
                    path: path.display().to_string(),
                    source,
                })?;
            let file_name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "photo".to_string());
            photos.push(PhotoUpload { file_name, bytes });
        }
        Self::new(author, description, photos)
    }

    pub fn author(&self) -> Account {
        self.author
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn photos(&self) -> &[PhotoUpload] {
        &self.photos
    }
}

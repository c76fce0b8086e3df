use axum::{
    body::Bytes,
    extract::{Json, Multipart, Path, State},
    response::Json as ResponseJson,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use super::SuccessResponse;
use super::comments::{CommentResponse, group_by_post};
use crate::errors::ApiError;
use crate::models::{ContentKind, NewAlbum, Photo};
use crate::repositories::AlbumWithPhotos;
use crate::uploads::{MAX_PHOTO_BYTES, MAX_PHOTOS_PER_ALBUM};
use crate::validation::ValidationError;
use crate::{
    AppState,
    repositories::{AlbumRepository, CommentRepository},
};

#[derive(Debug, Deserialize)]
pub(crate) struct UpdateAlbumRequest {
    description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PhotoResponse {
    pub id: i32,
    pub album_id: i32,
    pub filename: String,
}

impl From<Photo> for PhotoResponse {
    fn from(photo: Photo) -> Self {
        Self {
            id: photo.id,
            album_id: photo.album_id,
            filename: photo.filename,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AlbumResponse {
    pub id: i32,
    pub author: String,
    pub description: Option<String>,
    pub date: DateTime<Utc>,
    pub photos: Vec<PhotoResponse>,
    pub comments: Vec<CommentResponse>,
}

impl AlbumResponse {
    fn new(entry: AlbumWithPhotos, comments: Vec<CommentResponse>) -> Self {
        Self {
            id: entry.album.id,
            author: entry.album.author,
            description: entry.album.description,
            date: entry.album.date.and_utc(),
            photos: entry.photos.into_iter().map(PhotoResponse::from).collect(),
            comments,
        }
    }
}

/// Fields collected from an album upload form.
#[derive(Default)]
struct AlbumForm {
    author: Option<String>,
    description: Option<String>,
    photos: Vec<(Option<String>, Bytes)>,
}

async fn read_album_form(mut multipart: Multipart) -> Result<AlbumForm, ApiError> {
    let mut form = AlbumForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "author" => form.author = Some(field.text().await?),
            "description" => form.description = Some(field.text().await?),
            "photos" | "photos[]" => {
                if form.photos.len() == MAX_PHOTOS_PER_ALBUM {
                    return Err(ValidationError::TooManyPhotos {
                        count: MAX_PHOTOS_PER_ALBUM + 1,
                        max: MAX_PHOTOS_PER_ALBUM,
                    }
                    .into());
                }
                let file_name = field.file_name().map(str::to_string);
                let bytes = field.bytes().await?;
                if bytes.len() > MAX_PHOTO_BYTES {
                    return Err(ValidationError::PhotoTooLarge {
                        name: file_name.unwrap_or_default(),
                        max_bytes: MAX_PHOTO_BYTES,
                    }
                    .into());
                }
                form.photos.push((file_name, bytes));
            }
            other => debug!(field = %other, "Ignoring unexpected form field"),
        }
    }

    Ok(form)
}

#[instrument(skip_all)]
pub(crate) async fn list_albums<S: AppState>(
    State(state): State<S>,
) -> Result<ResponseJson<Vec<AlbumResponse>>, ApiError> {
    debug!("Processing list albums request");

    let albums = state.album_repo().list().await?;
    let mut comments = group_by_post(
        state
            .comment_repo()
            .list_by_kind(ContentKind::Gallery)
            .await?,
    );

    let response: Vec<AlbumResponse> = albums
        .into_iter()
        .map(|entry| {
            let thread = comments.remove(&entry.album.id).unwrap_or_default();
            AlbumResponse::new(entry, thread)
        })
        .collect();

    info!(returned_count = response.len(), "Successfully retrieved albums");
    Ok(ResponseJson(response))
}

#[instrument(skip_all)]
pub(crate) async fn create_album<S: AppState>(
    State(state): State<S>,
    multipart: Multipart,
) -> Result<ResponseJson<AlbumResponse>, ApiError> {
    debug!("Processing create album request");

    let form = read_album_form(multipart).await?;
    let new_album = NewAlbum::new(
        form.author.as_deref().unwrap_or_default(),
        form.description,
    )?;
    debug!(photo_count = form.photos.len(), "Album form accepted");

    let photo_store = state.photo_store();
    let mut filenames = Vec::with_capacity(form.photos.len());
    for (original_name, bytes) in &form.photos {
        match photo_store.save(original_name.as_deref(), bytes).await {
            Ok(filename) => filenames.push(filename),
            Err(err) => {
                photo_store.remove_all(&filenames).await;
                return Err(err.into());
            }
        }
    }

    let created = match state.album_repo().create(&new_album, &filenames).await {
        Ok(created) => created,
        Err(err) => {
            photo_store.remove_all(&filenames).await;
            return Err(err);
        }
    };

    info!(
        id = created.album.id,
        photo_count = created.photos.len(),
        "Successfully created album"
    );
    Ok(ResponseJson(AlbumResponse::new(created, Vec::new())))
}

#[instrument(skip_all, fields(id = %id))]
pub(crate) async fn update_album<S: AppState>(
    State(state): State<S>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateAlbumRequest>,
) -> Result<ResponseJson<SuccessResponse>, ApiError> {
    debug!("Processing update album request");

    if !state
        .album_repo()
        .update_description(id, payload.description)
        .await?
    {
        warn!("Album to update not found");
        return Err(ApiError::NotFound);
    }

    info!(id, "Successfully updated album");
    Ok(ResponseJson(SuccessResponse::ok()))
}

#[instrument(skip_all, fields(id = %id))]
pub(crate) async fn delete_album<S: AppState>(
    State(state): State<S>,
    Path(id): Path<i32>,
) -> Result<ResponseJson<SuccessResponse>, ApiError> {
    debug!("Processing delete album request");

    let Some(filenames) = state.album_repo().delete(id).await? else {
        warn!("Album to delete not found");
        return Err(ApiError::NotFound);
    };

    state.photo_store().remove_all(&filenames).await;

    info!(id, removed_photos = filenames.len(), "Successfully deleted album");
    Ok(ResponseJson(SuccessResponse::ok()))
}

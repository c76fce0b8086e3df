use axum::{
    extract::{Json, Path, State},
    response::Json as ResponseJson,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{debug, info, instrument, warn};

use super::SuccessResponse;
use super::comments::{CommentResponse, group_by_post};
use crate::errors::ApiError;
use crate::models::{ContentKind, NewPost, Post, PostChanges};
use crate::validation::ValidationError;
use crate::{
    AppState,
    repositories::{CommentRepository, PostRepository},
};

#[derive(Debug, Deserialize)]
pub(crate) struct CreatePostRequest {
    #[serde(rename = "type")]
    kind: Option<String>,
    author: Option<String>,
    title: Option<String>,
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UpdatePostRequest {
    title: Option<String>,
    content: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub id: i32,
    #[serde(rename = "type")]
    pub kind: String,
    pub author: String,
    pub title: String,
    pub content: String,
    pub date: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub comments: Vec<CommentResponse>,
}

impl PostResponse {
    fn new(post: Post, comments: Vec<CommentResponse>) -> Self {
        Self {
            id: post.id,
            kind: post.kind,
            author: post.author,
            title: post.title,
            content: post.content,
            date: post.date.and_utc(),
            updated_at: post.updated_at.and_utc(),
            comments,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct UpdatePostResponse {
    success: bool,
    updated_at: DateTime<Utc>,
}

#[instrument(skip_all, fields(kind = %kind))]
pub(crate) async fn list_posts<S: AppState>(
    State(state): State<S>,
    Path(kind): Path<String>,
) -> Result<ResponseJson<Vec<PostResponse>>, ApiError> {
    debug!("Processing list posts request");

    let kind = ContentKind::from_str(&kind)?;
    if !kind.is_post() {
        return Err(ValidationError::UnknownContentType(kind.to_string()).into());
    }

    let posts = state.post_repo().list_by_kind(kind).await?;
    let mut comments = group_by_post(state.comment_repo().list_by_kind(kind).await?);

    let response: Vec<PostResponse> = posts
        .into_iter()
        .map(|post| {
            let thread = comments.remove(&post.id).unwrap_or_default();
            PostResponse::new(post, thread)
        })
        .collect();

    info!(returned_count = response.len(), "Successfully retrieved posts");
    Ok(ResponseJson(response))
}

#[instrument(skip_all, fields(kind = ?payload.kind, author = ?payload.author, has_title = payload.title.is_some()))]
pub(crate) async fn create_post<S: AppState>(
    State(state): State<S>,
    Json(payload): Json<CreatePostRequest>,
) -> Result<ResponseJson<PostResponse>, ApiError> {
    debug!("Processing create post request");

    let new_post = NewPost::new(
        payload.kind.as_deref().unwrap_or_default(),
        payload.author.as_deref().unwrap_or_default(),
        payload.title,
        payload.content.unwrap_or_default(),
    )?;

    let post = state.post_repo().create(&new_post).await?;
    info!(id = post.id, "Successfully created post");

    Ok(ResponseJson(PostResponse::new(post, Vec::new())))
}

#[instrument(skip_all, fields(id = %id))]
pub(crate) async fn update_post<S: AppState>(
    State(state): State<S>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdatePostRequest>,
) -> Result<ResponseJson<UpdatePostResponse>, ApiError> {
    debug!("Processing update post request");

    let post_repo = state.post_repo();
    let Some(existing) = post_repo.find_by_id(id).await? else {
        warn!("Post to update not found");
        return Err(ApiError::NotFound);
    };

    let changes = PostChanges::new(
        &existing,
        payload.title,
        payload.content.unwrap_or_default(),
    )?;
    let updated = post_repo.update(id, &changes).await?;
    info!(id = updated.id, "Successfully updated post");

    Ok(ResponseJson(UpdatePostResponse {
        success: true,
        updated_at: updated.updated_at.and_utc(),
    }))
}

#[instrument(skip_all, fields(id = %id))]
pub(crate) async fn delete_post<S: AppState>(
    State(state): State<S>,
    Path(id): Path<i32>,
) -> Result<ResponseJson<SuccessResponse>, ApiError> {
    debug!("Processing delete post request");

    if !state.post_repo().delete(id).await? {
        warn!("Post to delete not found");
        return Err(ApiError::NotFound);
    }

    info!(id, "Successfully deleted post");
    Ok(ResponseJson(SuccessResponse::ok()))
}

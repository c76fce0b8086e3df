use axum::{
    extract::{Json, State},
    response::Json as ResponseJson,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use tracing::{debug, info, instrument, warn};

use crate::errors::ApiError;
use crate::models::{Comment, ContentKind, NewComment};
use crate::validation::ValidationError;
use crate::{AppState, repositories::CommentRepository};

#[derive(Debug, Deserialize)]
pub(crate) struct AddCommentRequest {
    post_id: Option<i32>,
    post_type: Option<String>,
    author: Option<String>,
    content: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentResponse {
    pub id: i32,
    pub post_id: i32,
    pub post_type: String,
    pub author: String,
    pub content: String,
    pub date: DateTime<Utc>,
}

impl From<Comment> for CommentResponse {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id,
            post_id: comment.post_id,
            post_type: comment.post_type,
            author: comment.author,
            content: comment.content,
            date: comment.date.and_utc(),
        }
    }
}

/// Groups comments by the item they belong to, keeping their order.
pub(crate) fn group_by_post(comments: Vec<Comment>) -> HashMap<i32, Vec<CommentResponse>> {
    let mut grouped: HashMap<i32, Vec<CommentResponse>> = HashMap::new();
    for comment in comments {
        grouped
            .entry(comment.post_id)
            .or_default()
            .push(comment.into());
    }
    grouped
}

#[instrument(skip_all, fields(post_id = ?payload.post_id, post_type = ?payload.post_type))]
pub(crate) async fn add_comment<S: AppState>(
    State(state): State<S>,
    Json(payload): Json<AddCommentRequest>,
) -> Result<ResponseJson<CommentResponse>, ApiError> {
    debug!("Processing add comment request");

    let post_id = payload
        .post_id
        .ok_or(ValidationError::MissingField("post_id"))?;
    let post_type = payload
        .post_type
        .ok_or(ValidationError::MissingField("post_type"))?;
    let new_comment = NewComment::new(
        post_id,
        &post_type,
        payload.author.as_deref().unwrap_or_default(),
        payload.content.unwrap_or_default(),
    )?;

    let comment_repo = state.comment_repo();
    let kind = ContentKind::from_str(&new_comment.post_type)?;
    if !comment_repo.target_exists(kind, post_id).await? {
        warn!("Comment target does not exist");
        return Err(ApiError::NotFound);
    }

    let comment = comment_repo.create(&new_comment).await?;
    info!(id = comment.id, "Successfully added comment");

    Ok(ResponseJson(comment.into()))
}

use super::lock;
use super::traits::CommentRepository;
use crate::errors::ApiError;
use crate::models::{Comment, ContentKind, NewComment};
use crate::schema::{albums, comments, posts};
use async_trait::async_trait;
use diesel::dsl::exists;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct SqliteCommentRepository {
    db: Arc<Mutex<SqliteConnection>>,
}

impl SqliteCommentRepository {
    pub fn new(db: Arc<Mutex<SqliteConnection>>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CommentRepository for SqliteCommentRepository {
    async fn list_by_kind(&self, kind: ContentKind) -> Result<Vec<Comment>, ApiError> {
        let mut conn = lock(&self.db)?;
        let result = comments::table
            .filter(comments::post_type.eq(kind.as_str()))
            .order((comments::date.asc(), comments::id.asc()))
            .select(Comment::as_select())
            .load(&mut *conn)?;
        Ok(result)
    }

    async fn create(&self, comment: &NewComment) -> Result<Comment, ApiError> {
        let mut conn = lock(&self.db)?;
        let result = diesel::insert_into(comments::table)
            .values(comment)
            .returning(Comment::as_returning())
            .get_result(&mut *conn)?;
        Ok(result)
    }

    async fn target_exists(&self, kind: ContentKind, post_id: i32) -> Result<bool, ApiError> {
        let mut conn = lock(&self.db)?;
        let found = match kind {
            ContentKind::Gallery => {
                diesel::select(exists(albums::table.find(post_id))).get_result(&mut *conn)?
            }
            _ => diesel::select(exists(
                posts::table
                    .find(post_id)
                    .filter(posts::kind.eq(kind.as_str())),
            ))
            .get_result(&mut *conn)?,
        };
        Ok(found)
    }
}

use super::lock;
use super::traits::PostRepository;
use crate::errors::ApiError;
use crate::models::{ContentKind, NewPost, Post, PostChanges};
use crate::schema::{comments, posts};
use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct SqlitePostRepository {
    db: Arc<Mutex<SqliteConnection>>,
}

impl SqlitePostRepository {
    pub fn new(db: Arc<Mutex<SqliteConnection>>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PostRepository for SqlitePostRepository {
    async fn list_by_kind(&self, kind: ContentKind) -> Result<Vec<Post>, ApiError> {
        let mut conn = lock(&self.db)?;
        let result = posts::table
            .filter(posts::kind.eq(kind.as_str()))
            .order((posts::date.desc(), posts::id.desc()))
            .select(Post::as_select())
            .load(&mut *conn)?;
        Ok(result)
    }

    async fn create(&self, post: &NewPost) -> Result<Post, ApiError> {
        let mut conn = lock(&self.db)?;
        let result = diesel::insert_into(posts::table)
            .values(post)
            .returning(Post::as_returning())
            .get_result(&mut *conn)?;
        Ok(result)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Post>, ApiError> {
        let mut conn = lock(&self.db)?;
        let result = posts::table
            .find(id)
            .select(Post::as_select())
            .first(&mut *conn)
            .optional()?;
        Ok(result)
    }

    async fn update(&self, id: i32, changes: &PostChanges) -> Result<Post, ApiError> {
        let mut conn = lock(&self.db)?;
        let result = diesel::update(posts::table.find(id))
            .set(changes)
            .returning(Post::as_returning())
            .get_result(&mut *conn)
            .optional()?;
        result.ok_or(ApiError::NotFound)
    }

    async fn delete(&self, id: i32) -> Result<bool, ApiError> {
        let mut conn = lock(&self.db)?;
        let deleted = conn.transaction::<_, diesel::result::Error, _>(|conn| {
            let Some(kind) = posts::table
                .find(id)
                .select(posts::kind)
                .first::<String>(conn)
                .optional()?
            else {
                return Ok(false);
            };

            diesel::delete(
                comments::table
                    .filter(comments::post_id.eq(id))
                    .filter(comments::post_type.eq(kind)),
            )
            .execute(conn)?;
            diesel::delete(posts::table.find(id)).execute(conn)?;
            Ok(true)
        })?;
        Ok(deleted)
    }
}

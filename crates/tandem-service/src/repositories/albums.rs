use super::lock;
use super::traits::{AlbumRepository, AlbumWithPhotos};
use crate::errors::ApiError;
use crate::models::{Album, ContentKind, NewAlbum, NewPhoto, Photo, normalize_description};
use crate::schema::{albums, comments, photos};
use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct SqliteAlbumRepository {
    db: Arc<Mutex<SqliteConnection>>,
}

impl SqliteAlbumRepository {
    pub fn new(db: Arc<Mutex<SqliteConnection>>) -> Self {
        Self { db }
    }
}

fn attach_photos(
    conn: &mut SqliteConnection,
    albums: Vec<Album>,
) -> QueryResult<Vec<AlbumWithPhotos>> {
    let photos = Photo::belonging_to(&albums)
        .order(photos::id.asc())
        .select(Photo::as_select())
        .load(conn)?;

    Ok(photos
        .grouped_by(&albums)
        .into_iter()
        .zip(albums)
        .map(|(photos, album)| AlbumWithPhotos { album, photos })
        .collect())
}

#[async_trait]
impl AlbumRepository for SqliteAlbumRepository {
    async fn list(&self) -> Result<Vec<AlbumWithPhotos>, ApiError> {
        let mut conn = lock(&self.db)?;
        let albums = albums::table
            .order((albums::date.desc(), albums::id.desc()))
            .select(Album::as_select())
            .load(&mut *conn)?;
        Ok(attach_photos(&mut conn, albums)?)
    }

    async fn create(
        &self,
        album: &NewAlbum,
        filenames: &[String],
    ) -> Result<AlbumWithPhotos, ApiError> {
        let mut conn = lock(&self.db)?;
        let created = conn.transaction::<_, diesel::result::Error, _>(|conn| {
            let album = diesel::insert_into(albums::table)
                .values(album)
                .returning(Album::as_returning())
                .get_result(conn)?;

            let rows: Vec<NewPhoto<'_>> = filenames
                .iter()
                .map(|filename| NewPhoto {
                    album_id: album.id,
                    filename,
                })
                .collect();
            if !rows.is_empty() {
                diesel::insert_into(photos::table)
                    .values(&rows)
                    .execute(conn)?;
            }

            let photos = Photo::belonging_to(&album)
                .order(photos::id.asc())
                .select(Photo::as_select())
                .load(conn)?;
            Ok(AlbumWithPhotos { album, photos })
        })?;
        Ok(created)
    }

    async fn update_description(
        &self,
        id: i32,
        description: Option<String>,
    ) -> Result<bool, ApiError> {
        let mut conn = lock(&self.db)?;
        let updated = diesel::update(albums::table.find(id))
            .set(albums::description.eq(normalize_description(description)))
            .execute(&mut *conn)?;
        Ok(updated > 0)
    }

    async fn delete(&self, id: i32) -> Result<Option<Vec<String>>, ApiError> {
        let mut conn = lock(&self.db)?;
        let removed = conn.transaction::<_, diesel::result::Error, _>(|conn| {
            let found = albums::table
                .find(id)
                .select(albums::id)
                .first::<i32>(conn)
                .optional()?;
            if found.is_none() {
                return Ok(None);
            }

            let filenames = photos::table
                .filter(photos::album_id.eq(id))
                .select(photos::filename)
                .load::<String>(conn)?;

            diesel::delete(
                comments::table
                    .filter(comments::post_id.eq(id))
                    .filter(comments::post_type.eq(ContentKind::Gallery.as_str())),
            )
            .execute(conn)?;
            diesel::delete(photos::table.filter(photos::album_id.eq(id))).execute(conn)?;
            diesel::delete(albums::table.find(id)).execute(conn)?;
            Ok(Some(filenames))
        })?;
        Ok(removed)
    }
}

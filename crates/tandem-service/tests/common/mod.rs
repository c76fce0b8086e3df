#![allow(dead_code)]

use diesel::{Connection, sqlite::SqliteConnection};

pub fn establish_test_connection() -> SqliteConnection {
    let mut connection =
        SqliteConnection::establish(":memory:").expect("Failed to create in-memory database");

    tandem_service::run_migrations(&mut connection).expect("Failed to run migrations");

    connection
}

pub mod server_utils {
    use super::*;
    use axum_test::TestServer;
    use std::sync::{Arc, Mutex};
    use tandem_service::{DefaultAppState, create_app, uploads::PhotoStore};
    use tempfile::TempDir;

    pub struct TestContext {
        pub server: TestServer,
        pub db: Arc<Mutex<SqliteConnection>>,
        pub uploads: TempDir,
    }

    pub fn create_test_server() -> TestContext {
        let uploads = tempfile::tempdir().expect("Failed to create upload directory");
        let db = Arc::new(Mutex::new(establish_test_connection()));

        let state = DefaultAppState::new(db.clone(), PhotoStore::new(uploads.path()));
        let server = TestServer::new(create_app(state)).unwrap();

        TestContext {
            server,
            db,
            uploads,
        }
    }
}

pub mod test_utils {
    use diesel::prelude::*;
    use diesel::sqlite::SqliteConnection;
    use tandem_service::models::{Comment, Photo};
    use tandem_service::schema::{albums, comments, photos, posts};

    pub fn count_posts(conn: &mut SqliteConnection) -> i64 {
        posts::table
            .count()
            .get_result(conn)
            .expect("Failed to count posts")
    }

    pub fn count_albums(conn: &mut SqliteConnection) -> i64 {
        albums::table
            .count()
            .get_result(conn)
            .expect("Failed to count albums")
    }

    pub fn photos_for_album(conn: &mut SqliteConnection, album_id: i32) -> Vec<Photo> {
        photos::table
            .filter(photos::album_id.eq(album_id))
            .select(Photo::as_select())
            .load(conn)
            .expect("Failed to load photos")
    }

    pub fn comments_for(conn: &mut SqliteConnection, post_type: &str, post_id: i32) -> Vec<Comment> {
        comments::table
            .filter(comments::post_type.eq(post_type))
            .filter(comments::post_id.eq(post_id))
            .select(Comment::as_select())
            .load(conn)
            .expect("Failed to load comments")
    }
}

use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::uploads::PhotoStore;
use crate::{DefaultAppState, create_app};

pub fn establish_test_connection() -> SqliteConnection {
    let mut connection =
        SqliteConnection::establish(":memory:").expect("Failed to create in-memory database");

    crate::run_migrations(&mut connection).expect("Failed to run migrations");

    connection
}

/// A router over a fresh in-memory database storing photos in `uploads`,
/// together with the connection for inspecting state.
pub fn create_test_app(uploads: &Path) -> (axum::Router, Arc<Mutex<SqliteConnection>>) {
    let db = Arc::new(Mutex::new(establish_test_connection()));
    let state = DefaultAppState::new(db.clone(), PhotoStore::new(uploads));
    (create_app(state), db)
}

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;

use crate::aggregate::Snapshot;
use crate::client::ContentStore;
use crate::errors::ClientError;
use crate::models::{Album, ContentKind, LongPost, ShortPost};

/// A content store backed by a snapshot held in memory. Each collection
/// can be made to fail on its own, and every fetch can be made to hang.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    snapshot: Mutex<Snapshot>,
    failing: Mutex<HashSet<ContentKind>>,
    stalled: Mutex<bool>,
}

impl InMemoryStore {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            snapshot: Mutex::new(snapshot),
            ..Self::default()
        }
    }

    pub fn push_thought(&self, post: ShortPost) {
        self.snapshot.lock().unwrap().thoughts.insert(0, post);
    }

    pub fn set_failing(&self, kind: ContentKind, failing: bool) {
        let mut set = self.failing.lock().unwrap();
        if failing {
            set.insert(kind);
        } else {
            set.remove(&kind);
        }
    }

    pub fn fail_all(&self) {
        for kind in ContentKind::ALL {
            self.set_failing(kind, true);
        }
    }

    /// Fetches started after this never complete.
    pub fn set_stalled(&self, stalled: bool) {
        *self.stalled.lock().unwrap() = stalled;
    }

    async fn read<T>(
        &self,
        kind: ContentKind,
        pick: impl FnOnce(&Snapshot) -> T,
    ) -> Result<T, ClientError> {
        let stalled = *self.stalled.lock().unwrap();
        if stalled {
            std::future::pending::<()>().await;
        }
        if self.failing.lock().unwrap().contains(&kind) {
            return Err(ClientError::invalid(format!("{kind} unavailable")));
        }
        Ok(pick(&self.snapshot.lock().unwrap()))
    }
}

#[async_trait]
impl ContentStore for InMemoryStore {
    async fn fetch_short_posts(&self) -> Result<Vec<ShortPost>, ClientError> {
        self.read(ContentKind::Thoughts, |s| s.thoughts.clone()).await
    }

    async fn fetch_long_posts(&self) -> Result<Vec<LongPost>, ClientError> {
        self.read(ContentKind::Articles, |s| s.articles.clone()).await
    }

    async fn fetch_albums(&self) -> Result<Vec<Album>, ClientError> {
        self.read(ContentKind::Gallery, |s| s.albums.clone()).await
    }
}

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

use crate::errors::CheckpointError;
use crate::models::Account;

pub const CHECKPOINT_FILE: &str = "checkpoints.json";

pub fn storage_key(account: Account) -> String {
    format!("lastCheckTime_{}", account.as_str())
}

/// Where each account's last notification check is remembered.
pub trait CheckpointStore: Send + Sync {
    fn load(&self, account: Account) -> Result<Option<DateTime<Utc>>, CheckpointError>;
    fn save(&self, account: Account, at: DateTime<Utc>) -> Result<(), CheckpointError>;
}

/// Checkpoints kept as a JSON object in the client state directory.
#[derive(Debug, Clone)]
pub struct FileCheckpointStore {
    path: PathBuf,
}

impl FileCheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_dir(state_dir: &Path) -> Self {
        Self::new(state_dir.join(CHECKPOINT_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, DateTime<Utc>>, CheckpointError> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }
}

impl CheckpointStore for FileCheckpointStore {
    fn load(&self, account: Account) -> Result<Option<DateTime<Utc>>, CheckpointError> {
        Ok(self.read_all()?.remove(&storage_key(account)))
    }

    fn save(&self, account: Account, at: DateTime<Utc>) -> Result<(), CheckpointError> {
        let mut all = self.read_all()?;
        all.insert(storage_key(account), at);

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(&all)?)?;
        debug!(path = %self.path.display(), %account, "Saved checkpoint");
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryCheckpointStore {
    entries: Mutex<HashMap<Account, DateTime<Utc>>>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CheckpointStore for MemoryCheckpointStore {
    fn load(&self, account: Account) -> Result<Option<DateTime<Utc>>, CheckpointError> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(&account).copied())
    }

    fn save(&self, account: Account, at: DateTime<Utc>) -> Result<(), CheckpointError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(account, at);
        Ok(())
    }
}

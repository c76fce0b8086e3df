use crate::validation::{is_stored_filename, upload_extension};
use chrono::Utc;
use rand::Rng;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Most photos accepted in a single album upload.
pub const MAX_PHOTOS_PER_ALBUM: usize = 20;

/// Per-photo size limit.
pub const MAX_PHOTO_BYTES: usize = 10 * 1024 * 1024;

/// Local-disk storage for album photos, served back under `/uploads`.
#[derive(Debug, Clone)]
pub struct PhotoStore {
    root: PathBuf,
}

impl PhotoStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn ensure_dir(&self) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.root).await
    }

    /// Writes `bytes` under a fresh `<millis>-<random><.ext>` name and
    /// returns that name.
    pub async fn save(&self, original_name: Option<&str>, bytes: &[u8]) -> io::Result<String> {
        let filename = generate_filename(original_name);
        tokio::fs::write(self.root.join(&filename), bytes).await?;
        debug!(filename = %filename, size = bytes.len(), "Stored photo");
        Ok(filename)
    }

    /// Removes stored files, skipping names that were never ours and files
    /// that are already gone.
    pub async fn remove_all(&self, filenames: &[String]) {
        for filename in filenames {
            if !is_stored_filename(filename) {
                warn!(filename = %filename, "Refusing to remove unexpected filename");
                continue;
            }
            match tokio::fs::remove_file(self.root.join(filename)).await {
                Ok(()) => debug!(filename = %filename, "Removed photo"),
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => warn!(filename = %filename, error = %err, "Failed to remove photo"),
            }
        }
    }

    /// Round-trips a probe file to prove the directory is writable.
    pub async fn check_writable(&self) -> io::Result<()> {
        let probe = self
            .root
            .join(format!(".write-test-{}", Utc::now().timestamp_millis()));
        tokio::fs::write(&probe, b"test").await?;
        tokio::fs::remove_file(&probe).await
    }
}

fn generate_filename(original_name: Option<&str>) -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
    format!(
        "{}-{}{}",
        Utc::now().timestamp_millis(),
        suffix,
        upload_extension(original_name)
    )
}

//! Snapshot Storage
//!
//! Where snapshots live between process runs. There is a single fixed location;
//! every save overwrites the previous one and no history is kept.

use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use std::future::Future;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

pub trait SnapshotStore: Send + Sync {
    /// Reads the stored snapshot. `Ok(None)` when nothing has been saved yet.
    fn load(&self) -> impl Future<Output = Result<Option<Vec<u8>>>> + Send;

    /// Replaces the stored snapshot with `bytes`.
    fn save(&self, bytes: &[u8]) -> impl Future<Output = Result<()>> + Send;
}

/// Snapshot kept in one file on local disk.
///
/// Each save is staged in its own temporary file, synced, and only then moved
/// over the real file. A crash mid-write leaves the previous snapshot intact.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStore for FileStore {
    async fn load(&self) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("reading {}", self.path.display())),
        }
    }

    async fn save(&self, bytes: &[u8]) -> Result<()> {
        let path = self.path.clone();
        let bytes = bytes.to_vec();

        tokio::task::spawn_blocking(move || write_atomically(&path, &bytes))
            .await
            .context("snapshot writer task failed")?
    }
}

fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("staging {}", path.display()))?;

    file.write_all(bytes)
        .with_context(|| format!("writing {}", path.display()))?;
    file.flush()?;
    file.as_file().sync_all()?;

    file.commit()
        .with_context(|| format!("replacing {}", path.display()))?;
    Ok(())
}

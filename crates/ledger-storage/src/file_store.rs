use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use ledger_core::{Hash, PeerId};
use tracing::{info, warn};

use crate::downloader::SnapshotDownloader;
use crate::error::SnapshotStoreError;

/// Deletes and fetches snapshot files by hash, given a diff already computed
/// by the coordination layer. This is the boundary between "decide what to
/// delete and download" (this repo's concern) and "move bytes around"
/// (left to a `SnapshotDownloader`).
#[async_trait]
pub trait SnapshotFileStore: Send + Sync {
    async fn remove(&self, hashes: &[Hash]) -> Result<(), SnapshotStoreError>;
    async fn fetch(&self, hashes: &[Hash], peers: &[PeerId]) -> Result<(), SnapshotStoreError>;
}

/// A snapshot store rooted at a single directory, one file per hash.
pub struct LocalSnapshotFileStore {
    root: PathBuf,
    downloader: Arc<dyn SnapshotDownloader>,
}

impl LocalSnapshotFileStore {
    pub fn new(root: impl Into<PathBuf>, downloader: Arc<dyn SnapshotDownloader>) -> Self {
        Self { root: root.into(), downloader }
    }

    /// Rejects any hash that would escape `root` when used as a file name.
    /// Mirrors the checkpoint import guard: a hash is an opaque identifier,
    /// never a path, and must never be allowed to traverse directories.
    fn path_for(&self, hash: &Hash) -> Result<PathBuf, SnapshotStoreError> {
        if hash.is_empty() || hash.contains('/') || hash.contains('\\') || hash.contains("..") {
            return Err(SnapshotStoreError::InvalidHash(hash.clone()));
        }
        Ok(self.root.join(hash))
    }
}

#[async_trait]
impl SnapshotFileStore for LocalSnapshotFileStore {
    async fn remove(&self, hashes: &[Hash]) -> Result<(), SnapshotStoreError> {
        for hash in hashes {
            let path = self.path_for(hash)?;
            match tokio::fs::remove_file(&path).await {
                Ok(()) => info!(%hash, "removed snapshot file"),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                    warn!(%hash, "snapshot file already absent, nothing to remove");
                }
                Err(err) => return Err(SnapshotStoreError::Io(err)),
            }
        }
        Ok(())
    }

    async fn fetch(&self, hashes: &[Hash], peers: &[PeerId]) -> Result<(), SnapshotStoreError> {
        if peers.is_empty() {
            return Err(SnapshotStoreError::NoPeerAvailable(Vec::new()));
        }
        for hash in hashes {
            let path = self.path_for(hash)?;
            let bytes = self.downloader.download(hash, peers).await?;
            tokio::fs::write(&path, bytes).await?;
            info!(%hash, "fetched snapshot file");
        }
        Ok(())
    }
}

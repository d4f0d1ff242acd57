use async_trait::async_trait;
use ledger_core::{Hash, PeerId};

use crate::error::SnapshotStoreError;

/// Retrieves the raw bytes of one snapshot from one of the given peers.
///
/// The transfer protocol itself — chunking, resumption, integrity checks
/// against the hash — is deliberately not part of this crate; callers
/// supply an implementation that speaks whatever wire format the snapshot
/// transport layer uses.
#[async_trait]
pub trait SnapshotDownloader: Send + Sync {
    async fn download(&self, hash: &Hash, peers: &[PeerId]) -> Result<Vec<u8>, SnapshotStoreError>;
}

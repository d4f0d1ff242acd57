use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Stable string identity of a consensus item or a snapshot.
pub type Hash = String;

/// Opaque identifier of a peer, as handed out by the Peer Directory.
pub type PeerId = String;

/// A `(hash, height)` pair describing one of a node's recent snapshots.
///
/// Height is monotone non-decreasing per honest node (spec §3).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecentSnapshot {
    pub hash: Hash,
    pub height: i64,
}

impl RecentSnapshot {
    pub fn new(hash: impl Into<Hash>, height: i64) -> Self {
        Self { hash: hash.into(), height }
    }
}

/// A node's view of `height -> hash` for its own recent history, or for a
/// peer's proposal in a health-check round. Hashes are unique per height
/// within one proposer's view; conflicts across proposers are resolved by
/// the majority chooser, not here.
pub type SnapshotsAtHeight = HashMap<i64, Hash>;

/// One peer's proposed `SnapshotsAtHeight`, keyed by height. Feeds the
/// height-by-height majority chooser (C6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerProposal {
    pub peer_id: PeerId,
    pub snapshots: SnapshotsAtHeight,
}

/// One peer's entire recent-snapshot list, as collected for cluster
/// consistency comparison (C7). Distinct from `PeerProposal`: C7 groups
/// peers by their whole list rather than tallying per height.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerSnapshotList {
    pub peer_id: PeerId,
    pub snapshots: Vec<RecentSnapshot>,
}

/// `(value, n, of)` — `value` was proposed by `n` of `of` total proposers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrences<T> {
    pub value: T,
    pub n: usize,
    pub of: usize,
}

impl<T> Occurrences<T> {
    pub fn percentage(&self) -> f64 {
        if self.of == 0 {
            0.0
        } else {
            self.n as f64 / self.of as f64
        }
    }
}

/// The divergence between a node's own recent snapshots and the cluster
/// majority. An empty `to_delete` or `to_download` means no redownload is
/// warranted (spec §3).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SnapshotDiff {
    pub to_delete: Vec<RecentSnapshot>,
    pub to_download: Vec<RecentSnapshot>,
    pub peers: Vec<PeerId>,
}

impl SnapshotDiff {
    /// True when there is nothing to act on: no heights to delete and none
    /// to download. `peers` is not part of this check — a non-empty
    /// `to_download` with no peers able to serve it is still a real (if
    /// currently unfulfillable) diff, not a no-op.
    pub fn is_empty(&self) -> bool {
        self.to_delete.is_empty() && self.to_download.is_empty()
    }
}

/// Wire payload announcing a freshly created snapshot (spec §6).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotCreated {
    pub hash: Hash,
    pub height: i64,
}

/// A peer's verdict on a `SnapshotCreated` announcement (spec §6).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotVerification {
    pub id: PeerId,
    pub status: SnapshotVerificationStatus,
    pub recent_snapshot: Vec<RecentSnapshot>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotVerificationStatus {
    SnapshotCorrect,
    SnapshotInvalid,
    SnapshotHeightAbove,
}

use std::sync::Arc;

use ledger_core::{Hash, NodeState, SnapshotDiff};
use ledger_storage::SnapshotFileStore;
use tracing::{info, warn};

use crate::cluster_check_gate::ClusterCheckGate;
use crate::error::NodeError;
use crate::metrics::NodeMetrics;
use crate::node_state_service::NodeStateService;

/// A hash made entirely of `'0'` characters is a placeholder entry (the
/// node has no snapshot yet at that height) and is never actually fetched.
fn is_zero_hash_sentinel(hash: &Hash) -> bool {
    !hash.is_empty() && hash.chars().all(|c| c == '0')
}

/// Runs at most one redownload episode at a time (I5), gated by the same
/// `ClusterCheckGate` that C9's `verifyRecentSnapshots` reserves for its
/// whole round. A second caller arriving while an episode (or a
/// verification round already holding the gate) is in flight gets
/// `Ok(false)` immediately rather than queuing or erroring — the next
/// scheduled health check will simply try again once the gate is free.
pub struct RedownloadDriver {
    gate: Arc<ClusterCheckGate>,
    node_state: Arc<NodeStateService>,
    file_store: Arc<dyn SnapshotFileStore>,
    metrics: Arc<NodeMetrics>,
}

impl RedownloadDriver {
    pub fn new(
        gate: Arc<ClusterCheckGate>,
        node_state: Arc<NodeStateService>,
        file_store: Arc<dyn SnapshotFileStore>,
        metrics: Arc<NodeMetrics>,
    ) -> Self {
        Self { gate, node_state, file_store, metrics }
    }

    /// Attempts to claim the single redownload slot and, if successful,
    /// runs the full delete-then-download episode for `diff` to completion.
    /// Returns `Ok(false)` without touching anything if the gate is already
    /// held.
    pub async fn try_run_episode(&self, diff: &SnapshotDiff) -> Result<bool, NodeError> {
        if !self.gate.try_acquire() {
            return Ok(false);
        }

        let result = self.run_episode(diff).await;
        self.gate.release();
        result.map(|()| true)
    }

    /// Runs the episode assuming the caller already holds the gate —
    /// `verifyRecentSnapshots` acquires it for its entire round (peer poll
    /// included), not just the redownload itself.
    pub async fn run_episode_already_gated(&self, diff: &SnapshotDiff) -> Result<(), NodeError> {
        self.run_episode(diff).await
    }

    async fn run_episode(&self, diff: &SnapshotDiff) -> Result<(), NodeError> {
        let previous_state = self.node_state.get();
        self.node_state.set(NodeState::DownloadInProgress);

        let outcome = self.execute(diff).await;
        self.node_state.set(previous_state);

        match &outcome {
            Ok(()) => {
                info!("redownload episode finished");
                self.metrics.record_redownload_finished();
            }
            Err(err) => {
                warn!(%err, "redownload episode failed");
                self.metrics.record_redownload_error();
            }
        }
        outcome
    }

    async fn execute(&self, diff: &SnapshotDiff) -> Result<(), NodeError> {
        if !diff.to_delete.is_empty() {
            let hashes: Vec<Hash> = diff.to_delete.iter().map(|s| s.hash.clone()).collect();
            self.file_store.remove(&hashes).await?;
        }

        let wanted: Vec<Hash> = diff
            .to_download
            .iter()
            .map(|s| s.hash.clone())
            .filter(|hash| !is_zero_hash_sentinel(hash))
            .collect();
        if !wanted.is_empty() {
            self.file_store.fetch(&wanted, &diff.peers).await?;
        }

        Ok(())
    }
}

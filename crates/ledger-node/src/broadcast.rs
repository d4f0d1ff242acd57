use std::sync::Arc;

use ledger_consensus::{compare_snapshot_state_with_majority, should_re_download};
use ledger_core::{
    can_verify_recent_snapshots, NodeType, PeerSnapshotList, ProcessingConfig, RecentSnapshot,
    SnapshotCreated, SnapshotVerification, SnapshotVerificationStatus,
};
use ledger_network::{PeerClient, PeerDirectory};
use tracing::{debug, info};

use crate::cluster_check_gate::ClusterCheckGate;
use crate::error::NodeError;
use crate::node_state_service::NodeStateService;
use crate::recent_snapshots::RecentSnapshotsHandle;
use crate::redownload::RedownloadDriver;

/// Announces freshly created snapshots to every known peer and keeps a
/// node's `recentSnapshots` list in step with the cluster (C9). Two
/// distinct operations live here, sharing the redownload driver's gate so
/// at most one of them ever drives a redownload episode at a time:
///
/// - `broadcast_snapshot`: fired right after a snapshot is created. Prepends
///   it to `recentSnapshots`, fans the new entry out to every ready `Full`
///   peer for verification, and feeds the verification responses into C7 to
///   see whether the node itself has fallen out of step.
/// - `verify_recent_snapshots`: a standalone poll, gated on the same
///   single-flight slot as redownload episodes, that asks peers for their
///   whole `recentSnapshots` list rather than waiting for a broadcast.
pub struct BroadcastVerifyLoop {
    peer_client: Arc<dyn PeerClient>,
    peer_directory: Arc<dyn PeerDirectory>,
    node_state: Arc<NodeStateService>,
    recent_snapshots: Arc<RecentSnapshotsHandle>,
    redownload_driver: Arc<RedownloadDriver>,
    gate: Arc<ClusterCheckGate>,
    config: ProcessingConfig,
}

impl BroadcastVerifyLoop {
    pub fn new(
        peer_client: Arc<dyn PeerClient>,
        peer_directory: Arc<dyn PeerDirectory>,
        node_state: Arc<NodeStateService>,
        recent_snapshots: Arc<RecentSnapshotsHandle>,
        redownload_driver: Arc<RedownloadDriver>,
        gate: Arc<ClusterCheckGate>,
        config: ProcessingConfig,
    ) -> Self {
        Self { peer_client, peer_directory, node_state, recent_snapshots, redownload_driver, gate, config }
    }

    /// C9's `broadcastSnapshot`: prepend `created` to `recentSnapshots`, fan
    /// it out to every ready `Full` peer, feed the responses into C7, and
    /// drive a redownload episode if the diff warrants one.
    pub async fn broadcast_snapshot(&self, created: &SnapshotCreated) -> Vec<SnapshotVerification> {
        let cap = self.config.recent_snapshot_number;
        let own = self.recent_snapshots.prepend_and_truncate(
            RecentSnapshot::new(created.hash.clone(), created.height),
            cap,
        );

        if !can_verify_recent_snapshots(self.node_state.get()) {
            debug!("node not ready, skipping snapshot broadcast");
            return Vec::new();
        }

        let peers = self.peer_directory.ready_peers(NodeType::Full).await;
        let mut verifications = Vec::with_capacity(peers.len());
        let mut cluster = Vec::with_capacity(peers.len());
        for peer in peers {
            if let Some(verification) = self.peer_client.verify_snapshot(&peer, created).await {
                if !verification.recent_snapshot.is_empty() {
                    cluster.push(PeerSnapshotList {
                        peer_id: verification.id.clone(),
                        snapshots: verification.recent_snapshot.clone(),
                    });
                }
                verifications.push(verification);
            }
        }

        if !cluster.is_empty() {
            let (diff, majority) = compare_snapshot_state_with_majority(&own, &cluster);
            if should_re_download(&own, &diff, &self.config) {
                match self.redownload_driver.try_run_episode(&diff).await {
                    Ok(true) => self.recent_snapshots.set(majority),
                    Ok(false) => info!("redownload episode already in progress, skipping"),
                    Err(err) => tracing::warn!(%err, "redownload episode failed during broadcast"),
                }
            }
        }

        verifications
    }

    /// C9's `verifyRecentSnapshots`: a standalone round, gated on the same
    /// slot as redownload episodes, that polls peers for their whole
    /// `recentSnapshots` list instead of waiting for a broadcast. Releases
    /// the gate on every return path.
    pub async fn verify_recent_snapshots(&self) -> Result<bool, NodeError> {
        if !self.gate.try_acquire() {
            return Ok(false);
        }

        let outcome = self.run_verification().await;
        self.gate.release();
        outcome
    }

    async fn run_verification(&self) -> Result<bool, NodeError> {
        if !can_verify_recent_snapshots(self.node_state.get()) {
            debug!("node not ready, skipping recent snapshot verification");
            return Ok(false);
        }

        let own = self.recent_snapshots.get();
        let peers = self.peer_directory.ready_peers(NodeType::Full).await;
        let mut cluster = Vec::with_capacity(peers.len());
        for peer in peers {
            if let Some(snapshots) = self.peer_client.recent_snapshots(&peer).await {
                cluster.push(PeerSnapshotList { peer_id: peer, snapshots });
            }
        }
        if cluster.is_empty() {
            return Ok(false);
        }

        let (diff, majority) = compare_snapshot_state_with_majority(&own, &cluster);
        if !should_re_download(&own, &diff, &self.config) {
            return Ok(false);
        }

        self.redownload_driver.run_episode_already_gated(&diff).await?;
        self.recent_snapshots.set(majority);
        Ok(true)
    }

    /// Whether enough peers reported `SnapshotInvalid` to warrant an early
    /// cluster consistency sweep (C10), per `max_invalid_snapshot_rate`.
    pub fn should_run_cluster_check(&self, verifications: &[SnapshotVerification]) -> bool {
        if verifications.is_empty() {
            return false;
        }
        let invalid =
            verifications.iter().filter(|v| v.status == SnapshotVerificationStatus::SnapshotInvalid).count();
        let rate = (invalid * 100) / verifications.len();
        rate as u8 >= self.config.max_invalid_snapshot_rate
    }
}

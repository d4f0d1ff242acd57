use std::sync::Arc;

use ledger_consensus::{compare_snapshot_state, should_re_download};
use ledger_core::{can_run_cluster_check, NodeType, PeerSnapshotList, ProcessingConfig, RecentSnapshot, SnapshotDiff};
use ledger_network::{PeerClient, PeerDirectory};
use tracing::debug;

use crate::node_state_service::NodeStateService;

/// Periodically compares a node's recent snapshots against the cluster
/// majority and produces a `SnapshotDiff` when the node has fallen behind
/// or diverged (C10). Uses C7's list-grouping majority chooser directly —
/// doesn't decide what to do about the diff — that's `RedownloadDriver`'s
/// job.
pub struct HealthCheckLoop {
    peer_client: Arc<dyn PeerClient>,
    peer_directory: Arc<dyn PeerDirectory>,
    pub(crate) node_state: Arc<NodeStateService>,
    config: ProcessingConfig,
}

impl HealthCheckLoop {
    pub fn new(
        peer_client: Arc<dyn PeerClient>,
        peer_directory: Arc<dyn PeerDirectory>,
        node_state: Arc<NodeStateService>,
        config: ProcessingConfig,
    ) -> Self {
        Self { peer_client, peer_directory, node_state, config }
    }

    /// Runs one consistency sweep. Returns `None` when the node isn't ready
    /// to check, when no peer responded, or when the node is already in
    /// step with the cluster.
    pub async fn run_cluster_check(&self, own: &[RecentSnapshot]) -> Option<SnapshotDiff> {
        if !can_run_cluster_check(self.node_state.get()) {
            debug!("node not ready, skipping cluster check");
            return None;
        }

        let peers = self.peer_directory.ready_peers(NodeType::Full).await;
        let mut cluster = Vec::with_capacity(peers.len());
        for peer in peers {
            if let Some(snapshots) = self.peer_client.recent_snapshots(&peer).await {
                cluster.push(PeerSnapshotList { peer_id: peer, snapshots });
            }
        }
        if cluster.is_empty() {
            return None;
        }

        let diff = compare_snapshot_state(own, &cluster);
        if should_re_download(own, &diff, &self.config) {
            Some(diff)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ledger_core::{NodeState, PeerId, SnapshotCreated, SnapshotVerification};
    use ledger_network::StaticPeerDirectory;

    struct FakeClient {
        snapshots: std::collections::HashMap<PeerId, Vec<RecentSnapshot>>,
    }

    #[async_trait]
    impl PeerClient for FakeClient {
        async fn verify_snapshot(
            &self,
            _peer: &PeerId,
            _created: &SnapshotCreated,
        ) -> Option<SnapshotVerification> {
            None
        }

        async fn recent_snapshots(&self, peer: &PeerId) -> Option<Vec<RecentSnapshot>> {
            self.snapshots.get(peer).cloned()
        }
    }

    fn check_with(snapshots: Vec<(&str, Vec<RecentSnapshot>)>) -> HealthCheckLoop {
        let peers: Vec<(PeerId, String)> =
            snapshots.iter().map(|(id, _)| (id.to_string(), format!("http://{id}"))).collect();
        let client = Arc::new(FakeClient {
            snapshots: snapshots.into_iter().map(|(id, s)| (id.to_string(), s)).collect(),
        });
        HealthCheckLoop::new(
            client,
            Arc::new(StaticPeerDirectory::new(peers)),
            Arc::new(NodeStateService::new(NodeState::Ready)),
            ProcessingConfig::default(),
        )
    }

    #[tokio::test]
    async fn no_diff_when_aligned_with_majority() {
        let check = check_with(vec![
            ("p1", vec![RecentSnapshot::new("a", 1)]),
            ("p2", vec![RecentSnapshot::new("a", 1)]),
        ]);
        let own = vec![RecentSnapshot::new("a", 1)];
        assert!(check.run_cluster_check(&own).await.is_none());
    }

    #[tokio::test]
    async fn diff_produced_when_behind_the_cluster() {
        let check = check_with(vec![
            ("p1", vec![RecentSnapshot::new("z", 50)]),
            ("p2", vec![RecentSnapshot::new("z", 50)]),
        ]);
        let own = vec![RecentSnapshot::new("a", 1)];
        let diff = check.run_cluster_check(&own).await;
        assert!(diff.is_some());
        assert_eq!(diff.unwrap().to_download, vec![RecentSnapshot::new("z", 50)]);
    }

    #[tokio::test]
    async fn no_diff_when_no_peer_responds() {
        let check = check_with(vec![]);
        let own = vec![RecentSnapshot::new("a", 1)];
        assert!(check.run_cluster_check(&own).await.is_none());
    }

    #[tokio::test]
    async fn skipped_when_node_not_ready() {
        let check = check_with(vec![("p1", vec![RecentSnapshot::new("z", 50)])]);
        check.node_state.set(NodeState::DownloadInProgress);
        let own = vec![RecentSnapshot::new("a", 1)];
        assert!(check.run_cluster_check(&own).await.is_none());
    }
}

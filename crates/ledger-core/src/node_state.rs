use serde::{Deserialize, Serialize};

/// Node lifecycle state, as reported by the Node State service (spec §6).
///
/// `Ready` and `DownloadInProgress` are the two states C8/C9/C10 actually
/// gate on; `Starting`/`Stopping` exist so the service can report an
/// accurate state before/after those loops are running at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeState {
    Ready,
    DownloadInProgress,
    Starting,
    Stopping,
}

/// Whether a health-check-driven cluster consistency sweep (C10) may run
/// in this state. Only a node that is fully up can safely compare itself
/// against peers.
pub fn can_run_cluster_check(state: NodeState) -> bool {
    matches!(state, NodeState::Ready)
}

/// Whether the broadcast/verify loop (C9) may poll peers for recent
/// snapshots. Same condition as `can_run_cluster_check` today, but kept as
/// a distinct predicate per spec §4.C9 since the two loops answer
/// different questions and may diverge later.
pub fn can_verify_recent_snapshots(state: NodeState) -> bool {
    matches!(state, NodeState::Ready)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_allows_checks() {
        assert!(can_run_cluster_check(NodeState::Ready));
        assert!(can_verify_recent_snapshots(NodeState::Ready));
    }

    #[test]
    fn download_in_progress_blocks_checks() {
        assert!(!can_run_cluster_check(NodeState::DownloadInProgress));
        assert!(!can_verify_recent_snapshots(NodeState::DownloadInProgress));
    }
}

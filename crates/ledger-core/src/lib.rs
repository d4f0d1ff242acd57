pub mod config;
pub mod consensus_object;
pub mod node_state;
pub mod node_type;
pub mod types;

pub use config::{ProcessingConfig, ProcessingConfigError, DEFAULT_SUBSTORE_CAPACITY};
pub use consensus_object::{ConsensusObject, ConsensusStatus};
pub use node_state::{can_run_cluster_check, can_verify_recent_snapshots, NodeState};
pub use node_type::NodeType;
pub use types::{
    Hash, Occurrences, PeerId, PeerProposal, PeerSnapshotList, RecentSnapshot, SnapshotCreated,
    SnapshotDiff, SnapshotVerification, SnapshotVerificationStatus, SnapshotsAtHeight,
};

use serde::{Deserialize, Serialize};

use crate::types::Hash;

/// A data item (checkpoint or transaction) that can move through the
/// consensus lifecycle store. Equality and ordering of stored items are by
/// `hash()` alone — the payload itself is opaque to the store.
pub trait ConsensusObject: Clone + Send + Sync + 'static {
    fn hash(&self) -> Hash;
}

/// The four-state machine a consensus item moves through (spec §3/§4.C4).
///
/// `Pending -> InConsensus -> Accepted` is the happy path;
/// `InConsensus -> Unknown -> Pending` is the recovery path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConsensusStatus {
    Pending,
    InConsensus,
    Accepted,
    Unknown,
}

impl std::fmt::Display for ConsensusStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ConsensusStatus::Pending => "pending",
            ConsensusStatus::InConsensus => "in_consensus",
            ConsensusStatus::Accepted => "accepted",
            ConsensusStatus::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

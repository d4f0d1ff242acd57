use ledger_core::{ConsensusObject, Hash};

/// The concrete item the node binary moves through the consensus lifecycle
/// store. A real deployment would carry a checkpoint or transaction payload
/// here; only the hash matters to the coordination layer itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerItem {
    pub hash: Hash,
}

impl LedgerItem {
    pub fn new(hash: impl Into<Hash>) -> Self {
        Self { hash: hash.into() }
    }
}

impl ConsensusObject for LedgerItem {
    fn hash(&self) -> Hash {
        self.hash.clone()
    }
}

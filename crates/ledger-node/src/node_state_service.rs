use ledger_core::NodeState;
use parking_lot::RwLock;

/// Holds the node's current lifecycle state (spec §6) behind a single lock.
/// C8 sets `DownloadInProgress` for the duration of a redownload episode;
/// C9 and C10 read it to decide whether they're allowed to run at all.
pub struct NodeStateService {
    state: RwLock<NodeState>,
}

impl NodeStateService {
    pub fn new(initial: NodeState) -> Self {
        Self { state: RwLock::new(initial) }
    }

    pub fn get(&self) -> NodeState {
        *self.state.read()
    }

    pub fn set(&self, state: NodeState) {
        *self.state.write() = state;
    }
}

impl Default for NodeStateService {
    fn default() -> Self {
        Self::new(NodeState::Starting)
    }
}

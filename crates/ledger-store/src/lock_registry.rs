use std::collections::HashMap;

use parking_lot::Mutex;

/// Names of the per-substore locks the lifecycle store serializes mutation
/// through (spec §6). Held for the duration of a single substore mutation,
/// never across an await point or a call back into the lifecycle store.
pub const IN_CONSENSUS_UPDATE: &str = "inConsensusUpdate";
pub const ACCEPTED_UPDATE: &str = "acceptedUpdate";
pub const UNKNOWN_UPDATE: &str = "unknownUpdate";
pub const MERKLE_POOL_UPDATE: &str = "merklePoolUpdate";

/// A fixed set of named mutexes (C3). Locks are created once up front;
/// `with_lock` panics on an unregistered name rather than silently creating
/// one, since an unknown lock name is always a programming error here.
pub struct LockRegistry {
    locks: HashMap<&'static str, Mutex<()>>,
}

impl LockRegistry {
    pub fn new(names: &[&'static str]) -> Self {
        let locks = names.iter().map(|&name| (name, Mutex::new(()))).collect();
        Self { locks }
    }

    /// Runs `body` while holding the named lock. `parking_lot::Mutex` has no
    /// poisoning, so a panic inside `body` releases the lock on unwind
    /// rather than leaving it permanently stuck.
    pub fn with_lock<F, R>(&self, name: &str, body: F) -> R
    where
        F: FnOnce() -> R,
    {
        let lock = self
            .locks
            .get(name)
            .unwrap_or_else(|| panic!("unregistered lock name: {name}"));
        let _guard = lock.lock();
        body()
    }
}

impl Default for LockRegistry {
    fn default() -> Self {
        Self::new(&[IN_CONSENSUS_UPDATE, ACCEPTED_UPDATE, UNKNOWN_UPDATE, MERKLE_POOL_UPDATE])
    }
}

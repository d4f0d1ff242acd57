use ledger_core::{ConsensusObject, Hash};

use crate::keyed_store::KeyedStore;

/// The pending pool (C2): an unbounded `KeyedStore` specialization that adds
/// `pull`, the only way items leave Pending for InConsensus.
///
/// Unlike InConsensus/Accepted/Unknown, Pending has no capacity bound —
/// nothing is ever silently dropped from the mempool, only moved onward by
/// the lifecycle store.
pub struct PendingMemPool<A: ConsensusObject> {
    store: KeyedStore<Hash, A>,
}

impl<A: ConsensusObject> PendingMemPool<A> {
    pub fn new() -> Self {
        Self { store: KeyedStore::new(None) }
    }

    pub fn put(&self, item: A) {
        self.store.put(item.hash(), item);
    }

    pub fn lookup(&self, key: &Hash) -> Option<A> {
        self.store.lookup(key)
    }

    pub fn contains(&self, key: &Hash) -> bool {
        self.store.contains(key)
    }

    pub fn remove(&self, key: &Hash) -> Option<A> {
        self.store.remove(key)
    }

    pub fn update<F>(&self, key: &Hash, f: F) -> Option<A>
    where
        F: FnOnce(A) -> A,
    {
        self.store.update(key, f)
    }

    pub fn update_or_insert<F>(&self, key: Hash, f: F, empty: A) -> A
    where
        F: FnOnce(A) -> A,
    {
        self.store.update_or_insert(key, f, empty)
    }

    pub fn size(&self) -> usize {
        self.store.size()
    }

    /// Pops up to `count` items, oldest first, for a consensus round.
    /// Pulled items leave Pending; the caller is responsible for placing
    /// them into InConsensus.
    pub fn pull(&self, count: usize) -> Vec<A> {
        let oldest_first = self.store.get_last_n(self.store.size());
        let mut oldest_first = oldest_first;
        oldest_first.reverse();
        let to_pull: Vec<A> = oldest_first.into_iter().take(count).collect();
        for item in &to_pull {
            self.store.remove(&item.hash());
        }
        to_pull
    }
}

impl<A: ConsensusObject> Default for PendingMemPool<A> {
    fn default() -> Self {
        Self::new()
    }
}

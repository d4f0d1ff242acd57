use std::collections::HashMap;

use ledger_core::{ConsensusObject, ConsensusStatus, Hash, ProcessingConfig};

use crate::error::StoreError;
use crate::keyed_store::KeyedStore;
use crate::lock_registry::{
    LockRegistry, ACCEPTED_UPDATE, IN_CONSENSUS_UPDATE, MERKLE_POOL_UPDATE, UNKNOWN_UPDATE,
};
use crate::mempool::PendingMemPool;
use crate::merkle_pool::MerklePool;

/// The four-state coordination store (C4): Pending, InConsensus, Accepted
/// and Unknown substores plus the merkle-root index, all behind a single
/// handle. Every mutation of a capacity-bounded substore runs under that
/// substore's named lock from the shared `LockRegistry` (C3); Pending is
/// unlocked since it has no capacity invariant to protect.
pub struct ConsensusLifecycleStore<A: ConsensusObject> {
    pending: PendingMemPool<A>,
    in_consensus: KeyedStore<Hash, A>,
    accepted: KeyedStore<Hash, A>,
    unknown: KeyedStore<Hash, A>,
    merkle_pool: MerklePool,
    locks: LockRegistry,
}

impl<A: ConsensusObject> ConsensusLifecycleStore<A> {
    pub fn new(config: &ProcessingConfig) -> Self {
        let capacity = Some(config.substore_capacity);
        Self {
            pending: PendingMemPool::new(),
            in_consensus: KeyedStore::new(capacity),
            accepted: KeyedStore::new(capacity),
            unknown: KeyedStore::new(capacity),
            merkle_pool: MerklePool::new(),
            locks: LockRegistry::default(),
        }
    }

    /// Inserts into Pending. Always succeeds.
    pub fn put(&self, item: A) {
        self.pending.put(item);
    }

    /// Inserts directly into a given status's substore. `InConsensus` is
    /// rejected: the only entry point into InConsensus is
    /// `pull_for_consensus`.
    pub fn put_with_status(&self, item: A, status: ConsensusStatus) -> Result<(), StoreError> {
        match status {
            ConsensusStatus::Pending => {
                self.pending.put(item);
                Ok(())
            }
            ConsensusStatus::Accepted => {
                let hash = item.hash();
                self.locks.with_lock(ACCEPTED_UPDATE, || self.accepted.put(hash, item));
                Ok(())
            }
            ConsensusStatus::Unknown => {
                let hash = item.hash();
                self.locks.with_lock(UNKNOWN_UPDATE, || self.unknown.put(hash, item));
                Ok(())
            }
            ConsensusStatus::InConsensus => Err(StoreError::UnreachableViaPut(status)),
        }
    }

    /// Applies `f` to the item at `key` within the named status's substore,
    /// inserting `f(empty)` if absent.
    pub fn update_with_status<F>(
        &self,
        key: &Hash,
        f: F,
        empty: A,
        status: ConsensusStatus,
    ) -> A
    where
        F: FnOnce(A) -> A,
    {
        match status {
            ConsensusStatus::Pending => self.pending.update_or_insert(key.clone(), f, empty),
            ConsensusStatus::InConsensus => self
                .locks
                .with_lock(IN_CONSENSUS_UPDATE, || self.in_consensus.update_or_insert(key.clone(), f, empty)),
            ConsensusStatus::Accepted => self
                .locks
                .with_lock(ACCEPTED_UPDATE, || self.accepted.update_or_insert(key.clone(), f, empty)),
            ConsensusStatus::Unknown => self
                .locks
                .with_lock(UNKNOWN_UPDATE, || self.unknown.update_or_insert(key.clone(), f, empty)),
        }
    }

    /// Status-oblivious update: applies `f` to whichever substore currently
    /// holds `key`, trying Pending, then InConsensus, Accepted, Unknown in
    /// that order. A no-op if `key` is absent from all four.
    ///
    /// The membership check and the update are not one atomic step, so a
    /// concurrent `accept`/`clear_in_consensus` moving the item between
    /// substores between the two can make this a no-op even though the key
    /// exists somewhere at call time. Callers that need a stronger guarantee
    /// should use `update_with_status` against a known status instead.
    pub fn update<F>(&self, key: &Hash, f: F) -> Option<A>
    where
        F: FnOnce(A) -> A,
    {
        if self.pending.contains(key) {
            return self.pending.update(key, f);
        }
        if self.in_consensus.contains(key) {
            return self.locks.with_lock(IN_CONSENSUS_UPDATE, || self.in_consensus.update(key, f));
        }
        if self.accepted.contains(key) {
            return self.locks.with_lock(ACCEPTED_UPDATE, || self.accepted.update(key, f));
        }
        if self.unknown.contains(key) {
            return self.locks.with_lock(UNKNOWN_UPDATE, || self.unknown.update(key, f));
        }
        None
    }

    pub fn contains(&self, key: &Hash) -> bool {
        self.pending.contains(key)
            || self.in_consensus.contains(key)
            || self.accepted.contains(key)
            || self.unknown.contains(key)
    }

    pub fn lookup(&self, key: &Hash) -> Option<A> {
        self.accepted
            .lookup(key)
            .or_else(|| self.in_consensus.lookup(key))
            .or_else(|| self.pending.lookup(key))
            .or_else(|| self.unknown.lookup(key))
    }

    pub fn lookup_with_status(&self, key: &Hash, status: ConsensusStatus) -> Option<A> {
        match status {
            ConsensusStatus::Pending => self.pending.lookup(key),
            ConsensusStatus::InConsensus => self.in_consensus.lookup(key),
            ConsensusStatus::Accepted => self.accepted.lookup(key),
            ConsensusStatus::Unknown => self.unknown.lookup(key),
        }
    }

    /// Marks an item Accepted unconditionally: inserts (or overwrites) in
    /// Accepted, then removes it from InConsensus and Unknown. Idempotent —
    /// calling this twice on the same item is safe.
    pub fn accept(&self, item: A) {
        let hash = item.hash();
        self.locks.with_lock(ACCEPTED_UPDATE, || self.accepted.put(hash.clone(), item));
        self.locks.with_lock(IN_CONSENSUS_UPDATE, || self.in_consensus.remove(&hash));
        self.locks.with_lock(UNKNOWN_UPDATE, || self.unknown.remove(&hash));
    }

    /// Pops up to `count` items from Pending, oldest first, and places them
    /// into InConsensus under its lock.
    pub fn pull_for_consensus(&self, count: usize) -> Vec<A> {
        let pulled = self.pending.pull(count);
        for item in &pulled {
            let hash = item.hash();
            let item = item.clone();
            self.locks.with_lock(IN_CONSENSUS_UPDATE, || self.in_consensus.put(hash, item));
        }
        pulled
    }

    /// Moves the named hashes out of InConsensus into Unknown — the
    /// recovery path for a consensus round that failed to finalize.
    pub fn clear_in_consensus(&self, hashes: &[Hash]) {
        for hash in hashes {
            let removed = self.locks.with_lock(IN_CONSENSUS_UPDATE, || self.in_consensus.remove(hash));
            if let Some(item) = removed {
                self.locks.with_lock(UNKNOWN_UPDATE, || self.unknown.put(hash.clone(), item));
            }
        }
    }

    /// Moves the named hashes out of InConsensus back into Pending, for
    /// retry without quarantining through Unknown.
    pub fn return_to_pending(&self, hashes: &[Hash]) {
        for hash in hashes {
            let removed = self.locks.with_lock(IN_CONSENSUS_UPDATE, || self.in_consensus.remove(hash));
            if let Some(item) = removed {
                self.pending.put(item);
            }
        }
    }

    pub fn count(&self) -> usize {
        self.pending.size() + self.in_consensus.size() + self.accepted.size() + self.unknown.size()
    }

    pub fn count_by_status(&self, status: ConsensusStatus) -> usize {
        match status {
            ConsensusStatus::Pending => self.pending.size(),
            ConsensusStatus::InConsensus => self.in_consensus.size(),
            ConsensusStatus::Accepted => self.accepted.size(),
            ConsensusStatus::Unknown => self.unknown.size(),
        }
    }

    /// Per-status counts for monitoring. When `config.legacy_metrics_indexing`
    /// is set, reproduces the original off-by-one lookup into a flat
    /// 4-element `[pending, inConsensus, accepted, unknown]` list: pending
    /// stays at index 0, but inConsensus/accepted/unknown are read from
    /// indices 2/3/4 instead of 1/2/3, so inConsensus silently reports
    /// accepted's count, accepted reports unknown's count, and unknown
    /// (index 4, out of bounds on a 4-element list) always reports zero.
    pub fn get_metrics_map(&self, config: &ProcessingConfig) -> HashMap<String, usize> {
        let counts = [
            self.pending.size(),
            self.in_consensus.size(),
            self.accepted.size(),
            self.unknown.size(),
        ];
        let get = |i: usize| counts.get(i).copied().unwrap_or(0);

        let mut map = HashMap::new();
        if config.legacy_metrics_indexing {
            map.insert("pending".to_string(), get(0));
            map.insert("inConsensus".to_string(), get(2));
            map.insert("accepted".to_string(), get(3));
            map.insert("unknown".to_string(), get(4));
        } else {
            map.insert("pending".to_string(), get(0));
            map.insert("inConsensus".to_string(), get(1));
            map.insert("accepted".to_string(), get(2));
            map.insert("unknown".to_string(), get(3));
        }
        map
    }

    pub fn record_merkle_root(&self, root: Hash, hash: Hash) {
        self.locks.with_lock(MERKLE_POOL_UPDATE, || self.merkle_pool.record(root, hash));
    }

    pub fn find_hashes_by_merkle_root(&self, root: &Hash) -> Vec<Hash> {
        self.merkle_pool.lookup(root)
    }

    pub fn get_last20_accepted(&self) -> Vec<A> {
        self.accepted.get_last_n(20)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq)]
    struct Item(String);

    impl ConsensusObject for Item {
        fn hash(&self) -> Hash {
            self.0.clone()
        }
    }

    fn store() -> ConsensusLifecycleStore<Item> {
        ConsensusLifecycleStore::new(&ProcessingConfig::default())
    }

    #[test]
    fn put_goes_to_pending() {
        let store = store();
        store.put(Item("a".into()));
        assert_eq!(store.count_by_status(ConsensusStatus::Pending), 1);
        assert_eq!(store.lookup_with_status(&"a".to_string(), ConsensusStatus::Pending), Some(Item("a".into())));
    }

    #[test]
    fn put_with_status_in_consensus_is_rejected() {
        let store = store();
        let result = store.put_with_status(Item("a".into()), ConsensusStatus::InConsensus);
        assert_eq!(result, Err(StoreError::UnreachableViaPut(ConsensusStatus::InConsensus)));
    }

    #[test]
    fn pull_for_consensus_moves_items() {
        let store = store();
        store.put(Item("a".into()));
        store.put(Item("b".into()));
        let pulled = store.pull_for_consensus(1);
        assert_eq!(pulled, vec![Item("a".into())]);
        assert_eq!(store.count_by_status(ConsensusStatus::Pending), 1);
        assert_eq!(store.count_by_status(ConsensusStatus::InConsensus), 1);
    }

    #[test]
    fn accept_removes_from_in_consensus_and_unknown() {
        let store = store();
        store.put(Item("a".into()));
        store.pull_for_consensus(1);
        store.accept(Item("a".into()));
        assert_eq!(store.count_by_status(ConsensusStatus::InConsensus), 0);
        assert_eq!(store.count_by_status(ConsensusStatus::Accepted), 1);
    }

    #[test]
    fn accept_is_idempotent() {
        let store = store();
        store.accept(Item("a".into()));
        store.accept(Item("a".into()));
        assert_eq!(store.count_by_status(ConsensusStatus::Accepted), 1);
    }

    #[test]
    fn clear_in_consensus_moves_to_unknown() {
        let store = store();
        store.put(Item("a".into()));
        store.pull_for_consensus(1);
        store.clear_in_consensus(&["a".to_string()]);
        assert_eq!(store.count_by_status(ConsensusStatus::InConsensus), 0);
        assert_eq!(store.count_by_status(ConsensusStatus::Unknown), 1);
    }

    #[test]
    fn return_to_pending_moves_back() {
        let store = store();
        store.put(Item("a".into()));
        store.pull_for_consensus(1);
        store.return_to_pending(&["a".to_string()]);
        assert_eq!(store.count_by_status(ConsensusStatus::InConsensus), 0);
        assert_eq!(store.count_by_status(ConsensusStatus::Pending), 1);
    }

    #[test]
    fn lookup_prefers_accepted_over_pending() {
        let store = store();
        store.put(Item("a".into()));
        store
            .put_with_status(Item("a".into()), ConsensusStatus::Accepted)
            .unwrap();
        assert_eq!(store.lookup(&"a".to_string()), Some(Item("a".into())));
        assert_eq!(store.count(), 2);
    }

    #[test]
    fn corrected_metrics_map_matches_counts() {
        let store = store();
        store.put(Item("a".into()));
        store.put_with_status(Item("b".into()), ConsensusStatus::Accepted).unwrap();
        store.put_with_status(Item("c".into()), ConsensusStatus::Unknown).unwrap();

        let config = ProcessingConfig::default();
        let metrics = store.get_metrics_map(&config);
        assert_eq!(metrics["pending"], 1);
        assert_eq!(metrics["inConsensus"], 0);
        assert_eq!(metrics["accepted"], 1);
        assert_eq!(metrics["unknown"], 1);
    }

    #[test]
    fn legacy_metrics_map_reproduces_the_shifted_bug() {
        let store = store();
        store.put(Item("a".into()));
        store.put_with_status(Item("b".into()), ConsensusStatus::Accepted).unwrap();
        store.put_with_status(Item("c".into()), ConsensusStatus::Unknown).unwrap();

        let mut config = ProcessingConfig::default();
        config.legacy_metrics_indexing = true;
        let metrics = store.get_metrics_map(&config);
        assert_eq!(metrics["pending"], 1);
        assert_eq!(metrics["inConsensus"], 1); // reads accepted's slot
        assert_eq!(metrics["accepted"], 1); // reads unknown's slot
        assert_eq!(metrics["unknown"], 0); // index 4 is out of bounds
    }

    #[test]
    fn status_oblivious_update_finds_item_in_unknown() {
        let store = store();
        store.put_with_status(Item("a".into()), ConsensusStatus::Unknown).unwrap();
        let updated = store.update(&"a".to_string(), |item| Item(item.0 + "!"));
        assert_eq!(updated, Some(Item("a!".into())));
    }

    #[test]
    fn status_oblivious_update_is_noop_when_absent() {
        let store = store();
        assert_eq!(store.update(&"missing".to_string(), |item| item), None);
    }

    #[test]
    fn merkle_root_round_trip() {
        let store = store();
        store.record_merkle_root("root1".into(), "h1".into());
        store.record_merkle_root("root1".into(), "h2".into());
        assert_eq!(
            store.find_hashes_by_merkle_root(&"root1".to_string()),
            vec!["h1".to_string(), "h2".to_string()]
        );
    }

    #[test]
    fn substore_capacity_evicts_oldest_accepted() {
        let mut config = ProcessingConfig::default();
        config.substore_capacity = 2;
        let store: ConsensusLifecycleStore<Item> = ConsensusLifecycleStore::new(&config);
        for i in 0..3 {
            store
                .put_with_status(Item(format!("h{i}")), ConsensusStatus::Accepted)
                .unwrap();
        }
        assert_eq!(store.count_by_status(ConsensusStatus::Accepted), 2);
        assert!(!store.contains(&"h0".to_string()));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Put(usize),
            PullForConsensus(usize),
            Accept(usize),
            ClearInConsensus(usize),
            ReturnToPending(usize),
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![
                (0usize..8).prop_map(Op::Put),
                (0usize..4).prop_map(Op::PullForConsensus),
                (0usize..8).prop_map(Op::Accept),
                (0usize..8).prop_map(Op::ClearInConsensus),
                (0usize..8).prop_map(Op::ReturnToPending),
            ]
        }

        fn apply(store: &ConsensusLifecycleStore<Item>, op: &Op) {
            match op {
                Op::Put(i) => store.put(Item(format!("h{i}"))),
                Op::PullForConsensus(count) => {
                    store.pull_for_consensus(*count);
                }
                Op::Accept(i) => store.accept(Item(format!("h{i}"))),
                Op::ClearInConsensus(i) => store.clear_in_consensus(&[format!("h{i}")]),
                Op::ReturnToPending(i) => store.return_to_pending(&[format!("h{i}")]),
            }
        }

        proptest! {
            // I1: Pending/InConsensus/Accepted never overlap after any
            // sequence of operations — each hash lives in at most one of
            // the three at a time (Unknown is a quarantine side-channel and
            // is allowed to coexist with Accepted per `accept`'s own
            // idempotence requirement, so it's excluded here).
            #[test]
            fn i1_pending_in_consensus_accepted_are_disjoint(ops in prop::collection::vec(op(), 0..40)) {
                let store: ConsensusLifecycleStore<Item> = ConsensusLifecycleStore::new(&ProcessingConfig::default());
                for op in &ops {
                    apply(&store, op);
                }
                for i in 0..8 {
                    let key = format!("h{i}");
                    let in_pending = store.lookup_with_status(&key, ConsensusStatus::Pending).is_some();
                    let in_consensus = store.lookup_with_status(&key, ConsensusStatus::InConsensus).is_some();
                    let accepted = store.lookup_with_status(&key, ConsensusStatus::Accepted).is_some();
                    let membership_count = [in_pending, in_consensus, accepted].iter().filter(|b| **b).count();
                    prop_assert!(membership_count <= 1, "hash {key} present in {membership_count} of pending/in_consensus/accepted");
                }
            }

            // I2: a capacity-bounded substore never exceeds its configured
            // capacity and always evicts the oldest surviving entry first.
            #[test]
            fn i2_accepted_never_exceeds_capacity(count in 0usize..30, capacity in 1usize..10) {
                let mut config = ProcessingConfig::default();
                config.substore_capacity = capacity;
                let store: ConsensusLifecycleStore<Item> = ConsensusLifecycleStore::new(&config);
                for i in 0..count {
                    store.put_with_status(Item(format!("h{i}")), ConsensusStatus::Accepted).unwrap();
                }
                prop_assert!(store.count_by_status(ConsensusStatus::Accepted) <= capacity);
                if count > capacity {
                    prop_assert!(!store.contains(&"h0".to_string()));
                    let newest = format!("h{}", count - 1);
                    prop_assert!(store.contains(&newest));
                }
            }

            // I3: accept is finality — once accepted, a hash is never found
            // in InConsensus or Unknown again, regardless of what ran before.
            #[test]
            fn i3_accept_clears_in_consensus_and_unknown(ops in prop::collection::vec(op(), 0..40), target in 0usize..8) {
                let store: ConsensusLifecycleStore<Item> = ConsensusLifecycleStore::new(&ProcessingConfig::default());
                for op in &ops {
                    apply(&store, op);
                }
                store.accept(Item(format!("h{target}")));
                let key = format!("h{target}");
                prop_assert!(store.lookup_with_status(&key, ConsensusStatus::InConsensus).is_none());
                prop_assert!(store.lookup_with_status(&key, ConsensusStatus::Unknown).is_none());
                prop_assert!(store.lookup_with_status(&key, ConsensusStatus::Accepted).is_some());
            }
        }
    }
}

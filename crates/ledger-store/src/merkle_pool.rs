use std::collections::HashMap;

use ledger_core::Hash;
use parking_lot::RwLock;

/// `merkleRoot -> [hash]` index (C5). Mutation is serialized by the caller
/// under the `merklePoolUpdate` lock; the `RwLock` here only protects the
/// map from concurrent readers while a write is in flight, it does not by
/// itself provide the read-modify-write atomicity the lock registry gives.
#[derive(Default)]
pub struct MerklePool {
    index: RwLock<HashMap<Hash, Vec<Hash>>>,
}

impl MerklePool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, root: Hash, hash: Hash) {
        let mut index = self.index.write();
        let hashes = index.entry(root).or_default();
        if !hashes.contains(&hash) {
            hashes.push(hash);
        }
    }

    pub fn lookup(&self, root: &Hash) -> Vec<Hash> {
        self.index.read().get(root).cloned().unwrap_or_default()
    }

    pub fn remove_hash(&self, root: &Hash, hash: &Hash) {
        let mut index = self.index.write();
        if let Some(hashes) = index.get_mut(root) {
            hashes.retain(|h| h != hash);
            if hashes.is_empty() {
                index.remove(root);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_then_lookup() {
        let pool = MerklePool::new();
        pool.record("root1".into(), "h1".into());
        pool.record("root1".into(), "h2".into());
        assert_eq!(pool.lookup(&"root1".to_string()), vec!["h1".to_string(), "h2".to_string()]);
    }

    #[test]
    fn record_is_idempotent() {
        let pool = MerklePool::new();
        pool.record("root1".into(), "h1".into());
        pool.record("root1".into(), "h1".into());
        assert_eq!(pool.lookup(&"root1".to_string()), vec!["h1".to_string()]);
    }

    #[test]
    fn lookup_of_unknown_root_is_empty() {
        let pool = MerklePool::new();
        assert!(pool.lookup(&"missing".to_string()).is_empty());
    }

    #[test]
    fn remove_hash_drops_empty_root() {
        let pool = MerklePool::new();
        pool.record("root1".into(), "h1".into());
        pool.remove_hash(&"root1".to_string(), &"h1".to_string());
        assert!(pool.lookup(&"root1".to_string()).is_empty());
    }
}

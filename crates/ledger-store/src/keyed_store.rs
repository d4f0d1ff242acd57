use std::collections::{HashMap, VecDeque};
use std::hash::Hash as StdHash;

use parking_lot::RwLock;

/// A thread-safe `key -> value` map with optional FIFO eviction (spec §4.C1).
///
/// Insertion order is tracked independently of the map itself so that
/// `get_last_n` and capacity eviction both have an O(1) view of "oldest
/// entry" without walking the whole map. A `put` of an already-present key
/// updates the value in place and does not move it in the eviction order;
/// only a genuinely new key counts against capacity.
pub struct KeyedStore<K, V> {
    inner: RwLock<Inner<K, V>>,
    capacity: Option<usize>,
}

struct Inner<K, V> {
    order: VecDeque<K>,
    map: HashMap<K, V>,
}

impl<K, V> KeyedStore<K, V>
where
    K: Eq + StdHash + Clone,
    V: Clone,
{
    /// `capacity = None` means unbounded (used by the pending mempool, C2).
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            inner: RwLock::new(Inner { order: VecDeque::new(), map: HashMap::new() }),
            capacity,
        }
    }

    pub fn put(&self, key: K, value: V) {
        let mut inner = self.inner.write();
        if inner.map.insert(key.clone(), value).is_none() {
            inner.order.push_back(key);
            Self::evict_if_over_capacity(&mut inner, self.capacity);
        }
    }

    fn evict_if_over_capacity(inner: &mut Inner<K, V>, capacity: Option<usize>) {
        let Some(capacity) = capacity else { return };
        while inner.order.len() > capacity {
            if let Some(oldest) = inner.order.pop_front() {
                inner.map.remove(&oldest);
            }
        }
    }

    pub fn lookup(&self, key: &K) -> Option<V> {
        self.inner.read().map.get(key).cloned()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.inner.read().map.contains_key(key)
    }

    /// Applies `f` to the existing value at `key`, if present. Returns the
    /// updated value, or `None` if the key was absent (no-op).
    pub fn update<F>(&self, key: &K, f: F) -> Option<V>
    where
        F: FnOnce(V) -> V,
    {
        let mut inner = self.inner.write();
        let existing = inner.map.get(key).cloned()?;
        let updated = f(existing);
        inner.map.insert(key.clone(), updated.clone());
        Some(updated)
    }

    /// Applies `f` to the existing value at `key`, or inserts `f(empty)` if
    /// the key is absent. Always returns the resulting value.
    pub fn update_or_insert<F>(&self, key: K, f: F, empty: V) -> V
    where
        F: FnOnce(V) -> V,
    {
        let mut inner = self.inner.write();
        let base = inner.map.get(&key).cloned().unwrap_or(empty);
        let updated = f(base);
        if inner.map.insert(key.clone(), updated.clone()).is_none() {
            inner.order.push_back(key);
            Self::evict_if_over_capacity(&mut inner, self.capacity);
        }
        updated
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        let mut inner = self.inner.write();
        let removed = inner.map.remove(key);
        if removed.is_some() {
            inner.order.retain(|k| k != key);
        }
        removed
    }

    pub fn size(&self) -> usize {
        self.inner.read().map.len()
    }

    /// The `n` most recently inserted values still present, newest first.
    pub fn get_last_n(&self, n: usize) -> Vec<V> {
        let inner = self.inner.read();
        inner
            .order
            .iter()
            .rev()
            .take(n)
            .filter_map(|k| inner.map.get(k).cloned())
            .collect()
    }
}

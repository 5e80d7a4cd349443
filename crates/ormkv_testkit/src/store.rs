//! In-memory sorted key/value store.

use std::collections::BTreeMap;
use std::ops::Bound;

use ormkv_encoding::prefix_end_bytes;
use parking_lot::RwLock;

/// A sorted, byte-ordered key/value store held in memory.
///
/// Provides the `get`/`put`/`delete`/`iterate` primitives the codecs are
/// designed against.
///
/// # Thread Safety
///
/// This store is thread-safe and can be shared across threads.
///
/// # Example
///
/// ```rust
/// use ormkv_testkit::MemoryStore;
///
/// let store = MemoryStore::new();
/// store.put(b"b".to_vec(), b"2".to_vec());
/// store.put(b"a".to_vec(), b"1".to_vec());
/// let keys: Vec<_> = store.iterate(b"", None).into_iter().map(|(k, _)| k).collect();
/// assert_eq!(keys, vec![b"a".to_vec(), b"b".to_vec()]);
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the value stored under `key`.
    pub fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.data.read().get(key).cloned()
    }

    /// Returns true if `key` is present.
    pub fn contains(&self, key: &[u8]) -> bool {
        self.data.read().contains_key(key)
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn put(&self, key: Vec<u8>, value: Vec<u8>) {
        self.data.write().insert(key, value);
    }

    /// Removes `key`, returning true if it was present.
    pub fn delete(&self, key: &[u8]) -> bool {
        self.data.write().remove(key).is_some()
    }

    /// Pairs with `start <= key < end` in ascending key order.
    ///
    /// `end = None` scans to the end of the store. The result is a snapshot
    /// taken under one read lock.
    pub fn iterate(&self, start: &[u8], end: Option<&[u8]>) -> Vec<(Vec<u8>, Vec<u8>)> {
        if end.is_some_and(|end| end < start) {
            return Vec::new();
        }
        let upper = end.map_or(Bound::Unbounded, Bound::Excluded);
        self.data
            .read()
            .range::<[u8], _>((Bound::Included(start), upper))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Pairs whose key starts with `prefix`, in ascending key order.
    pub fn scan_prefix(&self, prefix: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)> {
        let end = prefix_end_bytes(prefix);
        self.iterate(prefix, end.as_deref())
    }

    /// Number of stored pairs.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Returns true if the store holds no pairs.
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Removes every pair.
    pub fn clear(&self) {
        self.data.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MemoryStore {
        let store = MemoryStore::new();
        for key in [&b"a"[..], b"ab", b"abc", b"b", b"\xff", b"\xff\xff"] {
            store.put(key.to_vec(), key.to_vec());
        }
        store
    }

    fn keys(pairs: Vec<(Vec<u8>, Vec<u8>)>) -> Vec<Vec<u8>> {
        pairs.into_iter().map(|(k, _)| k).collect()
    }

    #[test]
    fn get_put_delete() {
        let store = MemoryStore::new();
        assert!(store.is_empty());
        store.put(b"k".to_vec(), b"v1".to_vec());
        store.put(b"k".to_vec(), b"v2".to_vec());
        assert_eq!(store.get(b"k"), Some(b"v2".to_vec()));
        assert_eq!(store.len(), 1);
        assert!(store.delete(b"k"));
        assert!(!store.delete(b"k"));
        assert_eq!(store.get(b"k"), None);
    }

    #[test]
    fn iterate_is_half_open() {
        let store = store();
        assert_eq!(
            keys(store.iterate(b"ab", Some(&b"b"[..]))),
            vec![b"ab".to_vec(), b"abc".to_vec()]
        );
        assert_eq!(keys(store.iterate(b"b", None)).len(), 3);
        assert!(store.iterate(b"b", Some(&b"a"[..])).is_empty());
    }

    #[test]
    fn scan_prefix_includes_all_extensions() {
        let store = store();
        assert_eq!(
            keys(store.scan_prefix(b"a")),
            vec![b"a".to_vec(), b"ab".to_vec(), b"abc".to_vec()]
        );
        assert_eq!(
            keys(store.scan_prefix(b"\xff")),
            vec![b"\xff".to_vec(), b"\xff\xff".to_vec()]
        );
        assert_eq!(keys(store.scan_prefix(b"")).len(), 6);
    }
}

//! Chained hash registry keyed by caller handles.
//!
//! [`HandleMap`] maps opaque [`Handle`]s to small `Copy` values (arena indices
//! in practice). Buckets are chains; when the number of entries exceeds three
//! times the bucket count the table grows to the next size of a fixed prime
//! table and every entry is rehashed. Values never move in memory beyond the
//! chain vectors themselves, so indices stored elsewhere stay valid.

use super::index::Handle;

/// Bucket counts the table steps through as it grows.
const BUCKET_SIZES: [usize; 29] = [
    1, 3, 5, 11, 17, 37, 67, 131, 257, 521, 1031, 2053, 4099, 8209, 16411, 32771, 65537, 131101,
    262147, 524309, 1048583, 2097169, 4194319, 8388617, 16777259, 33554467, 67108879, 134217757,
    268435459,
];

/// Entries per bucket that trigger a resize.
const MAX_LOAD: usize = 3;

/// A registry from handles to values.
#[derive(Debug, Clone)]
pub struct HandleMap<K, V> {
    buckets: Vec<Vec<(K, V)>>,
    size_index: usize,
    len: usize,
}

impl<K: Handle, V: Copy> Default for HandleMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Handle, V: Copy> HandleMap<K, V> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create a registry sized for roughly `estimate` entries.
    pub fn with_capacity(estimate: usize) -> Self {
        let size_index = BUCKET_SIZES
            .iter()
            .position(|&n| n * MAX_LOAD >= estimate)
            .unwrap_or(BUCKET_SIZES.len() - 1);
        Self {
            buckets: vec![Vec::new(); BUCKET_SIZES[size_index]],
            size_index,
            len: 0,
        }
    }

    /// Number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the registry is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current number of buckets.
    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    #[inline]
    fn bucket_of(&self, key: &K) -> usize {
        (key.key() % self.buckets.len() as u64) as usize
    }

    /// Look up the value registered for `key`.
    pub fn get(&self, key: &K) -> Option<V> {
        self.buckets[self.bucket_of(key)]
            .iter()
            .find(|(k, _)| k == key)
            .map(|&(_, v)| v)
    }

    /// Whether `key` is registered.
    #[inline]
    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Register `value` under `key`, returning the value it replaces.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let b = self.bucket_of(&key);
        if let Some(slot) = self.buckets[b].iter_mut().find(|(k, _)| *k == key) {
            return Some(std::mem::replace(&mut slot.1, value));
        }

        self.buckets[b].push((key, value));
        self.len += 1;

        if self.len > self.buckets.len() * MAX_LOAD && self.size_index + 1 < BUCKET_SIZES.len() {
            self.grow();
        }
        None
    }

    fn grow(&mut self) {
        self.size_index += 1;
        let mut buckets = vec![Vec::new(); BUCKET_SIZES[self.size_index]];
        for (key, value) in self.buckets.drain(..).flatten() {
            let b = (key.key() % buckets.len() as u64) as usize;
            buckets[b].push((key, value));
        }
        self.buckets = buckets;
    }

    /// Look up `key` and return a token that can remove the entry.
    pub fn entry(&mut self, key: &K) -> Option<Entry<'_, K, V>> {
        let bucket = self.bucket_of(key);
        let pos = self.buckets[bucket].iter().position(|(k, _)| k == key)?;
        Some(Entry {
            map: self,
            bucket,
            pos,
        })
    }

    /// Remove `key`, returning its value.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.entry(key).map(Entry::remove)
    }

    /// Iterate over all `(handle, value)` pairs in bucket order.
    pub fn iter(&self) -> impl Iterator<Item = (K, V)> + '_ {
        self.buckets.iter().flatten().copied()
    }

    /// Iterate over all values.
    pub fn values(&self) -> impl Iterator<Item = V> + '_ {
        self.iter().map(|(_, v)| v)
    }

    /// Remove every entry, returning them. The bucket table keeps its size.
    pub fn take_all(&mut self) -> Vec<(K, V)> {
        let mut out = Vec::with_capacity(self.len);
        for bucket in &mut self.buckets {
            out.append(bucket);
        }
        self.len = 0;
        out
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
        self.len = 0;
    }
}

/// A located registry entry that can be inspected or removed.
pub struct Entry<'a, K, V> {
    map: &'a mut HandleMap<K, V>,
    bucket: usize,
    pos: usize,
}

impl<K: Handle, V: Copy> Entry<'_, K, V> {
    /// The handle of this entry.
    pub fn key(&self) -> K {
        self.map.buckets[self.bucket][self.pos].0
    }

    /// The value of this entry.
    pub fn get(&self) -> V {
        self.map.buckets[self.bucket][self.pos].1
    }

    /// Remove the entry from the registry, returning its value.
    pub fn remove(self) -> V {
        let (_, value) = self.map.buckets[self.bucket].swap_remove(self.pos);
        self.map.len -= 1;
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_lookup() {
        let mut map: HandleMap<u32, usize> = HandleMap::new();
        assert!(map.is_empty());

        assert_eq!(map.insert(10, 1), None);
        assert_eq!(map.insert(20, 2), None);
        assert_eq!(map.get(&10), Some(1));
        assert_eq!(map.get(&20), Some(2));
        assert_eq!(map.get(&30), None);
        assert_eq!(map.len(), 2);

        assert_eq!(map.insert(10, 5), Some(1));
        assert_eq!(map.get(&10), Some(5));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_growth_keeps_entries() {
        let mut map: HandleMap<u64, u64> = HandleMap::new();
        assert_eq!(map.bucket_count(), 1);

        for i in 0..10_000u64 {
            map.insert(i * 7, i);
        }

        assert_eq!(map.len(), 10_000);
        assert!(map.bucket_count() * MAX_LOAD >= map.len());
        assert!(BUCKET_SIZES.contains(&map.bucket_count()));
        for i in 0..10_000u64 {
            assert_eq!(map.get(&(i * 7)), Some(i));
        }
    }

    #[test]
    fn test_growth_steps_through_primes() {
        let mut map: HandleMap<u32, u32> = HandleMap::new();
        for i in 0..4 {
            map.insert(i, i);
        }
        // 4 entries > 3 * 1 bucket
        assert_eq!(map.bucket_count(), 3);
        for i in 4..10 {
            map.insert(i, i);
        }
        assert_eq!(map.bucket_count(), 5);
    }

    #[test]
    fn test_entry_remove() {
        let mut map: HandleMap<u32, u32> = HandleMap::new();
        for i in 0..20 {
            map.insert(i, i * 2);
        }

        let entry = map.entry(&7).unwrap();
        assert_eq!(entry.key(), 7);
        assert_eq!(entry.get(), 14);
        assert_eq!(entry.remove(), 14);

        assert_eq!(map.get(&7), None);
        assert_eq!(map.len(), 19);
        assert!(map.entry(&7).is_none());
        assert_eq!(map.remove(&8), Some(16));
        assert_eq!(map.remove(&8), None);
    }

    #[test]
    fn test_iter_and_take_all() {
        let mut map: HandleMap<i32, i32> = HandleMap::with_capacity(100);
        for i in -5..5 {
            map.insert(i, i);
        }

        let mut keys: Vec<i32> = map.iter().map(|(k, _)| k).collect();
        keys.sort_unstable();
        assert_eq!(keys, (-5..5).collect::<Vec<_>>());
        assert_eq!(map.values().sum::<i32>(), -5);

        let buckets = map.bucket_count();
        let all = map.take_all();
        assert_eq!(all.len(), 10);
        assert!(map.is_empty());
        assert_eq!(map.bucket_count(), buckets);
        assert_eq!(map.iter().count(), 0);
    }
}

use crate::bucket::{Bucket, WriteBucket};
use crate::config::{resolve, Config, MapOption};
use crate::error::Error;
use crate::hash::{bytes_hash_fn, integer_hash_fn, HashFn, HashFunction, IntegerKey};
use crate::iter::SnapshotIter;
use crate::stats::Stats;
use std::hash::Hash;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Concurrent map sharded across independently locked buckets.
///
/// Every keyed operation locks exactly one bucket, chosen by
/// `hash_fn(key) & (bucket_count - 1)`. Operations that span the whole map
/// (`clear`, `range`, `iter_snapshot`) lock every bucket in ascending index
/// order. The element count lives in an atomic counter, so `len` and
/// `is_empty` never take a lock.
///
/// # Example
///
/// ```rust
/// use safemap::SafeMap;
///
/// let map = SafeMap::with_string_keys();
/// map.set("a", 1);
/// map.set("b", 2);
/// map.set("a", 3);
///
/// assert_eq!(map.len(), 2);
/// assert_eq!(map.get(&"a"), Some(3));
/// ```
pub struct SafeMap<K, V> {
    buckets: Box<[Bucket<K, V>]>,
    bucket_mask: usize,
    len: AtomicUsize,
    hash_fn: HashFn<K>,
}

impl<K, V> SafeMap<K, V>
where
    K: Hash + Eq,
{
    /// Create a map with defaults (32 buckets, ahash).
    pub fn new() -> Self
    where
        K: 'static,
    {
        Self::with_hash_function(HashFunction::default())
    }

    /// Create a map from a sequence of options, applied in order.
    ///
    /// Fails with [`Error::MissingHashFunction`] if none of the options
    /// supplies a hash function.
    pub fn with_options<I>(options: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = MapOption<K>>,
    {
        Ok(Self::with_config(resolve(options)?))
    }

    /// Create a map with default settings and a caller-supplied digest function.
    pub fn with_hash_fn<F>(f: F) -> Self
    where
        F: Fn(&K) -> u64 + Send + Sync + 'static,
    {
        Self::with_config(Config::with_hash_fn(Arc::new(f)))
    }

    /// Create a map with default settings and a built-in [`Hash`]-based hasher.
    pub fn with_hash_function(hash_fn: HashFunction) -> Self
    where
        K: 'static,
    {
        Self::with_config(Config::with_hash_fn(hash_fn.into_hash_fn()))
    }

    /// Create a map for byte-like keys, routed with XXH64.
    pub fn with_string_keys() -> Self
    where
        K: AsRef<[u8]> + 'static,
    {
        Self::with_config(Config::with_hash_fn(bytes_hash_fn()))
    }

    /// Create a map for primitive integer keys, routed by magnitude.
    pub fn with_integer_keys() -> Self
    where
        K: IntegerKey + 'static,
    {
        Self::with_config(Config::with_hash_fn(integer_hash_fn()))
    }

    /// Create a map from a resolved configuration.
    pub fn with_config(config: Config<K>) -> Self {
        let bucket_count = config.bucket_count;
        let buckets: Box<[Bucket<K, V>]> = (0..bucket_count)
            .map(|_| Bucket::new(config.capacity_per_bucket))
            .collect();

        tracing::debug!(
            bucket_count,
            capacity_per_bucket = ?config.capacity_per_bucket,
            "created safemap"
        );

        Self {
            buckets,
            bucket_mask: bucket_count - 1,
            len: AtomicUsize::new(0),
            hash_fn: config.hash_fn,
        }
    }

    /// Index of the bucket that owns `key`.
    #[inline]
    pub fn bucket_of(&self, key: &K) -> usize {
        ((self.hash_fn)(key) as usize) & self.bucket_mask
    }

    #[inline]
    fn bucket(&self, key: &K) -> &Bucket<K, V> {
        &self.buckets[self.bucket_of(key)]
    }

    /// Exclusive locks on every bucket, taken in ascending index order.
    fn lock_all(&self) -> Vec<WriteBucket<'_, K, V>> {
        self.buckets.iter().map(|bucket| bucket.write()).collect()
    }

    /// Number of buckets.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Get a copy of the value for `key`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use safemap::SafeMap;
    ///
    /// let map = SafeMap::with_string_keys();
    /// map.set("key", 7);
    /// assert_eq!(map.get(&"key"), Some(7));
    /// assert_eq!(map.get(&"missing"), None);
    /// ```
    pub fn get(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        self.bucket(key).read().read(key).cloned()
    }

    /// Run `f` on the value for `key` under the bucket's shared lock.
    ///
    /// `f` must not call back into this map for a key in the same bucket with
    /// a mutating operation, or it will deadlock.
    pub fn get_with<R, F>(&self, key: &K, f: F) -> Option<R>
    where
        F: FnOnce(&V) -> R,
    {
        self.bucket(key).read().read(key).map(f)
    }

    /// Check whether `key` is present.
    pub fn contains_key(&self, key: &K) -> bool {
        self.bucket(key).read().contains(key)
    }

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// Replacing an existing key leaves `len` unchanged.
    pub fn set(&self, key: K, value: V) {
        self.swap(key, value);
    }

    /// Store `value` under `key` and return the previous value, if any.
    pub fn swap(&self, key: K, value: V) -> Option<V> {
        let mut bucket = self.bucket(&key).write();
        let previous = bucket.write(key, value);
        if previous.is_none() {
            self.len.fetch_add(1, Ordering::AcqRel);
        }
        previous
    }

    /// Remove `key`. Removing an absent key is a no-op.
    pub fn delete(&self, key: &K) {
        self.get_and_delete(key);
    }

    /// Remove `key` and return its value, if it was present.
    ///
    /// The lookup and the removal happen under one exclusive lock.
    ///
    /// # Example
    ///
    /// ```rust
    /// use safemap::SafeMap;
    ///
    /// let map = SafeMap::with_string_keys();
    /// map.set("key", 1);
    /// assert_eq!(map.get_and_delete(&"key"), Some(1));
    /// assert_eq!(map.get_and_delete(&"key"), None);
    /// assert!(map.is_empty());
    /// ```
    pub fn get_and_delete(&self, key: &K) -> Option<V> {
        let mut bucket = self.bucket(key).write();
        let removed = bucket.remove(key);
        if removed.is_some() {
            self.len.fetch_sub(1, Ordering::AcqRel);
        }
        removed
    }

    /// Return the existing value for `key`, or store and return `value`.
    ///
    /// The boolean is `true` when the value was already present (loaded) and
    /// `false` when `value` was just stored. Check and store happen under one
    /// exclusive lock, so concurrent callers on the same key agree on a single
    /// winner.
    ///
    /// # Example
    ///
    /// ```rust
    /// use safemap::SafeMap;
    ///
    /// let map = SafeMap::with_string_keys();
    /// assert_eq!(map.get_or_set("x", 10), (10, false));
    /// assert_eq!(map.get_or_set("x", 20), (10, true));
    /// ```
    pub fn get_or_set(&self, key: K, value: V) -> (V, bool)
    where
        V: Clone,
    {
        let mut bucket = self.bucket(&key).write();
        let (resident, loaded) = bucket.read_or_write(key, value);
        let resident = resident.clone();
        if !loaded {
            self.len.fetch_add(1, Ordering::AcqRel);
        }
        (resident, loaded)
    }

    /// Replace the value for `key` with `new` if it is currently equal to `old`.
    ///
    /// Returns `false` if the key is absent or holds a different value.
    pub fn compare_and_swap(&self, key: &K, old: &V, new: V) -> bool
    where
        V: PartialEq,
    {
        let mut bucket = self.bucket(key).write();
        match bucket.read_mut(key) {
            Some(current) if *current == *old => {
                *current = new;
                bucket.record_write();
                true
            }
            _ => false,
        }
    }

    /// Remove `key` if its value is currently equal to `old`.
    pub fn compare_and_delete(&self, key: &K, old: &V) -> bool
    where
        V: PartialEq,
    {
        let mut bucket = self.bucket(key).write();
        if bucket.read(key) != Some(old) {
            return false;
        }
        bucket.remove(key);
        self.len.fetch_sub(1, Ordering::AcqRel);
        true
    }

    /// Remove every entry.
    ///
    /// All bucket locks are held while the tables are emptied and the counter
    /// is reset, so no observer sees `len() == 0` while entries remain.
    pub fn clear(&self) {
        let mut buckets = self.lock_all();
        let dropped: usize = buckets.iter_mut().map(|bucket| bucket.clear()).sum();
        self.len.store(0, Ordering::Release);
        drop(buckets);

        tracing::trace!(dropped, "cleared safemap");
    }

    /// Number of entries, read from the atomic counter without locking.
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    /// Check if the map is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Call `f` for each entry until it returns `false`.
    ///
    /// Every bucket is locked exclusively for the whole walk, so no other
    /// operation on this map makes progress until `range` returns. Entries are
    /// visited bucket by bucket; order within a bucket is unspecified. `f` must
    /// not call back into this map, apart from the lock-free `len` and
    /// `is_empty`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use safemap::SafeMap;
    ///
    /// let map = SafeMap::with_integer_keys();
    /// for i in 0..10u32 {
    ///     map.set(i, i * 2);
    /// }
    ///
    /// let mut sum = 0;
    /// map.range(|_, v| {
    ///     sum += *v;
    ///     true
    /// });
    /// assert_eq!(sum, 90);
    /// ```
    pub fn range<F>(&self, mut f: F)
    where
        F: FnMut(&K, &V) -> bool,
    {
        let buckets = self.lock_all();
        for bucket in &buckets {
            for (key, value) in bucket.iter() {
                if !f(key, value) {
                    return;
                }
            }
        }
    }

    /// Copy every entry into an owned iterator.
    ///
    /// The copy is taken under the same locking as [`range`](Self::range), so
    /// it is a consistent view of the map at one instant.
    pub fn iter_snapshot(&self) -> SnapshotIter<K, V>
    where
        K: Clone,
        V: Clone,
    {
        let mut entries = Vec::with_capacity(self.len());
        self.range(|key, value| {
            entries.push((key.clone(), value.clone()));
            true
        });
        SnapshotIter::new(entries)
    }

    /// Entry count of each bucket, sampled one bucket at a time.
    pub fn bucket_loads(&self) -> Vec<usize> {
        self.buckets.iter().map(|bucket| bucket.len()).collect()
    }

    /// Get statistics about the map and its buckets.
    pub fn stats(&self) -> Stats {
        Stats {
            len: self.len(),
            bucket_lens: self.bucket_loads(),
            operations: self.buckets.iter().map(|bucket| bucket.stats()).collect(),
        }
    }
}

impl<K, V> Default for SafeMap<K, V>
where
    K: Hash + Eq + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> std::fmt::Debug for SafeMap<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SafeMap")
            .field("bucket_count", &self.buckets.len())
            .field("len", &self.len.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SafeMapBuilder;

    #[test]
    fn test_routing_uses_mask() {
        let map: SafeMap<u64, ()> = SafeMapBuilder::new()
            .bucket_bits(3)
            .hash_fn(|k: &u64| *k)
            .build()
            .unwrap();

        assert_eq!(map.bucket_count(), 8);
        assert_eq!(map.bucket_of(&0), 0);
        assert_eq!(map.bucket_of(&7), 7);
        assert_eq!(map.bucket_of(&8), 0);
        assert_eq!(map.bucket_of(&13), 5);
    }

    #[test]
    fn test_single_bucket() {
        let map: SafeMap<u64, u64> = SafeMapBuilder::new()
            .bucket_bits(0)
            .hash_fn(|k: &u64| *k)
            .build()
            .unwrap();

        for i in 0..100 {
            map.set(i, i);
            assert_eq!(map.bucket_of(&i), 0);
        }
        assert_eq!(map.len(), 100);
        assert_eq!(map.bucket_loads(), vec![100]);
    }

    #[test]
    fn test_integer_keys_fold_sign() {
        let map: SafeMap<i64, &str> = SafeMap::with_integer_keys();
        assert_eq!(map.bucket_of(&-9), map.bucket_of(&9));

        map.set(-9, "neg");
        map.set(9, "pos");
        assert_eq!(map.len(), 2);
        assert_eq!(map.get(&-9), Some("neg"));
        assert_eq!(map.get(&9), Some("pos"));
    }

    #[test]
    fn test_counter_matches_buckets() {
        let map: SafeMap<String, usize> = SafeMap::with_string_keys();
        for i in 0..500 {
            map.set(format!("k{}", i), i);
        }
        for i in (0..500).step_by(3) {
            map.delete(&format!("k{}", i));
        }
        let stats = map.stats();
        assert_eq!(stats.len, stats.bucket_lens.iter().sum::<usize>());
        assert_eq!(stats.len, map.len());
    }

    #[test]
    fn test_range_stops_early() {
        let map: SafeMap<u32, u32> = SafeMap::with_integer_keys();
        for i in 0..50 {
            map.set(i, i);
        }

        let mut visited = 0;
        map.range(|_, _| {
            visited += 1;
            visited < 5
        });
        assert_eq!(visited, 5);
    }

    #[test]
    fn test_debug_output() {
        let map: SafeMap<u32, u32> = SafeMap::with_integer_keys();
        map.set(1, 1);
        let out = format!("{:?}", map);
        assert!(out.contains("bucket_count: 32"));
        assert!(out.contains("len: 1"));
    }
}

use crate::stats::{BucketEvent, BucketOps, BucketStats};
use hashbrown::hash_map::Entry;
use hashbrown::HashMap;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::hash::Hash;

/// One independently locked partition of the key space.
///
/// The table is only reachable through [`ReadBucket`] and [`WriteBucket`], so
/// every primitive runs with the lock mode it needs already held.
pub(crate) struct Bucket<K, V> {
    table: RwLock<HashMap<K, V>>,
    stats: BucketStats,
}

impl<K, V> Bucket<K, V>
where
    K: Hash + Eq,
{
    pub fn new(capacity: Option<usize>) -> Self {
        let table = match capacity {
            Some(cap) => HashMap::with_capacity(cap),
            None => HashMap::new(),
        };
        Self {
            table: RwLock::new(table),
            stats: BucketStats::new(),
        }
    }

    /// Acquire the shared lock.
    pub fn read(&self) -> ReadBucket<'_, K, V> {
        let table = self.table.read();
        self.stats.record(BucketEvent::Lock);
        ReadBucket {
            table,
            stats: &self.stats,
        }
    }

    /// Acquire the exclusive lock.
    pub fn write(&self) -> WriteBucket<'_, K, V> {
        let table = self.table.write();
        self.stats.record(BucketEvent::Lock);
        WriteBucket {
            table,
            stats: &self.stats,
        }
    }

    /// Number of entries, sampled under the shared lock.
    pub fn len(&self) -> usize {
        self.table.read().len()
    }

    pub fn stats(&self) -> BucketOps {
        self.stats.snapshot()
    }
}

/// A bucket held under its shared lock.
pub(crate) struct ReadBucket<'a, K, V> {
    table: RwLockReadGuard<'a, HashMap<K, V>>,
    stats: &'a BucketStats,
}

impl<K, V> ReadBucket<'_, K, V>
where
    K: Hash + Eq,
{
    pub fn read(&self, key: &K) -> Option<&V> {
        let value = self.table.get(key);
        if value.is_some() {
            self.stats.record(BucketEvent::Read);
        }
        value
    }

    pub fn contains(&self, key: &K) -> bool {
        self.table.contains_key(key)
    }
}

/// A bucket held under its exclusive lock.
pub(crate) struct WriteBucket<'a, K, V> {
    table: RwLockWriteGuard<'a, HashMap<K, V>>,
    stats: &'a BucketStats,
}

impl<K, V> WriteBucket<'_, K, V>
where
    K: Hash + Eq,
{
    pub fn read(&self, key: &K) -> Option<&V> {
        let value = self.table.get(key);
        if value.is_some() {
            self.stats.record(BucketEvent::Read);
        }
        value
    }

    /// Store unconditionally, returning the replaced value.
    pub fn write(&mut self, key: K, value: V) -> Option<V> {
        self.stats.record(BucketEvent::Write);
        self.table.insert(key, value)
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        let value = self.table.remove(key);
        if value.is_some() {
            self.stats.record(BucketEvent::Remove);
        }
        value
    }

    /// Load the value for `key`, or store `value` if absent.
    ///
    /// Returns the resident value and whether it was already there.
    pub fn read_or_write(&mut self, key: K, value: V) -> (&V, bool) {
        match self.table.entry(key) {
            Entry::Occupied(entry) => {
                self.stats.record(BucketEvent::Read);
                (&*entry.into_mut(), true)
            }
            Entry::Vacant(entry) => {
                self.stats.record(BucketEvent::Write);
                (&*entry.insert(value), false)
            }
        }
    }

    /// Mutable access to an existing value.
    pub fn read_mut(&mut self, key: &K) -> Option<&mut V> {
        self.table.get_mut(key)
    }

    pub fn record_write(&self) {
        self.stats.record(BucketEvent::Write);
    }

    pub fn iter(&self) -> hashbrown::hash_map::Iter<'_, K, V> {
        self.table.iter()
    }

    /// Remove every entry, returning how many were dropped.
    pub fn clear(&mut self) -> usize {
        let dropped = self.table.len();
        self.table.clear();
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_read_remove() {
        let bucket: Bucket<&str, i32> = Bucket::new(None);

        {
            let mut guard = bucket.write();
            assert_eq!(guard.write("a", 1), None);
            assert_eq!(guard.write("a", 2), Some(1));
            assert_eq!(guard.read(&"a"), Some(&2));
        }

        assert_eq!(bucket.read().read(&"a"), Some(&2));
        assert!(bucket.read().contains(&"a"));
        assert_eq!(bucket.len(), 1);

        let mut guard = bucket.write();
        assert_eq!(guard.remove(&"a"), Some(2));
        assert_eq!(guard.remove(&"a"), None);
    }

    #[test]
    fn test_read_or_write() {
        let bucket: Bucket<&str, i32> = Bucket::new(Some(8));
        let mut guard = bucket.write();

        assert_eq!(guard.read_or_write("x", 10), (&10, false));
        assert_eq!(guard.read_or_write("x", 20), (&10, true));
    }

    #[test]
    fn test_clear_reports_dropped() {
        let bucket: Bucket<u32, u32> = Bucket::new(None);
        let mut guard = bucket.write();
        for i in 0..5 {
            guard.write(i, i);
        }
        assert_eq!(guard.iter().count(), 5);
        assert_eq!(guard.clear(), 5);
        assert_eq!(guard.iter().count(), 0);
    }
}

/// Owned iterator over a copy of the map's entries.
///
/// The entries are copied while every bucket is locked, so the iterator sees
/// one consistent state of the map and nothing written afterwards. Iterating
/// holds no locks.
pub struct SnapshotIter<K, V> {
    entries: std::vec::IntoIter<(K, V)>,
}

impl<K, V> SnapshotIter<K, V> {
    pub(crate) fn new(entries: Vec<(K, V)>) -> Self {
        Self {
            entries: entries.into_iter(),
        }
    }
}

impl<K, V> Iterator for SnapshotIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.entries.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}

impl<K, V> ExactSizeIterator for SnapshotIter<K, V> {}

//! Statistics types.

#[cfg(feature = "metrics")]
use std::sync::atomic::{AtomicU64, Ordering};

/// Per-bucket operation counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BucketOps {
    /// Lookups that found their key.
    pub reads: u64,
    /// Writes that inserted or replaced an entry.
    pub writes: u64,
    /// Removals that removed an entry.
    pub removes: u64,
    /// Lock acquisitions, shared or exclusive, including whole-map operations.
    pub lock_acquisitions: u64,
}

/// Kind of event a bucket counts.
#[derive(Debug, Clone, Copy)]
pub(crate) enum BucketEvent {
    Read = 0,
    Write = 1,
    Remove = 2,
    Lock = 3,
}

/// Per-bucket event counters. Zero-sized unless the `metrics` feature is on.
pub(crate) struct BucketStats {
    #[cfg(feature = "metrics")]
    counters: [AtomicU64; 4],
}

impl BucketStats {
    pub fn new() -> Self {
        Self {
            #[cfg(feature = "metrics")]
            counters: Default::default(),
        }
    }

    #[inline]
    pub fn record(&self, event: BucketEvent) {
        #[cfg(feature = "metrics")]
        self.counters[event as usize].fetch_add(1, Ordering::Relaxed);
        #[cfg(not(feature = "metrics"))]
        let _ = event;
    }

    #[cfg(feature = "metrics")]
    fn count(&self, event: BucketEvent) -> u64 {
        self.counters[event as usize].load(Ordering::Relaxed)
    }

    #[cfg(not(feature = "metrics"))]
    fn count(&self, _event: BucketEvent) -> u64 {
        0
    }

    pub fn snapshot(&self) -> BucketOps {
        BucketOps {
            reads: self.count(BucketEvent::Read),
            writes: self.count(BucketEvent::Write),
            removes: self.count(BucketEvent::Remove),
            lock_acquisitions: self.count(BucketEvent::Lock),
        }
    }
}

/// Aggregate statistics for a SafeMap instance.
///
/// Bucket sizes are sampled one bucket at a time, so under concurrent writes
/// `bucket_lens` may not sum to `len`.
#[derive(Debug, Clone)]
pub struct Stats {
    /// Value of the map's element counter.
    pub len: usize,
    /// Number of entries in each bucket, in bucket order.
    pub bucket_lens: Vec<usize>,
    /// Operation counts for each bucket (zeroed without the `metrics` feature).
    pub operations: Vec<BucketOps>,
}

use crate::error::Error;
use crate::hash::{bytes_hash_fn, integer_hash_fn, HashFn, HashFunction, IntegerKey};
use std::hash::Hash;
use std::sync::Arc;

/// Default bucket bits: `1 << 5` = 32 buckets.
pub const DEFAULT_BUCKET_BITS: u8 = 5;
/// Largest accepted bucket bits. Larger requests are clamped.
pub const MAX_BUCKET_BITS: u8 = 8;
/// Largest bucket count a map can have.
pub const MAX_BUCKET_COUNT: usize = 1 << MAX_BUCKET_BITS;

/// A single construction option.
///
/// Options are applied in the order given; a later option for the same field
/// replaces an earlier one.
pub enum MapOption<K> {
    /// Use `1 << bits` buckets. Bits above [`MAX_BUCKET_BITS`] are clamped.
    BucketBits(u8),
    /// Digest function used to route keys to buckets.
    HashFn(HashFn<K>),
    /// Initial table capacity reserved in every bucket.
    CapacityPerBucket(usize),
}

impl<K> std::fmt::Debug for MapOption<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MapOption::BucketBits(bits) => write!(f, "MapOption::BucketBits({})", bits),
            MapOption::HashFn(_) => write!(f, "MapOption::HashFn(...)"),
            MapOption::CapacityPerBucket(cap) => {
                write!(f, "MapOption::CapacityPerBucket({})", cap)
            }
        }
    }
}

/// Resolved, immutable configuration for a SafeMap instance.
pub struct Config<K> {
    pub(crate) bucket_count: usize,
    pub(crate) capacity_per_bucket: Option<usize>,
    pub(crate) hash_fn: HashFn<K>,
}

impl<K> Config<K> {
    /// Default settings around an already chosen hash function.
    pub(crate) fn with_hash_fn(hash_fn: HashFn<K>) -> Self {
        Self {
            bucket_count: 1 << DEFAULT_BUCKET_BITS,
            capacity_per_bucket: None,
            hash_fn,
        }
    }

    /// Number of buckets. Always a power of two in `[1, MAX_BUCKET_COUNT]`.
    pub fn bucket_count(&self) -> usize {
        self.bucket_count
    }

    /// Initial capacity reserved per bucket, if any.
    pub fn capacity_per_bucket(&self) -> Option<usize> {
        self.capacity_per_bucket
    }
}

impl<K> Clone for Config<K> {
    fn clone(&self) -> Self {
        Self {
            bucket_count: self.bucket_count,
            capacity_per_bucket: self.capacity_per_bucket,
            hash_fn: Arc::clone(&self.hash_fn),
        }
    }
}

impl<K> std::fmt::Debug for Config<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("bucket_count", &self.bucket_count)
            .field("capacity_per_bucket", &self.capacity_per_bucket)
            .finish_non_exhaustive()
    }
}

/// Resolve a sequence of options into a configuration.
///
/// Fails with [`Error::MissingHashFunction`] when no option supplies a hash
/// function.
pub fn resolve<K, I>(options: I) -> Result<Config<K>, Error>
where
    I: IntoIterator<Item = MapOption<K>>,
{
    let mut bits = DEFAULT_BUCKET_BITS;
    let mut capacity_per_bucket = None;
    let mut hash_fn = None;

    for option in options {
        match option {
            MapOption::BucketBits(requested) => {
                if requested > MAX_BUCKET_BITS {
                    tracing::debug!(
                        requested,
                        max = MAX_BUCKET_BITS,
                        "clamping bucket bits"
                    );
                }
                bits = requested.min(MAX_BUCKET_BITS);
            }
            MapOption::HashFn(f) => hash_fn = Some(f),
            MapOption::CapacityPerBucket(cap) => capacity_per_bucket = Some(cap),
        }
    }

    let hash_fn = hash_fn.ok_or(Error::MissingHashFunction)?;
    let bucket_count = (1usize << bits).clamp(1, MAX_BUCKET_COUNT);

    Ok(Config {
        bucket_count,
        capacity_per_bucket,
        hash_fn,
    })
}

/// Builder for creating a SafeMap with custom configuration.
///
/// ```rust
/// use safemap::SafeMapBuilder;
///
/// let map = SafeMapBuilder::<&str>::new()
///     .bucket_bits(4)
///     .string_keys()
///     .build::<i32>()?;
/// assert_eq!(map.bucket_count(), 16);
/// map.set("key", 1);
/// assert_eq!(map.get(&"key"), Some(1));
/// # Ok::<(), safemap::Error>(())
/// ```
pub struct SafeMapBuilder<K> {
    options: Vec<MapOption<K>>,
}

impl<K> SafeMapBuilder<K> {
    /// Create a builder with no options applied.
    pub fn new() -> Self {
        Self {
            options: Vec::new(),
        }
    }

    /// Apply a raw option.
    pub fn option(mut self, option: MapOption<K>) -> Self {
        self.options.push(option);
        self
    }

    /// Use `1 << bits` buckets (clamped to `MAX_BUCKET_BITS`).
    pub fn bucket_bits(self, bits: u8) -> Self {
        self.option(MapOption::BucketBits(bits))
    }

    /// Reserve `capacity` entries in every bucket up front.
    pub fn capacity_per_bucket(self, capacity: usize) -> Self {
        self.option(MapOption::CapacityPerBucket(capacity))
    }

    /// Route keys with a caller-supplied digest function.
    pub fn hash_fn<F>(self, f: F) -> Self
    where
        F: Fn(&K) -> u64 + Send + Sync + 'static,
    {
        self.option(MapOption::HashFn(Arc::new(f)))
    }

    /// Route keys with one of the built-in [`Hash`]-based hashers.
    pub fn hash_function(self, hash_fn: HashFunction) -> Self
    where
        K: Hash + 'static,
    {
        self.option(MapOption::HashFn(hash_fn.into_hash_fn()))
    }

    /// Route byte-like keys (`&str`, `String`, `Vec<u8>`, ...) with XXH64.
    pub fn string_keys(self) -> Self
    where
        K: AsRef<[u8]> + 'static,
    {
        self.option(MapOption::HashFn(bytes_hash_fn()))
    }

    /// Route primitive integer keys by magnitude.
    pub fn integer_keys(self) -> Self
    where
        K: IntegerKey + 'static,
    {
        self.option(MapOption::HashFn(integer_hash_fn()))
    }

    /// Resolve the options applied so far.
    pub fn resolve(self) -> Result<Config<K>, Error> {
        resolve(self.options)
    }

    /// Build a SafeMap with the configured settings.
    pub fn build<V>(self) -> Result<crate::SafeMap<K, V>, Error>
    where
        K: Hash + Eq,
    {
        Ok(crate::SafeMap::with_config(self.resolve()?))
    }
}

impl<K> Default for SafeMapBuilder<K> {
    fn default() -> Self {
        Self::new()
    }
}

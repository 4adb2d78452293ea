use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A key digest function used to pick a bucket.
///
/// Must be deterministic for equal keys. The digest only selects a bucket, so
/// collisions cost throughput but never correctness.
pub type HashFn<K> = Arc<dyn Fn(&K) -> u64 + Send + Sync>;

/// Hash a byte sequence with XXH64 (seed 0).
#[inline]
pub fn hash_bytes(bytes: &[u8]) -> u64 {
    xxhash_rust::xxh64::xxh64(bytes, 0)
}

/// Hash a string with XXH64 (seed 0). Same digest as `hash_bytes(s.as_bytes())`.
#[inline]
pub fn hash_str(s: &str) -> u64 {
    hash_bytes(s.as_bytes())
}

/// Which general-purpose hasher to use for keys implementing [`Hash`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashFunction {
    /// ahash with fixed keys (default, fast and well-distributed).
    #[default]
    AHash,
    /// fxhash (faster but potentially less distributed).
    #[cfg(feature = "fxhash")]
    FxHash,
}

impl HashFunction {
    /// Hash a key with the selected hasher.
    pub fn hash_key<K: Hash + ?Sized>(&self, key: &K) -> u64 {
        match self {
            HashFunction::AHash => {
                let mut hasher = ahash::AHasher::default();
                key.hash(&mut hasher);
                hasher.finish()
            }
            #[cfg(feature = "fxhash")]
            HashFunction::FxHash => {
                let mut hasher = fxhash::FxHasher::default();
                key.hash(&mut hasher);
                hasher.finish()
            }
        }
    }

    pub(crate) fn into_hash_fn<K>(self) -> HashFn<K>
    where
        K: Hash + 'static,
    {
        Arc::new(move |key: &K| self.hash_key(key))
    }
}

pub(crate) fn bytes_hash_fn<K>() -> HashFn<K>
where
    K: AsRef<[u8]> + 'static,
{
    Arc::new(|key: &K| hash_bytes(key.as_ref()))
}

pub(crate) fn integer_hash_fn<K>() -> HashFn<K>
where
    K: IntegerKey + 'static,
{
    Arc::new(|key: &K| sealed::Sealed::fold_digest(key))
}

mod sealed {
    pub trait Sealed {
        /// Magnitude of the integer widened to `u64`. `k` and `-k` fold to the
        /// same digest, which is fine for bucket selection and nothing else.
        fn fold_digest(&self) -> u64;
    }
}

/// Primitive integer keys that can use the built-in integer bucket selector.
///
/// This trait is sealed. The digest it produces is not exposed: it folds
/// negative values onto their magnitude and is only good for spreading keys
/// over buckets.
pub trait IntegerKey: sealed::Sealed {}

macro_rules! impl_integer_key {
    (unsigned: $($t:ty),*) => {
        $(
            impl sealed::Sealed for $t {
                #[inline]
                fn fold_digest(&self) -> u64 {
                    *self as u64
                }
            }
            impl IntegerKey for $t {}
        )*
    };
    (signed: $($t:ty),*) => {
        $(
            impl sealed::Sealed for $t {
                #[inline]
                fn fold_digest(&self) -> u64 {
                    self.unsigned_abs() as u64
                }
            }
            impl IntegerKey for $t {}
        )*
    };
}

impl_integer_key!(unsigned: u8, u16, u32, u64, u128, usize);
impl_integer_key!(signed: i8, i16, i32, i64, i128, isize);

#[cfg(test)]
mod tests {
    use super::sealed::Sealed;
    use super::*;

    #[test]
    fn test_str_and_bytes_agree() {
        assert_eq!(hash_str("hello"), hash_bytes(b"hello"));
        assert_ne!(hash_str("hello"), hash_str("world"));
    }

    #[test]
    fn test_xxh64_known_digest() {
        // XXH64 of the empty input with seed 0.
        assert_eq!(hash_bytes(b""), 0xEF46_DB37_51D8_E999);
    }

    #[test]
    fn test_integer_folding() {
        assert_eq!(7i32.fold_digest(), 7);
        assert_eq!((-7i32).fold_digest(), 7);
        assert_eq!(i64::MIN.fold_digest(), 1u64 << 63);
        assert_eq!(u8::MAX.fold_digest(), 255);
    }

    #[test]
    fn test_ahash_deterministic() {
        let a = HashFunction::AHash.hash_key("key");
        let b = HashFunction::default().hash_key("key");
        assert_eq!(a, b);
    }

    #[test]
    fn test_hash_fn_wrappers() {
        let by_bytes = bytes_hash_fn::<String>();
        assert_eq!(by_bytes(&"abc".to_string()), hash_str("abc"));

        let by_int = integer_hash_fn::<i16>();
        assert_eq!(by_int(&-300), by_int(&300));
    }
}

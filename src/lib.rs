//! # SafeMap
//!
//! A concurrent map that shards its key space across independently locked
//! buckets.
//!
//! Each key is routed to one bucket by `hash_fn(key) & (bucket_count - 1)`.
//! A bucket is a plain hash table behind its own reader/writer lock, so
//! operations on keys in different buckets never block each other. The
//! element count is an atomic counter updated inside each bucket's critical
//! section, which makes `len` and `is_empty` lock-free.
//!
//! ## Features
//!
//! - **Atomic compound operations**: `get_or_set`, `get_and_delete`, `swap`,
//!   `compare_and_swap` and `compare_and_delete` each run under a single
//!   bucket lock
//! - **Whole-map operations**: `clear`, `range` and `iter_snapshot` lock every
//!   bucket in ascending order
//! - **Pluggable hashing**: any `Fn(&K) -> u64`, or a built-in strategy for
//!   byte strings (XXH64), integers, or any `Hash` key (ahash)
//! - **Statistics**: per-bucket operation counters behind the `metrics` feature
//!
//! ## Example
//!
//! ```rust
//! use safemap::SafeMap;
//!
//! let map = SafeMap::with_string_keys();
//!
//! map.set("a", 1);
//! map.set("b", 2);
//! map.set("a", 3);
//! assert_eq!(map.len(), 2);
//! assert_eq!(map.get(&"a"), Some(3));
//!
//! assert_eq!(map.get_or_set("x", 10), (10, false));
//! assert_eq!(map.get_or_set("x", 20), (10, true));
//!
//! map.range(|key, value| {
//!     println!("{}: {}", key, value);
//!     true
//! });
//!
//! map.clear();
//! assert!(map.is_empty());
//! ```
//!
//! ## Configuration
//!
//! ```rust
//! use safemap::{SafeMapBuilder, hash_str};
//!
//! let map = SafeMapBuilder::new()
//!     .bucket_bits(6) // 64 buckets, clamped to 256
//!     .hash_fn(|k: &String| hash_str(k))
//!     .build::<i32>()?;
//! assert_eq!(map.bucket_count(), 64);
//!
//! // A hash function is mandatory.
//! let missing = SafeMapBuilder::<String>::new().build::<i32>();
//! assert_eq!(missing.unwrap_err(), safemap::Error::MissingHashFunction);
//! # Ok::<(), safemap::Error>(())
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]

/// Lockable bucket.
mod bucket;
/// Options, builder and configuration resolver.
pub mod config;
/// Error types.
pub mod error;
/// Hash strategies for bucket selection.
pub mod hash;
/// Iterator implementations.
pub mod iter;
/// Main SafeMap implementation.
pub mod safemap;
/// Statistics collection.
pub mod stats;

pub use config::{Config, MapOption, SafeMapBuilder};
pub use error::Error;
pub use hash::{hash_bytes, hash_str, HashFn, HashFunction, IntegerKey};
pub use safemap::SafeMap;
pub use stats::{BucketOps, Stats};

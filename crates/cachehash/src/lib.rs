//! # cachehash
//!
//! Fixed-capacity LRU cache mapping byte-string keys to opaque values.
//!
//! ## Architecture
//! - **Arena**: every slot allocated up front in one block
//! - **Recency list**: index-linked list threading all slots (O(1) promote)
//! - **Hash index**: AHash map from key bytes to slot (O(1) lookup)
//!
//! ## Example
//! ```
//! use cachehash::CacheHash;
//!
//! let mut cache = CacheHash::with_evict_callback(2, |v: u32| println!("evicted {}", v));
//! cache.put(b"A", 1);
//! cache.put(b"B", 2);
//! cache.put(b"C", 3); // evicts A
//!
//! assert_eq!(cache.has(b"A"), None);
//! assert_eq!(cache.get(b"B"), Some(&2));
//! cache.free_with(|v| assert!(v == 2 || v == 3));
//! ```
//!
//! Callbacks run while the cache is mutably borrowed, so they cannot reach
//! back into it:
//! ```compile_fail
//! use cachehash::CacheHash;
//!
//! let mut cache = CacheHash::new(1);
//! cache.set_evict_callback(|v: u32| cache.put(b"again", v));
//! ```

#![warn(missing_docs)]

mod arena;
mod cache;
mod error;
mod stats;

#[cfg(test)]
mod property_tests;

pub use cache::{CacheHash, EvictCallback};
pub use error::{Error, Result};
pub use stats::CacheStats;

//! Restart-resistant lookup caches and in-flight fetch deduplication.
//!
//! - [`lookup`] - Persisted address→value maps, one JSON document per
//!   (category, chain)
//! - [`dedup`] - At-most-one-in-flight async fetch per (chain, key)

mod dedup;
mod lookup;

pub use dedup::DedupFetchCache;
pub use lookup::{AddressLookupCache, CacheCategory};

pub mod abis;
pub mod aggregates;
pub mod cache;
pub mod config;
pub mod context;
pub mod math;
pub mod models;
pub mod pricing;
pub mod store;
pub mod utils;

pub use aggregates::{AggregatorUpdater, SnapshotInterval};
pub use cache::{AddressLookupCache, CacheCategory, DedupFetchCache};
pub use config::Settings;
pub use context::ChainContext;
pub use pricing::{MetadataFetcher, OracleRateSource, PriceOracleRefresher, RateSource};
pub use store::{EntityStore, EntityStoreExt, MemoryStore};

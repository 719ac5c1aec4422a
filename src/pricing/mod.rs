//! Oracle-driven USD pricing and on-chain token metadata lookups.

mod metadata;
mod refresher;

pub use metadata::{MetadataFetcher, TokenMetadata};
pub use refresher::{OracleRateSource, PriceOracleRefresher, RateSource};

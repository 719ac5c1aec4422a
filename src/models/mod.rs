//! Long-lived analytics records and the diffs that mutate them.
//!
//! - [`pool`] - Pool aggregates, partial diffs, and immutable snapshots
//! - [`token`] - Token records and point-in-time price snapshots
//! - [`venft`] - veNFT lock aggregates and their delta diffs

mod pool;
mod token;
mod venft;

pub use pool::{PoolAggregate, PoolDiff, PoolSnapshot};
pub use token::{TokenPriceSnapshot, TokenRecord};
pub use venft::{VeNftAggregate, VeNftDiff};

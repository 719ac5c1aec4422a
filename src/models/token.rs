use chrono::{DateTime, Utc};
use num_bigint::BigInt;
use num_traits::Zero;
use serde::{Deserialize, Serialize};

use crate::store::Entity;
use crate::utils::serde_bigint;

/// Token metadata and current USD price.
///
/// Primary Key: `<chainId>_<address>`
/// Mutated by the price refresher and by pool-creation / whitelist-toggle
/// event handlers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenRecord {
    pub chain_id: u64,
    pub address: String,

    // On-chain metadata (decimals is informational, not itself scaled)
    pub symbol: String,
    pub name: String,
    pub decimals: u8,

    /// Current USD price, base-1e18.
    #[serde(with = "serde_bigint")]
    pub price_per_usd: BigInt,
    pub is_whitelisted: bool,
    pub last_updated_timestamp: DateTime<Utc>,
}

impl TokenRecord {
    pub fn new(
        chain_id: u64,
        address: String,
        symbol: String,
        name: String,
        decimals: u8,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            chain_id,
            // Always lowercase addresses for consistent comparisons
            address: address.to_lowercase(),
            symbol,
            name,
            decimals,
            price_per_usd: BigInt::zero(),
            is_whitelisted: false,
            last_updated_timestamp: timestamp,
        }
    }

    /// Zeroed stand-in for a token the oracle priced before its creation
    /// event was seen. Defaults to 18 decimals.
    pub fn placeholder(chain_id: u64, address: &str, timestamp: DateTime<Utc>) -> Self {
        Self::new(
            chain_id,
            address.to_string(),
            String::new(),
            String::new(),
            18,
            timestamp,
        )
    }

    pub fn id(&self) -> String {
        Self::storage_key(self.chain_id, &self.address)
    }

    pub fn storage_key(chain_id: u64, address: &str) -> String {
        format!("{chain_id}_{}", address.to_lowercase())
    }
}

impl Entity for TokenRecord {
    const KIND: &'static str = "TokenRecord";

    fn key(&self) -> String {
        self.id()
    }
}

/// Immutable point-in-time USD price record.
///
/// Primary Key: `<chainId>_<address>_<blockNumber>`
/// Created on every successful oracle refresh; never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPriceSnapshot {
    pub id: String,
    pub chain_id: u64,
    pub address: String,
    pub block_number: u64,
    #[serde(with = "serde_bigint")]
    pub price_per_usd: BigInt,
    pub timestamp: DateTime<Utc>,
}

impl TokenPriceSnapshot {
    pub fn new(
        chain_id: u64,
        address: &str,
        block_number: u64,
        price_per_usd: BigInt,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let address = address.to_lowercase();
        Self {
            id: format!("{chain_id}_{address}_{block_number}"),
            chain_id,
            address,
            block_number,
            price_per_usd,
            timestamp,
        }
    }
}

impl Entity for TokenPriceSnapshot {
    const KIND: &'static str = "TokenPriceSnapshot";

    fn key(&self) -> String {
        self.id.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_key_is_lowercased() {
        assert_eq!(
            TokenRecord::storage_key(10, "0xAbCd"),
            "10_0xabcd".to_string()
        );
    }

    #[test]
    fn placeholder_defaults_to_18_decimals() {
        let t = TokenRecord::placeholder(10, "0xAbCd", Utc::now());
        assert_eq!(t.decimals, 18);
        assert_eq!(t.address, "0xabcd");
        assert_eq!(t.price_per_usd, BigInt::zero());
        assert!(!t.is_whitelisted);
    }

    #[test]
    fn price_snapshot_key_embeds_block_number() {
        let snap = TokenPriceSnapshot::new(10, "0xAbCd", 12345, BigInt::from(1), Utc::now());
        assert_eq!(snap.id, "10_0xabcd_12345");
    }
}

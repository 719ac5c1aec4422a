use chrono::Duration;
use config::{Config, ConfigError, File};
use serde::Deserialize;

use crate::aggregates::SnapshotInterval;

/// Per-chain indexing configuration.
///
/// One entry per chain the process owns. The oracle fields gate the price
/// refresher: no refresh happens below `oracle_activation_block`, and
/// refreshes are rate-limited to one per `price_update_delta_secs`.
#[derive(Debug, Deserialize, Clone)]
pub struct ChainSettings {
    pub chain_id: u64,
    pub rpc_url: String,
    pub oracle_address: String,
    #[serde(default)]
    pub oracle_activation_block: u64,
    #[serde(default = "default_price_update_delta_secs")]
    pub price_update_delta_secs: u64,
    /// The chain's canonical USDC address; always pinned to a price of 1 USD.
    pub usdc_address: String,
    /// Voter contract used for gauge liveness probes.
    #[serde(default)]
    pub voter_address: Option<String>,
    /// Token addresses eligible for oracle pricing.
    #[serde(default)]
    pub whitelisted_tokens: Vec<String>,
}

fn default_price_update_delta_secs() -> u64 {
    3600 // 1 hour
}

impl ChainSettings {
    pub fn is_usdc(&self, address: &str) -> bool {
        self.usdc_address.eq_ignore_ascii_case(address)
    }

    /// Minimum wall-clock gap between oracle refreshes.
    pub fn update_delta(&self) -> Duration {
        Duration::seconds(self.price_update_delta_secs as i64)
    }
}

/// Durable lookup-cache location.
#[derive(Debug, Deserialize, Clone)]
pub struct CacheSettings {
    #[serde(default = "default_cache_dir")]
    pub directory: String,
}

fn default_cache_dir() -> String {
    "./cache".to_string()
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            directory: default_cache_dir(),
        }
    }
}

/// Snapshot bucketing configuration.
///
/// Only hourly/daily/weekly bucket sizes exist; anything else is rejected at
/// load time, not per-event.
#[derive(Debug, Deserialize, Clone)]
pub struct SnapshotSettings {
    #[serde(default = "default_snapshot_interval_secs")]
    pub interval_secs: u64,
}

fn default_snapshot_interval_secs() -> u64 {
    3600 // hourly
}

impl Default for SnapshotSettings {
    fn default() -> Self {
        Self {
            interval_secs: default_snapshot_interval_secs(),
        }
    }
}

/// Root application configuration, loaded from `config.{yaml,toml}`.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub snapshots: SnapshotSettings,
    pub chains: Vec<ChainSettings>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name("config"))
            .build()?;

        let settings: Settings = s.try_deserialize()?;
        settings.validate()?;

        Ok(settings)
    }

    /// Fail fast on configuration errors instead of surfacing them per-event.
    pub fn validate(&self) -> Result<(), ConfigError> {
        SnapshotInterval::from_secs(self.snapshots.interval_secs)
            .map_err(|e| ConfigError::Message(e.to_string()))?;

        for chain in &self.chains {
            if chain.rpc_url.is_empty() {
                return Err(ConfigError::Message(format!(
                    "chain {}: rpc_url is required",
                    chain.chain_id
                )));
            }
            if chain.oracle_address.is_empty() {
                return Err(ConfigError::Message(format!(
                    "chain {}: oracle_address is required",
                    chain.chain_id
                )));
            }
            if chain.usdc_address.is_empty() {
                return Err(ConfigError::Message(format!(
                    "chain {}: usdc_address is required",
                    chain.chain_id
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> ChainSettings {
        ChainSettings {
            chain_id: 10,
            rpc_url: "http://localhost:8545".to_string(),
            oracle_address: "0x395942c2049604a314d39f370dfb8d87aac89e16".to_string(),
            oracle_activation_block: 0,
            price_update_delta_secs: 3600,
            usdc_address: "0x7f5c764cbc14f9669b88837ca1490cca17c31607".to_string(),
            voter_address: None,
            whitelisted_tokens: vec![],
        }
    }

    fn settings() -> Settings {
        Settings {
            cache: CacheSettings::default(),
            snapshots: SnapshotSettings::default(),
            chains: vec![chain()],
        }
    }

    #[test]
    fn valid_settings_pass() {
        assert!(settings().validate().is_ok());
    }

    #[test]
    fn missing_rpc_url_fails_fast() {
        let mut s = settings();
        s.chains[0].rpc_url = String::new();
        assert!(s.validate().is_err());
    }

    #[test]
    fn unsupported_snapshot_interval_fails_fast() {
        let mut s = settings();
        s.snapshots.interval_secs = 1234;
        assert!(s.validate().is_err());
    }

    #[test]
    fn usdc_comparison_ignores_case() {
        let c = chain();
        assert!(c.is_usdc("0x7F5C764CBC14F9669B88837CA1490CCA17C31607"));
        assert!(!c.is_usdc("0x0000000000000000000000000000000000000000"));
    }
}

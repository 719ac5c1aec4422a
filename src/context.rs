//! Per-chain wiring.
//!
//! Every chain the process owns gets its own [`ChainContext`] holding the
//! chain's lookup caches, price refresher, and aggregate updater. Nothing
//! here is shared across chains, so chain workers never contend on each
//! other's state.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use serde_json::{json, Map, Value};

use crate::aggregates::{AggregatorUpdater, SnapshotInterval};
use crate::cache::{AddressLookupCache, CacheCategory};
use crate::config::{ChainSettings, Settings};
use crate::pricing::{MetadataFetcher, OracleRateSource, PriceOracleRefresher, RateSource};
use crate::store::EntityStore;

pub struct ChainContext {
    pub chain_id: u64,
    pub store: Arc<dyn EntityStore>,

    // Durable address lookups, one document per (category, chain)
    pub gauge_to_pool: AddressLookupCache,
    pub bribe_to_pool: AddressLookupCache,
    pub pool_tokens: AddressLookupCache,
    pub token_metadata: AddressLookupCache,
    pub whitelisted_pools: AddressLookupCache,

    pub refresher: PriceOracleRefresher,
    pub updater: AggregatorUpdater,
    pub metadata: MetadataFetcher,
}

impl ChainContext {
    pub fn new(
        settings: &Settings,
        chain: &ChainSettings,
        store: Arc<dyn EntityStore>,
    ) -> Result<Self> {
        let rates = Arc::new(OracleRateSource::new(&chain.rpc_url, &chain.oracle_address)?);
        Self::with_rate_source(settings, chain, store, rates)
    }

    /// Build a context around an explicit [`RateSource`]. Used by tests and
    /// embedders that price off-chain.
    pub fn with_rate_source(
        settings: &Settings,
        chain: &ChainSettings,
        store: Arc<dyn EntityStore>,
        rates: Arc<dyn RateSource>,
    ) -> Result<Self> {
        let root = Path::new(&settings.cache.directory);
        let interval = SnapshotInterval::from_secs(settings.snapshots.interval_secs)?;
        let metadata = MetadataFetcher::new(
            &chain.rpc_url,
            chain.chain_id,
            chain.voter_address.as_deref(),
        )?;

        Ok(Self {
            chain_id: chain.chain_id,
            gauge_to_pool: AddressLookupCache::init(root, CacheCategory::GaugeToPool, chain.chain_id),
            bribe_to_pool: AddressLookupCache::init(root, CacheCategory::BribeToPool, chain.chain_id),
            pool_tokens: AddressLookupCache::init(root, CacheCategory::PoolTokens, chain.chain_id),
            token_metadata: AddressLookupCache::init(
                root,
                CacheCategory::TokenMetadata,
                chain.chain_id,
            ),
            whitelisted_pools: AddressLookupCache::init(
                root,
                CacheCategory::WhitelistedPools,
                chain.chain_id,
            ),
            refresher: PriceOracleRefresher::new(store.clone(), chain.clone(), rates),
            updater: AggregatorUpdater::new(store.clone(), interval),
            metadata,
            store,
        })
    }

    /// Record a gauge→pool mapping at gauge-creation time.
    pub fn register_gauge(&self, gauge: &str, pool: &str) -> Result<()> {
        self.gauge_to_pool.add(mapping(gauge, pool))
    }

    /// Record a bribe-contract→pool mapping at bribe-creation time.
    pub fn register_bribe(&self, bribe: &str, pool: &str) -> Result<()> {
        self.bribe_to_pool.add(mapping(bribe, pool))
    }

    pub fn pool_for_gauge(&self, gauge: &str) -> Option<String> {
        pool_of(&self.gauge_to_pool, gauge)
    }

    pub fn pool_for_bribe(&self, bribe: &str) -> Option<String> {
        pool_of(&self.bribe_to_pool, bribe)
    }
}

fn mapping(key: &str, pool: &str) -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert(key.to_lowercase(), json!({ "pool": pool.to_lowercase() }));
    fields
}

fn pool_of(cache: &AddressLookupCache, key: &str) -> Option<String> {
    cache
        .read(key)
        .and_then(|entry| entry.get("pool").and_then(Value::as_str).map(String::from))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CacheSettings, SnapshotSettings};
    use crate::pricing::RateSource;
    use crate::store::MemoryStore;
    use async_trait::async_trait;

    struct NullRateSource;

    #[async_trait]
    impl RateSource for NullRateSource {
        async fn get_many_rates(
            &self,
            _connectors: Vec<String>,
            _block_number: u64,
        ) -> Result<Vec<String>> {
            Ok(vec![])
        }
    }

    fn settings(cache_dir: &str) -> Settings {
        Settings {
            cache: CacheSettings {
                directory: cache_dir.to_string(),
            },
            snapshots: SnapshotSettings::default(),
            chains: vec![chain()],
        }
    }

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

    fn context(cache_dir: &str) -> ChainContext {
        let settings = settings(cache_dir);
        ChainContext::with_rate_source(
            &settings,
            &settings.chains[0],
            Arc::new(MemoryStore::new()),
            Arc::new(NullRateSource),
        )
        .unwrap()
    }

    #[test]
    fn gauge_registration_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path().to_str().unwrap());

        ctx.register_gauge("0xGaUgE", "0xPoOl").unwrap();
        assert_eq!(ctx.pool_for_gauge("0xgauge"), Some("0xpool".to_string()));
        assert_eq!(ctx.pool_for_gauge("0xGAUGE"), Some("0xpool".to_string()));
        assert_eq!(ctx.pool_for_gauge("0xother"), None);
        // Gauge mappings never leak into the bribe cache
        assert_eq!(ctx.pool_for_bribe("0xgauge"), None);
    }

    #[test]
    fn bribe_registration_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path().to_str().unwrap());

        ctx.register_bribe("0xbribe", "0xpool").unwrap();
        assert_eq!(ctx.pool_for_bribe("0xbribe"), Some("0xpool".to_string()));
    }

    #[test]
    fn registrations_survive_a_rebuild() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().to_str().unwrap();

        context(path).register_gauge("0xgauge", "0xpool").unwrap();

        let reopened = context(path);
        assert_eq!(
            reopened.pool_for_gauge("0xgauge"),
            Some("0xpool".to_string())
        );
    }

    #[test]
    fn unsupported_interval_fails_construction() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = settings(dir.path().to_str().unwrap());
        settings.snapshots.interval_secs = 1234;

        let result = ChainContext::with_rate_source(
            &settings,
            &settings.chains[0],
            Arc::new(MemoryStore::new()),
            Arc::new(NullRateSource),
        );
        assert!(result.is_err());
    }
}

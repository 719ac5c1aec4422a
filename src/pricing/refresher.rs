use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy::eips::BlockId;
use alloy::primitives::{Address, U256};
use alloy::providers::{DynProvider, ProviderBuilder};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{info, warn};
use num_bigint::BigInt;
use num_traits::Zero;
use url::Url;

use crate::abis::oracle::IPriceOracle;
use crate::cache::DedupFetchCache;
use crate::config::ChainSettings;
use crate::math::ONE_E18;
use crate::models::{TokenPriceSnapshot, TokenRecord};
use crate::store::{load_token, EntityStore, EntityStoreExt, TokenLookup};

/// Timeout for individual RPC calls (30 seconds)
const RPC_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Batched USD rate lookup at a specific block.
///
/// Rates come back as base-1e18 decimal strings, positionally aligned with
/// the input addresses. `"-1"` marks a token the oracle has no route for.
#[async_trait]
pub trait RateSource: Send + Sync {
    async fn get_many_rates(
        &self,
        connectors: Vec<String>,
        block_number: u64,
    ) -> Result<Vec<String>>;
}

/// [`RateSource`] backed by an on-chain price oracle contract.
pub struct OracleRateSource {
    provider: DynProvider,
    oracle: Address,
}

impl OracleRateSource {
    pub fn new(rpc_url: &str, oracle_address: &str) -> Result<Self> {
        let url = Url::parse(rpc_url).context("Invalid RPC URL")?;
        let provider = DynProvider::new(ProviderBuilder::new().connect_http(url));
        let oracle = oracle_address.parse().context("Invalid oracle address")?;

        Ok(Self { provider, oracle })
    }
}

#[async_trait]
impl RateSource for OracleRateSource {
    async fn get_many_rates(
        &self,
        connectors: Vec<String>,
        block_number: u64,
    ) -> Result<Vec<String>> {
        let oracle = IPriceOracle::new(self.oracle, &self.provider);

        let mut parsed: Vec<Address> = Vec::with_capacity(connectors.len());
        for connector in &connectors {
            parsed.push(connector.parse().context("Invalid connector address")?);
        }
        // The contract expects the source count, which excludes the final
        // connector in the path.
        let src_len = parsed.len().saturating_sub(1) as u8;

        let rates = tokio::time::timeout(
            RPC_CALL_TIMEOUT,
            oracle
                .getManyRatesWithConnectors(src_len, parsed)
                .block(BlockId::number(block_number))
                .call(),
        )
        .await
        .context("Oracle call timeout")?
        .context("getManyRatesWithConnectors failed")?;

        // The oracle signals "no route" as int(-1), which reads back from a
        // uint256 return slot as U256::MAX.
        Ok(rates
            .into_iter()
            .map(|rate| {
                if rate == U256::MAX {
                    "-1".to_string()
                } else {
                    rate.to_string()
                }
            })
            .collect())
    }
}

/// Refreshes whitelisted-token USD prices from the oracle under a
/// staleness policy.
///
/// A refresh only happens above the oracle activation block, at most once
/// per configured update delta, and only for whitelisted tokens that
/// already have a [`TokenRecord`]. Concurrent refreshes for the same block
/// collapse onto one oracle call via [`DedupFetchCache`].
pub struct PriceOracleRefresher {
    store: Arc<dyn EntityStore>,
    chain: ChainSettings,
    rates: Arc<dyn RateSource>,
    dedup: DedupFetchCache<Vec<String>>,
    last_updated: Mutex<Option<DateTime<Utc>>>,
}

impl PriceOracleRefresher {
    pub fn new(
        store: Arc<dyn EntityStore>,
        chain: ChainSettings,
        rates: Arc<dyn RateSource>,
    ) -> Self {
        Self {
            store,
            chain,
            rates,
            dedup: DedupFetchCache::new(1_024),
            last_updated: Mutex::new(None),
        }
    }

    /// Refresh every priceable whitelisted token at `block_number`.
    ///
    /// Skips silently when the oracle is not yet active, when the last
    /// refresh is still fresh, or when no whitelisted token has been
    /// created yet. On success every priced token gets its [`TokenRecord`]
    /// updated and an immutable [`TokenPriceSnapshot`] written.
    pub async fn refresh_whitelisted_prices(
        &self,
        block_number: u64,
        block_time: DateTime<Utc>,
    ) -> Result<()> {
        if block_number < self.chain.oracle_activation_block {
            return Ok(());
        }

        {
            let last = self.last_updated.lock().unwrap();
            if let Some(previous) = *last {
                if block_time - previous <= self.chain.update_delta() {
                    return Ok(());
                }
            }
        }

        // Only tokens whose creation event was already processed are
        // priceable; the rest are picked up on a later refresh.
        let mut addresses = Vec::new();
        for candidate in &self.chain.whitelisted_tokens {
            let address = candidate.to_lowercase();
            match load_token(self.store.as_ref(), self.chain.chain_id, &address).await? {
                TokenLookup::Found(_) => addresses.push(address),
                TokenLookup::NotFound { .. } => {},
            }
        }
        if addresses.is_empty() {
            return Ok(());
        }

        let fetch_key = format!("{block_number}:{}", addresses.join(","));
        let rates = {
            let source = Arc::clone(&self.rates);
            let connectors = addresses.clone();
            self.dedup
                .get(self.chain.chain_id, &fetch_key, async move {
                    source.get_many_rates(connectors, block_number).await
                })
                .await?
        };

        if rates.len() != addresses.len() {
            bail!(
                "oracle returned {} rates for {} tokens on chain {}",
                rates.len(),
                addresses.len(),
                self.chain.chain_id
            );
        }

        for (address, raw) in addresses.iter().zip(rates.iter()) {
            let price = if self.chain.is_usdc(address) {
                // USDC is the unit of account and is always exactly 1 USD
                ONE_E18.clone()
            } else if raw == "-1" {
                BigInt::zero()
            } else {
                match raw.parse::<BigInt>() {
                    Ok(price) => price,
                    Err(e) => {
                        warn!(
                            "Unparseable oracle rate {raw:?} for token {address} on chain {}: {e}",
                            self.chain.chain_id
                        );
                        BigInt::zero()
                    },
                }
            };

            let mut token =
                match load_token(self.store.as_ref(), self.chain.chain_id, address).await? {
                    TokenLookup::Found(token) => *token,
                    TokenLookup::NotFound { .. } => {
                        TokenRecord::placeholder(self.chain.chain_id, address, block_time)
                    },
                };
            token.price_per_usd = price.clone();
            token.last_updated_timestamp = block_time;
            self.store.set_entity(&token).await?;

            let snapshot = TokenPriceSnapshot::new(
                self.chain.chain_id,
                address,
                block_number,
                price,
                block_time,
            );
            self.store.set_entity(&snapshot).await?;
        }

        *self.last_updated.lock().unwrap() = Some(block_time);
        info!(
            "Refreshed {} token prices on chain {} at block {block_number}",
            addresses.len(),
            self.chain.chain_id
        );

        Ok(())
    }
}

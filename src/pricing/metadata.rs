use std::time::Duration;

use alloy::primitives::Address;
use alloy::providers::{DynProvider, ProviderBuilder};
use anyhow::{Context, Result};
use log::debug;
use serde_json::{json, Map, Value};
use url::Url;

use crate::abis::erc20::IERC20;
use crate::abis::voter::IVoter;
use crate::cache::AddressLookupCache;

/// Timeout for individual RPC calls (30 seconds)
const RPC_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// On-chain ERC20 metadata for a single token.
#[derive(Debug, Clone)]
pub struct TokenMetadata {
    pub address: String,
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
}

/// Fetches token metadata and gauge liveness over RPC.
///
/// Every call is individually timed out; a failing field falls back to a
/// safe default (empty name/symbol, 18 decimals, dead gauge) instead of
/// failing the surrounding event.
pub struct MetadataFetcher {
    provider: DynProvider,
    chain_id: u64,
    voter: Option<Address>,
}

impl MetadataFetcher {
    pub fn new(rpc_url: &str, chain_id: u64, voter_address: Option<&str>) -> Result<Self> {
        let url = Url::parse(rpc_url).context("Invalid RPC URL")?;
        let provider = DynProvider::new(ProviderBuilder::new().connect_http(url));
        let voter = match voter_address {
            Some(address) => Some(address.parse().context("Invalid voter address")?),
            None => None,
        };

        Ok(Self {
            provider,
            chain_id,
            voter,
        })
    }

    /// Fetch name/symbol/decimals for a token, with per-field timeouts and
    /// defaults.
    pub async fn fetch_token_metadata(&self, addr: &str) -> Result<TokenMetadata> {
        let address: Address = addr.parse().context("Invalid token address")?;
        let token = IERC20::new(address, &self.provider);

        let decimals = tokio::time::timeout(RPC_CALL_TIMEOUT, token.decimals().call())
            .await
            .ok()
            .and_then(|r| r.ok())
            .unwrap_or(18);

        let name = tokio::time::timeout(RPC_CALL_TIMEOUT, token.name().call())
            .await
            .ok()
            .and_then(|r| r.ok())
            .unwrap_or_default();

        let symbol = tokio::time::timeout(RPC_CALL_TIMEOUT, token.symbol().call())
            .await
            .ok()
            .and_then(|r| r.ok())
            .unwrap_or_default();

        debug!(
            "Fetched metadata for token {addr} on chain {}: {symbol} ({decimals} decimals)",
            self.chain_id
        );

        Ok(TokenMetadata {
            address: addr.to_lowercase(),
            symbol,
            name,
            decimals,
        })
    }

    /// Fetch metadata and persist it into the durable lookup cache so the
    /// RPC round-trip survives restarts.
    pub async fn fetch_and_cache(
        &self,
        addr: &str,
        cache: &AddressLookupCache,
    ) -> Result<TokenMetadata> {
        let metadata = self.fetch_token_metadata(addr).await?;
        cache.add(cache_entry(&metadata))?;
        Ok(metadata)
    }

    /// Whether a gauge is alive according to the voter contract.
    ///
    /// Returns false when no voter is configured or the probe fails.
    pub async fn gauge_is_alive(&self, gauge: &str) -> bool {
        let Some(voter_address) = self.voter else {
            return false;
        };
        let Ok(gauge_address) = gauge.parse::<Address>() else {
            return false;
        };

        let voter = IVoter::new(voter_address, &self.provider);
        tokio::time::timeout(RPC_CALL_TIMEOUT, voter.isAlive(gauge_address).call())
            .await
            .ok()
            .and_then(|r| r.ok())
            .unwrap_or(false)
    }
}

fn cache_entry(metadata: &TokenMetadata) -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert(
        metadata.address.clone(),
        json!({
            "symbol": metadata.symbol,
            "name": metadata.name,
            "decimals": metadata.decimals,
        }),
    );
    fields
}

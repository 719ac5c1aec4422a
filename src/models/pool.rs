use chrono::{DateTime, Utc};
use num_bigint::BigInt;
use num_traits::Zero;
use serde::{Deserialize, Serialize};

use crate::math::{abs, mul_1e18, normalize_to_1e18};
use crate::store::Entity;
use crate::utils::serde_bigint;

/// Long-lived analytics record for one liquidity pool.
///
/// Primary Key: (chain_id, address)
/// Lifecycle: created once at the pool-creation event with all cumulative
/// counters at zero, mutated on every subsequent event via diff-merge, never
/// deleted.
///
/// Every monetary field is an integer scaled by 1e18. Reserves are the
/// exception: they are stored raw, in the token's own decimals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolAggregate {
    // Identity (static after creation)
    pub chain_id: u64,
    pub address: String,
    pub name: String,
    pub token0_id: String,
    pub token1_id: String,
    pub token0_address: String,
    pub token1_address: String,
    pub is_stable: bool,
    /// Concentrated-liquidity pool flag.
    pub is_cl: bool,

    // Monotonic cumulative counters (base-1e18)
    #[serde(with = "serde_bigint")]
    pub total_volume0: BigInt,
    #[serde(with = "serde_bigint")]
    pub total_volume1: BigInt,
    #[serde(with = "serde_bigint")]
    pub total_volume_usd: BigInt,
    #[serde(with = "serde_bigint")]
    pub total_volume_usd_whitelisted: BigInt,
    #[serde(with = "serde_bigint")]
    pub total_fees0: BigInt,
    #[serde(with = "serde_bigint")]
    pub total_fees1: BigInt,
    #[serde(with = "serde_bigint")]
    pub total_fees_usd: BigInt,
    #[serde(with = "serde_bigint")]
    pub total_fees_usd_whitelisted: BigInt,
    pub number_of_swaps: u64,
    #[serde(with = "serde_bigint")]
    pub total_emissions_usd: BigInt,
    #[serde(with = "serde_bigint")]
    pub total_bribes_usd: BigInt,

    // Point-in-time state
    /// Raw token0 reserve, unnormalized (token0's own decimals).
    #[serde(with = "serde_bigint")]
    pub reserve0: BigInt,
    /// Raw token1 reserve, unnormalized (token1's own decimals).
    #[serde(with = "serde_bigint")]
    pub reserve1: BigInt,
    #[serde(with = "serde_bigint")]
    pub total_liquidity_usd: BigInt,
    #[serde(with = "serde_bigint")]
    pub token0_price: BigInt,
    #[serde(with = "serde_bigint")]
    pub token1_price: BigInt,
    pub gauge_is_alive: bool,
    pub last_updated_timestamp: DateTime<Utc>,
    pub last_snapshot_timestamp: Option<DateTime<Utc>>,
}

impl PoolAggregate {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        chain_id: u64,
        address: String,
        name: String,
        token0_address: String,
        token1_address: String,
        is_stable: bool,
        is_cl: bool,
        created_at: DateTime<Utc>,
    ) -> Self {
        let address = address.to_lowercase();
        let token0_address = token0_address.to_lowercase();
        let token1_address = token1_address.to_lowercase();
        Self {
            chain_id,
            token0_id: format!("{chain_id}_{token0_address}"),
            token1_id: format!("{chain_id}_{token1_address}"),
            address,
            name,
            token0_address,
            token1_address,
            is_stable,
            is_cl,
            total_volume0: BigInt::zero(),
            total_volume1: BigInt::zero(),
            total_volume_usd: BigInt::zero(),
            total_volume_usd_whitelisted: BigInt::zero(),
            total_fees0: BigInt::zero(),
            total_fees1: BigInt::zero(),
            total_fees_usd: BigInt::zero(),
            total_fees_usd_whitelisted: BigInt::zero(),
            number_of_swaps: 0,
            total_emissions_usd: BigInt::zero(),
            total_bribes_usd: BigInt::zero(),
            reserve0: BigInt::zero(),
            reserve1: BigInt::zero(),
            total_liquidity_usd: BigInt::zero(),
            token0_price: BigInt::zero(),
            token1_price: BigInt::zero(),
            gauge_is_alive: false,
            last_updated_timestamp: created_at,
            last_snapshot_timestamp: None,
        }
    }

    pub fn id(&self) -> String {
        Self::storage_key(self.chain_id, &self.address)
    }

    pub fn storage_key(chain_id: u64, address: &str) -> String {
        format!("{chain_id}-{}", address.to_lowercase())
    }

    /// Merge a partial diff into this aggregate, stamping the update time.
    ///
    /// Cumulative fields in the diff are deltas and are added to the previous
    /// totals; point-in-time fields overwrite. Fields absent from the diff
    /// are retained unchanged.
    pub fn apply(&self, diff: &PoolDiff, timestamp: DateTime<Utc>) -> PoolAggregate {
        let mut next = self.clone();

        if let Some(d) = &diff.volume0 {
            next.total_volume0 += d;
        }
        if let Some(d) = &diff.volume1 {
            next.total_volume1 += d;
        }
        if let Some(d) = &diff.volume_usd {
            next.total_volume_usd += d;
        }
        if let Some(d) = &diff.volume_usd_whitelisted {
            next.total_volume_usd_whitelisted += d;
        }
        if let Some(d) = &diff.fees0 {
            next.total_fees0 += d;
        }
        if let Some(d) = &diff.fees1 {
            next.total_fees1 += d;
        }
        if let Some(d) = &diff.fees_usd {
            next.total_fees_usd += d;
        }
        if let Some(d) = &diff.fees_usd_whitelisted {
            next.total_fees_usd_whitelisted += d;
        }
        if let Some(d) = diff.swaps {
            next.number_of_swaps += d;
        }
        if let Some(d) = &diff.emissions_usd {
            next.total_emissions_usd += d;
        }
        if let Some(d) = &diff.bribes_usd {
            next.total_bribes_usd += d;
        }

        if let Some(v) = &diff.reserve0 {
            next.reserve0 = v.clone();
        }
        if let Some(v) = &diff.reserve1 {
            next.reserve1 = v.clone();
        }
        if let Some(v) = &diff.total_liquidity_usd {
            next.total_liquidity_usd = v.clone();
        }
        if let Some(v) = &diff.token0_price {
            next.token0_price = v.clone();
        }
        if let Some(v) = &diff.token1_price {
            next.token1_price = v.clone();
        }
        if let Some(v) = diff.gauge_is_alive {
            next.gauge_is_alive = v;
        }

        next.last_updated_timestamp = timestamp;
        next
    }

    /// Immutable copy of this aggregate's fields for historical charting.
    ///
    /// The snapshot carries the aggregate's own `last_updated_timestamp`, and
    /// its id is `<chainId>-<poolAddress>_<epochMillis>` of that timestamp.
    pub fn snapshot(&self) -> PoolSnapshot {
        PoolSnapshot {
            id: format!("{}_{}", self.id(), self.last_updated_timestamp.timestamp_millis()),
            pool: self.id(),
            timestamp: self.last_updated_timestamp,
            chain_id: self.chain_id,
            address: self.address.clone(),
            total_volume0: self.total_volume0.clone(),
            total_volume1: self.total_volume1.clone(),
            total_volume_usd: self.total_volume_usd.clone(),
            total_volume_usd_whitelisted: self.total_volume_usd_whitelisted.clone(),
            total_fees0: self.total_fees0.clone(),
            total_fees1: self.total_fees1.clone(),
            total_fees_usd: self.total_fees_usd.clone(),
            total_fees_usd_whitelisted: self.total_fees_usd_whitelisted.clone(),
            number_of_swaps: self.number_of_swaps,
            total_emissions_usd: self.total_emissions_usd.clone(),
            total_bribes_usd: self.total_bribes_usd.clone(),
            reserve0: self.reserve0.clone(),
            reserve1: self.reserve1.clone(),
            total_liquidity_usd: self.total_liquidity_usd.clone(),
            token0_price: self.token0_price.clone(),
            token1_price: self.token1_price.clone(),
            gauge_is_alive: self.gauge_is_alive,
        }
    }
}

impl Entity for PoolAggregate {
    const KIND: &'static str = "PoolAggregate";

    fn key(&self) -> String {
        self.id()
    }
}

/// Partial record describing one event's effect on a pool aggregate.
///
/// Cumulative fields hold deltas (the merge performs the addition);
/// point-in-time fields hold replacement values. Everything is optional.
#[derive(Debug, Clone, Default)]
pub struct PoolDiff {
    // Cumulative deltas (base-1e18)
    pub volume0: Option<BigInt>,
    pub volume1: Option<BigInt>,
    pub volume_usd: Option<BigInt>,
    pub volume_usd_whitelisted: Option<BigInt>,
    pub fees0: Option<BigInt>,
    pub fees1: Option<BigInt>,
    pub fees_usd: Option<BigInt>,
    pub fees_usd_whitelisted: Option<BigInt>,
    pub swaps: Option<u64>,
    pub emissions_usd: Option<BigInt>,
    pub bribes_usd: Option<BigInt>,

    // Point-in-time overwrites
    pub reserve0: Option<BigInt>,
    pub reserve1: Option<BigInt>,
    pub total_liquidity_usd: Option<BigInt>,
    pub token0_price: Option<BigInt>,
    pub token1_price: Option<BigInt>,
    pub gauge_is_alive: Option<bool>,
}

impl PoolDiff {
    /// Diff for a swap event.
    ///
    /// Amounts are the event's net amounts (any sign); per-token volume is
    /// the normalized magnitude. The USD volume counts exactly one side:
    /// token0's value when its amount is nonzero, token1's otherwise.
    /// `both_whitelisted` gates the whitelisted-pair counters.
    #[allow(clippy::too_many_arguments)]
    pub fn from_swap(
        amount0: &BigInt,
        amount1: &BigInt,
        token0_decimals: u8,
        token1_decimals: u8,
        token0_price: &BigInt,
        token1_price: &BigInt,
        both_whitelisted: bool,
    ) -> Self {
        let normalized0 = normalize_to_1e18(&abs(amount0), token0_decimals);
        let normalized1 = normalize_to_1e18(&abs(amount1), token1_decimals);

        let volume_usd = if !amount0.is_zero() {
            mul_1e18(&normalized0, token0_price)
        } else {
            mul_1e18(&normalized1, token1_price)
        };

        Self {
            volume0: Some(normalized0),
            volume1: Some(normalized1),
            volume_usd_whitelisted: both_whitelisted.then(|| volume_usd.clone()),
            volume_usd: Some(volume_usd),
            swaps: Some(1),
            ..Default::default()
        }
    }

    /// Diff for a reserve sync event.
    ///
    /// Reserves are stored raw (unnormalized); the USD liquidity overwrite is
    /// computed from reserves normalized to 1e18 scale times token prices.
    pub fn from_sync(
        reserve0: BigInt,
        reserve1: BigInt,
        token0_decimals: u8,
        token1_decimals: u8,
        token0_price: &BigInt,
        token1_price: &BigInt,
    ) -> Self {
        let liquidity_usd = mul_1e18(&normalize_to_1e18(&reserve0, token0_decimals), token0_price)
            + mul_1e18(&normalize_to_1e18(&reserve1, token1_decimals), token1_price);

        Self {
            reserve0: Some(reserve0),
            reserve1: Some(reserve1),
            total_liquidity_usd: Some(liquidity_usd),
            ..Default::default()
        }
    }

    /// Diff for collected trading fees.
    #[allow(clippy::too_many_arguments)]
    pub fn from_fees(
        fee0: &BigInt,
        fee1: &BigInt,
        token0_decimals: u8,
        token1_decimals: u8,
        token0_price: &BigInt,
        token1_price: &BigInt,
        both_whitelisted: bool,
    ) -> Self {
        let normalized0 = normalize_to_1e18(&abs(fee0), token0_decimals);
        let normalized1 = normalize_to_1e18(&abs(fee1), token1_decimals);
        let fees_usd =
            mul_1e18(&normalized0, token0_price) + mul_1e18(&normalized1, token1_price);

        Self {
            fees0: Some(normalized0),
            fees1: Some(normalized1),
            fees_usd_whitelisted: both_whitelisted.then(|| fees_usd.clone()),
            fees_usd: Some(fees_usd),
            ..Default::default()
        }
    }

    /// Diff for a gauge emissions distribution, valued in USD.
    pub fn from_emissions(amount_usd: BigInt) -> Self {
        Self {
            emissions_usd: Some(amount_usd),
            ..Default::default()
        }
    }

    /// Diff for a bribe deposit, valued in USD.
    pub fn from_bribe(amount_usd: BigInt) -> Self {
        Self {
            bribes_usd: Some(amount_usd),
            ..Default::default()
        }
    }

    /// Diff updating the pool's current token USD prices.
    pub fn from_prices(token0_price: BigInt, token1_price: BigInt) -> Self {
        Self {
            token0_price: Some(token0_price),
            token1_price: Some(token1_price),
            ..Default::default()
        }
    }

    /// Diff toggling the gauge liveness flag.
    pub fn gauge_liveness(alive: bool) -> Self {
        Self {
            gauge_is_alive: Some(alive),
            ..Default::default()
        }
    }
}

/// Immutable point-in-time copy of a pool aggregate.
///
/// Primary Key: `<chainId>-<poolAddress>_<epochMillis>`
/// Created only when the snapshot policy fires; never mutated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub id: String,
    /// Back-reference to the pool aggregate id.
    pub pool: String,
    pub timestamp: DateTime<Utc>,
    pub chain_id: u64,
    pub address: String,
    #[serde(with = "serde_bigint")]
    pub total_volume0: BigInt,
    #[serde(with = "serde_bigint")]
    pub total_volume1: BigInt,
    #[serde(with = "serde_bigint")]
    pub total_volume_usd: BigInt,
    #[serde(with = "serde_bigint")]
    pub total_volume_usd_whitelisted: BigInt,
    #[serde(with = "serde_bigint")]
    pub total_fees0: BigInt,
    #[serde(with = "serde_bigint")]
    pub total_fees1: BigInt,
    #[serde(with = "serde_bigint")]
    pub total_fees_usd: BigInt,
    #[serde(with = "serde_bigint")]
    pub total_fees_usd_whitelisted: BigInt,
    pub number_of_swaps: u64,
    #[serde(with = "serde_bigint")]
    pub total_emissions_usd: BigInt,
    #[serde(with = "serde_bigint")]
    pub total_bribes_usd: BigInt,
    #[serde(with = "serde_bigint")]
    pub reserve0: BigInt,
    #[serde(with = "serde_bigint")]
    pub reserve1: BigInt,
    #[serde(with = "serde_bigint")]
    pub total_liquidity_usd: BigInt,
    #[serde(with = "serde_bigint")]
    pub token0_price: BigInt,
    #[serde(with = "serde_bigint")]
    pub token1_price: BigInt,
    pub gauge_is_alive: bool,
}

impl Entity for PoolSnapshot {
    const KIND: &'static str = "PoolSnapshot";

    fn key(&self) -> String {
        self.id.clone()
    }
}

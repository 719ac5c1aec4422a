use chrono::{DateTime, Utc};
use num_bigint::BigInt;
use num_traits::Zero;
use serde::{Deserialize, Serialize};

use crate::store::Entity;
use crate::utils::serde_bigint;

/// Vote-escrow NFT lock aggregate.
///
/// Primary Key: `<chainId>_<tokenId>`
/// Mutated by deposit/withdraw/transfer diffs; the locked total saturates at
/// zero rather than going negative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VeNftAggregate {
    pub chain_id: u64,
    pub token_id: u64,
    pub owner: String,
    pub lock_time: Option<DateTime<Utc>>,
    /// Cumulative locked value, base-1e18.
    #[serde(with = "serde_bigint")]
    pub total_locked: BigInt,
    pub is_alive: bool,
    pub last_updated_timestamp: DateTime<Utc>,
}

impl VeNftAggregate {
    pub fn new(chain_id: u64, token_id: u64, owner: String, created_at: DateTime<Utc>) -> Self {
        Self {
            chain_id,
            token_id,
            owner: owner.to_lowercase(),
            lock_time: None,
            total_locked: BigInt::zero(),
            is_alive: true,
            last_updated_timestamp: created_at,
        }
    }

    pub fn id(&self) -> String {
        Self::storage_key(self.chain_id, self.token_id)
    }

    pub fn storage_key(chain_id: u64, token_id: u64) -> String {
        format!("{chain_id}_{token_id}")
    }

    /// Merge a delta diff, stamping the update time.
    pub fn apply(&self, diff: &VeNftDiff, timestamp: DateTime<Utc>) -> VeNftAggregate {
        let mut next = self.clone();

        if let Some(delta) = &diff.locked_delta {
            next.total_locked += delta;
            // No negative locks: a withdraw larger than the tracked total
            // saturates at zero.
            if next.total_locked < BigInt::zero() {
                next.total_locked = BigInt::zero();
            }
        }
        if let Some(owner) = &diff.owner {
            next.owner = owner.to_lowercase();
        }
        if let Some(lock_time) = diff.lock_time {
            next.lock_time = Some(lock_time);
        }
        if let Some(alive) = diff.is_alive {
            next.is_alive = alive;
        }

        next.last_updated_timestamp = timestamp;
        next
    }
}

impl Entity for VeNftAggregate {
    const KIND: &'static str = "VeNftAggregate";

    fn key(&self) -> String {
        self.id()
    }
}

/// Partial record describing one event's effect on a veNFT aggregate.
/// Locked-value changes are deltas; the merge performs the arithmetic.
#[derive(Debug, Clone, Default)]
pub struct VeNftDiff {
    /// Signed change to the locked total (withdraws are negative).
    pub locked_delta: Option<BigInt>,
    pub owner: Option<String>,
    pub lock_time: Option<DateTime<Utc>>,
    pub is_alive: Option<bool>,
}

impl VeNftDiff {
    pub fn deposit(amount: &BigInt, lock_time: DateTime<Utc>) -> Self {
        Self {
            locked_delta: Some(amount.clone()),
            lock_time: Some(lock_time),
            ..Default::default()
        }
    }

    pub fn withdraw(amount: &BigInt) -> Self {
        Self {
            locked_delta: Some(-amount),
            ..Default::default()
        }
    }

    pub fn transfer(new_owner: &str) -> Self {
        Self {
            owner: Some(new_owner.to_string()),
            ..Default::default()
        }
    }

    pub fn liveness(alive: bool) -> Self {
        Self {
            is_alive: Some(alive),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deposit_then_withdraw_nets_out() {
        let nft = VeNftAggregate::new(10, 7, "0xOwner".to_string(), Utc::now());
        let t = Utc::now();

        let after_deposit = nft.apply(&VeNftDiff::deposit(&BigInt::from(500), t), t);
        assert_eq!(after_deposit.total_locked, BigInt::from(500));
        assert_eq!(after_deposit.lock_time, Some(t));

        let after_withdraw = after_deposit.apply(&VeNftDiff::withdraw(&BigInt::from(200)), t);
        assert_eq!(after_withdraw.total_locked, BigInt::from(300));
    }

    #[test]
    fn withdraw_saturates_at_zero() {
        let nft = VeNftAggregate::new(10, 7, "0xOwner".to_string(), Utc::now());
        let t = Utc::now();
        let drained = nft.apply(&VeNftDiff::withdraw(&BigInt::from(1_000)), t);
        assert_eq!(drained.total_locked, BigInt::zero());
    }

    #[test]
    fn transfer_changes_owner_only() {
        let nft = VeNftAggregate::new(10, 7, "0xOwner".to_string(), Utc::now());
        let t = Utc::now();
        let moved = nft.apply(&VeNftDiff::transfer("0xNewOwner"), t);
        assert_eq!(moved.owner, "0xnewowner");
        assert_eq!(moved.total_locked, nft.total_locked);
        assert_eq!(moved.last_updated_timestamp, t);
    }
}

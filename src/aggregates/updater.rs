use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use log::debug;

use crate::models::{PoolAggregate, PoolDiff, VeNftAggregate, VeNftDiff};
use crate::store::{EntityStore, EntityStoreExt};

use super::scheduler::{snapshot_due, SnapshotInterval};

/// Applies partial diffs to long-lived aggregates and materializes
/// time-bucketed snapshots when one is due.
///
/// The caller supplies the previous aggregate (looked up via
/// [`crate::store::load_pool`]); the updater merges, persists, and decides
/// on snapshots. Events for a given pool must arrive in order and exactly
/// once; the merge has no replay-recovery mechanism.
pub struct AggregatorUpdater {
    store: Arc<dyn EntityStore>,
    interval: SnapshotInterval,
}

impl AggregatorUpdater {
    pub fn new(store: Arc<dyn EntityStore>, interval: SnapshotInterval) -> Self {
        Self { store, interval }
    }

    /// Merge `diff` into `previous`, persist the result, and snapshot it if
    /// the policy fires.
    ///
    /// A snapshot is due when the pool has never been snapshotted or when
    /// more than one interval has elapsed since the last snapshot. When it
    /// fires, the snapshot is persisted first and the aggregate is persisted
    /// a second time with `last_snapshot_timestamp` set to `timestamp`.
    pub async fn update_pool(
        &self,
        previous: &PoolAggregate,
        diff: &PoolDiff,
        timestamp: DateTime<Utc>,
    ) -> Result<PoolAggregate> {
        let mut updated = previous.apply(diff, timestamp);
        self.store.set_entity(&updated).await?;

        if snapshot_due(previous.last_snapshot_timestamp, timestamp, self.interval) {
            let snapshot = updated.snapshot();
            debug!(
                "Snapshotting pool {} at {}",
                updated.id(),
                snapshot.timestamp
            );
            self.store.set_entity(&snapshot).await?;

            updated.last_snapshot_timestamp = Some(timestamp);
            self.store.set_entity(&updated).await?;
        }

        Ok(updated)
    }

    /// Merge a veNFT delta diff and persist the result.
    pub async fn update_venft(
        &self,
        previous: &VeNftAggregate,
        diff: &VeNftDiff,
        timestamp: DateTime<Utc>,
    ) -> Result<VeNftAggregate> {
        let updated = previous.apply(diff, timestamp);
        self.store.set_entity(&updated).await?;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::ONE_E18;
    use crate::models::PoolSnapshot;
    use crate::store::{Entity, MemoryStore};
    use chrono::Duration;
    use num_bigint::BigInt;

    fn pool(created_at: DateTime<Utc>) -> PoolAggregate {
        PoolAggregate::new(
            10,
            "0xpool".to_string(),
            "vAMM-A/B".to_string(),
            "0xaaaa".to_string(),
            "0xbbbb".to_string(),
            false,
            false,
            created_at,
        )
    }

    fn swap_diff() -> PoolDiff {
        PoolDiff::from_swap(
            &(BigInt::from(100) * &*ONE_E18),
            &BigInt::from(-99_000_000),
            18,
            6,
            &ONE_E18,
            &ONE_E18,
            true,
        )
    }

    fn updater(store: &Arc<MemoryStore>) -> AggregatorUpdater {
        AggregatorUpdater::new(store.clone(), SnapshotInterval::Hourly)
    }

    #[tokio::test]
    async fn first_update_always_snapshots() {
        let store = Arc::new(MemoryStore::new());
        let t0 = Utc::now();
        let updated = updater(&store)
            .update_pool(&pool(t0), &swap_diff(), t0)
            .await
            .unwrap();

        assert_eq!(store.count(PoolSnapshot::KIND).await, 1);
        assert_eq!(updated.last_snapshot_timestamp, Some(t0));
        assert_eq!(updated.number_of_swaps, 1);
    }

    #[tokio::test]
    async fn rapid_updates_snapshot_once() {
        let store = Arc::new(MemoryStore::new());
        let updater = updater(&store);
        let t0 = Utc::now();

        let first = updater.update_pool(&pool(t0), &swap_diff(), t0).await.unwrap();
        let second = updater
            .update_pool(&first, &swap_diff(), t0 + Duration::seconds(5))
            .await
            .unwrap();

        assert_eq!(store.count(PoolSnapshot::KIND).await, 1);
        assert_eq!(second.last_snapshot_timestamp, Some(t0));
        // Counters still accumulated across both updates
        assert_eq!(second.number_of_swaps, 2);
        assert_eq!(
            second.total_volume_usd,
            BigInt::from(200) * &*ONE_E18
        );
    }

    #[tokio::test]
    async fn stale_snapshot_triggers_new_one() {
        let store = Arc::new(MemoryStore::new());
        let updater = updater(&store);
        let t0 = Utc::now();

        let first = updater.update_pool(&pool(t0), &swap_diff(), t0).await.unwrap();
        let t1 = t0 + Duration::hours(1) + Duration::seconds(1);
        let second = updater.update_pool(&first, &swap_diff(), t1).await.unwrap();

        assert_eq!(store.count(PoolSnapshot::KIND).await, 2);
        assert_eq!(second.last_snapshot_timestamp, Some(t1));
    }

    #[tokio::test]
    async fn snapshot_carries_post_update_totals() {
        let store = Arc::new(MemoryStore::new());
        let t0 = Utc::now();
        let updated = updater(&store)
            .update_pool(&pool(t0), &swap_diff(), t0)
            .await
            .unwrap();

        let key = format!("{}_{}", updated.id(), t0.timestamp_millis());
        let snapshot: PoolSnapshot = store.get_entity(&key).await.unwrap().unwrap();
        assert_eq!(snapshot.pool, updated.id());
        assert_eq!(snapshot.timestamp, t0);
        assert_eq!(snapshot.number_of_swaps, 1);
        assert_eq!(snapshot.total_volume_usd, BigInt::from(100) * &*ONE_E18);
    }

    #[tokio::test]
    async fn updated_aggregate_is_persisted() {
        let store = Arc::new(MemoryStore::new());
        let t0 = Utc::now();
        let updated = updater(&store)
            .update_pool(&pool(t0), &swap_diff(), t0)
            .await
            .unwrap();

        let persisted: PoolAggregate =
            store.get_entity(&updated.id()).await.unwrap().unwrap();
        assert_eq!(persisted.number_of_swaps, 1);
        assert_eq!(persisted.last_snapshot_timestamp, Some(t0));
    }

    #[tokio::test]
    async fn venft_update_persists_merged_aggregate() {
        let store = Arc::new(MemoryStore::new());
        let updater = updater(&store);
        let t0 = Utc::now();

        let nft = VeNftAggregate::new(10, 7, "0xowner".to_string(), t0);
        let updated = updater
            .update_venft(&nft, &VeNftDiff::deposit(&BigInt::from(500), t0), t0)
            .await
            .unwrap();
        assert_eq!(updated.total_locked, BigInt::from(500));

        let persisted: VeNftAggregate =
            store.get_entity(&updated.id()).await.unwrap().unwrap();
        assert_eq!(persisted.total_locked, BigInt::from(500));
    }
}

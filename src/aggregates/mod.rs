//! Incremental aggregate maintenance: diff-merge updates and time-bucketed
//! snapshot materialization.

mod scheduler;
mod updater;

pub use scheduler::{bucket_start, interval_entity_id, snapshot_due, SnapshotInterval};
pub use updater::AggregatorUpdater;

use anyhow::{bail, Result};
use chrono::{DateTime, Duration, Utc};

/// Supported snapshot bucket sizes.
///
/// Anything else is a configuration error and is rejected at startup by
/// [`SnapshotInterval::from_secs`]; nothing here fails per-event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotInterval {
    Hourly,
    Daily,
    Weekly,
}

impl SnapshotInterval {
    pub const fn seconds(self) -> i64 {
        match self {
            SnapshotInterval::Hourly => 3_600,
            SnapshotInterval::Daily => 86_400,
            SnapshotInterval::Weekly => 604_800,
        }
    }

    pub fn duration(self) -> Duration {
        Duration::seconds(self.seconds())
    }

    pub fn from_secs(secs: u64) -> Result<Self> {
        match secs {
            3_600 => Ok(SnapshotInterval::Hourly),
            86_400 => Ok(SnapshotInterval::Daily),
            604_800 => Ok(SnapshotInterval::Weekly),
            other => bail!(
                "unsupported snapshot interval {other}s (supported: 3600, 86400, 604800)"
            ),
        }
    }
}

/// Start of the bucket containing `timestamp`, as epoch seconds:
/// `floor(epochSeconds / bucketSeconds) * bucketSeconds`.
pub fn bucket_start(timestamp: DateTime<Utc>, interval: SnapshotInterval) -> i64 {
    let secs = interval.seconds();
    timestamp.timestamp().div_euclid(secs) * secs
}

/// Interval-bucketed entity id: `<id>-<bucketStart>`.
pub fn interval_entity_id(id: &str, timestamp: DateTime<Utc>, interval: SnapshotInterval) -> String {
    format!("{id}-{}", bucket_start(timestamp, interval))
}

/// Whether a new snapshot is due.
///
/// True when no snapshot was ever taken, or when strictly more than one
/// interval has elapsed since the last one. The comparison basis is always
/// the last snapshot time, never the last update time.
pub fn snapshot_due(
    last_snapshot: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    interval: SnapshotInterval,
) -> bool {
    match last_snapshot {
        None => true,
        Some(previous) => now - previous > interval.duration(),
    }
}

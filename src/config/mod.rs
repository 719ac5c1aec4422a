mod config;

pub use config::{CacheSettings, ChainSettings, Settings, SnapshotSettings};

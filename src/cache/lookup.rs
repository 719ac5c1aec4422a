use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use log::warn;
use serde_json::{Map, Value};

/// The derived-relationship categories a chain keeps on disk.
///
/// Each (category, chain) pair maps to one JSON document at
/// `<root>/<category>-<chainId>.json`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheCategory {
    GaugeToPool,
    BribeToPool,
    PoolTokens,
    TokenMetadata,
    WhitelistedPools,
}

impl CacheCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheCategory::GaugeToPool => "gauge-to-pool",
            CacheCategory::BribeToPool => "bribe-to-pool",
            CacheCategory::PoolTokens => "pool-tokens",
            CacheCategory::TokenMetadata => "token-metadata",
            CacheCategory::WhitelistedPools => "whitelisted-pools",
        }
    }
}

/// Persisted key→value map for relationships that are established once
/// (at contract-registration events) and expensive to reconstruct from
/// history: gauge→pool, bribe→pool, and friends.
///
/// Keys are normalized to lower case on both insert and read. Writes are
/// merge-in: nested objects are merged leaf-wise, never wholesale-replaced,
/// so repeated insertion of the same mapping is idempotent. Every `add`
/// rewrites the whole document; durability is last-write-wins at document
/// granularity, which is fine because exactly one process owns a chain's
/// caches.
pub struct AddressLookupCache {
    path: PathBuf,
    doc: Mutex<Map<String, Value>>,
}

impl AddressLookupCache {
    /// Open the document for (category, chain), loading existing content.
    ///
    /// An absent file yields an empty document. An unreadable or corrupt
    /// file is logged and also yields an empty document; construction never
    /// fails.
    pub fn init(root: &Path, category: CacheCategory, chain_id: u64) -> Self {
        let path = root.join(format!("{}-{chain_id}.json", category.as_str()));
        let doc = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<Map<String, Value>>(&raw) {
                Ok(doc) => doc,
                Err(e) => {
                    warn!(
                        "Lookup cache {} is corrupt, starting empty: {e}",
                        path.display()
                    );
                    Map::new()
                },
            },
            Err(_) => Map::new(),
        };

        Self {
            path,
            doc: Mutex::new(doc),
        }
    }

    /// Stored value for a lower-cased key.
    pub fn read(&self, key: &str) -> Option<Value> {
        self.doc.lock().unwrap().get(&key.to_lowercase()).cloned()
    }

    /// Merge `fields` into the document and persist it.
    ///
    /// Top-level keys are lower-cased. Missing keys are inserted wholesale;
    /// existing nested objects are merged sub-key by sub-key, overwriting
    /// only the provided leaves.
    pub fn add(&self, fields: Map<String, Value>) -> Result<()> {
        let mut doc = self.doc.lock().unwrap();

        for (key, incoming) in fields {
            let key = key.to_lowercase();
            match doc.get_mut(&key) {
                Some(existing) => merge_value(existing, incoming),
                None => {
                    doc.insert(key, incoming);
                },
            }
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create cache dir {}", parent.display()))?;
        }
        let raw = serde_json::to_string(&*doc)?;
        fs::write(&self.path, raw)
            .with_context(|| format!("failed to persist lookup cache {}", self.path.display()))
    }

    pub fn is_empty(&self) -> bool {
        self.doc.lock().unwrap().is_empty()
    }

    pub fn len(&self) -> usize {
        self.doc.lock().unwrap().len()
    }
}

fn merge_value(existing: &mut Value, incoming: Value) {
    match (existing, incoming) {
        (Value::Object(current), Value::Object(new)) => {
            for (k, v) in new {
                match current.get_mut(&k) {
                    Some(slot) => merge_value(slot, v),
                    None => {
                        current.insert(k, v);
                    },
                }
            }
        },
        (slot, new) => *slot = new,
    }
}

use anyhow::Result;
use async_trait::async_trait;
use rustc_hash::FxHashMap;
use serde_json::Value;
use tokio::sync::RwLock;

use super::EntityStore;

/// In-memory entity store keyed by (kind, key).
///
/// Used by unit tests and by embedders that supply their own durability.
#[derive(Default)]
pub struct MemoryStore {
    entities: RwLock<FxHashMap<(String, String), Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records of the given kind.
    pub async fn count(&self, kind: &str) -> usize {
        self.entities
            .read()
            .await
            .keys()
            .filter(|(k, _)| k == kind)
            .count()
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn get_raw(&self, kind: &str, key: &str) -> Result<Option<Value>> {
        Ok(self
            .entities
            .read()
            .await
            .get(&(kind.to_string(), key.to_string()))
            .cloned())
    }

    async fn set_raw(&self, kind: &str, key: &str, value: Value) -> Result<()> {
        self.entities
            .write()
            .await
            .insert((kind.to_string(), key.to_string()), value);
        Ok(())
    }

    async fn delete_raw(&self, kind: &str, key: &str) -> Result<()> {
        self.entities
            .write()
            .await
            .remove(&(kind.to_string(), key.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn set_get_delete_round_trip() {
        let store = MemoryStore::new();
        store
            .set_raw("Token", "10_0xabc", json!({"symbol": "USDC"}))
            .await
            .unwrap();

        let value = store.get_raw("Token", "10_0xabc").await.unwrap();
        assert_eq!(value, Some(json!({"symbol": "USDC"})));
        assert_eq!(store.count("Token").await, 1);

        store.delete_raw("Token", "10_0xabc").await.unwrap();
        assert_eq!(store.get_raw("Token", "10_0xabc").await.unwrap(), None);
    }

    #[tokio::test]
    async fn kinds_are_namespaced() {
        let store = MemoryStore::new();
        store.set_raw("Pool", "k", json!(1)).await.unwrap();
        store.set_raw("Token", "k", json!(2)).await.unwrap();
        assert_eq!(store.get_raw("Pool", "k").await.unwrap(), Some(json!(1)));
        assert_eq!(store.get_raw("Token", "k").await.unwrap(), Some(json!(2)));
    }
}

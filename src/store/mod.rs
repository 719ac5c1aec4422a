//! Entity persistence seam.
//!
//! The aggregation engine reads and writes long-lived records through the
//! [`EntityStore`] trait: get/set/delete by (kind, key) with JSON payloads.
//! The real backing store lives outside this crate; [`MemoryStore`] is the
//! in-process implementation used by tests and embedders.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

mod memory;

pub use memory::MemoryStore;

use crate::models::{PoolAggregate, TokenRecord};

/// A persistable record with a stable kind name and a unique key.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync {
    const KIND: &'static str;

    fn key(&self) -> String;
}

/// Key-value persistence as seen by the aggregation engine.
///
/// Calls look synchronous but may suspend (the backing store is typically
/// remote). Implementations must be safe to share across chain workers.
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn get_raw(&self, kind: &str, key: &str) -> Result<Option<Value>>;
    async fn set_raw(&self, kind: &str, key: &str, value: Value) -> Result<()>;
    async fn delete_raw(&self, kind: &str, key: &str) -> Result<()>;
}

/// Typed convenience layer over [`EntityStore`].
#[async_trait]
pub trait EntityStoreExt: EntityStore {
    async fn get_entity<E>(&self, key: &str) -> Result<Option<E>>
    where
        E: Entity + 'static,
    {
        match self.get_raw(E::KIND, key).await? {
            Some(value) => {
                let entity = serde_json::from_value(value)
                    .with_context(|| format!("corrupt {} record for key {key}", E::KIND))?;
                Ok(Some(entity))
            },
            None => Ok(None),
        }
    }

    async fn set_entity<E>(&self, entity: &E) -> Result<()>
    where
        E: Entity + 'static,
    {
        let value = serde_json::to_value(entity)
            .with_context(|| format!("failed to serialize {} record", E::KIND))?;
        self.set_raw(E::KIND, &entity.key(), value).await
    }

    async fn delete_entity<E>(&self, key: &str) -> Result<()>
    where
        E: Entity + 'static,
    {
        self.delete_raw(E::KIND, key).await
    }
}

impl<S: EntityStore + ?Sized> EntityStoreExt for S {}

/// Result of a pool aggregate lookup.
///
/// Absence is data, not an error: callers match on `NotFound`, log it, and
/// skip the update rather than aborting the encompassing event.
#[derive(Debug)]
pub enum PoolLookup {
    Found(Box<PoolAggregate>),
    NotFound { chain_id: u64, address: String },
}

/// Result of a token record lookup.
#[derive(Debug)]
pub enum TokenLookup {
    Found(Box<TokenRecord>),
    NotFound { chain_id: u64, address: String },
}

pub async fn load_pool(
    store: &dyn EntityStore,
    chain_id: u64,
    address: &str,
) -> Result<PoolLookup> {
    let key = PoolAggregate::storage_key(chain_id, address);
    match store.get_entity::<PoolAggregate>(&key).await? {
        Some(pool) => Ok(PoolLookup::Found(Box::new(pool))),
        None => Ok(PoolLookup::NotFound {
            chain_id,
            address: address.to_lowercase(),
        }),
    }
}

pub async fn load_token(
    store: &dyn EntityStore,
    chain_id: u64,
    address: &str,
) -> Result<TokenLookup> {
    let key = TokenRecord::storage_key(chain_id, address);
    match store.get_entity::<TokenRecord>(&key).await? {
        Some(token) => Ok(TokenLookup::Found(Box::new(token))),
        None => Ok(TokenLookup::NotFound {
            chain_id,
            address: address.to_lowercase(),
        }),
    }
}

use std::future::Future;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use futures::future::{BoxFuture, FutureExt, Shared};
use moka::future::Cache;
use rustc_hash::FxHashMap;

type SharedFetch<V> = Shared<BoxFuture<'static, Result<V, Arc<anyhow::Error>>>>;

/// Collapses concurrent fetches for the same (chain, key) onto a single
/// outstanding operation.
///
/// Completed values live in a bounded cache and are returned without a new
/// fetch. While a fetch is in flight, every caller for the same key awaits
/// the same shared future. The in-flight marker is removed on completion
/// even when the fetch fails, so a failed fetch can be retried by a later
/// call.
pub struct DedupFetchCache<V: Clone + Send + Sync + 'static> {
    resolved: Cache<String, V>,
    in_flight: Arc<Mutex<FxHashMap<String, SharedFetch<V>>>>,
}

impl<V: Clone + Send + Sync + 'static> DedupFetchCache<V> {
    pub fn new(max_capacity: u64) -> Self {
        Self {
            resolved: Cache::builder().max_capacity(max_capacity).build(),
            in_flight: Arc::new(Mutex::new(FxHashMap::default())),
        }
    }

    /// Return the cached value for (chain, key), or run `fetch` to produce
    /// it. At most one underlying fetch is ever outstanding per key,
    /// regardless of how many callers ask concurrently.
    pub async fn get<F>(&self, chain_id: u64, key: &str, fetch: F) -> Result<V>
    where
        F: Future<Output = Result<V>> + Send + 'static,
    {
        let cache_key = format!("{chain_id}:{key}");

        if let Some(value) = self.resolved.get(&cache_key).await {
            return Ok(value);
        }

        let shared = {
            let mut in_flight = self.in_flight.lock().unwrap();
            match in_flight.get(&cache_key) {
                Some(existing) => existing.clone(),
                None => {
                    let resolved = self.resolved.clone();
                    let registry = Arc::clone(&self.in_flight);
                    let owned_key = cache_key.clone();
                    let fut = async move {
                        let outcome = fetch.await.map_err(Arc::new);
                        // Deregister before publishing so a failed fetch is
                        // retryable by the next caller.
                        registry.lock().unwrap().remove(&owned_key);
                        if let Ok(value) = &outcome {
                            resolved.insert(owned_key, value.clone()).await;
                        }
                        outcome
                    }
                    .boxed()
                    .shared();
                    in_flight.insert(cache_key.clone(), fut.clone());
                    fut
                },
            }
        };

        shared.await.map_err(|e| anyhow!("{e:#}"))
    }
}

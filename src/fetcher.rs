//! Fans one logical request out into independent storage calls.

use std::future::Future;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use crate::backend::{BackendResult, StorageBackend};
use crate::metrics::QueryStats;
use crate::models::{LastSample, Series, SeriesInfo, SeriesKey, SeriesQuery};

/// Batch calls keep input order: slot `i` of the output answers input `i`,
/// and a failed call leaves `None` in its slot without touching its siblings.
#[derive(Debug, Clone)]
pub struct SeriesFetcher {
    backend: Arc<dyn StorageBackend>,
    stats: Arc<QueryStats>,
    max_concurrency: usize,
}

impl SeriesFetcher {
    pub fn new(backend: Arc<dyn StorageBackend>, stats: Arc<QueryStats>, max_concurrency: usize) -> Self {
        Self {
            backend,
            stats,
            max_concurrency: max_concurrency.max(1),
        }
    }

    pub async fn fetch_many(&self, queries: Vec<SeriesQuery>) -> Vec<Option<Series>> {
        self.fan_out("query_range", queries, |backend, query| async move {
            let result = backend.query_range(&query).await;
            (query.key(), result)
        })
        .await
    }

    pub async fn fetch_last_many(&self, keys: Vec<SeriesKey>) -> Vec<Option<LastSample>> {
        self.fan_out("query_last", keys, |backend, key| async move {
            let result = backend.query_last(&key).await;
            (key, result)
        })
        .await
    }

    pub async fn fetch_last_raw_many(&self, keys: Vec<SeriesKey>) -> Vec<Option<LastSample>> {
        self.fan_out("query_last_raw", keys, |backend, key| async move {
            let result = backend.query_last_raw(&key).await;
            (key, result)
        })
        .await
    }

    pub async fn fetch_info_many(&self, keys: Vec<SeriesKey>) -> Vec<Option<SeriesInfo>> {
        self.fan_out("query_info", keys, |backend, key| async move {
            let result = backend.query_info(&key).await;
            (key, result)
        })
        .await
    }

    pub async fn fetch_one(&self, query: &SeriesQuery) -> BackendResult<Series> {
        let result = self.backend.query_range(query).await;
        self.record_single("query_range", &query.key(), result)
    }

    pub async fn fetch_last(&self, key: &SeriesKey) -> BackendResult<LastSample> {
        let result = self.backend.query_last(key).await;
        self.record_single("query_last", key, result)
    }

    pub async fn fetch_info(&self, key: &SeriesKey) -> BackendResult<SeriesInfo> {
        let result = self.backend.query_info(key).await;
        self.record_single("query_info", key, result)
    }

    /// Single-item calls hand the error back to the caller after logging it.
    fn record_single<T>(&self, op: &str, key: &SeriesKey, result: BackendResult<T>) -> BackendResult<T> {
        if let Err(e) = &result {
            self.stats.backend_failures.inc();
            warn!("{} failed for {}: {}", op, key.routing_key(), e);
        }
        result
    }

    async fn fan_out<I, T, F, Fut>(&self, op: &'static str, inputs: Vec<I>, call: F) -> Vec<Option<T>>
    where
        F: Fn(Arc<dyn StorageBackend>, I) -> Fut,
        Fut: Future<Output = (SeriesKey, BackendResult<T>)>,
    {
        let total = inputs.len();
        let results: Vec<Option<T>> = stream::iter(inputs)
            .map(|input| call(Arc::clone(&self.backend), input))
            .buffered(self.max_concurrency)
            .map(|(key, result)| match result {
                Ok(value) => Some(value),
                Err(e) => {
                    self.stats.backend_failures.inc();
                    warn!("{} failed for {}: {}", op, key.routing_key(), e);
                    None
                }
            })
            .collect()
            .await;

        debug!(
            "{} finished: {}/{} succeeded",
            op,
            results.iter().filter(|r| r.is_some()).count(),
            total
        );
        results
    }
}

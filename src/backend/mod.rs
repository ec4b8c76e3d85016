//! Storage tier interface.

pub mod http;

use std::fmt::Debug;

use async_trait::async_trait;

use crate::error::BackendError;
use crate::models::{LastSample, Series, SeriesInfo, SeriesKey, SeriesQuery};

pub use self::http::HttpBackend;

pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Point, range and metadata lookups against the sharded storage nodes.
///
/// Every call may fail on its own; callers decide whether a failure aborts
/// the request or only drops one slot of a batch.
#[async_trait]
pub trait StorageBackend: Send + Sync + Debug {
    async fn query_range(&self, query: &SeriesQuery) -> BackendResult<Series>;

    async fn query_last(&self, key: &SeriesKey) -> BackendResult<LastSample>;

    /// Latest sample before consolidation. Storage nodes without a raw view
    /// answer with the regular last sample.
    async fn query_last_raw(&self, key: &SeriesKey) -> BackendResult<LastSample> {
        self.query_last(key).await
    }

    async fn query_info(&self, key: &SeriesKey) -> BackendResult<SeriesInfo>;
}

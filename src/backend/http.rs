//! JSON-over-HTTP client for the storage nodes.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::{BackendResult, StorageBackend};
use crate::config::{Settings, StorageSettings};
use crate::error::{BackendError, GatewayError, Result};
use crate::models::{LastSample, Series, SeriesInfo, SeriesKey, SeriesQuery};
use crate::partitioning;

#[derive(Debug, Clone)]
struct StorageNode {
    name: String,
    base_url: String,
}

/// Routes every series to one storage node by hashing `endpoint/counter`.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    nodes: Vec<StorageNode>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RangeQueryBody<'a> {
    start: i64,
    end: i64,
    consol_fun: &'static str,
    endpoint: &'a str,
    counter: &'a str,
}

impl HttpBackend {
    pub fn new<I, K, V>(nodes: I, storage: &StorageSettings) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let client = Client::builder()
            .connect_timeout(Duration::from_millis(storage.connect_timeout_ms))
            .timeout(Duration::from_millis(storage.call_timeout_ms))
            .build()
            .map_err(|e| GatewayError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        let nodes = nodes
            .into_iter()
            .map(|(name, addr)| StorageNode {
                name: name.into(),
                base_url: normalize_base_url(addr.as_ref()),
            })
            .collect();

        Ok(Self { client, nodes })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(
            settings.backends.iter().map(|(name, addr)| (name.clone(), addr.clone())),
            &settings.storage,
        )
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn node_for(&self, key: &SeriesKey) -> BackendResult<&StorageNode> {
        partitioning::pick(&key.routing_key(), &self.nodes).ok_or(BackendError::NoNodes)
    }

    async fn post<B, T>(&self, key: &SeriesKey, path: &str, body: &B) -> BackendResult<(T, String)>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let node = self.node_for(key)?;
        let url = format!("{}{}", node.base_url, path);
        debug!("Querying {} on node {} ({})", key.routing_key(), node.name, url);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| classify(e, &node.base_url))?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(BackendError::NoSuchSeries {
                endpoint: key.endpoint.clone(),
                counter: key.counter.clone(),
            }),
            status if !status.is_success() => Err(BackendError::Status {
                addr: node.base_url.clone(),
                status: status.as_u16(),
            }),
            _ => {
                let parsed = response.json::<T>().await.map_err(|e| classify(e, &node.base_url))?;
                Ok((parsed, node.base_url.clone()))
            }
        }
    }
}

#[async_trait]
impl StorageBackend for HttpBackend {
    async fn query_range(&self, query: &SeriesQuery) -> BackendResult<Series> {
        let key = query.key();
        let body = RangeQueryBody {
            start: query.window.start,
            end: query.window.end,
            consol_fun: query.consolidation.as_str(),
            endpoint: &query.endpoint,
            counter: &query.counter,
        };
        let (mut series, _): (Series, _) = self.post(&key, "/graph/query", &body).await?;
        if series.endpoint.is_empty() {
            series.endpoint = key.endpoint;
        }
        if series.counter.is_empty() {
            series.counter = key.counter;
        }
        Ok(series)
    }

    async fn query_last(&self, key: &SeriesKey) -> BackendResult<LastSample> {
        let (last, _) = self.post(key, "/graph/last", key).await?;
        Ok(last)
    }

    async fn query_last_raw(&self, key: &SeriesKey) -> BackendResult<LastSample> {
        let (last, _) = self.post(key, "/graph/last/raw", key).await?;
        Ok(last)
    }

    async fn query_info(&self, key: &SeriesKey) -> BackendResult<SeriesInfo> {
        let (mut info, addr): (SeriesInfo, _) = self.post(key, "/graph/info", key).await?;
        if info.addr.is_empty() {
            info.addr = addr;
        }
        Ok(info)
    }
}

fn classify(err: reqwest::Error, addr: &str) -> BackendError {
    if err.is_timeout() {
        BackendError::Timeout {
            addr: addr.to_string(),
        }
    } else if err.is_connect() {
        BackendError::Unavailable {
            addr: addr.to_string(),
            reason: err.to_string(),
        }
    } else {
        BackendError::Http(err)
    }
}

fn normalize_base_url(addr: &str) -> String {
    let addr = addr.trim_end_matches('/');
    if addr.starts_with("http://") || addr.starts_with("https://") {
        addr.to_string()
    } else {
        format!("http://{}", addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consolidation::ConsolidationFunction;
    use crate::models::TimeWindow;

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(normalize_base_url("10.0.0.1:6071"), "http://10.0.0.1:6071");
        assert_eq!(normalize_base_url("https://graph.local/"), "https://graph.local");
    }

    #[test]
    fn test_routing_is_stable() {
        let backend = HttpBackend::new(
            [("graph-00", "10.0.0.1:6071"), ("graph-01", "10.0.0.2:6071")],
            &StorageSettings::default(),
        )
        .unwrap();
        let key = SeriesKey::new("h1", "cpu.load");

        let first = backend.node_for(&key).unwrap().name.clone();
        let second = backend.node_for(&key).unwrap().name.clone();
        assert_eq!(first, second);
        assert_eq!(backend.node_count(), 2);
    }

    #[tokio::test]
    async fn test_no_nodes_fails_each_call() {
        let backend =
            HttpBackend::new(Vec::<(String, String)>::new(), &StorageSettings::default()).unwrap();
        let query = SeriesQuery::new(
            SeriesKey::new("h1", "cpu.load"),
            TimeWindow::new(0, 60),
            ConsolidationFunction::Average,
        );

        assert!(matches!(backend.query_range(&query).await, Err(BackendError::NoNodes)));
        assert!(matches!(
            backend.query_last(&SeriesKey::new("h1", "agent.alive")).await,
            Err(BackendError::NoNodes)
        ));
    }

    #[test]
    fn test_range_body_wire_names() {
        let body = RangeQueryBody {
            start: 1,
            end: 2,
            consol_fun: ConsolidationFunction::Max.as_str(),
            endpoint: "h1",
            counter: "cpu.load",
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["consolFun"], "MAX");
        assert_eq!(value["start"], 1);
    }
}

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, Response, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use metrics_query_gateway::{
    api::{self, AppState},
    backend::{BackendResult, StorageBackend},
    config::Settings,
    metrics::QueryStats,
    models::{LastSample, SamplePoint, Series, SeriesInfo, SeriesKey, SeriesQuery},
    BackendError,
};

/// Storage double keyed by `endpoint/counter`. Unknown keys fail with
/// `NoSuchSeries`, keys in `down` fail with `Unavailable`.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    series: HashMap<String, Vec<SamplePoint>>,
    last: HashMap<String, SamplePoint>,
    down: Vec<String>,
    pub range_calls: Mutex<Vec<SeriesQuery>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_series(mut self, endpoint: &str, counter: &str, points: &[(i64, f64)]) -> Self {
        self.series.insert(
            key(endpoint, counter),
            points.iter().map(|&(ts, v)| SamplePoint::new(ts, v)).collect(),
        );
        self
    }

    pub fn with_last(mut self, endpoint: &str, counter: &str, timestamp: i64, value: f64) -> Self {
        self.last.insert(key(endpoint, counter), SamplePoint::new(timestamp, value));
        self
    }

    pub fn with_down(mut self, endpoint: &str, counter: &str) -> Self {
        self.down.push(key(endpoint, counter));
        self
    }

    fn check(&self, k: &SeriesKey) -> BackendResult<()> {
        if self.down.contains(&k.routing_key()) {
            return Err(BackendError::Unavailable {
                addr: "graph-00".to_string(),
                reason: "connection refused".to_string(),
            });
        }
        Ok(())
    }

    fn missing(k: &SeriesKey) -> BackendError {
        BackendError::NoSuchSeries {
            endpoint: k.endpoint.clone(),
            counter: k.counter.clone(),
        }
    }
}

fn key(endpoint: &str, counter: &str) -> String {
    format!("{}/{}", endpoint, counter)
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn query_range(&self, query: &SeriesQuery) -> BackendResult<Series> {
        self.range_calls.lock().unwrap().push(query.clone());
        let k = query.key();
        self.check(&k)?;
        let points = self.series.get(&k.routing_key()).ok_or_else(|| Self::missing(&k))?;
        Ok(Series::new(k.counter.clone(), points.clone()).with_endpoint(k.endpoint))
    }

    async fn query_last(&self, k: &SeriesKey) -> BackendResult<LastSample> {
        self.check(k)?;
        let value = *self.last.get(&k.routing_key()).ok_or_else(|| Self::missing(k))?;
        Ok(LastSample {
            endpoint: k.endpoint.clone(),
            counter: k.counter.clone(),
            value,
        })
    }

    async fn query_info(&self, k: &SeriesKey) -> BackendResult<SeriesInfo> {
        self.check(k)?;
        if !self.series.contains_key(&k.routing_key()) {
            return Err(Self::missing(k));
        }
        Ok(SeriesInfo {
            endpoint: k.endpoint.clone(),
            counter: k.counter.clone(),
            consol_fun: "AVERAGE".to_string(),
            step: 60,
            filename: format!("/data/{}.rrd", k.routing_key()),
            addr: "graph-00".to_string(),
        })
    }
}

pub struct TestApp {
    pub router: Router,
    pub stats: Arc<QueryStats>,
    pub backend: Arc<MemoryBackend>,
}

pub fn app(backend: MemoryBackend) -> TestApp {
    let backend = Arc::new(backend);
    let stats = Arc::new(QueryStats::new().unwrap());
    let state = AppState::new(backend.clone(), Arc::clone(&stats), &Settings::default());

    TestApp {
        router: api::router(state),
        stats,
        backend,
    }
}

pub async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    send(router, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

pub async fn post(router: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(
        router,
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    json_body(response).await
}

async fn json_body(response: Response<Body>) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or_else(|_| {
        Value::String(String::from_utf8_lossy(&bytes).into_owned())
    });
    (status, value)
}

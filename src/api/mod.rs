pub mod graph;
pub mod proc;

use std::sync::Arc;

use axum::{
    http::Method,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    backend::StorageBackend,
    config::Settings,
    fetcher::SeriesFetcher,
    metrics::QueryStats,
};

#[derive(Clone)]
pub struct AppState {
    pub fetcher: Arc<SeriesFetcher>,
    pub stats: Arc<QueryStats>,
    pub liveness_threshold_secs: i64,
}

impl AppState {
    pub fn new(backend: Arc<dyn StorageBackend>, stats: Arc<QueryStats>, settings: &Settings) -> Self {
        let fetcher = SeriesFetcher::new(
            backend,
            Arc::clone(&stats),
            settings.storage.max_concurrency,
        );

        Self {
            fetcher: Arc::new(fetcher),
            stats,
            liveness_threshold_secs: settings.liveness.threshold_secs,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/graph/history", post(graph::history))
        .route("/graph/history/one", get(graph::history_one))
        .route("/graph/info", post(graph::info))
        .route("/graph/info/one", get(graph::info_one))
        .route("/graph/last", post(graph::last))
        .route("/graph/last/raw", post(graph::last_raw))
        .route("/graph/sdp/one", get(graph::chart))
        .route("/graph/sdp/alive", post(graph::alive))
        .route("/counter/all", get(proc::counters))
        .route("/metrics", get(proc::metrics_text))
        .route("/health", get(proc::health))
        .route("/version", get(proc::version))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

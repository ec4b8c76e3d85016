use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};

use super::AppState;
use crate::Result;

pub async fn counters(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "msg": "success",
        "data": state.stats.snapshot(),
    }))
}

pub async fn metrics_text(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let body = state.stats.encode()?;
    Ok(([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body))
}

pub async fn health() -> &'static str {
    "ok"
}

pub async fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

use axum::{
    extract::{rejection::{JsonRejection, QueryRejection}, Query, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, info};

use super::AppState;
use crate::{
    align::{self, AlignmentStrategy},
    consolidation,
    duration,
    liveness::{self, HEARTBEAT_COUNTER},
    models::{
        AlignedTable, AliveRequest, HistoryRequest, LastSample, LivenessRecord, Series,
        SeriesInfo, SeriesKey, SeriesQuery, TimeWindow,
    },
    GatewayError, Result,
};

/// Default look-back for `/graph/history/one` when `start` is not a number.
const DEFAULT_HISTORY_SECS: i64 = 3600;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct HistoryOneParams {
    pub start: String,
    pub end: String,
    pub cf: String,
    pub endpoint: String,
    pub counter: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SeriesKeyParams {
    pub endpoint: String,
    pub counter: String,
}

/// Query string of the chart route. `counter` may repeat; for every other
/// key only the first occurrence counts.
#[derive(Debug, Default)]
struct ChartParams {
    duration: String,
    cf: String,
    endpoint: String,
    counters: Vec<String>,
}

impl ChartParams {
    fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let (mut duration, mut cf, mut endpoint) = (None, None, None);
        let mut counters = Vec::new();
        for (key, value) in pairs {
            match key.as_str() {
                "duration" => {
                    duration.get_or_insert(value);
                }
                "cf" => {
                    cf.get_or_insert(value);
                }
                "endpoint" => {
                    endpoint.get_or_insert(value);
                }
                "counter" if !value.is_empty() => counters.push(value),
                _ => {}
            }
        }

        ChartParams {
            duration: duration.unwrap_or_default(),
            cf: cf.unwrap_or_default(),
            endpoint: endpoint.unwrap_or_default(),
            counters,
        }
    }
}

/// Rejects an empty array; `null` entries inside a non-empty one are skipped.
fn non_null_keys(Json(keys): Json<Vec<Option<SeriesKey>>>) -> Result<Vec<SeriesKey>> {
    if keys.is_empty() {
        return Err(GatewayError::EmptyRequest);
    }
    Ok(keys.into_iter().flatten().collect())
}

pub async fn history(
    State(state): State<AppState>,
    payload: std::result::Result<Json<HistoryRequest>, JsonRejection>,
) -> Result<Json<Vec<Series>>> {
    let _timer = state.stats.start_request("graph_history");
    state.stats.history_requests.inc();

    let Json(request) = payload?;
    if request.endpoint_counters.is_empty() {
        return Err(GatewayError::EmptyRequest);
    }
    let cf = consolidation::parse_or_default(&request.cf)?;
    let window = TimeWindow::new(request.start, request.end);

    let queries = request
        .endpoint_counters
        .into_iter()
        .map(|key| SeriesQuery::new(key, window, cf))
        .collect::<Vec<_>>();
    let requested = queries.len();

    let data: Vec<Series> = state.fetcher.fetch_many(queries).await.into_iter().flatten().collect();

    state.stats.history_response_counters.inc_by(data.len() as u64);
    state
        .stats
        .history_response_items
        .inc_by(data.iter().map(|s| s.len() as u64).sum());
    info!("History: {}/{} series over [{}, {}] {}", data.len(), requested, window.start, window.end, cf);

    Ok(Json(data))
}

pub async fn history_one(
    State(state): State<AppState>,
    params: std::result::Result<Query<HistoryOneParams>, QueryRejection>,
) -> Result<Json<Series>> {
    let _timer = state.stats.start_request("graph_history_one");
    let Query(params) = params?;

    let key = SeriesKey::new(params.endpoint, params.counter);
    if !key.is_complete() {
        return Err(GatewayError::MissingIdentity);
    }
    let cf = consolidation::parse_or_default(&params.cf)?;

    let now = Utc::now().timestamp();
    let start = params.start.parse::<i64>().unwrap_or(now - DEFAULT_HISTORY_SECS);
    let end = params.end.parse::<i64>().unwrap_or(now);

    let query = SeriesQuery::new(key, TimeWindow::new(start, end), cf);
    let series = state.fetcher.fetch_one(&query).await?;
    debug!("History one {}: {} points", query.key().routing_key(), series.len());

    Ok(Json(series))
}

pub async fn info(
    State(state): State<AppState>,
    payload: std::result::Result<Json<Vec<Option<SeriesKey>>>, JsonRejection>,
) -> Result<Json<Vec<SeriesInfo>>> {
    let _timer = state.stats.start_request("graph_info");
    state.stats.info_requests.inc();

    let keys = non_null_keys(payload?)?;

    let data: Vec<SeriesInfo> = state.fetcher.fetch_info_many(keys).await.into_iter().flatten().collect();
    Ok(Json(data))
}

pub async fn info_one(
    State(state): State<AppState>,
    params: std::result::Result<Query<SeriesKeyParams>, QueryRejection>,
) -> Result<Json<SeriesInfo>> {
    let _timer = state.stats.start_request("graph_info_one");
    let Query(params) = params?;

    let key = SeriesKey::new(params.endpoint, params.counter);
    if !key.is_complete() {
        return Err(GatewayError::MissingIdentity);
    }

    let info = state.fetcher.fetch_info(&key).await?;
    Ok(Json(info))
}

pub async fn last(
    State(state): State<AppState>,
    payload: std::result::Result<Json<Vec<Option<SeriesKey>>>, JsonRejection>,
) -> Result<Json<Vec<LastSample>>> {
    let _timer = state.stats.start_request("graph_last");
    state.stats.last_requests.inc();

    let keys = non_null_keys(payload?)?;

    let data: Vec<LastSample> = state.fetcher.fetch_last_many(keys).await.into_iter().flatten().collect();
    state.stats.last_request_items.inc_by(data.len() as u64);
    Ok(Json(data))
}

pub async fn last_raw(
    State(state): State<AppState>,
    payload: std::result::Result<Json<Vec<Option<SeriesKey>>>, JsonRejection>,
) -> Result<Json<Vec<LastSample>>> {
    let _timer = state.stats.start_request("graph_last_raw");
    state.stats.last_raw_requests.inc();

    let keys = non_null_keys(payload?)?;

    let data: Vec<LastSample> = state
        .fetcher
        .fetch_last_raw_many(keys)
        .await
        .into_iter()
        .flatten()
        .collect();
    state.stats.last_raw_request_items.inc_by(data.len() as u64);
    Ok(Json(data))
}

/// Several counters of one endpoint over a relative duration, aligned for charting.
pub async fn chart(
    State(state): State<AppState>,
    pairs: std::result::Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<AlignedTable>> {
    let _timer = state.stats.start_request("graph_chart");
    state.stats.chart_requests.inc();

    let Query(pairs) = pairs?;
    let params = ChartParams::from_pairs(pairs);

    if params.endpoint.is_empty() || params.counters.is_empty() {
        return Err(GatewayError::MissingIdentity);
    }
    let cf = consolidation::parse_or_default(&params.cf)?;

    let window = duration::resolve(&params.duration);
    if window.is_sentinel() {
        return Err(GatewayError::InvalidWindow);
    }

    let queries = params
        .counters
        .iter()
        .map(|counter| SeriesQuery::new(SeriesKey::new(params.endpoint.clone(), counter.clone()), window, cf))
        .collect();

    let series: Vec<Series> = state.fetcher.fetch_many(queries).await.into_iter().flatten().collect();
    let table = align::align_with(AlignmentStrategy::Positional, &series);
    debug!(
        "Chart {}: {} of {} counters, {} slots",
        params.endpoint,
        series.len(),
        params.counters.len(),
        table.timestamps.len()
    );

    Ok(Json(table))
}

pub async fn alive(
    State(state): State<AppState>,
    payload: std::result::Result<Json<Vec<AliveRequest>>, JsonRejection>,
) -> Result<Json<Vec<LivenessRecord>>> {
    let _timer = state.stats.start_request("graph_alive");
    state.stats.alive_requests.inc();

    let Json(requests) = payload?;
    if requests.is_empty() {
        return Err(GatewayError::EmptyRequest);
    }

    let keys: Vec<SeriesKey> = requests
        .iter()
        .map(|r| SeriesKey::new(r.endpoint.clone(), HEARTBEAT_COUNTER))
        .collect();
    let samples = state.fetcher.fetch_last_many(keys).await;

    let now = Utc::now().timestamp();
    let records = requests
        .into_iter()
        .zip(samples)
        .map(|(request, last)| {
            liveness::evaluate(
                request.endpoint,
                last.as_ref().map(|l| &l.value),
                now,
                state.liveness_threshold_secs,
            )
        })
        .collect();

    Ok(Json(records))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_null_keys_are_skipped() {
        let keys = non_null_keys(Json(vec![None, Some(SeriesKey::new("h1", "cpu.load")), None])).unwrap();
        assert_eq!(keys, vec![SeriesKey::new("h1", "cpu.load")]);

        assert!(non_null_keys(Json(vec![None])).unwrap().is_empty());
        assert!(matches!(non_null_keys(Json(Vec::new())), Err(GatewayError::EmptyRequest)));
    }

    #[test]
    fn test_chart_params_collect_repeated_counters() {
        let params = ChartParams::from_pairs(pairs(&[
            ("endpoint", "h1"),
            ("counter", "cpu.load"),
            ("duration", "3h"),
            ("counter", "mem.used"),
            ("endpoint", "h2"),
            ("counter", ""),
        ]));

        assert_eq!(params.endpoint, "h1");
        assert_eq!(params.duration, "3h");
        assert_eq!(params.counters, vec!["cpu.load", "mem.used"]);
        assert!(params.cf.is_empty());
    }
}

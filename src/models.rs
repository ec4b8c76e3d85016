use std::collections::BTreeMap;

use serde::{Deserialize, Serialize, Serializer};

use crate::consolidation::ConsolidationFunction;

/// Absolute query window in unix seconds.
///
/// `{0, 0}` is the sentinel for a window that could not be resolved and must
/// never be sent to storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: i64,
    pub end: i64,
}

impl TimeWindow {
    pub const SENTINEL: TimeWindow = TimeWindow { start: 0, end: 0 };

    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    pub fn is_sentinel(&self) -> bool {
        *self == Self::SENTINEL
    }

    pub fn span_secs(&self) -> i64 {
        self.end - self.start
    }
}

/// Identity of one series on the storage tier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeriesKey {
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub counter: String,
}

impl SeriesKey {
    pub fn new(endpoint: impl Into<String>, counter: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            counter: counter.into(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.endpoint.is_empty() && !self.counter.is_empty()
    }

    /// Routing key used to pick a storage node.
    pub fn routing_key(&self) -> String {
        format!("{}/{}", self.endpoint, self.counter)
    }
}

/// A single range query, consumed once by the fetcher.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesQuery {
    pub endpoint: String,
    pub counter: String,
    pub window: TimeWindow,
    pub consolidation: ConsolidationFunction,
}

impl SeriesQuery {
    pub fn new(key: SeriesKey, window: TimeWindow, consolidation: ConsolidationFunction) -> Self {
        Self {
            endpoint: key.endpoint,
            counter: key.counter,
            window,
            consolidation,
        }
    }

    pub fn key(&self) -> SeriesKey {
        SeriesKey::new(self.endpoint.clone(), self.counter.clone())
    }
}

/// One sample. A NaN value means the slot holds no data and is rendered as `null`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SamplePoint {
    pub timestamp: i64,
    #[serde(with = "nan_as_null")]
    pub value: f64,
}

impl SamplePoint {
    pub fn new(timestamp: i64, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// Points of one counter, ascending by timestamp as returned by storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Series {
    #[serde(default)]
    pub endpoint: String,
    pub counter: String,
    #[serde(default)]
    pub dstype: String,
    #[serde(default)]
    pub step: i64,
    #[serde(rename = "Values", alias = "values", default)]
    pub points: Vec<SamplePoint>,
}

impl Series {
    pub fn new(counter: impl Into<String>, points: Vec<SamplePoint>) -> Self {
        Self {
            endpoint: String::new(),
            counter: counter.into(),
            dstype: String::new(),
            step: 0,
            points,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Chart-ready columns sharing one timestamp axis.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AlignedTable {
    #[serde(rename = "timestamp")]
    pub timestamps: Vec<i64>,
    #[serde(rename = "data", serialize_with = "serialize_columns")]
    pub columns: BTreeMap<String, Vec<f64>>,
}

impl AlignedTable {
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty() && self.columns.is_empty()
    }

    pub fn column(&self, counter: &str) -> Option<&[f64]> {
        self.columns.get(counter).map(Vec::as_slice)
    }
}

/// Most recent sample of a series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LastSample {
    pub endpoint: String,
    pub counter: String,
    pub value: SamplePoint,
}

/// Storage-side metadata for a series.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesInfo {
    pub endpoint: String,
    pub counter: String,
    #[serde(default)]
    pub consol_fun: String,
    #[serde(default)]
    pub step: i64,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub addr: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LivenessRecord {
    pub endpoint: String,
    #[serde(rename = "status", serialize_with = "serialize_status")]
    pub alive: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryRequest {
    #[serde(default)]
    pub start: i64,
    #[serde(default)]
    pub end: i64,
    #[serde(default)]
    pub cf: String,
    #[serde(default)]
    pub endpoint_counters: Vec<SeriesKey>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AliveRequest {
    #[serde(default)]
    pub endpoint: String,
}

mod nan_as_null {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else {
            serializer.serialize_none()
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
    }
}

struct NullableColumn<'a>(&'a [f64]);

impl Serialize for NullableColumn<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter().map(|v| v.is_finite().then_some(*v)))
    }
}

fn serialize_columns<S: Serializer>(
    columns: &BTreeMap<String, Vec<f64>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_map(columns.iter().map(|(k, v)| (k, NullableColumn(v))))
}

fn serialize_status<S: Serializer>(alive: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u8(u8::from(*alive))
}

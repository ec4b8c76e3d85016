//! Heartbeat freshness checks.

use crate::models::{LivenessRecord, SamplePoint};

/// Counter every agent reports on each heartbeat.
pub const HEARTBEAT_COUNTER: &str = "agent.alive";

pub const DEFAULT_THRESHOLD_SECS: i64 = 120;

/// An age that does not fit in `i64` is never fresh.
pub fn is_alive(last_sample_timestamp: i64, now: i64, threshold_secs: i64) -> bool {
    now.checked_sub(last_sample_timestamp)
        .is_some_and(|age| age <= threshold_secs)
}

/// A missing heartbeat sample always reports not-alive.
pub fn evaluate(
    endpoint: impl Into<String>,
    last: Option<&SamplePoint>,
    now: i64,
    threshold_secs: i64,
) -> LivenessRecord {
    let alive = last.is_some_and(|sample| is_alive(sample.timestamp, now, threshold_secs));
    LivenessRecord {
        endpoint: endpoint.into(),
        alive,
    }
}

//! Relative duration tokens such as `3h` or `7d`.

use chrono::Utc;

use crate::models::TimeWindow;

const SECS_PER_HOUR: i64 = 60 * 60;
const SECS_PER_DAY: i64 = 24 * SECS_PER_HOUR;

/// Resolves `token` into a window ending at the current wall-clock second.
///
/// Returns [`TimeWindow::SENTINEL`] for an unsupported suffix. An unparseable
/// magnitude is treated as `1`, so `"xh"` silently becomes a one hour window.
pub fn resolve(token: &str) -> TimeWindow {
    resolve_at(token, Utc::now().timestamp())
}

/// Same as [`resolve`] with an explicit `now`; both ends share that instant.
pub fn resolve_at(token: &str, now: i64) -> TimeWindow {
    let (magnitude, unit) = if let Some(m) = token.strip_suffix('h') {
        (m, SECS_PER_HOUR)
    } else if let Some(m) = token.strip_suffix('d') {
        (m, SECS_PER_DAY)
    } else {
        return TimeWindow::SENTINEL;
    };

    let magnitude = magnitude.parse::<u64>().unwrap_or(1);

    match i64::try_from(magnitude)
        .ok()
        .and_then(|m| m.checked_mul(unit))
        .and_then(|span| now.checked_sub(span))
    {
        Some(start) => TimeWindow::new(start, now),
        None => TimeWindow::SENTINEL,
    }
}

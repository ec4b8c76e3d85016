use std::collections::BTreeMap;
use std::fmt;

use prometheus::{
    Encoder, HistogramOpts, HistogramTimer, HistogramVec, IntCounter, Opts, Registry, TextEncoder,
};

use crate::error::{GatewayError, Result};

/// Request statistics. Owned by the application state and shared behind an
/// `Arc`; every counter is safe to bump from concurrent handlers.
#[derive(Clone)]
pub struct QueryStats {
    registry: Registry,

    pub history_requests: IntCounter,
    pub history_response_counters: IntCounter,
    pub history_response_items: IntCounter,

    pub info_requests: IntCounter,

    pub last_requests: IntCounter,
    pub last_request_items: IntCounter,
    pub last_raw_requests: IntCounter,
    pub last_raw_request_items: IntCounter,

    pub chart_requests: IntCounter,
    pub alive_requests: IntCounter,

    pub backend_failures: IntCounter,

    request_duration: HistogramVec,
}

impl QueryStats {
    pub fn new() -> Result<Self> {
        let registry = Registry::new_custom(Some("query".to_string()), None)
            .map_err(|e| GatewayError::Internal(format!("Failed to create registry: {}", e)))?;

        let stats = Self {
            history_requests: counter(&registry, "history_requests_total", "Number of history requests")?,
            history_response_counters: counter(
                &registry,
                "history_response_counters_total",
                "Number of series returned by history requests",
            )?,
            history_response_items: counter(
                &registry,
                "history_response_items_total",
                "Number of points returned by history requests",
            )?,
            info_requests: counter(&registry, "info_requests_total", "Number of info requests")?,
            last_requests: counter(&registry, "last_requests_total", "Number of last requests")?,
            last_request_items: counter(
                &registry,
                "last_request_items_total",
                "Number of samples returned by last requests",
            )?,
            last_raw_requests: counter(&registry, "last_raw_requests_total", "Number of last/raw requests")?,
            last_raw_request_items: counter(
                &registry,
                "last_raw_request_items_total",
                "Number of samples returned by last/raw requests",
            )?,
            chart_requests: counter(&registry, "chart_requests_total", "Number of aligned chart requests")?,
            alive_requests: counter(&registry, "alive_requests_total", "Number of alive-check requests")?,
            backend_failures: counter(
                &registry,
                "backend_failures_total",
                "Storage calls that failed",
            )?,
            request_duration: {
                let histogram = HistogramVec::new(
                    HistogramOpts::new("request_duration_seconds", "Request duration in seconds")
                        .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0]),
                    &["route"],
                )
                .map_err(register_error)?;
                registry.register(Box::new(histogram.clone())).map_err(register_error)?;
                histogram
            },
            registry,
        };

        Ok(stats)
    }

    /// Starts a timer observed into `request_duration_seconds{route}` on drop.
    pub fn start_request(&self, route: &str) -> RequestTimer {
        RequestTimer {
            _timer: self.request_duration.with_label_values(&[route]).start_timer(),
        }
    }

    /// Counter values keyed by metric name, for the `/counter/all` view.
    pub fn snapshot(&self) -> BTreeMap<String, u64> {
        self.registry
            .gather()
            .iter()
            .filter(|family| family.get_field_type() == prometheus::proto::MetricType::COUNTER)
            .map(|family| {
                let total = family
                    .get_metric()
                    .iter()
                    .map(|m| m.get_counter().get_value())
                    .sum::<f64>();
                (family.get_name().to_string(), total as u64)
            })
            .collect()
    }

    /// Prometheus text exposition of everything in the registry.
    pub fn encode(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(|e| GatewayError::Internal(format!("Failed to encode metrics: {}", e)))?;
        String::from_utf8(buffer)
            .map_err(|e| GatewayError::Internal(format!("Metrics are not UTF-8: {}", e)))
    }
}

impl fmt::Debug for QueryStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryStats")
            .field("counters", &self.snapshot())
            .finish_non_exhaustive()
    }
}

pub struct RequestTimer {
    _timer: HistogramTimer,
}

fn counter(registry: &Registry, name: &str, help: &str) -> Result<IntCounter> {
    let counter = IntCounter::with_opts(Opts::new(name, help)).map_err(register_error)?;
    registry.register(Box::new(counter.clone())).map_err(register_error)?;
    Ok(counter)
}

fn register_error(err: prometheus::Error) -> GatewayError {
    GatewayError::Internal(format!("Failed to register metric: {}", err))
}

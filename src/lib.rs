pub mod align;
pub mod api;
pub mod backend;
pub mod config;
pub mod consolidation;
pub mod duration;
pub mod error;
pub mod fetcher;
pub mod liveness;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod partitioning;

pub use error::{BackendError, GatewayError, Result};

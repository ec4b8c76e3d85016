use tracing_subscriber::{
    fmt,
    EnvFilter,
    layer::SubscriberExt,
    util::SubscriberInitExt,
};
use tracing::Level;

use crate::error::{GatewayError, Result};

/// Sets up the logging subscriber for the gateway.
///
/// `RUST_LOG` wins when set; otherwise the crate logs at INFO and tower-http
/// request spans at the same level.
pub fn init_logger() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={},tower_http={}",
                env!("CARGO_CRATE_NAME"),
                Level::INFO,
                Level::INFO
            ))
        });

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_level(true)
        .with_ansi(true)
        .compact();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| GatewayError::Internal(format!("Failed to initialize logger: {}", e)))
}

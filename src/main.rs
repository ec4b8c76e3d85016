use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::{error, info};

use metrics_query_gateway::{
    api::{self, AppState},
    backend::HttpBackend,
    config::Settings,
    logging,
    metrics::QueryStats,
    GatewayError,
    Result,
};

#[derive(Debug, Parser)]
#[command(about = "Query gateway in front of the time-series storage nodes")]
struct Cli {
    /// Config file (defaults to ./cfg.json when present)
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Print version and exit
    #[arg(short = 'v', long = "version")]
    version: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if cli.version {
        println!("{}", env!("CARGO_PKG_VERSION"));
        return;
    }

    if let Err(e) = logging::init_logger() {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(cli).await {
        error!("Gateway stopped: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let settings = Settings::load(cli.config.as_deref())?;

    let backend = HttpBackend::from_settings(&settings)?;
    info!("Routing to {} storage nodes", backend.node_count());

    let stats = Arc::new(QueryStats::new()?);
    let state = AppState::new(Arc::new(backend), stats, &settings);
    let app = api::router(state);

    let listener = TcpListener::bind(&settings.http.listen).await.map_err(|e|
        GatewayError::Internal(format!("Failed to bind to {}: {}", settings.http.listen, e)))?;
    info!("Listening on {}", settings.http.listen);

    axum::serve(listener, app).await.map_err(|e|
        GatewayError::Internal(format!("Server error: {}", e)))?;

    Ok(())
}

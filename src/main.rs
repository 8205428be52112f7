//! This file defines the ndvi-stats binary entry point.

use ndvi_stats::app;
use ndvi_stats::app_state::AppState;
use ndvi_stats::cli;
use ndvi_stats::metrics;
use ndvi_stats::server;
use ndvi_stats::tracing;

use std::sync::Arc;

/// Application entry point
#[tokio::main]
async fn main() {
    let args = cli::parse();
    tracing::init_tracing(&args);
    ::tracing::debug!("{:?}", args);
    metrics::register_metrics();
    let state = Arc::new(AppState::new(&args));
    let service = app::service(state);
    server::serve(&args, service).await;
    tracing::shutdown_tracing();
}

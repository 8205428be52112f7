//! Tracing (logging)

use crate::cli::CommandLineArgs;

use opentelemetry::global;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initlialise tracing (logging)
///
/// Applies a filter based on the `RUST_LOG` environment variable, falling back to enable debug
/// logging for this crate and tower_http if not set.
///
/// If Jaeger is enabled, spans are also exported to a Jaeger agent.
///
/// # Arguments
///
/// * `args`: Command line arguments
pub fn init_tracing(args: &CommandLineArgs) {
    let subscriber = tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ndvi_stats=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer());

    if args.enable_jaeger {
        global::set_text_map_propagator(opentelemetry_jaeger::Propagator::new());
        match opentelemetry_jaeger::new_agent_pipeline()
            .with_service_name("ndvi-stats")
            .install_batch(opentelemetry::runtime::Tokio)
        {
            Ok(tracer) => subscriber
                .with(tracing_opentelemetry::layer().with_tracer(tracer))
                .init(),
            Err(error) => {
                subscriber.init();
                tracing::error!("failed to initialise Jaeger tracing: {}", error);
            }
        }
    } else {
        subscriber.init();
    }
}

/// Flush and shut down any span exporter.
pub fn shutdown_tracing() {
    global::shutdown_tracer_provider();
}

use crate::app_state::SharedAppState;
use crate::error::NdviError;
use crate::metrics::{metrics_handler, record_response_metrics, request_counter};
use crate::models::{NdviStatistics, QueryRequest};
use crate::pipeline;
use crate::validated_json::ValidatedJson;

use axum::{
    extract::State,
    routing::{get, post},
    Router,
};

use tower::Layer;
use tower::ServiceBuilder;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::trace::TraceLayer;

/// Returns a [axum::Router] for the NDVI statistics API
///
/// The router is populated with all routes as well as the following middleware:
///
/// * a [tower_http::trace::TraceLayer] for tracing requests and responses
/// * request and response metrics
///
/// # Arguments
///
/// * `state`: Shared application state
fn router(state: SharedAppState) -> Router {
    Router::new()
        .route("/", get(get_query))
        .route("/query", post(post_query))
        .with_state(state)
        .layer(
            ServiceBuilder::new().layer(
                TraceLayer::new_for_http()
                    .on_request(request_counter)
                    .on_response(record_response_metrics),
            ),
        )
        .route("/metrics", get(metrics_handler))
}

/// NDVI statistics Service type alias
///
/// This type implements [tower_service::Service].
pub type Service = NormalizePath<Router>;

/// Returns a [crate::app::Service] for the NDVI statistics API
///
/// The service is populated with all routes as well as the following middleware:
///
/// * a [tower_http::trace::TraceLayer] for tracing requests and responses
/// * a [tower_http::normalize_path::NormalizePath] for trimming trailing slashes from
///   requests
///
/// # Arguments
///
/// * `state`: Shared application state
pub fn service(state: SharedAppState) -> Service {
    // Note that any middleware that should affect routing must wrap the router.
    // See
    // https://docs.rs/axum/0.6.12/axum/middleware/index.html#rewriting-request-uri-in-middleware.
    NormalizePathLayer::trim_trailing_slash().layer(router(state))
}

/// Handler for the default request, loaded from the input file.
async fn get_query(State(state): State<SharedAppState>) -> Result<NdviStatistics, NdviError> {
    let request = pipeline::load_default_request(&state.args.input_file).await?;
    pipeline::get_ndvi_stats(&state, &request).await
}

/// Handler for a request supplied in the body.
async fn post_query(
    State(state): State<SharedAppState>,
    ValidatedJson(request): ValidatedJson<QueryRequest>,
) -> Result<NdviStatistics, NdviError> {
    pipeline::get_ndvi_stats(&state, &request).await
}

//! NDVI statistics request orchestration.
//!
//! A request moves through the stages of [Stage] in order. A failure in any stage aborts the
//! request; there are no retries and no partial results.

use crate::app_state::AppState;
use crate::catalog::least_cloudy;
use crate::error::NdviError;
use crate::metrics::{PIPELINE_FAILURES, SELECTED_CLOUD_COVER};
use crate::models::{NdviStatistics, QueryRequest};
use crate::ndvi::{compute_ndvi, RasterWindow};
use crate::statistics::Summary;

use std::error::Error;
use strum_macros::Display;
use tracing::{event, Level};
use validator::Validate;

/// Stages of an NDVI statistics request.
#[derive(Clone, Copy, Debug, Display, PartialEq)]
pub enum Stage {
    Received,
    Searching,
    Selecting,
    Reading,
    Computing,
    Sanitizing,
    Done,
}

/// Load and validate the default request from a JSON file.
///
/// # Arguments
///
/// * `path`: Path to the JSON file
pub async fn load_default_request(path: &str) -> Result<QueryRequest, NdviError> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| NdviError::InputFile {
            path: path.to_string(),
            source,
        })?;
    let request: QueryRequest =
        serde_json::from_str(&contents).map_err(|source| NdviError::InputJson {
            path: path.to_string(),
            source,
        })?;
    request
        .validate()
        .map_err(|source| NdviError::InputValidation {
            path: path.to_string(),
            source,
        })?;
    Ok(request)
}

/// Compute NDVI statistics for the least cloudy scene matching a request.
///
/// Failures are counted by the stage in which they occurred.
///
/// # Arguments
///
/// * `state`: Shared application state
/// * `request`: QueryRequest object for the request
#[tracing::instrument(level = "DEBUG", skip(state))]
pub async fn get_ndvi_stats(
    state: &AppState,
    request: &QueryRequest,
) -> Result<NdviStatistics, NdviError> {
    let mut stage = Stage::Received;
    let result = run(state, request, &mut stage).await;
    if let Err(error) = &result {
        PIPELINE_FAILURES
            .with_label_values(&[&stage.to_string()])
            .inc();
        event!(
            Level::WARN,
            %stage,
            "NDVI request failed: {}",
            cause_chain(error)
        );
    }
    result
}

/// Run the stages of a request, recording the current stage in `stage`.
async fn run(
    state: &AppState,
    request: &QueryRequest,
    stage: &mut Stage,
) -> Result<NdviStatistics, NdviError> {
    let args = &state.args;
    let bounds = request.bounds().ok_or(NdviError::DegenerateArea)?;

    advance(stage, Stage::Searching);
    let candidates = state.catalog.search(request).await?;
    if candidates.is_empty() {
        return Err(NdviError::NoDataFound);
    }

    advance(stage, Stage::Selecting);
    let scene = least_cloudy(candidates)?;
    if let Some(cloud_cover) = scene.cloud_cover {
        SELECTED_CLOUD_COVER.observe(cloud_cover);
    }
    event!(Level::INFO, scene = %scene.id, cloud_cover = ?scene.cloud_cover, "selected scene");

    advance(stage, Stage::Reading);
    let red_href = scene.asset(&args.red_band)?;
    let nir_href = scene.asset(&args.nir_band)?;
    let (red, nir) = tokio::try_join!(
        state.reader.read_window(&args.red_band, red_href, &bounds),
        state.reader.read_window(&args.nir_band, nir_href, &bounds),
    )?;

    advance(stage, Stage::Computing);
    let summary = if args.use_rayon {
        tokio_rayon::spawn(move || summarise(red, nir)).await?
    } else {
        summarise(red, nir)?
    };

    advance(stage, Stage::Sanitizing);
    let stats = summary.sanitize();

    advance(stage, Stage::Done);
    Ok(stats)
}

/// Move to the next stage.
fn advance(stage: &mut Stage, next: Stage) {
    event!(Level::DEBUG, from = %stage, to = %next, "stage complete");
    *stage = next;
}

/// Format an error and each of its sources, outermost first.
fn cause_chain(error: &NdviError) -> String {
    let mut message = error.to_string();
    let mut current = error.source();
    while let Some(source) = current {
        message.push_str(": ");
        message.push_str(&source.to_string());
        current = source.source();
    }
    message
}

/// Compute the NDVI grid of two windows and reduce it to summary statistics.
fn summarise(red: RasterWindow, nir: RasterWindow) -> Result<Summary, NdviError> {
    let grid = compute_ndvi(red.view(), nir.view())?;
    Ok(Summary::of(grid.view()))
}

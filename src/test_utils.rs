use crate::app_state::{AppState, SharedAppState};
use crate::catalog::{SceneCatalog, SceneCandidate};
use crate::cli::CommandLineArgs;
use crate::error::NdviError;
use crate::geometry::BoundingBox;
use crate::models::QueryRequest;
use crate::ndvi::RasterWindow;
use crate::raster::RasterReader;

use async_trait::async_trait;
use clap::Parser;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Create a QueryRequest over a unit square for the whole of 2023.
pub(crate) fn get_test_query_request() -> QueryRequest {
    QueryRequest {
        time_of_interest: "2023-01-01/2023-12-31".to_string(),
        area_of_interest: geojson::Geometry::new(geojson::Value::Polygon(vec![vec![
            vec![0.0, 0.0],
            vec![1.0, 0.0],
            vec![1.0, 1.0],
            vec![0.0, 1.0],
            vec![0.0, 0.0],
        ]])),
    }
}

/// Create a scene candidate with red and near-infrared assets named after the scene.
pub(crate) fn get_test_scene(id: &str, cloud_cover: f64) -> SceneCandidate {
    SceneCandidate {
        id: id.to_string(),
        cloud_cover: Some(cloud_cover),
        assets: HashMap::from([
            ("B04".to_string(), format!("https://example.com/{id}/B04.tif")),
            ("B08".to_string(), format!("https://example.com/{id}/B08.tif")),
        ]),
    }
}

/// A scene catalog returning a fixed list of candidates.
pub(crate) struct FakeCatalog {
    pub candidates: Vec<SceneCandidate>,
}

#[async_trait]
impl SceneCatalog for FakeCatalog {
    async fn search(&self, _request: &QueryRequest) -> Result<Vec<SceneCandidate>, NdviError> {
        Ok(self.candidates.clone())
    }
}

/// A raster reader returning fixed windows keyed by href, counting reads.
#[derive(Default)]
pub(crate) struct FakeReader {
    pub windows: HashMap<String, RasterWindow>,
    pub reads: AtomicUsize,
}

impl FakeReader {
    /// Return the number of reads performed.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RasterReader for FakeReader {
    async fn read_window(
        &self,
        band: &str,
        href: &str,
        _bounds: &BoundingBox,
    ) -> Result<RasterWindow, NdviError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.windows
            .get(href)
            .cloned()
            .ok_or_else(|| NdviError::Reprojection {
                band: band.to_string(),
            })
    }
}

/// Create command line arguments with default values plus `extra`.
pub(crate) fn get_test_args(extra: &[&str]) -> CommandLineArgs {
    let mut argv = vec!["ndvi-stats"];
    argv.extend_from_slice(extra);
    CommandLineArgs::try_parse_from(argv).unwrap()
}

/// Create application state with fake collaborators.
pub(crate) fn get_test_state(
    args: &CommandLineArgs,
    candidates: Vec<SceneCandidate>,
    reader: Arc<FakeReader>,
) -> SharedAppState {
    Arc::new(AppState::with_collaborators(
        args,
        Arc::new(FakeCatalog { candidates }),
        reader,
    ))
}

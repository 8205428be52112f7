use crate::catalog::SceneCatalog;
use crate::cli::CommandLineArgs;
use crate::raster::RasterReader;

use std::sync::Arc;

/// Shared application state passed to each request handler.
pub struct AppState {
    /// Command line arguments.
    pub args: CommandLineArgs,

    /// Scene catalog.
    pub catalog: Arc<dyn SceneCatalog>,

    /// Raster band reader.
    pub reader: Arc<dyn RasterReader>,
}

impl AppState {
    /// Create and return an [AppState] using the STAC API and GDAL.
    #[cfg(feature = "gdal")]
    pub fn new(args: &CommandLineArgs) -> Self {
        Self::with_collaborators(
            args,
            Arc::new(crate::catalog::StacClient::new(args)),
            Arc::new(crate::raster::GdalRasterReader::new()),
        )
    }

    /// Create and return an [AppState] with a given catalog and raster reader.
    pub fn with_collaborators(
        args: &CommandLineArgs,
        catalog: Arc<dyn SceneCatalog>,
        reader: Arc<dyn RasterReader>,
    ) -> Self {
        Self {
            args: args.clone(),
            catalog,
            reader,
        }
    }
}

/// AppState wrapped in an Atomic Reference Count (Arc) to allow multiple references.
pub type SharedAppState = Arc<AppState>;

use crate::error::NdviError;
use crate::geometry::{BoundingBox, GeoTransform, PixelWindow};
use crate::ndvi::RasterWindow;
use crate::raster::{RasterReader, DENSIFY_PTS};

use async_trait::async_trait;
use gdal::spatial_ref::{CoordTransform, SpatialRef};
use gdal::Dataset;
use gdal_sys::OSRAxisMappingStrategy::OAMS_TRADITIONAL_GIS_ORDER;

/// GDAL raster reader.
///
/// Implements [RasterReader] for any raster GDAL can open. HTTP(S) locations are read through
/// GDAL's `/vsicurl/` virtual file system, which fetches only the byte ranges needed for the
/// window.
#[derive(Debug, Default)]
pub struct GdalRasterReader {}

impl GdalRasterReader {
    /// Create a new GDAL raster reader.
    pub fn new() -> Self {
        Self {}
    }
}

#[async_trait]
impl RasterReader for GdalRasterReader {
    #[tracing::instrument(level = "DEBUG", skip(self, href))]
    async fn read_window(
        &self,
        band: &str,
        href: &str,
        bounds: &BoundingBox,
    ) -> Result<RasterWindow, NdviError> {
        let band = band.to_string();
        let path = vsi_path(href);
        let bounds = *bounds;
        // GDAL I/O blocks, so keep it off the async worker threads.
        tokio::task::spawn_blocking(move || read_window_blocking(&band, &path, &bounds)).await?
    }
}

/// Returns the GDAL path of a raster location.
fn vsi_path(href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        format!("/vsicurl/{}", href)
    } else {
        href.to_string()
    }
}

/// Open a raster, locate the window covering `bounds` and read its samples from band 1.
///
/// The dataset is closed when it goes out of scope, whether or not the read succeeds.
fn read_window_blocking(
    band: &str,
    path: &str,
    bounds: &BoundingBox,
) -> Result<RasterWindow, NdviError> {
    let dataset = Dataset::open(path)?;

    let source = SpatialRef::from_epsg(4326)?;
    source.set_axis_mapping_strategy(OAMS_TRADITIONAL_GIS_ORDER);
    let target = dataset.spatial_ref()?;
    target.set_axis_mapping_strategy(OAMS_TRADITIONAL_GIS_ORDER);
    let coord_transform = CoordTransform::new(&source, &target)?;
    let projected = bounds
        .transform(DENSIFY_PTS, |xs, ys| {
            let mut zs = vec![0.0; xs.len()];
            coord_transform.transform_coords(xs, ys, &mut zs)
        })?
        .ok_or_else(|| NdviError::Reprojection {
            band: band.to_string(),
        })?;

    let geo_transform = GeoTransform(dataset.geo_transform()?);
    let window = PixelWindow::from_bounds(&projected, &geo_transform, dataset.raster_size())
        .ok_or_else(|| NdviError::GeoTransform {
            band: band.to_string(),
        })?;
    tracing::debug!(band, ?projected, ?window, "reading window");
    if window.is_empty() {
        return Ok(RasterWindow::zeros((window.height, window.width)));
    }

    let rasterband = dataset.rasterband(1)?;
    let buffer = rasterband.read_as::<i32>(
        (window.col_off as isize, window.row_off as isize),
        (window.width, window.height),
        (window.width, window.height),
        None,
    )?;
    Ok(RasterWindow::from_shape_vec(
        (window.height, window.width),
        buffer.data,
    )?)
}

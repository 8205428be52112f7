//! Windowed reads of single raster bands.
//!
//! A [RasterReader] reads the samples of one band that cover an area of interest. The
//! [GdalRasterReader] implementation opens remote Cloud Optimized GeoTIFFs via GDAL.

use crate::error::NdviError;
use crate::geometry::BoundingBox;
use crate::ndvi::RasterWindow;

use async_trait::async_trait;

#[cfg(feature = "gdal")]
mod gdal_reader;

#[cfg(feature = "gdal")]
pub use gdal_reader::GdalRasterReader;

/// Number of points added between the corners of each edge of a bounding box when reprojecting
/// it.
pub const DENSIFY_PTS: usize = 21;

/// Raster reader trait.
///
/// Defines the interface for reading a window of a band.
#[async_trait]
pub trait RasterReader: Send + Sync {
    /// Read the samples of a band covering an area.
    ///
    /// Returns a 2D array of samples in row-major order. The array is empty if the area does not
    /// intersect the band.
    ///
    /// # Arguments
    ///
    /// * `band`: Band identifier, used in errors and logs
    /// * `href`: Location of the band's raster
    /// * `bounds`: Bounds of the area of interest in EPSG:4326 longitude/latitude
    async fn read_window(
        &self,
        band: &str,
        href: &str,
        bounds: &BoundingBox,
    ) -> Result<RasterWindow, NdviError>;
}

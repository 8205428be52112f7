//! Normalized Difference Vegetation Index computation.

use crate::error::NdviError;

use ndarray::{Array2, ArrayView2, Zip};

/// A window of integer samples read from a single band.
pub type RasterWindow = Array2<i32>;

/// Per-pixel NDVI values.
pub type NdviGrid = Array2<f64>;

/// NDVI of a single pixel.
///
/// Arithmetic is performed in `f64` so that 16-bit sample sums cannot overflow.
/// Pixels whose red and near-infrared samples sum to zero have an NDVI of zero.
#[inline]
pub fn ndvi(red: i32, nir: i32) -> f64 {
    let (red, nir) = (f64::from(red), f64::from(nir));
    let denominator = nir + red;
    if denominator != 0.0 {
        (nir - red) / denominator
    } else {
        0.0
    }
}

/// Compute the NDVI grid of a pair of red and near-infrared windows.
///
/// # Arguments
///
/// * `red`: Red band samples
/// * `nir`: Near-infrared band samples. Must have the same shape as `red`.
pub fn compute_ndvi(
    red: ArrayView2<i32>,
    nir: ArrayView2<i32>,
) -> Result<NdviGrid, NdviError> {
    if red.shape() != nir.shape() {
        return Err(NdviError::ShapeMismatch {
            red: red.shape().to_vec(),
            nir: nir.shape().to_vec(),
        });
    }
    Ok(Zip::from(&red)
        .and(&nir)
        .map_collect(|&red, &nir| ndvi(red, nir)))
}

//! This crate provides a server computing Normalized Difference Vegetation Index (NDVI)
//! statistics for an area of interest over a time range.
//!
//! For each request the server searches a [STAC](https://stacspec.org) catalog for Sentinel-2
//! Level-2A scenes intersecting the area, selects the least cloudy candidate, reads the red and
//! near-infrared band windows covering the area and returns the minimum, maximum, mean, median
//! and standard deviation of the per-pixel NDVI.
//!
//! The server is built on top of a number of open source components.
//!
//! * [Tokio](tokio), the most popular asynchronous Rust runtime.
//! * [Axum](axum) web framework, built by the Tokio team, on top of the [hyper] HTTP library.
//! * [Serde](serde) performs (de)serialisation of JSON request and response data.
//! * [reqwest] talks to the STAC API and the SAS token endpoint.
//! * [GDAL](https://gdal.org) reads Cloud Optimized GeoTIFF windows over HTTP.
//! * [ndarray] provides [NumPy](https://numpy.org)-like n-dimensional arrays used in numerical
//!   computation.

pub mod app;
pub mod app_state;
pub mod catalog;
pub mod cli;
pub mod error;
pub mod geometry;
pub mod metrics;
pub mod models;
pub mod ndvi;
pub mod pipeline;
pub mod raster;
pub mod server;
pub mod statistics;
#[cfg(test)]
pub mod test_utils;
pub mod tracing;
pub mod validated_json;

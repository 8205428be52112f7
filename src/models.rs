//! Request and response types and associated functions and methods

use crate::geometry::BoundingBox;

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Request data for NDVI statistics
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize, Validate)]
pub struct QueryRequest {
    /// Single timestamp or `start/end` range, passed to the catalog unmodified
    #[validate(length(min = 1, message = "time_of_interest must not be empty"))]
    pub time_of_interest: String,
    /// GeoJSON geometry in EPSG:4326 longitude/latitude
    #[validate(custom = "validate_area_of_interest")]
    pub area_of_interest: geojson::Geometry,
}

impl QueryRequest {
    /// Bounding box of the area of interest in EPSG:4326.
    ///
    /// Returns `None` if the geometry has no coordinates or its bounds are degenerate.
    pub fn bounds(&self) -> Option<BoundingBox> {
        BoundingBox::from_geometry(&self.area_of_interest).filter(|bbox| !bbox.is_degenerate())
    }
}

/// Validate that an area of interest spans a non-degenerate bounding box
fn validate_area_of_interest(geometry: &geojson::Geometry) -> Result<(), ValidationError> {
    match BoundingBox::from_geometry(geometry) {
        None => Err(ValidationError::new(
            "area_of_interest must contain at least one coordinate",
        )),
        Some(bbox) if bbox.is_degenerate() => {
            let mut error =
                ValidationError::new("area_of_interest must have a non-degenerate bounding box");
            error.add_param("bounds".into(), &bbox.to_array());
            Err(error)
        }
        Some(_) => Ok(()),
    }
}

/// Summary statistics of an NDVI grid.
///
/// A `None` field is serialised as `null` and marks a statistic that was not finite.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct NdviStatistics {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub std: Option<f64>,
}

impl IntoResponse for NdviStatistics {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

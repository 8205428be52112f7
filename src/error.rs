//! Error handling.

use axum::{
    extract::rejection::JsonRejection,
    http::header,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::error::Error;
use thiserror::Error;
use tracing::{event, Level};

/// NDVI statistics server error type
///
/// This type encapsulates the various errors that may occur.
/// Callers see two kinds of failure: [NdviError::NoDataFound], which is reported as not found,
/// and everything else, which is reported as a failed computation carrying the error message.
/// Malformed requests are rejected before the pipeline runs.
#[derive(Debug, Error)]
pub enum NdviError {
    /// No scene matched the area, time and cloud cover filter
    #[error("No Sentinel-2 data found for the given parameters")]
    NoDataFound,

    /// Error sending a request to the STAC API or decoding its response
    #[error("error searching STAC catalog")]
    CatalogRequest(#[from] reqwest::Error),

    /// STAC API returned an unsuccessful status
    #[error("STAC request to {url} failed with status {status}")]
    CatalogStatus { url: String, status: u16 },

    /// The selected scene does not provide a required band
    #[error("scene {scene} has no asset {asset}")]
    AssetMissing { scene: String, asset: String },

    /// Asset href could not be parsed for signing
    #[error("invalid asset URL {href}")]
    AssetUrl {
        href: String,
        #[source]
        source: url::ParseError,
    },

    /// Error reported by GDAL while opening or reading a band
    #[cfg(feature = "gdal")]
    #[error("failed to read raster band")]
    Gdal(#[from] gdal::errors::GdalError),

    /// Band has a geotransform that cannot be inverted
    #[error("band {band} has a non-invertible geotransform")]
    GeoTransform { band: String },

    /// Area of interest could not be reprojected into the band's CRS
    #[error("failed to reproject area of interest into the CRS of band {band}")]
    Reprojection { band: String },

    /// Area of interest has no usable bounding box
    #[error("area of interest does not span a non-degenerate bounding box")]
    DegenerateArea,

    /// Error creating an ndarray Array from a read buffer
    #[error("failed to create array from shape")]
    ShapeInvalid(#[from] ndarray::ShapeError),

    /// The red and near-infrared windows have different shapes
    #[error("red band shape {red:?} does not match near-infrared band shape {nir:?}")]
    ShapeMismatch { red: Vec<usize>, nir: Vec<usize> },

    /// Error joining a blocking or Rayon task
    #[error("background task failed")]
    TaskJoin(#[from] tokio::task::JoinError),

    /// Error reading the default input file
    #[error("failed to read default input file {path}")]
    InputFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Default input file does not contain a valid request
    #[error("default input file {path} does not contain a valid request")]
    InputJson {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// Default input file contains a request that fails validation
    #[error("default input file {path} does not contain a valid request")]
    InputValidation {
        path: String,
        #[source]
        source: validator::ValidationErrors,
    },

    /// Error deserialising request data into QueryRequest
    #[error("request data is not valid")]
    RequestDataJsonRejection(#[from] JsonRejection),

    /// Error validating QueryRequest
    #[error("request data is not valid")]
    RequestDataValidation(#[from] validator::ValidationErrors),
}

impl IntoResponse for NdviError {
    /// Convert from an `NdviError` into an [axum::response::Response].
    fn into_response(self) -> Response {
        ErrorResponse::from(self).into_response()
    }
}

/// Body of error response
///
/// Implements serde (de)serialise.
#[derive(Deserialize, Serialize)]
struct ErrorBody {
    /// Main error message
    detail: String,

    /// Optional list of causes
    #[serde(skip_serializing_if = "Option::is_none")]
    caused_by: Option<Vec<String>>,
}

impl ErrorBody {
    /// Return a new ErrorBody
    ///
    /// # Arguments
    ///
    /// * `error`: The error that occurred
    fn new<E>(error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        let detail = error.to_string();
        let mut caused_by = None;
        let mut current = error.source();
        while let Some(source) = current {
            let mut causes: Vec<String> = caused_by.unwrap_or_default();
            causes.push(source.to_string());
            caused_by = Some(causes);
            current = source.source();
        }
        // Remove duplicate entries.
        if let Some(caused_by) = caused_by.as_mut() {
            caused_by.dedup()
        }
        ErrorBody { detail, caused_by }
    }
}

/// A response to send in error cases
///
/// Implements serde (de)serialise.
#[derive(Deserialize, Serialize)]
struct ErrorResponse {
    /// HTTP status of the response
    #[serde(skip)]
    status: StatusCode,

    /// Response body
    #[serde(flatten)]
    error: ErrorBody,
}

impl ErrorResponse {
    /// Return a new ErrorResponse
    ///
    /// # Arguments
    ///
    /// * `status`: HTTP status of the response
    /// * `error`: The error that occurred. This will be formatted into a suitable `ErrorBody`
    fn new<E>(status: StatusCode, error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        ErrorResponse {
            status,
            error: ErrorBody::new(error),
        }
    }

    /// Return a 400 bad request ErrorResponse
    fn bad_request<E>(error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        Self::new(StatusCode::BAD_REQUEST, error)
    }

    /// Return a 404 not found ErrorResponse
    fn not_found<E>(error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        Self::new(StatusCode::NOT_FOUND, error)
    }

    /// Return a 500 internal server error ErrorResponse
    fn internal_server_error<E>(error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, error)
    }
}

impl From<NdviError> for ErrorResponse {
    /// Convert from an `NdviError` into an `ErrorResponse`.
    fn from(error: NdviError) -> Self {
        let response = match &error {
            // Bad request
            NdviError::RequestDataJsonRejection(_) | NdviError::RequestDataValidation(_) => {
                Self::bad_request(&error)
            }

            // Not found
            NdviError::NoDataFound => Self::not_found(&error),

            // Failed computation
            NdviError::CatalogRequest(_)
            | NdviError::CatalogStatus { .. }
            | NdviError::AssetMissing { .. }
            | NdviError::AssetUrl { .. }
            | NdviError::GeoTransform { .. }
            | NdviError::Reprojection { .. }
            | NdviError::DegenerateArea
            | NdviError::ShapeInvalid(_)
            | NdviError::ShapeMismatch { .. }
            | NdviError::TaskJoin(_)
            | NdviError::InputFile { .. }
            | NdviError::InputJson { .. }
            | NdviError::InputValidation { .. } => Self::internal_server_error(&error),

            #[cfg(feature = "gdal")]
            NdviError::Gdal(_) => Self::internal_server_error(&error),
        };

        // Log server errors.
        if response.status.is_server_error() {
            event!(Level::ERROR, "{}", error.to_string());
            let mut current = error.source();
            while let Some(source) = current {
                event!(Level::ERROR, "Caused by: {}", source.to_string());
                current = source.source();
            }
        }

        response
    }
}

impl IntoResponse for ErrorResponse {
    /// Convert from an `ErrorResponse` into an `axum::response::Response`.
    ///
    /// Renders the response as JSON.
    fn into_response(self) -> Response {
        let json_body = serde_json::to_string_pretty(&self);
        match json_body {
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to serialise error response: {}", err),
            )
                .into_response(),
            Ok(json_body) => (
                self.status,
                [(&header::CONTENT_TYPE, mime::APPLICATION_JSON.to_string())],
                json_body,
            )
                .into_response(),
        }
    }
}

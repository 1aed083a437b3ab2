//! Error types for the track heatmap services.

use thiserror::Error;

/// Result type alias using HeatmapError.
pub type HeatmapResult<T> = Result<T, HeatmapError>;

/// Primary error type for tile requests.
///
/// Every variant is scoped to a single request; none of them is fatal to
/// the process.
#[derive(Debug, Error)]
pub enum HeatmapError {
    // === Request Errors ===
    #[error("Invalid tile coordinate: {0}")]
    InvalidTileCoordinate(String),

    #[error("Invalid hex color: {0}")]
    InvalidColor(String),

    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    // === Data Errors ===
    #[error("Malformed polyline: {0}")]
    MalformedPolyline(String),

    // === Rendering Errors ===
    #[error("Rendering failed: {0}")]
    RenderError(String),

    // === Infrastructure Errors ===
    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl HeatmapError {
    /// Short machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            HeatmapError::InvalidTileCoordinate(_) => "InvalidTileCoordinate",
            HeatmapError::InvalidColor(_) => "InvalidColor",
            HeatmapError::InvalidParameter { .. } => "InvalidParameterValue",
            HeatmapError::MalformedPolyline(_) => "MalformedPolyline",
            _ => "NoApplicableCode",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            HeatmapError::InvalidTileCoordinate(_)
            | HeatmapError::InvalidColor(_)
            | HeatmapError::InvalidParameter { .. }
            | HeatmapError::MalformedPolyline(_) => 400,

            _ => 500,
        }
    }
}

// Conversion from common error types
impl From<std::io::Error> for HeatmapError {
    fn from(err: std::io::Error) -> Self {
        HeatmapError::InternalError(err.to_string())
    }
}

impl From<serde_json::Error> for HeatmapError {
    fn from(err: serde_json::Error) -> Self {
        HeatmapError::InternalError(format!("JSON error: {}", err))
    }
}

//! API error handling module
//!
//! Provides a unified error type for all API endpoints with structured error variants.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use timelens_core::TimelensError;

/// API error type with structured variants for different error categories
#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad request - client provided invalid input
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Not found - requested resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// No usable location could be derived from the request
    #[error("No location available: {0}")]
    NoLocation(String),

    /// A location was found but no catalog photo lies within range
    #[error("No candidates in range: {0}")]
    NoCandidates(String),

    /// Error raised by the matching engine
    #[error("Matcher error: {0}")]
    Core(#[from] TimelensError),
}

impl ApiError {
    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) | Self::NoLocation(_) | Self::NoCandidates(_) => {
                StatusCode::NOT_FOUND
            }
            Self::Core(ref e) => match e {
                // Client-provided invalid input → 400
                TimelensError::InvalidCoordinate { .. }
                | TimelensError::InvalidViewingArc(_)
                | TimelensError::InvalidScore { .. }
                | TimelensError::InvalidRadius(_) => StatusCode::BAD_REQUEST,

                // External service failures → 503
                TimelensError::Vision(_)
                | TimelensError::VisionTimeout { .. }
                | TimelensError::Http(_) => StatusCode::SERVICE_UNAVAILABLE,

                // Internal processing failures → 500
                TimelensError::Catalog(_) | TimelensError::Serialization(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }

    /// Get the error code for programmatic error handling
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "INVALID_INPUT",
            Self::NotFound(_) => "NOT_FOUND",
            Self::NoLocation(_) => "NO_LOCATION",
            Self::NoCandidates(_) => "NO_CANDIDATES",
            Self::Core(ref e) => match e {
                TimelensError::InvalidCoordinate { .. } => "INVALID_COORDINATE",
                TimelensError::InvalidViewingArc(_) => "INVALID_VIEWING_ARC",
                TimelensError::InvalidScore { .. } => "INVALID_SCORE",
                TimelensError::InvalidRadius(_) => "INVALID_RADIUS",
                TimelensError::Vision(_) | TimelensError::VisionTimeout { .. } => {
                    "VISION_UNAVAILABLE"
                }
                TimelensError::Http(_) => "UPSTREAM_ERROR",
                TimelensError::Catalog(_) => "CATALOG_ERROR",
                TimelensError::Serialization(_) => "SERIALIZATION_ERROR",
            },
        }
    }

    /// Get sanitized error message for client response
    fn client_message(&self) -> String {
        match self {
            Self::Core(ref e) => match e {
                // Validation messages are safe to echo
                TimelensError::InvalidCoordinate { .. }
                | TimelensError::InvalidViewingArc(_)
                | TimelensError::InvalidScore { .. }
                | TimelensError::InvalidRadius(_) => e.to_string(),
                TimelensError::Vision(_) | TimelensError::VisionTimeout { .. } => {
                    "Vision service unavailable".to_string()
                }
                TimelensError::Http(_) => "Upstream service error".to_string(),
                TimelensError::Catalog(_) => "Catalog unavailable".to_string(),
                TimelensError::Serialization(_) => "Serialization error".to_string(),
            },
            _ => self.to_string(),
        }
    }

    /// Get the error category for logging
    fn error_category(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::NotFound(_) => "not_found",
            Self::NoLocation(_) | Self::NoCandidates(_) => "no_match",
            Self::Core(_) => "matcher",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let category = self.error_category();
        let code = self.error_code();
        let internal_message = self.to_string();
        let client_message = self.client_message();

        match &self {
            Self::NoLocation(_) | Self::NoCandidates(_) => {
                tracing::info!(status = %status, code = code, "No match");
            }
            Self::BadRequest(_) | Self::NotFound(_) => {
                tracing::warn!(
                    status = %status,
                    category = category,
                    code = code,
                    error = %internal_message,
                    "Client error"
                );
            }
            Self::Core(_) => {
                tracing::error!(
                    status = %status,
                    category = category,
                    code = code,
                    error = %internal_message,
                    client_message = %client_message,
                    "Server error"
                );
            }
        }

        let body = serde_json::json!({
            "error": client_message,
            "code": code,
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_match_outcomes_are_404_with_distinct_codes() {
        let no_location = ApiError::NoLocation("no GPS".into());
        let no_candidates = ApiError::NoCandidates("empty area".into());

        assert_eq!(no_location.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(no_candidates.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(no_location.error_code(), "NO_LOCATION");
        assert_eq!(no_candidates.error_code(), "NO_CANDIDATES");
    }

    #[test]
    fn test_core_validation_errors_are_client_errors() {
        let err = ApiError::from(TimelensError::InvalidCoordinate {
            latitude: 91.0,
            longitude: 0.0,
        });
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), "INVALID_COORDINATE");
        assert!(err.client_message().contains("91"));
    }

    #[test]
    fn test_catalog_errors_are_sanitized() {
        let err = ApiError::from(TimelensError::Catalog("/etc/secret.json: denied".into()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.client_message().contains("secret"));
    }
}

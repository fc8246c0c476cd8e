//! Request validation module
//!
//! Upload checks for photos and bounds on query parameters.

use crate::error::ApiError;

/// Allowed MIME type prefixes for photo uploads
const ALLOWED_MIME_PREFIXES: &[&str] = &["image/", "application/octet-stream"];

/// Largest radius accepted by `GET /catalog/near`
pub const MAX_NEAR_RADIUS_KM: f64 = 50.0;

/// Validates the Content-Type of an uploaded photo
///
/// Accepts image/* and application/octet-stream. A missing Content-Type is
/// treated as binary.
pub fn validate_content_type(content_type: Option<&str>) -> Result<(), ApiError> {
    match content_type {
        Some(ct) => {
            let ct_lower = ct.to_lowercase();
            if ALLOWED_MIME_PREFIXES
                .iter()
                .any(|prefix| ct_lower.starts_with(prefix))
            {
                Ok(())
            } else {
                Err(ApiError::bad_request(format!(
                    "Unsupported Content-Type: '{}'. Allowed types: image/*, application/octet-stream",
                    ct
                )))
            }
        }
        None => Ok(()),
    }
}

/// Validates the size of an uploaded photo
pub fn validate_file_size(size: usize, max_size: usize) -> Result<(), ApiError> {
    if size == 0 {
        return Err(ApiError::bad_request("Uploaded file is empty"));
    }
    if size > max_size {
        let max_mb = max_size / (1024 * 1024);
        let actual_mb = size / (1024 * 1024);
        Err(ApiError::bad_request(format!(
            "File too large: {} MB exceeds maximum of {} MB",
            actual_mb, max_mb
        )))
    } else {
        Ok(())
    }
}

/// Validates a compass heading given by the client
pub fn validate_heading(heading: f64) -> Result<f64, ApiError> {
    if heading.is_finite() && (0.0..=360.0).contains(&heading) {
        Ok(heading)
    } else {
        Err(ApiError::bad_request(format!(
            "Heading must be between 0 and 360 degrees, got {}",
            heading
        )))
    }
}

/// Validates a search radius for catalog browsing
pub fn validate_near_radius(radius_km: f64) -> Result<f64, ApiError> {
    if radius_km.is_finite() && (0.0..=MAX_NEAR_RADIUS_KM).contains(&radius_km) {
        Ok(radius_km)
    } else {
        Err(ApiError::bad_request(format!(
            "radius_km must be between 0 and {} km, got {}",
            MAX_NEAR_RADIUS_KM, radius_km
        )))
    }
}

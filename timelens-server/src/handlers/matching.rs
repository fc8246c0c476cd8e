//! Photo matching handler
//!
//! Handles POST /match requests: fuse the uploaded signals, pick the best
//! historical photograph and wrap it with narrative context.

use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::{Deserialize, Serialize};
use timelens_core::exif::read_gps;
use timelens_core::{
    geo::LOG_GEOHASH_PRECISION, AiAnalysis, Coordinate, LocationSource, MatchOutcome,
    MatchPipeline, MatchRequest, MatchResult,
};
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::handlers::catalog::CatalogEntrySummary;
use crate::multipart::MultipartFields;
use crate::state::AppState;
use crate::story::{historical_story, HistoricalStory};
use crate::validation::validate_heading;

/// Accuracy assumed for device coordinates sent without one. Matches the
/// untrusted range, so such fixes only count when nothing better exists.
pub const DEFAULT_DEVICE_ACCURACY_METERS: f64 = 1000.0;

/// EXIF GPS position extracted by the client
#[derive(Debug, Deserialize, ToSchema)]
pub struct ExifGpsInput {
    #[schema(example = 41.8781)]
    pub latitude: f64,
    #[schema(example = -87.6278)]
    pub longitude: f64,
}

/// Where the catalog was searched
#[derive(Debug, Serialize, ToSchema)]
pub struct QueryLocation {
    /// Coarse geohash of the fused position (about 150 m cells)
    #[schema(example = "dp3wnp0")]
    pub geohash: String,
    /// Signal the position came from
    #[schema(example = "device_gps")]
    pub source: String,
    /// Fusion confidence in `[0, 0.95]`
    #[schema(example = 0.7)]
    pub fusion_confidence: f64,
}

/// What image analysis saw in the photo
#[derive(Debug, Serialize, ToSchema)]
pub struct AnalysisSummary {
    pub landmarks: Vec<String>,
    #[schema(example = 0.75)]
    pub locale_likelihood: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "art deco")]
    pub architectural_era: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_era_year: Option<i32>,
}

impl From<&AiAnalysis> for AnalysisSummary {
    fn from(ai: &AiAnalysis) -> Self {
        Self {
            landmarks: ai.landmark_names.iter().cloned().collect(),
            locale_likelihood: ai.locale_likelihood,
            architectural_era: ai.architectural_era.clone(),
            estimated_era_year: ai.estimated_era_year,
        }
    }
}

/// Response for a successful match
#[derive(Debug, Serialize, ToSchema)]
pub struct MatchResponse {
    /// Unique identifier for this match
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub match_id: String,
    /// When the match was produced (RFC 3339)
    #[schema(example = "2026-01-07T10:00:00+00:00")]
    pub matched_at: String,
    /// The chosen historical photograph
    pub entry: CatalogEntrySummary,
    /// Distance from the fused position to the photo's location
    #[schema(example = 42.5)]
    pub distance_meters: f64,
    /// Heuristic confidence in `[20, 95]`
    #[schema(example = 78)]
    pub confidence_percent: u8,
    /// "comprehensive_ai_analysis" or "proximity_heading"
    #[schema(example = "proximity_heading")]
    pub match_method: String,
    #[schema(example = 0.68)]
    pub composite_score: f64,
    pub landmark_overlap_count: usize,
    pub query: QueryLocation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_analysis: Option<AnalysisSummary>,
    pub story: HistoricalStory,
}

impl MatchResponse {
    fn new(result: &MatchResult) -> Self {
        let location = &result.query_location;
        Self {
            match_id: uuid::Uuid::new_v4().to_string(),
            matched_at: chrono::Utc::now().to_rfc3339(),
            entry: CatalogEntrySummary::from(&result.candidate),
            distance_meters: result.distance_meters,
            confidence_percent: result.confidence_percent,
            match_method: result.match_method.to_string(),
            composite_score: result.composite_score,
            landmark_overlap_count: result.landmark_overlap_count,
            query: QueryLocation {
                geohash: location
                    .geohash(LOG_GEOHASH_PRECISION)
                    .unwrap_or_default(),
                source: location.source().to_string(),
                fusion_confidence: result.fusion_confidence,
            },
            ai_analysis: result.ai_analysis.as_ref().map(AnalysisSummary::from),
            story: historical_story(&result.candidate),
        }
    }
}

fn build_request(fields: &mut MultipartFields) -> Result<MatchRequest, ApiError> {
    let mut request = MatchRequest::new();

    match (fields.get_f64("latitude")?, fields.get_f64("longitude")?) {
        (Some(lat), Some(lon)) => {
            let accuracy = fields
                .get_f64("accuracy")?
                .unwrap_or(DEFAULT_DEVICE_ACCURACY_METERS);
            if accuracy < 0.0 {
                return Err(ApiError::bad_request("accuracy must not be negative"));
            }
            let gps = Coordinate::new(lat, lon, LocationSource::DeviceGps)?.with_accuracy(accuracy);
            request = request.with_device_gps(gps);
        }
        (None, None) => {}
        _ => {
            return Err(ApiError::bad_request(
                "latitude and longitude must be provided together",
            ))
        }
    }

    let sent_exif = fields.get_json::<ExifGpsInput>("exif_gps")?;
    if let Some(exif) = &sent_exif {
        let gps = Coordinate::new(exif.latitude, exif.longitude, LocationSource::ExifGps)?;
        request = request.with_exif_gps(gps);
    }

    if let Some(heading) = fields.get_f64("heading")? {
        request = request.with_heading(validate_heading(heading)?);
    }

    if let Some(file) = fields.take_file() {
        tracing::debug!(
            bytes = file.data.len(),
            content_type = ?file.content_type,
            file_name = ?file.file_name,
            "Photo received"
        );
        // An explicit exif_gps field wins over tags embedded in the upload
        if sent_exif.is_none() {
            if let Some(gps) = read_gps(&file.data) {
                request = request.with_exif_gps(gps);
            }
        }
        request = request.with_image(file.data);
    }

    Ok(request)
}

fn select_pipeline(state: &AppState, use_mock: bool) -> Result<Arc<MatchPipeline>, ApiError> {
    if !use_mock {
        return Ok(state.pipeline.clone());
    }
    state
        .mock_pipeline
        .clone()
        .ok_or_else(|| ApiError::bad_request("Mock vision is disabled on this server"))
}

/// Find the historical photograph taken where the user stands
///
/// Accepts multipart/form-data with:
/// - **file** (optional): the street photo, analysed when a vision provider is configured
/// - **latitude**, **longitude** (optional, together): device GPS
/// - **accuracy** (optional): device GPS accuracy in meters (default: 1000)
/// - **heading** (optional): compass heading in degrees
/// - **exif_gps** (optional): JSON `{"latitude": .., "longitude": ..}` read from the photo;
///   when absent, GPS tags embedded in **file** are used
/// - **mock** (optional): "true" to use the deterministic mock vision provider
///
/// Device GPS counts only when more accurate than 100 m; otherwise EXIF
/// GPS, then image analysis, locate the photo.
#[utoipa::path(
    post,
    path = "/match",
    tag = "Matching",
    request_body(
        content_type = "multipart/form-data",
        description = "Photo and location signals"
    ),
    responses(
        (status = 200, description = "Historical photo found", body = MatchResponse),
        (status = 400, description = "Invalid input (coordinates, heading, file type)"),
        (status = 404, description = "No location could be derived (NO_LOCATION) or nothing in range (NO_CANDIDATES)"),
        (status = 413, description = "Upload too large")
    )
)]
pub async fn match_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<MatchResponse>, ApiError> {
    let mut fields = MultipartFields::parse(&mut multipart, state.max_file_size).await?;
    let pipeline = select_pipeline(&state, fields.get_bool("mock"))?;
    let request = build_request(&mut fields)?;

    match pipeline.run(&request).await? {
        MatchOutcome::Matched(result) => {
            let response = MatchResponse::new(&result);
            tracing::info!(
                match_id = %response.match_id,
                entry = %response.entry.id,
                confidence = response.confidence_percent,
                method = %response.match_method,
                "Match served"
            );
            Ok(Json(response))
        }
        MatchOutcome::NoLocationAvailable => Err(ApiError::NoLocation(
            "Provide GPS coordinates, EXIF GPS, or a recognisable photo".into(),
        )),
        MatchOutcome::NoCandidatesInRange { location } => Err(ApiError::NoCandidates(format!(
            "No historical photos within {} km of {}",
            pipeline.config().radius_km,
            location.geohash(LOG_GEOHASH_PRECISION).unwrap_or_default()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_accuracy_is_untrusted() {
        assert!(
            DEFAULT_DEVICE_ACCURACY_METERS
                >= timelens_core::fusion::DEVICE_GPS_MAX_ACCURACY_METERS
        );
    }

    #[test]
    fn test_select_pipeline_rejects_disabled_mock() {
        let config = crate::config::Config {
            allow_mock_vision: false,
            ..crate::config::Config::default()
        };
        let state = AppState::from_config(&config).unwrap();

        assert!(select_pipeline(&state, false).is_ok());
        assert!(matches!(
            select_pipeline(&state, true),
            Err(ApiError::BadRequest(_))
        ));
    }
}

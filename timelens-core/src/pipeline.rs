//! End-to-end matching: vision → fusion → catalog query → selection →
//! scoring → confidence.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument};

use crate::catalog::{CatalogEntry, CatalogStore};
use crate::confidence::{estimate, ConfidenceSignals};
use crate::config::MatcherConfig;
use crate::error::Result;
use crate::fusion::{FusedLocation, LocationFusion};
use crate::geo::{Coordinate, LOG_GEOHASH_PRECISION};
use crate::landmarks::LandmarkTable;
use crate::scorer::score_and_select;
use crate::selector::select_with_tolerance;
use crate::vision::{analyze_or_degrade, AiAnalysis, VisionAnalyzer};

/// Inputs for one match.
#[derive(Debug, Clone, Default)]
pub struct MatchRequest {
    pub device_gps: Option<Coordinate>,
    pub exif_gps: Option<Coordinate>,
    /// Compass heading the photographer faced, degrees from North
    pub heading_degrees: Option<f64>,
    /// Encoded image bytes, sent to the vision provider when one is configured
    pub image: Option<Vec<u8>>,
}

impl MatchRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_device_gps(mut self, gps: Coordinate) -> Self {
        self.device_gps = Some(gps);
        self
    }

    pub fn with_exif_gps(mut self, gps: Coordinate) -> Self {
        self.exif_gps = Some(gps);
        self
    }

    pub fn with_heading(mut self, heading_degrees: f64) -> Self {
        self.heading_degrees = Some(heading_degrees);
        self
    }

    pub fn with_image(mut self, image: impl Into<Vec<u8>>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Position passed to the vision provider as a hint.
    fn location_hint(&self) -> Option<&Coordinate> {
        self.device_gps.as_ref().or(self.exif_gps.as_ref())
    }
}

/// How a match was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    /// Image analysis contributed to fusion and scoring
    ComprehensiveAiAnalysis,
    /// Location and heading only
    ProximityHeading,
}

impl MatchMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ComprehensiveAiAnalysis => "comprehensive_ai_analysis",
            Self::ProximityHeading => "proximity_heading",
        }
    }
}

impl std::fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The chosen historical photo and how much to trust it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub candidate: CatalogEntry,
    pub distance_meters: f64,
    /// Heuristic score in `[20, 95]`
    pub confidence_percent: u8,
    pub match_method: MatchMethod,
    pub composite_score: f64,
    pub landmark_overlap_count: usize,
    /// Fused position the catalog was searched around
    pub query_location: Coordinate,
    pub fusion_confidence: f64,
    pub ai_analysis: Option<AiAnalysis>,
}

/// Result of a match attempt. The two "no match" cases are normal outcomes.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    Matched(Box<MatchResult>),
    /// No GPS and no confident image analysis
    NoLocationAvailable,
    /// A location was found but the catalog has nothing near it
    NoCandidatesInRange { location: Coordinate },
}

impl MatchOutcome {
    pub fn matched(&self) -> Option<&MatchResult> {
        match self {
            Self::Matched(result) => Some(result.as_ref()),
            _ => None,
        }
    }

    pub fn into_matched(self) -> Option<MatchResult> {
        match self {
            Self::Matched(result) => Some(*result),
            _ => None,
        }
    }
}

/// Select, score and rate over an in-memory catalog snapshot.
///
/// Pure and synchronous; identical inputs give identical output.
pub fn match_in(
    catalog: &[CatalogEntry],
    fused: &FusedLocation,
    heading_degrees: Option<f64>,
    ai: Option<&AiAnalysis>,
    config: &MatcherConfig,
) -> MatchOutcome {
    let Some(location) = fused.location else {
        return MatchOutcome::NoLocationAvailable;
    };

    let selected = select_with_tolerance(
        catalog,
        &location,
        heading_degrees,
        config.radius_km,
        config.heading_tolerance_degrees,
    );

    let Some(best) = score_and_select(selected, &location, ai) else {
        return MatchOutcome::NoCandidatesInRange { location };
    };

    let distance_meters = best.distance_km * 1000.0;
    let heading_known = heading_degrees.is_some_and(f64::is_finite);

    let confidence_percent = estimate(&ConfidenceSignals {
        fusion_confidence: fused.confidence,
        ai,
        distance_meters,
        landmark_overlap_count: best.landmark_overlap_count,
        heading_known,
        composite_score: best.composite_score,
    });

    let match_method = if ai.is_some() {
        MatchMethod::ComprehensiveAiAnalysis
    } else {
        MatchMethod::ProximityHeading
    };

    MatchOutcome::Matched(Box::new(MatchResult {
        candidate: best.entry.clone(),
        distance_meters,
        confidence_percent,
        match_method,
        composite_score: best.composite_score,
        landmark_overlap_count: best.landmark_overlap_count,
        query_location: location,
        fusion_confidence: fused.confidence,
        ai_analysis: ai.cloned(),
    }))
}

/// Matching pipeline with its collaborators injected.
///
/// ```no_run
/// use std::sync::Arc;
/// use timelens_core::{
///     Coordinate, InMemoryCatalog, LocationSource, MatchPipeline, MatchRequest, MatcherConfig,
/// };
///
/// # async fn example() -> timelens_core::Result<()> {
/// let pipeline = MatchPipeline::new(Arc::new(InMemoryCatalog::chicago()?), MatcherConfig::default());
/// let gps = Coordinate::new(41.8781, -87.6278, LocationSource::DeviceGps)?.with_accuracy(10.0);
/// let outcome = pipeline.run(&MatchRequest::new().with_device_gps(gps).with_heading(5.0)).await?;
/// if let Some(result) = outcome.matched() {
///     println!("{} ({}%)", result.candidate.title, result.confidence_percent);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct MatchPipeline {
    catalog: Arc<dyn CatalogStore>,
    vision: Option<Arc<dyn VisionAnalyzer>>,
    landmarks: Option<Arc<LandmarkTable>>,
    config: MatcherConfig,
}

impl MatchPipeline {
    pub fn new(catalog: Arc<dyn CatalogStore>, config: MatcherConfig) -> Self {
        Self {
            catalog,
            vision: None,
            landmarks: None,
            config,
        }
    }

    pub fn with_vision(mut self, vision: Option<Arc<dyn VisionAnalyzer>>) -> Self {
        self.vision = vision;
        self
    }

    pub fn with_landmarks(mut self, landmarks: Arc<LandmarkTable>) -> Self {
        self.landmarks = Some(landmarks);
        self
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Arc<dyn CatalogStore> {
        &self.catalog
    }

    pub fn has_vision(&self) -> bool {
        self.vision.is_some()
    }

    /// Fuse the request's signals into one position.
    ///
    /// Runs the vision provider (bounded by the configured timeout) when
    /// both a provider and an image are present.
    pub async fn locate(&self, request: &MatchRequest) -> (FusedLocation, Option<AiAnalysis>) {
        let ai = match (&self.vision, &request.image) {
            (Some(vision), Some(image)) => {
                analyze_or_degrade(
                    vision.as_ref(),
                    image,
                    request.location_hint(),
                    self.config.vision_timeout,
                )
                .await
            }
            _ => None,
        };

        let mut fusion = LocationFusion::new(self.config.fallback_area);
        if let Some(table) = &self.landmarks {
            fusion = fusion.with_landmarks(table);
        }
        let fused = fusion.fuse(
            request.device_gps.as_ref(),
            request.exif_gps.as_ref(),
            ai.as_ref(),
        );

        (fused, ai)
    }

    /// Run a full match.
    ///
    /// Errors only come from the catalog store; provider failures degrade
    /// to a match without image analysis.
    #[instrument(level = "debug", skip_all, fields(
        has_image = request.image.is_some(),
        heading = ?request.heading_degrees
    ))]
    pub async fn run(&self, request: &MatchRequest) -> Result<MatchOutcome> {
        let (fused, ai) = self.locate(request).await;

        let Some(location) = fused.location else {
            info!("No location available, cannot match");
            return Ok(MatchOutcome::NoLocationAvailable);
        };

        let geohash = location.geohash(LOG_GEOHASH_PRECISION).unwrap_or_default();
        let snapshot = self
            .catalog
            .query_near(&location, self.config.radius_km)
            .await?;

        let outcome = match_in(
            &snapshot,
            &fused,
            request.heading_degrees,
            ai.as_ref(),
            &self.config,
        );

        match &outcome {
            MatchOutcome::Matched(result) => info!(
                geohash = %geohash,
                source = %location.source(),
                id = %result.candidate.id,
                distance_m = result.distance_meters.round() as u64,
                confidence = result.confidence_percent,
                method = %result.match_method,
                "Match found"
            ),
            MatchOutcome::NoCandidatesInRange { .. } => info!(
                geohash = %geohash,
                source = %location.source(),
                radius_km = self.config.radius_km,
                "No catalog entries in range"
            ),
            MatchOutcome::NoLocationAvailable => {}
        }

        Ok(outcome)
    }
}

impl std::fmt::Debug for MatchPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchPipeline")
            .field("vision", &self.vision.as_ref().map(|v| v.source_id()))
            .field("landmarks", &self.landmarks.as_ref().map(|l| l.len()))
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{InMemoryCatalog, ViewingArc};
    use crate::geo::LocationSource;
    use crate::vision::MockVision;

    fn gps(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon, LocationSource::DeviceGps)
            .unwrap()
            .with_accuracy(10.0)
    }

    fn pipeline() -> MatchPipeline {
        let catalog = InMemoryCatalog::from_entries(vec![CatalogEntry::new(
            "pier",
            "Navy Pier",
            1920,
            Coordinate::new(41.8917, -87.6086, LocationSource::Catalog).unwrap(),
            ViewingArc::new(120, 200).unwrap(),
        )
        .with_landmarks(["Navy Pier"])])
        .unwrap();
        MatchPipeline::new(Arc::new(catalog), MatcherConfig::default())
    }

    #[tokio::test]
    async fn test_run_without_vision() {
        let outcome = pipeline()
            .run(&MatchRequest::new().with_device_gps(gps(41.8917, -87.6086)))
            .await
            .unwrap();
        let result = outcome.matched().unwrap();
        assert_eq!(result.candidate.id, "pier");
        assert_eq!(result.match_method, MatchMethod::ProximityHeading);
        assert!(result.ai_analysis.is_none());
    }

    #[tokio::test]
    async fn test_run_with_vision_uses_landmarks() {
        let ai = AiAnalysis::new(["Navy Pier"], 0.8, "Navy Pier").unwrap();
        let outcome = pipeline()
            .with_vision(Some(Arc::new(MockVision::with_analysis(ai))))
            .run(
                &MatchRequest::new()
                    .with_device_gps(gps(41.8917, -87.6086))
                    .with_image(b"jpeg".to_vec()),
            )
            .await
            .unwrap();
        let result = outcome.matched().unwrap();
        assert_eq!(result.match_method, MatchMethod::ComprehensiveAiAnalysis);
        assert_eq!(result.landmark_overlap_count, 1);
    }

    #[tokio::test]
    async fn test_run_degrades_on_vision_failure() {
        let outcome = pipeline()
            .with_vision(Some(Arc::new(MockVision::failing("boom"))))
            .run(
                &MatchRequest::new()
                    .with_device_gps(gps(41.8917, -87.6086))
                    .with_image(b"jpeg".to_vec()),
            )
            .await
            .unwrap();
        let result = outcome.matched().unwrap();
        assert_eq!(result.match_method, MatchMethod::ProximityHeading);
    }

    #[tokio::test]
    async fn test_run_without_location() {
        let outcome = pipeline().run(&MatchRequest::new()).await.unwrap();
        assert_eq!(outcome, MatchOutcome::NoLocationAvailable);
    }

    #[tokio::test]
    async fn test_run_out_of_range() {
        let outcome = pipeline()
            .run(&MatchRequest::new().with_device_gps(gps(41.95, -87.65)))
            .await
            .unwrap();
        assert!(matches!(outcome, MatchOutcome::NoCandidatesInRange { .. }));
    }

    #[tokio::test]
    async fn test_landmark_inference_without_gps() {
        let ai = AiAnalysis::new(["Navy Pier"], 0.4, "").unwrap();
        let outcome = pipeline()
            .with_vision(Some(Arc::new(MockVision::with_analysis(ai))))
            .with_landmarks(Arc::new(LandmarkTable::chicago().unwrap()))
            .run(&MatchRequest::new().with_image(b"jpeg".to_vec()))
            .await
            .unwrap();
        let result = outcome.matched().unwrap();
        assert_eq!(
            result.query_location.source(),
            LocationSource::LandmarkInference
        );
        assert_eq!(result.candidate.id, "pier");
    }
}

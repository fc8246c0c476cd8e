//! Location fusion: merge device GPS, EXIF GPS and image analysis into one
//! best-effort position with a running confidence.

use serde::Serialize;
use tracing::debug;

use crate::geo::{Coordinate, LocationSource};
use crate::landmarks::LandmarkTable;
use crate::vision::AiAnalysis;

/// Confidence before any signal is counted.
pub const BASE_FUSION_CONFIDENCE: f64 = 0.3;

/// Ceiling on fused confidence.
pub const MAX_FUSION_CONFIDENCE: f64 = 0.95;

/// Device fixes at or above this accuracy are not trusted over EXIF.
pub const DEVICE_GPS_MAX_ACCURACY_METERS: f64 = 100.0;

const DEVICE_GPS_BONUS: f64 = 0.4;
const EXIF_GPS_BONUS: f64 = 0.3;
const LOCALE_BONUS_THRESHOLD: f64 = 0.6;
const LOCALE_BONUS: f64 = 0.2;
const LANDMARKS_BONUS: f64 = 0.1;
const AREA_FALLBACK_THRESHOLD: f64 = 0.7;
const AREA_FALLBACK_BONUS: f64 = 0.2;
const LANDMARK_INFERENCE_BONUS: f64 = 0.1;

/// Output of [`LocationFusion::fuse`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FusedLocation {
    /// `None` when no signal yielded a position
    pub location: Option<Coordinate>,
    /// Running confidence in `[0, 0.95]`
    pub confidence: f64,
}

impl FusedLocation {
    pub fn source(&self) -> Option<LocationSource> {
        self.location.map(|c| c.source())
    }
}

/// Fusion rules plus the static data they consult.
#[derive(Debug, Clone)]
pub struct LocationFusion<'a> {
    /// Adopted when analysis is confident about the region but no GPS exists
    pub fallback_area: Coordinate,
    pub landmarks: Option<&'a LandmarkTable>,
}

impl<'a> LocationFusion<'a> {
    pub fn new(fallback_area: Coordinate) -> Self {
        Self {
            fallback_area,
            landmarks: None,
        }
    }

    pub fn with_landmarks(mut self, landmarks: &'a LandmarkTable) -> Self {
        self.landmarks = Some(landmarks);
        self
    }

    /// Combine the available signals.
    ///
    /// 1. Device GPS more accurate than 100 m: adopt, +0.4
    /// 2. Otherwise EXIF GPS: adopt, +0.3
    /// 3. Locale likelihood > 0.6: +0.2
    /// 4. Any landmarks reported: +0.1
    /// 5. Nothing adopted and likelihood > 0.7: adopt the fallback area, +0.2
    /// 6. Nothing adopted and a reported landmark is in the table: adopt it, +0.1
    ///
    /// Confidence is capped at 0.95.
    pub fn fuse(
        &self,
        device_gps: Option<&Coordinate>,
        exif_gps: Option<&Coordinate>,
        ai: Option<&AiAnalysis>,
    ) -> FusedLocation {
        let mut confidence = BASE_FUSION_CONFIDENCE;
        let mut location = None;

        match (device_gps, exif_gps) {
            (Some(device), _) if device.accuracy_meters() < DEVICE_GPS_MAX_ACCURACY_METERS => {
                location = Some(device.with_source(LocationSource::DeviceGps));
                confidence += DEVICE_GPS_BONUS;
            }
            (_, Some(exif)) => {
                location = Some(exif.with_source(LocationSource::ExifGps));
                confidence += EXIF_GPS_BONUS;
            }
            _ => {}
        }

        let likelihood = ai.map_or(0.0, |a| a.locale_likelihood);
        if likelihood > LOCALE_BONUS_THRESHOLD {
            confidence += LOCALE_BONUS;
        }
        if ai.is_some_and(AiAnalysis::has_landmarks) {
            confidence += LANDMARKS_BONUS;
        }

        if location.is_none() && likelihood > AREA_FALLBACK_THRESHOLD {
            location = Some(self.fallback_area.with_source(LocationSource::AreaInference));
            confidence += AREA_FALLBACK_BONUS;
        }

        if location.is_none() {
            if let (Some(table), Some(ai)) = (self.landmarks, ai) {
                if let Some((name, position)) = table.resolve_first(&ai.landmark_names) {
                    debug!(landmark = name, "Location inferred from landmark");
                    location = Some(position);
                    confidence += LANDMARK_INFERENCE_BONUS;
                }
            }
        }

        let fused = FusedLocation {
            location,
            confidence: confidence.min(MAX_FUSION_CONFIDENCE),
        };

        debug!(
            source = ?fused.source(),
            confidence = fused.confidence,
            "Location fused"
        );

        fused
    }
}

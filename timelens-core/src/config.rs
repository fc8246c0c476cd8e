//! Matcher configuration.

use std::time::Duration;

use tracing::warn;

use crate::error::{Result, TimelensError};
use crate::geo::{Coordinate, LocationSource};
use crate::selector::{DEFAULT_HEADING_TOLERANCE_DEGREES, DEFAULT_RADIUS_KM};

/// Chicago city centre (State and Madison).
pub const DEFAULT_FALLBACK_LATITUDE: f64 = 41.8781;
pub const DEFAULT_FALLBACK_LONGITUDE: f64 = -87.6278;

/// Accuracy attached to the fallback area coordinate.
pub const FALLBACK_AREA_ACCURACY_METERS: f64 = 1000.0;

pub const DEFAULT_FALLBACK_AREA: Coordinate = Coordinate::from_trusted(
    DEFAULT_FALLBACK_LATITUDE,
    DEFAULT_FALLBACK_LONGITUDE,
    FALLBACK_AREA_ACCURACY_METERS,
    LocationSource::AreaInference,
);

pub const DEFAULT_VISION_TIMEOUT: Duration = Duration::from_secs(15);

/// Tunables for [`MatchPipeline`](crate::MatchPipeline).
#[derive(Debug, Clone, PartialEq)]
pub struct MatcherConfig {
    pub radius_km: f64,
    pub heading_tolerance_degrees: f64,
    /// Upper bound on one vision provider call, retries included
    pub vision_timeout: Duration,
    /// Position adopted when analysis places the photo in the region but no GPS exists
    pub fallback_area: Coordinate,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            radius_km: DEFAULT_RADIUS_KM,
            heading_tolerance_degrees: DEFAULT_HEADING_TOLERANCE_DEGREES,
            vision_timeout: DEFAULT_VISION_TIMEOUT,
            fallback_area: DEFAULT_FALLBACK_AREA,
        }
    }
}

fn fallback_area(latitude: f64, longitude: f64) -> Result<Coordinate> {
    Ok(
        Coordinate::new(latitude, longitude, LocationSource::AreaInference)?
            .with_accuracy(FALLBACK_AREA_ACCURACY_METERS),
    )
}

fn env_f64(name: &str) -> Option<f64> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse::<f64>() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(variable = name, value = %raw, "Ignoring unparsable environment variable");
            None
        }
    }
}

impl MatcherConfig {
    /// Load configuration from environment variables, defaulting anything unset.
    ///
    /// - `TIMELENS_RADIUS_KM`
    /// - `TIMELENS_HEADING_TOLERANCE`
    /// - `TIMELENS_VISION_TIMEOUT_SECS`
    /// - `TIMELENS_FALLBACK_LAT`, `TIMELENS_FALLBACK_LON`
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let fallback = match (env_f64("TIMELENS_FALLBACK_LAT"), env_f64("TIMELENS_FALLBACK_LON")) {
            (None, None) => defaults.fallback_area,
            // A lone half is rejected rather than paired with the default.
            (lat, lon) => fallback_area(lat.unwrap_or(f64::NAN), lon.unwrap_or(f64::NAN))?,
        };

        let config = Self {
            radius_km: env_f64("TIMELENS_RADIUS_KM").unwrap_or(defaults.radius_km),
            heading_tolerance_degrees: env_f64("TIMELENS_HEADING_TOLERANCE")
                .unwrap_or(defaults.heading_tolerance_degrees),
            vision_timeout: env_f64("TIMELENS_VISION_TIMEOUT_SECS")
                .filter(|s| s.is_finite() && *s > 0.0)
                .map(Duration::from_secs_f64)
                .unwrap_or(defaults.vision_timeout),
            fallback_area: fallback,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_radius_km(mut self, radius_km: f64) -> Self {
        self.radius_km = radius_km;
        self
    }

    pub fn with_vision_timeout(mut self, timeout: Duration) -> Self {
        self.vision_timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.radius_km.is_finite() || self.radius_km < 0.0 {
            return Err(TimelensError::InvalidRadius(self.radius_km));
        }
        if !(0.0..=180.0).contains(&self.heading_tolerance_degrees) {
            return Err(TimelensError::InvalidViewingArc(format!(
                "heading tolerance must be in [0, 180], got {}",
                self.heading_tolerance_degrees
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MatcherConfig::default();
        assert_eq!(config.radius_km, 1.0);
        assert_eq!(config.heading_tolerance_degrees, 60.0);
        assert_eq!(config.vision_timeout, Duration::from_secs(15));
        assert_eq!(config.fallback_area.source(), LocationSource::AreaInference);
        assert_eq!(config.fallback_area.accuracy_meters(), 1000.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(MatcherConfig::default().with_radius_km(-1.0).validate().is_err());
        assert!(MatcherConfig::default().with_radius_km(f64::NAN).validate().is_err());

        let mut config = MatcherConfig::default();
        config.heading_tolerance_degrees = 200.0;
        assert!(config.validate().is_err());
    }
}

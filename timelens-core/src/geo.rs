//! Geodesy primitives: validated coordinates, great-circle distance and the
//! bounding-box pre-filter used ahead of exact radius checks.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TimelensError};

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Kilometres per degree of latitude used by the bounding-box approximation.
pub const KM_PER_DEGREE: f64 = 111.0;

/// Accuracy assumed when a source does not report one.
pub const DEFAULT_ACCURACY_METERS: f64 = 1000.0;

/// Geohash length used when a location is logged or echoed back to clients
/// (roughly 150 m cells).
pub const LOG_GEOHASH_PRECISION: usize = 7;

/// Where a coordinate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationSource {
    /// Reported by the capturing device at upload time
    DeviceGps,
    /// Read from the image's EXIF GPS block
    ExifGps,
    /// Position of a landmark recognised in the image
    LandmarkInference,
    /// Configured centre of the catalog's region
    AreaInference,
    /// Recorded position of a catalog photograph
    #[default]
    Catalog,
}

impl std::fmt::Display for LocationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DeviceGps => write!(f, "device_gps"),
            Self::ExifGps => write!(f, "exif_gps"),
            Self::LandmarkInference => write!(f, "landmark_inference"),
            Self::AreaInference => write!(f, "area_inference"),
            Self::Catalog => write!(f, "catalog"),
        }
    }
}

/// A validated WGS84 position with its accuracy and provenance.
///
/// Fields are private so every instance has passed range validation;
/// use [`Coordinate::new`] or the builder-style setters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CoordinateRecord", into = "CoordinateRecord")]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
    accuracy_meters: f64,
    source: LocationSource,
}

/// Wire shape of [`Coordinate`]; validated on the way in.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CoordinateRecord {
    latitude: f64,
    longitude: f64,
    #[serde(default = "default_accuracy")]
    accuracy_meters: f64,
    #[serde(default)]
    source: LocationSource,
}

fn default_accuracy() -> f64 {
    DEFAULT_ACCURACY_METERS
}

impl TryFrom<CoordinateRecord> for Coordinate {
    type Error = TimelensError;

    fn try_from(record: CoordinateRecord) -> Result<Self> {
        Ok(Self::new(record.latitude, record.longitude, record.source)?
            .with_accuracy(record.accuracy_meters))
    }
}

impl From<Coordinate> for CoordinateRecord {
    fn from(c: Coordinate) -> Self {
        Self {
            latitude: c.latitude,
            longitude: c.longitude,
            accuracy_meters: c.accuracy_meters,
            source: c.source,
        }
    }
}

impl Coordinate {
    /// Create a coordinate with the default (unknown) accuracy.
    ///
    /// Returns `InvalidCoordinate` when latitude is outside [-90, 90],
    /// longitude outside [-180, 180], or either is not finite.
    pub fn new(latitude: f64, longitude: f64, source: LocationSource) -> Result<Self> {
        if !latitude.is_finite()
            || !longitude.is_finite()
            || !(-90.0..=90.0).contains(&latitude)
            || !(-180.0..=180.0).contains(&longitude)
        {
            return Err(TimelensError::InvalidCoordinate {
                latitude,
                longitude,
            });
        }

        Ok(Self {
            latitude,
            longitude,
            accuracy_meters: DEFAULT_ACCURACY_METERS,
            source,
        })
    }

    /// Build a coordinate from literals already known to be in range.
    pub(crate) const fn from_trusted(
        latitude: f64,
        longitude: f64,
        accuracy_meters: f64,
        source: LocationSource,
    ) -> Self {
        Self {
            latitude,
            longitude,
            accuracy_meters,
            source,
        }
    }

    /// Set the reported accuracy. Non-finite or negative values fall back to
    /// the default.
    pub fn with_accuracy(mut self, accuracy_meters: f64) -> Self {
        self.accuracy_meters = if accuracy_meters.is_finite() && accuracy_meters >= 0.0 {
            accuracy_meters
        } else {
            DEFAULT_ACCURACY_METERS
        };
        self
    }

    /// Same position, different provenance.
    pub fn with_source(mut self, source: LocationSource) -> Self {
        self.source = source;
        self
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn accuracy_meters(&self) -> f64 {
        self.accuracy_meters
    }

    pub fn source(&self) -> LocationSource {
        self.source
    }

    /// Encode the position as a geohash of the given length.
    ///
    /// Used to log request locations at neighbourhood precision.
    pub fn geohash(&self, precision: usize) -> Option<String> {
        geohash::encode(
            geohash::Coord {
                x: self.longitude,
                y: self.latitude,
            },
            precision,
        )
        .ok()
    }
}

/// Great-circle distance between two coordinates in kilometres (haversine).
pub fn distance_km(a: &Coordinate, b: &Coordinate) -> f64 {
    haversine_km(a.latitude, a.longitude, b.latitude, b.longitude)
}

/// Haversine distance over raw degrees.
///
/// Differences are taken as absolute values so the result is bit-for-bit
/// symmetric in its arguments.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlat = (lat2 - lat1).abs().to_radians();
    let dlon = (lon2 - lon1).abs().to_radians();

    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlon / 2.0).sin().powi(2);

    let c = 2.0 * a.sqrt().atan2((1.0 - a).max(0.0).sqrt());
    EARTH_RADIUS_KM * c
}

/// Axis-aligned latitude/longitude box around a centre point.
///
/// This is a loose pre-filter: it contains the true radius circle, so an
/// exact [`distance_km`] check must always follow.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    center_latitude: f64,
    center_longitude: f64,
    lat_delta: f64,
    lon_delta: f64,
}

impl BoundingBox {
    /// Latitude range `(min, max)`, clamped to the poles.
    pub fn lat_range(&self) -> (f64, f64) {
        (
            (self.center_latitude - self.lat_delta).max(-90.0),
            (self.center_latitude + self.lat_delta).min(90.0),
        )
    }

    /// Longitude range `(min, max)`. Bounds may extend past ±180 when the box
    /// straddles the antimeridian; [`BoundingBox::contains`] handles the wrap.
    pub fn lon_range(&self) -> (f64, f64) {
        (
            self.center_longitude - self.lon_delta,
            self.center_longitude + self.lon_delta,
        )
    }

    /// Whether a coordinate falls inside the box.
    pub fn contains(&self, c: &Coordinate) -> bool {
        let (min_lat, max_lat) = self.lat_range();
        if c.latitude < min_lat || c.latitude > max_lat {
            return false;
        }

        if self.lon_delta >= 180.0 {
            return true;
        }

        let mut diff = (c.longitude - self.center_longitude).abs() % 360.0;
        if diff > 180.0 {
            diff = 360.0 - diff;
        }
        diff <= self.lon_delta
    }
}

/// Bounding box for a radius query.
///
/// Latitude delta is `radius_km / 111`. Longitude delta is
/// `radius_km / (111 * cos(latitude))`, widened to the spherical extent
/// `asin(sin(r / R) / cos(latitude))` where that is larger. Close to the
/// poles the flat approximation is too narrow, and once the circle reaches
/// a pole the box spans every longitude.
pub fn bounding_box(center: &Coordinate, radius_km: f64) -> BoundingBox {
    let lat_delta = radius_km / KM_PER_DEGREE;
    let angular_radius = radius_km / EARTH_RADIUS_KM;
    let polar_reach = lat_delta.max(angular_radius.to_degrees());
    let cos_lat = center.latitude.to_radians().cos().abs();

    let lon_delta = if center.latitude.abs() + polar_reach >= 90.0 || cos_lat < 1e-9 {
        180.0
    } else {
        let ratio = angular_radius.sin() / cos_lat;
        if ratio >= 1.0 {
            180.0
        } else {
            let flat = radius_km / (KM_PER_DEGREE * cos_lat);
            let spherical = ratio.asin().to_degrees();
            // Slack so entries on the exact radius survive rounding.
            (flat.max(spherical) * (1.0 + 1e-9)).min(180.0)
        }
    };

    BoundingBox {
        center_latitude: center.latitude,
        center_longitude: center.longitude,
        lat_delta,
        lon_delta,
    }
}

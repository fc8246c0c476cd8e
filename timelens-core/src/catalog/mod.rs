//! Historical photo catalog.
//!
//! The catalog is an external collaborator: the matcher only needs a
//! consistent snapshot of the records near a point. [`CatalogStore`] is the
//! seam; [`InMemoryCatalog`] is the bundled implementation.

mod memory;

pub use memory::InMemoryCatalog;

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TimelensError};
use crate::geo::{Coordinate, LocationSource};

/// Compass-heading range from which a catalog photo was taken.
///
/// Both bounds are whole degrees in `[0, 360)`. When `start > end` the arc
/// wraps through North (e.g. 350..10).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "ArcRecord")]
pub struct ViewingArc {
    start_degrees: u16,
    end_degrees: u16,
}

#[derive(Deserialize)]
struct ArcRecord {
    start_degrees: u16,
    end_degrees: u16,
}

impl TryFrom<ArcRecord> for ViewingArc {
    type Error = TimelensError;

    fn try_from(record: ArcRecord) -> Result<Self> {
        Self::new(record.start_degrees, record.end_degrees)
    }
}

impl ViewingArc {
    pub fn new(start_degrees: u16, end_degrees: u16) -> Result<Self> {
        if start_degrees >= 360 || end_degrees >= 360 {
            return Err(TimelensError::InvalidViewingArc(format!(
                "bounds must be in [0, 360), got {start_degrees}..{end_degrees}"
            )));
        }
        Ok(Self {
            start_degrees,
            end_degrees,
        })
    }

    pub fn start_degrees(&self) -> u16 {
        self.start_degrees
    }

    pub fn end_degrees(&self) -> u16 {
        self.end_degrees
    }

    /// Whether the arc passes through North.
    pub fn wraps(&self) -> bool {
        self.start_degrees > self.end_degrees
    }

    /// Whether `heading` lies inside the arc, inclusive of both bounds.
    pub fn contains(&self, heading_degrees: f64) -> bool {
        let h = normalize_heading(heading_degrees);
        let start = f64::from(self.start_degrees);
        let end = f64::from(self.end_degrees);

        if self.wraps() {
            h >= start || h <= end
        } else {
            start <= h && h <= end
        }
    }

    /// Whether `heading` is within `tolerance_degrees` of either bound,
    /// measured the short way around the compass.
    pub fn near_boundary(&self, heading_degrees: f64, tolerance_degrees: f64) -> bool {
        [self.start_degrees, self.end_degrees]
            .iter()
            .any(|&bound| angular_difference(heading_degrees, f64::from(bound)) <= tolerance_degrees)
    }

    /// Heading-filter predicate: inside the arc or close to one of its bounds.
    pub fn accepts(&self, heading_degrees: f64, tolerance_degrees: f64) -> bool {
        self.contains(heading_degrees) || self.near_boundary(heading_degrees, tolerance_degrees)
    }
}

/// Map any finite heading onto `[0, 360)`.
pub fn normalize_heading(heading_degrees: f64) -> f64 {
    let h = heading_degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if h >= 360.0 {
        0.0
    } else {
        h
    }
}

/// Smallest angle between two compass headings, in `[0, 180]`.
pub fn angular_difference(a: f64, b: f64) -> f64 {
    let diff = (normalize_heading(a) - normalize_heading(b)).abs();
    if diff > 180.0 {
        360.0 - diff
    } else {
        diff
    }
}

/// A historical photograph record.
///
/// The scores are private: they are only set through [`CatalogEntry::with_interest`],
/// [`CatalogEntry::with_quality`] or deserialization, all of which check the
/// `[0, 1]` range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CatalogRecord", into = "CatalogRecord")]
pub struct CatalogEntry {
    pub id: String,
    pub title: String,
    pub year: i32,
    pub location: Coordinate,
    pub viewing_arc: ViewingArc,
    pub landmark_names: BTreeSet<String>,
    /// Prior on how interesting the photo is, in `[0, 1]`
    historical_interest_score: f64,
    /// Scan/print quality, in `[0, 1]`
    image_quality_score: f64,
    pub description: Option<String>,
    pub source: Option<String>,
    /// Short narrative hook shown alongside a match
    pub story_context: Option<String>,
}

/// Flat wire/storage shape of a catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CatalogRecord {
    id: String,
    title: String,
    year: i32,
    latitude: f64,
    longitude: f64,
    viewing_arc: ViewingArc,
    #[serde(default)]
    landmark_names: BTreeSet<String>,
    #[serde(default = "default_score")]
    historical_interest_score: f64,
    #[serde(default = "default_score")]
    image_quality_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    story_context: Option<String>,
}

fn default_score() -> f64 {
    0.5
}

impl TryFrom<CatalogRecord> for CatalogEntry {
    type Error = TimelensError;

    fn try_from(r: CatalogRecord) -> Result<Self> {
        let entry = Self {
            id: r.id,
            title: r.title,
            year: r.year,
            location: Coordinate::new(r.latitude, r.longitude, LocationSource::Catalog)?,
            viewing_arc: r.viewing_arc,
            landmark_names: r.landmark_names,
            historical_interest_score: r.historical_interest_score,
            image_quality_score: r.image_quality_score,
            description: r.description,
            source: r.source,
            story_context: r.story_context,
        };
        entry.validate()?;
        Ok(entry)
    }
}

impl From<CatalogEntry> for CatalogRecord {
    fn from(e: CatalogEntry) -> Self {
        Self {
            id: e.id,
            title: e.title,
            year: e.year,
            latitude: e.location.latitude(),
            longitude: e.location.longitude(),
            viewing_arc: e.viewing_arc,
            landmark_names: e.landmark_names,
            historical_interest_score: e.historical_interest_score,
            image_quality_score: e.image_quality_score,
            description: e.description,
            source: e.source,
            story_context: e.story_context,
        }
    }
}

impl CatalogEntry {
    /// Create an entry with neutral scores and no landmarks.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        year: i32,
        location: Coordinate,
        viewing_arc: ViewingArc,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            year,
            location: location.with_source(LocationSource::Catalog),
            viewing_arc,
            landmark_names: BTreeSet::new(),
            historical_interest_score: default_score(),
            image_quality_score: default_score(),
            description: None,
            source: None,
            story_context: None,
        }
    }

    pub fn with_landmarks<I, S>(mut self, landmarks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.landmark_names = landmarks.into_iter().map(Into::into).collect();
        self
    }

    /// Set the historical-interest prior. `InvalidScore` outside `[0, 1]`.
    pub fn with_interest(mut self, score: f64) -> Result<Self> {
        check_unit_score("historical_interest_score", score)?;
        self.historical_interest_score = score;
        Ok(self)
    }

    /// Set the image quality score. `InvalidScore` outside `[0, 1]`.
    pub fn with_quality(mut self, score: f64) -> Result<Self> {
        check_unit_score("image_quality_score", score)?;
        self.image_quality_score = score;
        Ok(self)
    }

    pub fn historical_interest_score(&self) -> f64 {
        self.historical_interest_score
    }

    pub fn image_quality_score(&self) -> f64 {
        self.image_quality_score
    }

    pub fn with_story_context(mut self, context: impl Into<String>) -> Self {
        self.story_context = Some(context.into());
        self
    }

    /// Check the score invariants. Stores call this before accepting a record.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(TimelensError::Catalog("entry id must not be empty".into()));
        }
        check_unit_score("historical_interest_score", self.historical_interest_score)?;
        check_unit_score("image_quality_score", self.image_quality_score)?;
        Ok(())
    }
}

pub(crate) fn check_unit_score(field: &'static str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(TimelensError::InvalidScore { field, value })
    }
}

/// Read/write access to a historical photo catalog.
///
/// Implementations must return a consistent snapshot from
/// [`CatalogStore::query_near`]; the matcher does not re-read the store
/// during a single selection and scoring pass.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Entries within `radius_km` of `center`.
    ///
    /// Implementations may over-fetch (bounding box, index cell), so the
    /// caller still applies the exact haversine filter.
    async fn query_near(&self, center: &Coordinate, radius_km: f64) -> Result<Vec<CatalogEntry>>;

    async fn get(&self, id: &str) -> Result<Option<CatalogEntry>>;

    /// Insert or replace an entry by id.
    async fn insert(&self, entry: CatalogEntry) -> Result<()>;

    async fn len(&self) -> Result<usize>;

    async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arc_rejects_out_of_range() {
        assert!(ViewingArc::new(360, 10).is_err());
        assert!(ViewingArc::new(0, 400).is_err());
        assert!(ViewingArc::new(0, 359).is_ok());
    }

    #[test]
    fn test_arc_contains_plain() {
        let arc = ViewingArc::new(80, 120).unwrap();
        assert!(!arc.wraps());
        assert!(arc.contains(80.0));
        assert!(arc.contains(100.0));
        assert!(arc.contains(120.0));
        assert!(!arc.contains(121.0));
        assert!(!arc.contains(0.0));
    }

    #[test]
    fn test_arc_contains_wraparound() {
        let arc = ViewingArc::new(350, 10).unwrap();
        assert!(arc.wraps());
        assert!(arc.contains(355.0));
        assert!(arc.contains(0.0));
        assert!(arc.contains(5.0));
        assert!(arc.contains(365.0));
        assert!(!arc.contains(180.0));
        assert!(!arc.contains(11.0));
    }

    #[test]
    fn test_near_boundary_wraps_compass() {
        let arc = ViewingArc::new(90, 120).unwrap();
        assert!(arc.near_boundary(30.0, 60.0));
        assert!(!arc.near_boundary(29.0, 60.0));

        let north = ViewingArc::new(10, 40).unwrap();
        // 340 is 30 degrees from 10 going through North
        assert!(north.near_boundary(340.0, 60.0));
    }

    #[test]
    fn test_angular_difference() {
        assert_eq!(angular_difference(350.0, 10.0), 20.0);
        assert_eq!(angular_difference(10.0, 350.0), 20.0);
        assert_eq!(angular_difference(0.0, 180.0), 180.0);
        assert_eq!(angular_difference(-90.0, 270.0), 0.0);
    }

    #[test]
    fn test_entry_from_json() {
        let json = r#"{
            "id": "state_street_1950",
            "title": "State Street Looking North",
            "year": 1950,
            "latitude": 41.8781,
            "longitude": -87.6278,
            "viewing_arc": {"start_degrees": 350, "end_degrees": 10},
            "landmark_names": ["Chicago Theater", "State Street"],
            "historical_interest_score": 0.95,
            "image_quality_score": 0.9
        }"#;
        let entry: CatalogEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.year, 1950);
        assert_eq!(entry.location.source(), LocationSource::Catalog);
        assert!(entry.landmark_names.contains("State Street"));
        assert!(entry.viewing_arc.wraps());
        assert_eq!(entry.historical_interest_score(), 0.95);
        assert_eq!(entry.image_quality_score(), 0.9);
    }

    #[test]
    fn test_score_setters_validate() {
        let entry = CatalogEntry::new(
            "x",
            "x",
            1900,
            Coordinate::new(0.0, 0.0, LocationSource::Catalog).unwrap(),
            ViewingArc::new(0, 90).unwrap(),
        );

        assert!(matches!(
            entry.clone().with_interest(5.0),
            Err(TimelensError::InvalidScore { field: "historical_interest_score", .. })
        ));
        assert!(entry.clone().with_quality(-0.1).is_err());
        assert!(entry.clone().with_interest(f64::NAN).is_err());

        let entry = entry.with_interest(1.0).unwrap().with_quality(0.0).unwrap();
        assert_eq!(entry.historical_interest_score(), 1.0);
        assert_eq!(entry.image_quality_score(), 0.0);
    }

    #[test]
    fn test_entry_rejects_bad_score() {
        let json = r#"{
            "id": "x", "title": "x", "year": 1900,
            "latitude": 0.0, "longitude": 0.0,
            "viewing_arc": {"start_degrees": 0, "end_degrees": 90},
            "historical_interest_score": 1.5
        }"#;
        assert!(serde_json::from_str::<CatalogEntry>(json).is_err());
    }

    #[test]
    fn test_entry_rejects_bad_arc() {
        let json = r#"{
            "id": "x", "title": "x", "year": 1900,
            "latitude": 0.0, "longitude": 0.0,
            "viewing_arc": {"start_degrees": 0, "end_degrees": 360}
        }"#;
        assert!(serde_json::from_str::<CatalogEntry>(json).is_err());
    }
}

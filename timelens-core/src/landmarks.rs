//! Landmark name to coordinate lookup table.
//!
//! Static configuration data: injected into location fusion so the matcher
//! can place a photo from a recognised landmark when no GPS fix exists.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Result, TimelensError};
use crate::geo::{Coordinate, LocationSource};

/// Chicago landmark table shipped with the crate.
const CHICAGO_LANDMARKS_JSON: &str = include_str!("../data/chicago_landmarks.json");

/// Accuracy assigned to a landmark-derived position.
pub const LANDMARK_ACCURACY_METERS: f64 = 200.0;

#[derive(Deserialize)]
struct LandmarkPoint {
    latitude: f64,
    longitude: f64,
}

/// Case-insensitive landmark lookup.
#[derive(Debug, Clone, Default)]
pub struct LandmarkTable {
    /// lowercase name -> (display name, position)
    entries: BTreeMap<String, (String, Coordinate)>,
}

impl LandmarkTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON object of `{ "Name": { "latitude": .., "longitude": .. } }`.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: BTreeMap<String, LandmarkPoint> = serde_json::from_str(json)
            .map_err(|e| TimelensError::Catalog(format!("Failed to parse landmark table: {e}")))?;

        let mut table = Self::new();
        for (name, point) in raw {
            table.insert(&name, point.latitude, point.longitude)?;
        }
        Ok(table)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            TimelensError::Catalog(format!(
                "Failed to read landmark table {}: {e}",
                path.display()
            ))
        })?;
        Self::from_json_str(&json)
    }

    /// The bundled Chicago landmark table.
    pub fn chicago() -> Result<Self> {
        Self::from_json_str(CHICAGO_LANDMARKS_JSON)
    }

    pub fn insert(&mut self, name: &str, latitude: f64, longitude: f64) -> Result<()> {
        let position = Coordinate::new(latitude, longitude, LocationSource::LandmarkInference)?
            .with_accuracy(LANDMARK_ACCURACY_METERS);
        self.entries
            .insert(name.to_lowercase(), (name.to_string(), position));
        Ok(())
    }

    /// Position of a landmark by name, ignoring case.
    pub fn lookup(&self, name: &str) -> Option<Coordinate> {
        self.entries
            .get(&name.to_lowercase())
            .map(|(_, position)| *position)
    }

    /// First of `names` that the table knows, with its position.
    pub fn resolve_first<'a, I>(&self, names: I) -> Option<(&'a str, Coordinate)>
    where
        I: IntoIterator<Item = &'a String>,
    {
        names
            .into_iter()
            .find_map(|name| self.lookup(name).map(|pos| (name.as_str(), pos)))
    }

    /// Display names in alphabetical order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.values().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

//! In-memory catalog store backed by a JSON snapshot.

use std::path::Path;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

use super::{CatalogEntry, CatalogStore};
use crate::error::{Result, TimelensError};
use crate::geo::{bounding_box, distance_km, Coordinate};

/// Chicago catalog shipped with the crate.
const CHICAGO_CATALOG_JSON: &str = include_str!("../../data/chicago_catalog.json");

/// Catalog held entirely in memory.
///
/// Queries take a read lock and return cloned entries, so each call sees a
/// consistent snapshot even while another task inserts.
#[derive(Default)]
pub struct InMemoryCatalog {
    entries: RwLock<Vec<CatalogEntry>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from already-validated entries.
    pub fn from_entries(entries: Vec<CatalogEntry>) -> Result<Self> {
        for entry in &entries {
            entry.validate()?;
        }
        Ok(Self {
            entries: RwLock::new(entries),
        })
    }

    /// Parse a JSON array of catalog records.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let entries: Vec<CatalogEntry> = serde_json::from_str(json)
            .map_err(|e| TimelensError::Catalog(format!("Failed to parse catalog JSON: {e}")))?;
        Self::from_entries(entries)
    }

    /// Load a JSON catalog file.
    #[instrument(level = "debug", skip_all, fields(path = %path.as_ref().display()))]
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            TimelensError::Catalog(format!("Failed to read catalog {}: {e}", path.display()))
        })?;
        let catalog = Self::from_json_str(&json)?;
        info!(
            path = %path.display(),
            entries = catalog.entries.try_read().map(|e| e.len()).unwrap_or_default(),
            "Loaded catalog"
        );
        Ok(catalog)
    }

    /// The bundled Chicago catalog.
    pub fn chicago() -> Result<Self> {
        Self::from_json_str(CHICAGO_CATALOG_JSON)
    }

    /// Clone of every entry, in insertion order.
    pub async fn snapshot(&self) -> Vec<CatalogEntry> {
        self.entries.read().await.clone()
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalog {
    async fn query_near(&self, center: &Coordinate, radius_km: f64) -> Result<Vec<CatalogEntry>> {
        if !radius_km.is_finite() || radius_km < 0.0 {
            return Err(TimelensError::InvalidRadius(radius_km));
        }

        let bbox = bounding_box(center, radius_km);
        let entries = self.entries.read().await;

        let near: Vec<CatalogEntry> = entries
            .iter()
            .filter(|entry| bbox.contains(&entry.location))
            .filter(|entry| distance_km(&entry.location, center) <= radius_km)
            .cloned()
            .collect();

        debug!(
            total = entries.len(),
            found = near.len(),
            radius_km,
            "Catalog radius query"
        );

        Ok(near)
    }

    async fn get(&self, id: &str) -> Result<Option<CatalogEntry>> {
        Ok(self
            .entries
            .read()
            .await
            .iter()
            .find(|entry| entry.id == id)
            .cloned())
    }

    async fn insert(&self, entry: CatalogEntry) -> Result<()> {
        entry.validate()?;
        let mut entries = self.entries.write().await;
        match entries.iter_mut().find(|existing| existing.id == entry.id) {
            Some(existing) => *existing = entry,
            None => entries.push(entry),
        }
        Ok(())
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.entries.read().await.len())
    }
}

impl std::fmt::Debug for InMemoryCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryCatalog")
            .field(
                "entries",
                &self.entries.try_read().map(|e| e.len()).unwrap_or_default(),
            )
            .finish()
    }
}

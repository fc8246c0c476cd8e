//! Catalog browsing handlers
//!
//! `GET /catalog/near` lists historical photos around a point and
//! `GET /catalog/{id}` returns a single entry.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use timelens_core::{distance_km, CatalogEntry, CatalogStore, Coordinate, LocationSource};
use utoipa::{IntoParams, ToSchema};

use crate::error::ApiError;
use crate::state::AppState;
use crate::validation::validate_near_radius;

/// Default radius for catalog browsing
const DEFAULT_NEAR_RADIUS_KM: f64 = 1.0;

/// Query parameters for `GET /catalog/near`
#[derive(Debug, Deserialize, IntoParams)]
pub struct NearQuery {
    /// Latitude in decimal degrees
    #[param(example = 41.8781)]
    pub lat: f64,
    /// Longitude in decimal degrees
    #[param(example = -87.6278)]
    pub lon: f64,
    /// Search radius in kilometres (default: 1.0, max: 50)
    #[param(example = 1.0)]
    pub radius_km: Option<f64>,
}

/// Compass arc the photographer faced, clockwise from `start_degrees`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ViewingArcSummary {
    #[schema(example = 350)]
    pub start_degrees: u16,
    #[schema(example = 10)]
    pub end_degrees: u16,
}

/// Public view of a catalog entry.
#[derive(Debug, Serialize, ToSchema)]
pub struct CatalogEntrySummary {
    #[schema(example = "state_street_1950")]
    pub id: String,
    #[schema(example = "State Street Shopping District")]
    pub title: String,
    #[schema(example = 1950)]
    pub year: i32,
    pub latitude: f64,
    pub longitude: f64,
    pub viewing_arc: ViewingArcSummary,
    pub landmark_names: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl From<&CatalogEntry> for CatalogEntrySummary {
    fn from(entry: &CatalogEntry) -> Self {
        Self {
            id: entry.id.clone(),
            title: entry.title.clone(),
            year: entry.year,
            latitude: entry.location.latitude(),
            longitude: entry.location.longitude(),
            viewing_arc: ViewingArcSummary {
                start_degrees: entry.viewing_arc.start_degrees(),
                end_degrees: entry.viewing_arc.end_degrees(),
            },
            landmark_names: entry.landmark_names.iter().cloned().collect(),
            description: entry.description.clone(),
            source: entry.source.clone(),
        }
    }
}

/// A catalog entry with its distance from the query point
#[derive(Debug, Serialize, ToSchema)]
pub struct NearbyEntry {
    #[serde(flatten)]
    pub entry: CatalogEntrySummary,
    #[schema(example = 179.4)]
    pub distance_meters: f64,
}

/// Response for `GET /catalog/near`
#[derive(Debug, Serialize, ToSchema)]
pub struct NearResponse {
    #[schema(example = 3)]
    pub count: usize,
    pub radius_km: f64,
    /// Entries sorted by distance, closest first
    pub entries: Vec<NearbyEntry>,
}

/// List historical photos near a point.
#[utoipa::path(
    get,
    path = "/catalog/near",
    tag = "Catalog",
    params(NearQuery),
    responses(
        (status = 200, description = "Entries within the radius", body = NearResponse),
        (status = 400, description = "Invalid coordinate or radius")
    )
)]
pub async fn near_handler(
    State(state): State<AppState>,
    Query(query): Query<NearQuery>,
) -> Result<Json<NearResponse>, ApiError> {
    let center = Coordinate::new(query.lat, query.lon, LocationSource::DeviceGps)?;
    let radius_km = validate_near_radius(query.radius_km.unwrap_or(DEFAULT_NEAR_RADIUS_KM))?;

    let mut entries: Vec<NearbyEntry> = state
        .catalog
        .query_near(&center, radius_km)
        .await?
        .iter()
        .map(|entry| NearbyEntry {
            entry: entry.into(),
            distance_meters: distance_km(&entry.location, &center) * 1000.0,
        })
        .collect();
    entries.sort_by(|a, b| a.distance_meters.total_cmp(&b.distance_meters));

    tracing::debug!(count = entries.len(), radius_km, "Catalog near query");

    Ok(Json(NearResponse {
        count: entries.len(),
        radius_km,
        entries,
    }))
}

/// Fetch one catalog entry by id.
#[utoipa::path(
    get,
    path = "/catalog/{id}",
    tag = "Catalog",
    params(("id" = String, Path, description = "Catalog entry id")),
    responses(
        (status = 200, description = "Catalog entry", body = CatalogEntrySummary),
        (status = 404, description = "No entry with this id")
    )
)]
pub async fn entry_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CatalogEntrySummary>, ApiError> {
    let entry = state
        .catalog
        .get(&id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Catalog entry '{}'", id)))?;

    Ok(Json(CatalogEntrySummary::from(&entry)))
}

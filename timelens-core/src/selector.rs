//! Candidate selection: proximity filter, then viewing-direction filter.

use tracing::debug;

use crate::catalog::CatalogEntry;
use crate::geo::{distance_km, Coordinate};

/// Search radius used when none is configured.
pub const DEFAULT_RADIUS_KM: f64 = 1.0;

/// How far outside a viewing arc a heading may fall and still pass.
pub const DEFAULT_HEADING_TOLERANCE_DEGREES: f64 = 60.0;

/// [`select_with_tolerance`] with the default heading tolerance.
pub fn select<'a, I>(
    catalog: I,
    at: &Coordinate,
    heading_degrees: Option<f64>,
    radius_km: f64,
) -> Vec<&'a CatalogEntry>
where
    I: IntoIterator<Item = &'a CatalogEntry>,
{
    select_with_tolerance(
        catalog,
        at,
        heading_degrees,
        radius_km,
        DEFAULT_HEADING_TOLERANCE_DEGREES,
    )
}

/// Entries within `radius_km` of `at`, narrowed by heading when one is known.
///
/// - An empty proximity set is returned as-is; the radius is never widened.
/// - The heading keeps entries whose arc contains it or whose nearest arc
///   bound is within `tolerance_degrees`. If that would drop every entry,
///   the proximity set is returned unchanged.
/// - Non-finite headings are treated as unknown.
///
/// Catalog order is preserved. A negative or NaN radius selects nothing.
pub fn select_with_tolerance<'a, I>(
    catalog: I,
    at: &Coordinate,
    heading_degrees: Option<f64>,
    radius_km: f64,
    tolerance_degrees: f64,
) -> Vec<&'a CatalogEntry>
where
    I: IntoIterator<Item = &'a CatalogEntry>,
{
    let nearby: Vec<&CatalogEntry> = catalog
        .into_iter()
        .filter(|entry| distance_km(&entry.location, at) <= radius_km)
        .collect();

    if nearby.is_empty() {
        debug!(radius_km, "No catalog entries within radius");
        return nearby;
    }

    let Some(heading) = heading_degrees.filter(|h| h.is_finite()) else {
        debug!(candidates = nearby.len(), "Proximity filter only, heading unknown");
        return nearby;
    };

    let facing: Vec<&CatalogEntry> = nearby
        .iter()
        .copied()
        .filter(|entry| entry.viewing_arc.accepts(heading, tolerance_degrees))
        .collect();

    if facing.is_empty() {
        debug!(
            heading,
            candidates = nearby.len(),
            "Heading filter matched nothing, keeping proximity set"
        );
        nearby
    } else {
        debug!(
            heading,
            nearby = nearby.len(),
            facing = facing.len(),
            "Heading filter applied"
        );
        facing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ViewingArc;
    use crate::geo::LocationSource;

    fn entry(id: &str, lat: f64, lon: f64, start: u16, end: u16) -> CatalogEntry {
        CatalogEntry::new(
            id,
            id,
            1950,
            Coordinate::new(lat, lon, LocationSource::Catalog).unwrap(),
            ViewingArc::new(start, end).unwrap(),
        )
    }

    fn here() -> Coordinate {
        Coordinate::new(41.8781, -87.6278, LocationSource::DeviceGps).unwrap()
    }

    fn ids(selected: &[&CatalogEntry]) -> Vec<String> {
        selected.iter().map(|e| e.id.clone()).collect()
    }

    #[test]
    fn test_proximity_only_without_heading() {
        let catalog = vec![
            entry("a", 41.8781, -87.6278, 0, 90),
            entry("b", 41.8790, -87.6278, 180, 270),
            entry("far", 41.95, -87.6278, 0, 90),
        ];
        let selected = select(&catalog, &here(), None, 1.0);
        assert_eq!(ids(&selected), vec!["a", "b"]);
    }

    #[test]
    fn test_heading_narrows_set() {
        let catalog = vec![
            entry("north", 41.8781, -87.6278, 350, 10),
            entry("south", 41.8781, -87.6278, 170, 190),
        ];
        let selected = select(&catalog, &here(), Some(5.0), 1.0);
        assert_eq!(ids(&selected), vec!["north"]);
    }

    #[test]
    fn test_heading_tolerance_window() {
        let catalog = vec![entry("east", 41.8781, -87.6278, 80, 100)];
        // 60 degrees before the start bound
        assert_eq!(select_with_tolerance(&catalog, &here(), Some(20.0), 1.0, 60.0).len(), 1);

        let with_other = vec![
            entry("east", 41.8781, -87.6278, 80, 100),
            entry("west", 41.8781, -87.6278, 260, 280),
        ];
        let selected = select_with_tolerance(&with_other, &here(), Some(20.0), 1.0, 60.0);
        assert_eq!(ids(&selected), vec!["east"]);
        let strict = select_with_tolerance(&with_other, &here(), Some(20.0), 1.0, 10.0);
        // nothing within 10 degrees: falls back to both
        assert_eq!(strict.len(), 2);
    }

    #[test]
    fn test_heading_fallback_keeps_proximity_set() {
        let catalog = vec![
            entry("a", 41.8781, -87.6278, 170, 190),
            entry("b", 41.8785, -87.6278, 160, 200),
        ];
        let selected = select_with_tolerance(&catalog, &here(), Some(0.0), 1.0, 30.0);
        assert_eq!(ids(&selected), vec!["a", "b"]);
    }

    #[test]
    fn test_nan_heading_ignored() {
        let catalog = vec![entry("a", 41.8781, -87.6278, 170, 190)];
        assert_eq!(select(&catalog, &here(), Some(f64::NAN), 1.0).len(), 1);
    }

    #[test]
    fn test_empty_proximity_not_widened() {
        let catalog = vec![entry("far", 41.9231, -87.6278, 0, 90)];
        assert!(select(&catalog, &here(), Some(45.0), 1.0).is_empty());
    }
}

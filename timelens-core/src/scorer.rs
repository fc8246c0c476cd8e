//! Multi-factor ranking of selected candidates.
//!
//! ```text
//! distance_score  = max(0, 1 - distance_km / 2)
//! landmark_score  = min(0.3 * overlap, 1)
//! composite_score = 0.4 * distance_score + 0.3 * landmark_score + 0.3 * historical_interest
//! ```

use std::cmp::Ordering;

use serde::Serialize;
use tracing::debug;

use crate::catalog::CatalogEntry;
use crate::geo::{distance_km, Coordinate};
use crate::vision::AiAnalysis;

pub const DISTANCE_WEIGHT: f64 = 0.4;
pub const LANDMARK_WEIGHT: f64 = 0.3;
pub const INTEREST_WEIGHT: f64 = 0.3;

/// Distance at which `distance_score` reaches zero.
pub const DISTANCE_DECAY_KM: f64 = 2.0;

/// `landmark_score` gained per shared landmark.
pub const LANDMARK_STEP: f64 = 0.3;

/// A catalog entry with its score for one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchCandidate<'a> {
    pub entry: &'a CatalogEntry,
    pub distance_km: f64,
    pub landmark_overlap_count: usize,
    pub composite_score: f64,
}

pub fn distance_score(distance_km: f64) -> f64 {
    (1.0 - distance_km / DISTANCE_DECAY_KM).max(0.0)
}

pub fn landmark_score(overlap: usize) -> f64 {
    (LANDMARK_STEP * overlap as f64).min(1.0)
}

/// Landmarks named by both the analysis and the entry (exact names).
pub fn landmark_overlap(entry: &CatalogEntry, ai: Option<&AiAnalysis>) -> usize {
    ai.map_or(0, |ai| {
        ai.landmark_names
            .intersection(&entry.landmark_names)
            .count()
    })
}

/// Score one entry relative to `at`.
pub fn score_candidate<'a>(
    entry: &'a CatalogEntry,
    at: &Coordinate,
    ai: Option<&AiAnalysis>,
) -> MatchCandidate<'a> {
    let distance = distance_km(&entry.location, at);
    let overlap = landmark_overlap(entry, ai);

    let composite = DISTANCE_WEIGHT * distance_score(distance)
        + LANDMARK_WEIGHT * landmark_score(overlap)
        + INTEREST_WEIGHT * entry.historical_interest_score();

    MatchCandidate {
        entry,
        distance_km: distance,
        landmark_overlap_count: overlap,
        // Inputs are validated to [0, 1]; the clamp only absorbs rounding.
        composite_score: composite.clamp(0.0, 1.0),
    }
}

/// Highest-scoring candidate, or `None` for an empty set.
///
/// Ties on `composite_score` go to the smaller distance; remaining ties go
/// to the candidate that came first.
pub fn score_and_select<'a, I>(
    candidates: I,
    at: &Coordinate,
    ai: Option<&AiAnalysis>,
) -> Option<MatchCandidate<'a>>
where
    I: IntoIterator<Item = &'a CatalogEntry>,
{
    let mut best: Option<MatchCandidate<'a>> = None;
    let mut scored = 0usize;

    for entry in candidates {
        let candidate = score_candidate(entry, at, ai);
        scored += 1;
        best = match best {
            Some(current) if !outranks(&candidate, &current) => Some(current),
            _ => Some(candidate),
        };
    }

    if let Some(best) = &best {
        debug!(
            scored,
            id = %best.entry.id,
            composite_score = best.composite_score,
            distance_km = best.distance_km,
            landmark_overlap = best.landmark_overlap_count,
            "Selected best candidate"
        );
    }

    best
}

fn outranks(challenger: &MatchCandidate<'_>, incumbent: &MatchCandidate<'_>) -> bool {
    match challenger
        .composite_score
        .partial_cmp(&incumbent.composite_score)
    {
        Some(Ordering::Greater) => true,
        Some(Ordering::Equal) => challenger.distance_km < incumbent.distance_km,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ViewingArc;
    use crate::geo::LocationSource;

    fn entry(id: &str, lat: f64, interest: f64) -> CatalogEntry {
        CatalogEntry::new(
            id,
            id,
            1950,
            Coordinate::new(lat, -87.6278, LocationSource::Catalog).unwrap(),
            ViewingArc::new(0, 90).unwrap(),
        )
        .with_interest(interest)
        .unwrap()
    }

    fn origin() -> Coordinate {
        Coordinate::new(41.8781, -87.6278, LocationSource::DeviceGps).unwrap()
    }

    #[test]
    fn test_component_scores() {
        assert_eq!(distance_score(0.0), 1.0);
        assert!((distance_score(1.0) - 0.5).abs() < 1e-12);
        assert_eq!(distance_score(5.0), 0.0);
        assert_eq!(landmark_score(0), 0.0);
        assert!((landmark_score(2) - 0.6).abs() < 1e-12);
        assert_eq!(landmark_score(4), 1.0);
    }

    #[test]
    fn test_score_at_same_point() {
        let e = entry("a", 41.8781, 0.5);
        let c = score_candidate(&e, &origin(), None);
        assert_eq!(c.distance_km, 0.0);
        assert_eq!(c.landmark_overlap_count, 0);
        assert!((c.composite_score - 0.55).abs() < 1e-12);
    }

    #[test]
    fn test_empty_set_is_none() {
        let none: Vec<CatalogEntry> = Vec::new();
        assert!(score_and_select(&none, &origin(), None).is_none());
    }

    #[test]
    fn test_tie_breaks_on_distance_then_order() {
        // Same interest, both beyond the decay range: equal composite.
        let far = entry("far", 41.9231, 0.5);
        let farther = entry("farther", 41.9331, 0.5);
        let picked = score_and_select([&farther, &far], &origin(), None).unwrap();
        assert_eq!(picked.entry.id, "far");

        let twin_a = entry("twin_a", 41.8781, 0.5);
        let twin_b = entry("twin_b", 41.8781, 0.5);
        let picked = score_and_select([&twin_a, &twin_b], &origin(), None).unwrap();
        assert_eq!(picked.entry.id, "twin_a");
    }

    #[test]
    fn test_interest_breaks_distance_lead() {
        let near_dull = entry("near", 41.8781, 0.1);
        let close_famous = entry("famous", 41.8790, 0.9);
        let picked = score_and_select([&near_dull, &close_famous], &origin(), None).unwrap();
        assert_eq!(picked.entry.id, "famous");
    }
}

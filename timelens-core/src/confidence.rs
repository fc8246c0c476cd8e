//! Match confidence scorecard.
//!
//! A heuristic, additive score: it is not a calibrated probability. Each
//! signal adds or removes a fixed number of points from a base of 50 and the
//! total is clamped to `[20, 95]`.
//!
//! | Signal | Points |
//! |--------|--------|
//! | fusion confidence | `trunc(confidence * 30)` |
//! | locale likelihood > 0.7 | +15 |
//! | AI reported landmarks | +10 |
//! | distance < 200 m / < 500 m / > 1500 m | +20 / +10 / -15 |
//! | each shared landmark | +5 |
//! | heading known | +8 |
//! | composite score | `trunc(score * 20)` |

use crate::vision::AiAnalysis;

pub const BASE_CONFIDENCE: i64 = 50;
pub const MIN_CONFIDENCE: u8 = 20;
pub const MAX_CONFIDENCE: u8 = 95;

/// Inputs to [`estimate`], gathered by the pipeline.
#[derive(Debug, Clone, Copy)]
pub struct ConfidenceSignals<'a> {
    pub fusion_confidence: f64,
    pub ai: Option<&'a AiAnalysis>,
    pub distance_meters: f64,
    pub landmark_overlap_count: usize,
    pub heading_known: bool,
    pub composite_score: f64,
}

fn distance_points(distance_meters: f64) -> i64 {
    if distance_meters < 200.0 {
        20
    } else if distance_meters < 500.0 {
        10
    } else if distance_meters > 1500.0 {
        -15
    } else {
        0
    }
}

/// Truncate toward zero; NaN counts as zero.
fn scaled_points(value: f64, scale: f64) -> i64 {
    let points = value * scale;
    if points.is_finite() {
        points.trunc() as i64
    } else {
        0
    }
}

/// Confidence percentage in `[20, 95]`.
pub fn estimate(signals: &ConfidenceSignals<'_>) -> u8 {
    let mut score = BASE_CONFIDENCE;

    score += scaled_points(signals.fusion_confidence, 30.0);

    if let Some(ai) = signals.ai {
        if ai.locale_likelihood > 0.7 {
            score += 15;
        }
        if ai.has_landmarks() {
            score += 10;
        }
    }

    score += distance_points(signals.distance_meters);
    score = score.saturating_add(5i64.saturating_mul(signals.landmark_overlap_count as i64));

    if signals.heading_known {
        score += 8;
    }

    score = score.saturating_add(scaled_points(signals.composite_score, 20.0));

    score.clamp(i64::from(MIN_CONFIDENCE), i64::from(MAX_CONFIDENCE)) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signals() -> ConfidenceSignals<'static> {
        ConfidenceSignals {
            fusion_confidence: 0.0,
            ai: None,
            distance_meters: 1000.0,
            landmark_overlap_count: 0,
            heading_known: false,
            composite_score: 0.0,
        }
    }

    #[test]
    fn test_base_only() {
        assert_eq!(estimate(&signals()), 50);
    }

    #[test]
    fn test_distance_bands() {
        let at = |d| {
            estimate(&ConfidenceSignals {
                distance_meters: d,
                ..signals()
            })
        };
        assert_eq!(at(0.0), 70);
        assert_eq!(at(199.9), 70);
        assert_eq!(at(200.0), 60);
        assert_eq!(at(499.9), 60);
        assert_eq!(at(500.0), 50);
        assert_eq!(at(1500.0), 50);
        assert_eq!(at(1500.1), 35);
    }

    #[test]
    fn test_truncation() {
        let s = ConfidenceSignals {
            fusion_confidence: 0.8,
            composite_score: 0.59,
            ..signals()
        };
        // 50 + 24 + 11
        assert_eq!(estimate(&s), 85);
    }

    #[test]
    fn test_ai_bonuses() {
        let ai = AiAnalysis::new(["Navy Pier"], 0.75, "").unwrap();
        let s = ConfidenceSignals {
            ai: Some(&ai),
            ..signals()
        };
        assert_eq!(estimate(&s), 75);

        let weak = AiAnalysis::new(Vec::<String>::new(), 0.7, "").unwrap();
        let s = ConfidenceSignals {
            ai: Some(&weak),
            ..signals()
        };
        assert_eq!(estimate(&s), 50);
    }

    #[test]
    fn test_heading_and_overlap() {
        let s = ConfidenceSignals {
            heading_known: true,
            landmark_overlap_count: 2,
            distance_meters: 600.0,
            ..signals()
        };
        assert_eq!(estimate(&s), 68);
    }
}

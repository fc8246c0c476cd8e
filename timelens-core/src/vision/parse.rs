//! Turn free-text vision output into an [`AiAnalysis`].

use std::collections::BTreeSet;

use serde::Deserialize;
use tracing::{debug, warn};

use super::{AiAnalysis, NEUTRAL_LOCALE_LIKELIHOOD};

/// Likelihood before any locale keyword is seen.
const BASE_LIKELIHOOD: f64 = 0.3;

/// Added per distinct locale keyword found.
const LIKELIHOOD_PER_KEYWORD: f64 = 0.15;

/// Keyword evidence alone never claims more than this.
const MAX_KEYWORD_LIKELIHOOD: f64 = 0.9;

/// Architectural styles and a representative year, checked in order.
const ERA_KEYWORDS: &[(&str, i32)] = &[
    ("victorian", 1890),
    ("art deco", 1930),
    ("mid-century", 1950),
    ("modern", 1970),
    ("contemporary", 1990),
    ("brutalist", 1970),
    ("prairie school", 1910),
    ("chicago school", 1890),
];

/// Vocabulary describing the region a catalog covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleProfile {
    pub name: String,
    /// Lowercase terms that suggest the region
    pub keywords: Vec<String>,
    /// Landmark names reported when mentioned in the text
    pub landmarks: Vec<String>,
}

impl LocaleProfile {
    pub fn chicago() -> Self {
        let keywords = [
            "chicago",
            "loop",
            "magnificent mile",
            "lake michigan",
            "chi-town",
            "windy city",
            "el train",
            "elevated",
            "wrigley",
            "sears tower",
            "willis tower",
            "navy pier",
            "millennium park",
            "grant park",
            "lincoln park",
            "gold coast",
            "river north",
        ];
        let landmarks = [
            "Chicago Theater",
            "Willis Tower",
            "Sears Tower",
            "Navy Pier",
            "Millennium Park",
            "Grant Park",
            "Wrigley Field",
            "Union Station",
            "Art Institute",
            "Lincoln Park Zoo",
            "Buckingham Fountain",
            "Chicago Riverwalk",
            "Magnificent Mile",
            "State Street",
        ];
        Self {
            name: "Chicago".into(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            landmarks: landmarks.iter().map(|l| l.to_string()).collect(),
        }
    }
}

impl Default for LocaleProfile {
    fn default() -> Self {
        Self::chicago()
    }
}

/// Structured answer some models return when asked for JSON.
#[derive(Debug, Deserialize)]
struct StructuredAnswer {
    #[serde(default, alias = "landmark_names")]
    landmarks: Vec<String>,
    #[serde(default)]
    locale_likelihood: Option<f64>,
    #[serde(default)]
    architectural_era: Option<String>,
    #[serde(default)]
    estimated_era_year: Option<i32>,
}

/// Parse a provider's answer.
///
/// A JSON object is read field by field; anything that looks like JSON but
/// does not fit yields [`AiAnalysis::neutral`]. Prose is scanned for the
/// profile's keywords and landmark names.
pub fn parse_analysis(text: &str, profile: &LocaleProfile) -> AiAnalysis {
    let trimmed = strip_code_fence(text.trim());

    if trimmed.starts_with('{') {
        return match serde_json::from_str::<StructuredAnswer>(trimmed) {
            Ok(answer) => from_structured(answer, text),
            Err(e) => {
                warn!(error = %e, "Unparsable structured vision answer, using neutral analysis");
                AiAnalysis::neutral(text)
            }
        };
    }

    scan_keywords(text, profile)
}

fn from_structured(answer: StructuredAnswer, raw: &str) -> AiAnalysis {
    let locale_likelihood = match answer.locale_likelihood {
        Some(v) if (0.0..=1.0).contains(&v) => v,
        Some(v) => {
            warn!(value = v, "Locale likelihood out of range, using neutral value");
            NEUTRAL_LOCALE_LIKELIHOOD
        }
        None => NEUTRAL_LOCALE_LIKELIHOOD,
    };

    let era_year = answer.estimated_era_year.or_else(|| {
        answer
            .architectural_era
            .as_deref()
            .and_then(|era| detect_era(&era.to_lowercase()))
            .map(|(_, year)| year)
    });

    AiAnalysis {
        landmark_names: answer
            .landmarks
            .into_iter()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect(),
        locale_likelihood,
        raw_text: raw.to_string(),
        architectural_era: answer.architectural_era,
        estimated_era_year: era_year,
    }
}

fn scan_keywords(text: &str, profile: &LocaleProfile) -> AiAnalysis {
    let lower = text.to_lowercase();

    let hits = profile
        .keywords
        .iter()
        .filter(|k| lower.contains(k.as_str()))
        .count();
    let locale_likelihood =
        (BASE_LIKELIHOOD + hits as f64 * LIKELIHOOD_PER_KEYWORD).min(MAX_KEYWORD_LIKELIHOOD);

    let landmark_names: BTreeSet<String> = profile
        .landmarks
        .iter()
        .filter(|l| lower.contains(&l.to_lowercase()))
        .cloned()
        .collect();

    let era = detect_era(&lower);

    debug!(
        keyword_hits = hits,
        landmarks = landmark_names.len(),
        era = era.map(|(name, _)| name),
        "Parsed vision answer"
    );

    AiAnalysis {
        landmark_names,
        locale_likelihood,
        raw_text: text.to_string(),
        architectural_era: era.map(|(name, _)| name.to_string()),
        estimated_era_year: era.map(|(_, year)| year),
    }
}

fn detect_era(lower: &str) -> Option<(&'static str, i32)> {
    ERA_KEYWORDS
        .iter()
        .find(|(name, _)| lower.contains(name))
        .copied()
}

/// Models often wrap JSON in a markdown fence.
fn strip_code_fence(text: &str) -> &str {
    text.strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .and_then(|rest| rest.trim_end().strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_likelihood_caps() {
        let profile = LocaleProfile::chicago();

        let none = parse_analysis("A quiet street somewhere.", &profile);
        assert!((none.locale_likelihood - 0.3).abs() < 1e-9);

        let two = parse_analysis("Looks like Chicago, near the Loop.", &profile);
        assert!((two.locale_likelihood - 0.6).abs() < 1e-9);

        let many = parse_analysis(
            "Chicago: the Loop, Lake Michigan, the Windy City, Navy Pier and Grant Park.",
            &profile,
        );
        assert_eq!(many.locale_likelihood, 0.9);
    }

    #[test]
    fn test_landmarks_case_insensitive() {
        let profile = LocaleProfile::chicago();
        let a = parse_analysis("I can see NAVY PIER and the union station clock.", &profile);
        assert!(a.landmark_names.contains("Navy Pier"));
        assert!(a.landmark_names.contains("Union Station"));
        assert_eq!(a.landmark_names.len(), 2);
    }

    #[test]
    fn test_era_first_match_wins() {
        let profile = LocaleProfile::chicago();
        let a = parse_analysis("Mid-century storefronts under art deco towers.", &profile);
        assert_eq!(a.architectural_era.as_deref(), Some("art deco"));
        assert_eq!(a.estimated_era_year, Some(1930));
    }

    #[test]
    fn test_structured_answer() {
        let profile = LocaleProfile::chicago();
        let text = r#"```json
        {"landmarks": ["Navy Pier"], "locale_likelihood": 0.8, "architectural_era": "Victorian"}
        ```"#;
        let a = parse_analysis(text, &profile);
        assert!(a.landmark_names.contains("Navy Pier"));
        assert_eq!(a.locale_likelihood, 0.8);
        assert_eq!(a.estimated_era_year, Some(1890));
    }

    #[test]
    fn test_malformed_structured_answer_is_neutral() {
        let profile = LocaleProfile::chicago();
        let a = parse_analysis(r#"{"landmarks": ["Navy Pier""#, &profile);
        assert!(a.landmark_names.is_empty());
        assert_eq!(a.locale_likelihood, NEUTRAL_LOCALE_LIKELIHOOD);
    }

    #[test]
    fn test_out_of_range_likelihood_is_neutral() {
        let profile = LocaleProfile::chicago();
        let a = parse_analysis(r#"{"locale_likelihood": 7.5}"#, &profile);
        assert_eq!(a.locale_likelihood, NEUTRAL_LOCALE_LIKELIHOOD);
    }
}

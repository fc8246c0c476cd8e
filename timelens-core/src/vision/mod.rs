//! Vision analysis providers.
//!
//! The matcher never looks at pixels itself. A [`VisionAnalyzer`] turns an
//! image into an [`AiAnalysis`] (landmark names, how likely the photo shows
//! the catalog's region, free text). Providers are injected by the caller;
//! there is no process-wide client.
//!
//! ## Providers
//!
//! - **OpenAI** - chat-completions vision model over HTTPS
//! - **Mock** - deterministic analysis for tests and offline runs
//!
//! ## Degradation
//!
//! Analysis is optional. [`analyze_or_degrade`] bounds the call with a
//! timeout and turns any failure into `None`, so a match always proceeds.
//!
//! ```no_run
//! use std::time::Duration;
//! use timelens_core::vision::{analyze_or_degrade, MockVision};
//!
//! # async fn example() {
//! let provider = MockVision::new(7);
//! let analysis = analyze_or_degrade(&provider, b"jpeg bytes", None, Duration::from_secs(5)).await;
//! assert!(analysis.is_some());
//! # }
//! ```

mod mock;
#[cfg(feature = "network")]
mod openai;
mod parse;
mod provider;

pub use mock::MockVision;
#[cfg(feature = "network")]
pub use openai::{OpenAiVision, OpenAiVisionConfig};
pub use parse::{parse_analysis, LocaleProfile};
pub use provider::{VisionProviderConfig, VisionProviderFactory};

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::catalog::check_unit_score;
use crate::error::{Result, TimelensError};
use crate::geo::Coordinate;

/// Locale likelihood used when a response cannot be interpreted.
pub const NEUTRAL_LOCALE_LIKELIHOOD: f64 = 0.5;

/// Structured output of a vision provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiAnalysis {
    pub landmark_names: BTreeSet<String>,
    /// How likely the image depicts the catalog's region, in `[0, 1]`
    pub locale_likelihood: f64,
    pub raw_text: String,
    /// Architectural style mentioned in the analysis, if any
    pub architectural_era: Option<String>,
    /// Rough year associated with `architectural_era`
    pub estimated_era_year: Option<i32>,
}

impl AiAnalysis {
    pub fn new<I, S>(landmarks: I, locale_likelihood: f64, raw_text: impl Into<String>) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        check_unit_score("locale_likelihood", locale_likelihood)?;
        Ok(Self {
            landmark_names: landmarks.into_iter().map(Into::into).collect(),
            locale_likelihood,
            raw_text: raw_text.into(),
            architectural_era: None,
            estimated_era_year: None,
        })
    }

    /// Neutral analysis: no landmarks, mid-range likelihood.
    ///
    /// Substituted when a provider answers with something unparsable.
    pub fn neutral(raw_text: impl Into<String>) -> Self {
        Self {
            landmark_names: BTreeSet::new(),
            locale_likelihood: NEUTRAL_LOCALE_LIKELIHOOD,
            raw_text: raw_text.into(),
            architectural_era: None,
            estimated_era_year: None,
        }
    }

    pub fn has_landmarks(&self) -> bool {
        !self.landmark_names.is_empty()
    }
}

/// Identifies which provider produced an analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisionSource {
    OpenAi { model: String },
    Mock,
}

impl std::fmt::Display for VisionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OpenAi { model } => write!(f, "OpenAI ({model})"),
            Self::Mock => write!(f, "Mock"),
        }
    }
}

/// Trait for image analysis providers.
///
/// Implementations must be thread-safe (`Send + Sync`). Retries, if any,
/// belong inside the implementation; callers bound the whole call with a
/// timeout.
#[async_trait]
pub trait VisionAnalyzer: Send + Sync {
    /// Analyse an encoded image, optionally hinting where it was taken.
    async fn analyze(&self, image: &[u8], location_hint: Option<&Coordinate>) -> Result<AiAnalysis>;

    fn source_id(&self) -> VisionSource;
}

/// Run a provider under `timeout`, returning `None` on any failure.
///
/// Provider errors and timeouts are logged and swallowed: analysis is a
/// refinement, never a hard dependency of matching.
pub async fn analyze_or_degrade(
    provider: &dyn VisionAnalyzer,
    image: &[u8],
    location_hint: Option<&Coordinate>,
    timeout: Duration,
) -> Option<AiAnalysis> {
    let start = Instant::now();
    let source = provider.source_id();

    let outcome = match tokio::time::timeout(timeout, provider.analyze(image, location_hint)).await
    {
        Ok(result) => result,
        Err(_) => Err(TimelensError::VisionTimeout {
            timeout_ms: timeout.as_millis() as u64,
        }),
    };

    let latency_ms = start.elapsed().as_millis() as u64;
    match outcome {
        Ok(analysis) => {
            debug!(
                source = %source,
                latency_ms,
                landmarks = analysis.landmark_names.len(),
                locale_likelihood = analysis.locale_likelihood,
                "Vision analysis completed"
            );
            Some(analysis)
        }
        Err(e) => {
            warn!(
                source = %source,
                latency_ms,
                error = %e,
                "Vision analysis unavailable, continuing without it"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_out_of_range_likelihood() {
        assert!(AiAnalysis::new(["Navy Pier"], 1.2, "").is_err());
        assert!(AiAnalysis::new(Vec::<String>::new(), -0.1, "").is_err());
        assert!(AiAnalysis::new(["Navy Pier"], 0.8, "").is_ok());
    }

    #[test]
    fn test_neutral_analysis() {
        let a = AiAnalysis::neutral("garbage");
        assert!(!a.has_landmarks());
        assert_eq!(a.locale_likelihood, NEUTRAL_LOCALE_LIKELIHOOD);
        assert_eq!(a.raw_text, "garbage");
    }

    #[tokio::test]
    async fn test_degrade_on_provider_error() {
        let provider = MockVision::failing("quota exceeded");
        let result = analyze_or_degrade(&provider, b"img", None, Duration::from_secs(1)).await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_degrade_on_timeout() {
        let slow = MockVision::delayed(
            Duration::from_millis(200),
            AiAnalysis::neutral("late"),
        );
        let result = analyze_or_degrade(&slow, b"img", None, Duration::from_millis(20)).await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_passes_through_success() {
        let expected = AiAnalysis::new(["Navy Pier"], 0.8, "pier").unwrap();
        let provider = MockVision::with_analysis(expected.clone());
        let result = analyze_or_degrade(&provider, b"img", None, Duration::from_secs(1)).await;
        assert_eq!(result, Some(expected));
    }
}

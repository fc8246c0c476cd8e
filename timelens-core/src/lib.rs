//! Timelens Core - match street photos against historical photographs
//!
//! Given where a photo was taken (device GPS, EXIF GPS, or what an image
//! model recognises in it) and optionally which way the camera faced, the
//! crate finds the best historical photograph of the same place and rates
//! how much to trust the match.
//!
//! # Pipeline
//!
//! 1. **Fusion** merges location signals into one coordinate and a confidence
//! 2. **Selection** keeps catalog entries within the radius, then those facing the same way
//! 3. **Scoring** ranks survivors by distance, shared landmarks and historical interest
//! 4. **Confidence** turns the signals into a bounded percentage
//!
//! The catalog store and the vision provider are injected; the crate holds no
//! global client state.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use timelens_core::{
//!     Coordinate, InMemoryCatalog, LocationSource, MatchOutcome, MatchPipeline, MatchRequest,
//!     MatcherConfig, MockVision,
//! };
//!
//! # async fn example() -> timelens_core::Result<()> {
//! let pipeline = MatchPipeline::new(Arc::new(InMemoryCatalog::chicago()?), MatcherConfig::default())
//!     .with_vision(Some(Arc::new(MockVision::default())));
//!
//! let gps = Coordinate::new(41.8917, -87.6086, LocationSource::DeviceGps)?.with_accuracy(15.0);
//! let request = MatchRequest::new().with_device_gps(gps).with_heading(160.0);
//!
//! match pipeline.run(&request).await? {
//!     MatchOutcome::Matched(result) => println!("{}", result.candidate.title),
//!     MatchOutcome::NoLocationAvailable => println!("no location"),
//!     MatchOutcome::NoCandidatesInRange { .. } => println!("nothing nearby"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod confidence;
pub mod config;
pub mod error;
pub mod exif;
pub mod fusion;
pub mod geo;
pub mod landmarks;
pub mod pipeline;
pub mod scorer;
pub mod selector;
pub mod vision;

// Re-export main types for convenience
pub use catalog::{CatalogEntry, CatalogStore, InMemoryCatalog, ViewingArc};
pub use config::MatcherConfig;
pub use error::{Result, TimelensError};
pub use fusion::{FusedLocation, LocationFusion};
pub use geo::{bounding_box, distance_km, BoundingBox, Coordinate, LocationSource};
pub use landmarks::LandmarkTable;
pub use pipeline::{match_in, MatchMethod, MatchOutcome, MatchPipeline, MatchRequest, MatchResult};
pub use scorer::{score_and_select, MatchCandidate};
pub use selector::select;
pub use vision::{
    analyze_or_degrade, AiAnalysis, MockVision, VisionAnalyzer, VisionProviderConfig,
    VisionProviderFactory, VisionSource,
};

// Network-dependent exports
#[cfg(feature = "network")]
pub use vision::{OpenAiVision, OpenAiVisionConfig};

//! HTTP request handlers
//!
//! This module contains all the request handlers for the API endpoints.

pub mod catalog;
pub mod health;
pub mod matching;

pub use catalog::{
    entry_handler, near_handler, CatalogEntrySummary, NearQuery, NearResponse, NearbyEntry,
    ViewingArcSummary,
};
pub use health::{health, ready, HealthResponse, ReadyResponse};
pub use matching::{
    match_handler, AnalysisSummary, ExifGpsInput, MatchResponse, QueryLocation,
};

//! Application state module
//!
//! Defines shared state accessible across all request handlers.

use std::sync::Arc;

use timelens_core::{
    InMemoryCatalog, LandmarkTable, MatchPipeline, MatcherConfig, Result, VisionProviderConfig,
    VisionProviderFactory,
};

use crate::config::Config;

/// Application state containing shared resources.
#[derive(Clone)]
pub struct AppState {
    /// Historical photo catalog shared by every pipeline
    pub catalog: Arc<InMemoryCatalog>,
    /// Pipeline using the configured vision provider (if any)
    pub pipeline: Arc<MatchPipeline>,
    /// Pipeline backed by the deterministic mock provider, when allowed
    pub mock_pipeline: Option<Arc<MatchPipeline>>,
    /// Maximum accepted photo size in bytes
    pub max_file_size: usize,
}

impl AppState {
    /// Load the catalog and landmark table and build the pipelines.
    pub fn from_config(config: &Config) -> Result<Self> {
        let catalog = Arc::new(match &config.catalog_path {
            Some(path) => InMemoryCatalog::from_path(path)?,
            None => InMemoryCatalog::chicago()?,
        });
        let landmarks = Arc::new(match &config.landmarks_path {
            Some(path) => LandmarkTable::from_path(path)?,
            None => LandmarkTable::chicago()?,
        });

        let matcher_config = MatcherConfig::from_env()?;
        matcher_config.validate()?;

        let base = MatchPipeline::new(catalog.clone(), matcher_config)
            .with_landmarks(landmarks);

        let vision = VisionProviderFactory::create(VisionProviderConfig::Auto)?;
        let pipeline = Arc::new(base.clone().with_vision(vision));

        let mock_pipeline = config.allow_mock_vision.then(|| {
            tracing::warn!("Mock vision provider enabled (ALLOW_MOCK_VISION)");
            Arc::new(base.with_vision(Some(VisionProviderFactory::create_mock())))
        });

        Ok(Self {
            catalog,
            pipeline,
            mock_pipeline,
            max_file_size: config.max_file_size(),
        })
    }
}

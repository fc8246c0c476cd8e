//! Vision provider selection.
//!
//! ## Supported Providers
//!
//! - `OpenAiVision` - OpenAI chat-completions vision model (requires `network`)
//! - `MockVision` - deterministic mock (testing and offline demos)

use std::sync::Arc;

use super::{MockVision, VisionAnalyzer};
#[cfg(feature = "network")]
use super::{OpenAiVision, OpenAiVisionConfig};
use crate::error::Result;

/// Configuration for creating a vision provider.
#[derive(Debug, Clone, Default)]
pub enum VisionProviderConfig {
    #[cfg(feature = "network")]
    OpenAi(OpenAiVisionConfig),

    /// Mock provider (testing only)
    Mock { seed: u64 },

    /// Match without image analysis
    Disabled,

    /// OpenAI when `OPENAI_API_KEY` is set, otherwise disabled
    #[default]
    Auto,
}

/// Factory for creating vision providers.
pub struct VisionProviderFactory;

impl VisionProviderFactory {
    /// Create a provider from configuration; `None` means analysis is off.
    pub fn create(config: VisionProviderConfig) -> Result<Option<Arc<dyn VisionAnalyzer>>> {
        match config {
            #[cfg(feature = "network")]
            VisionProviderConfig::OpenAi(openai_config) => {
                let provider = OpenAiVision::new(openai_config)?;
                Ok(Some(Arc::new(provider)))
            }
            VisionProviderConfig::Mock { seed } => Ok(Some(Arc::new(MockVision::new(seed)))),
            VisionProviderConfig::Disabled => Ok(None),
            VisionProviderConfig::Auto => Self::create_auto(),
        }
    }

    fn create_auto() -> Result<Option<Arc<dyn VisionAnalyzer>>> {
        #[cfg(feature = "network")]
        {
            if let Ok(openai_config) = OpenAiVisionConfig::from_env() {
                tracing::info!("Auto-selected OpenAI vision provider");
                return Self::create(VisionProviderConfig::OpenAi(openai_config));
            }
        }

        tracing::info!("No vision provider configured, matching without image analysis");
        Ok(None)
    }

    /// Create a mock provider for testing.
    pub fn create_mock() -> Arc<dyn VisionAnalyzer> {
        Arc::new(MockVision::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vision::VisionSource;

    #[test]
    fn test_provider_config_default() {
        assert!(matches!(
            VisionProviderConfig::default(),
            VisionProviderConfig::Auto
        ));
    }

    #[test]
    fn test_create_disabled() {
        assert!(VisionProviderFactory::create(VisionProviderConfig::Disabled)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_create_mock_provider() {
        let provider = VisionProviderFactory::create(VisionProviderConfig::Mock { seed: 1 })
            .unwrap()
            .unwrap();
        assert_eq!(provider.source_id(), VisionSource::Mock);
    }

    #[cfg(feature = "network")]
    #[test]
    fn test_create_openai_provider() {
        let config = VisionProviderConfig::OpenAi(OpenAiVisionConfig::new("sk-test"));
        let provider = VisionProviderFactory::create(config).unwrap().unwrap();
        assert!(matches!(provider.source_id(), VisionSource::OpenAi { .. }));
    }
}

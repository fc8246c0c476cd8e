//! OpenAI chat-completions vision client.
//!
//! ## Features
//!
//! - Image downscaled to at most 1024 px and re-encoded as JPEG before upload
//! - Automatic retry with exponential backoff on transient errors
//! - HTTPS-only connections
//! - API key zeroized on drop and redacted from `Debug`

use std::io::Cursor;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use backoff::{future::retry_notify, ExponentialBackoff};
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use zeroize::Zeroizing;

use super::{parse_analysis, AiAnalysis, LocaleProfile, VisionAnalyzer, VisionSource};
use crate::error::{Result, TimelensError};
use crate::geo::Coordinate;

const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";

const DEFAULT_MODEL: &str = "gpt-4o";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const MAX_RETRIES: u32 = 2;

const INITIAL_INTERVAL: Duration = Duration::from_millis(250);

const MAX_INTERVAL: Duration = Duration::from_secs(4);

/// Longest image side sent to the model.
pub const MAX_IMAGE_DIMENSION: u32 = 1024;

const JPEG_QUALITY: u8 = 85;

const MAX_TOKENS: u32 = 1000;

const TEMPERATURE: f32 = 0.3;

/// Configuration for the OpenAI vision client.
#[derive(Clone)]
pub struct OpenAiVisionConfig {
    pub api_url: String,
    pub api_key: Zeroizing<String>,
    pub model: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Maximum retry attempts for transient errors
    pub max_retries: u32,
}

impl std::fmt::Debug for OpenAiVisionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiVisionConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl OpenAiVisionConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: Zeroizing::new(api_key.into()),
            model: DEFAULT_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            max_retries: MAX_RETRIES,
        }
    }

    /// Create configuration from environment variables.
    ///
    /// Required: `OPENAI_API_KEY`
    /// Optional: `OPENAI_API_URL`, `OPENAI_VISION_MODEL`
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                TimelensError::Vision("OPENAI_API_KEY environment variable not set".into())
            })?;

        let mut config = Self::new(api_key);
        if let Ok(url) = std::env::var("OPENAI_API_URL") {
            config.api_url = url;
        }
        if let Ok(model) = std::env::var("OPENAI_VISION_MODEL") {
            config.model = model;
        }
        Ok(config)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: [ContentPart<'a>; 2],
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl<'a> },
}

#[derive(Debug, Serialize)]
struct ImageUrl<'a> {
    url: &'a str,
    detail: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI vision model client.
///
/// ```no_run
/// use timelens_core::vision::{OpenAiVision, OpenAiVisionConfig, VisionAnalyzer};
///
/// # async fn example(photo: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
/// let vision = OpenAiVision::new(OpenAiVisionConfig::from_env()?)?;
/// let analysis = vision.analyze(photo, None).await?;
/// println!("landmarks: {:?}", analysis.landmark_names);
/// # Ok(())
/// # }
/// ```
pub struct OpenAiVision {
    client: Client,
    config: OpenAiVisionConfig,
    profile: LocaleProfile,
}

impl OpenAiVision {
    #[instrument(level = "debug", skip_all, fields(
        api_url = %config.api_url,
        model = %config.model,
        timeout_ms = config.timeout.as_millis() as u64
    ))]
    pub fn new(config: OpenAiVisionConfig) -> Result<Self> {
        Self::with_profile(config, LocaleProfile::chicago())
    }

    pub fn with_profile(config: OpenAiVisionConfig, profile: LocaleProfile) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .https_only(true)
            .build()
            .map_err(|e| {
                warn!(error = %e, "Failed to create HTTP client");
                TimelensError::Vision(format!("Failed to create HTTP client: {e}"))
            })?;

        info!(model = %config.model, "OpenAI vision client created");
        Ok(Self {
            client,
            config,
            profile,
        })
    }

    fn build_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: INITIAL_INTERVAL,
            max_interval: MAX_INTERVAL,
            max_elapsed_time: Some(self.config.timeout * self.config.max_retries.max(1)),
            ..Default::default()
        }
    }

    /// Single request; errors are classified for the retry loop.
    async fn request_once(
        &self,
        body: &ChatRequest<'_>,
    ) -> std::result::Result<String, backoff::Error<TimelensError>> {
        let start = Instant::now();

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(self.config.api_key.as_str())
            .json(body)
            .send()
            .await
            .map_err(|e| {
                let latency_ms = start.elapsed().as_millis() as u64;
                if is_transient_error(&e) {
                    warn!(error = %e, latency_ms, "Transient error, will retry");
                    backoff::Error::transient(TimelensError::Http(e))
                } else {
                    warn!(error = %e, latency_ms, "Permanent error, aborting");
                    backoff::Error::permanent(TimelensError::Http(e))
                }
            })?;

        let status = response.status();
        debug!(status = %status, "Received HTTP response");

        if !status.is_success() {
            let latency_ms = start.elapsed().as_millis() as u64;
            let err = TimelensError::Vision(format!("OpenAI API returned status: {status}"));
            return if is_transient_status(status) {
                warn!(status = %status, latency_ms, "Transient HTTP status, will retry");
                Err(backoff::Error::transient(err))
            } else {
                warn!(status = %status, latency_ms, "Permanent HTTP error");
                Err(backoff::Error::permanent(err))
            };
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            backoff::Error::permanent(TimelensError::Vision(format!(
                "Failed to parse OpenAI response: {e}"
            )))
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                backoff::Error::permanent(TimelensError::Vision(
                    "OpenAI response contained no message content".into(),
                ))
            })
    }
}

#[async_trait]
impl VisionAnalyzer for OpenAiVision {
    #[instrument(
        level = "info",
        skip(self, image, location_hint),
        fields(model = %self.config.model, image_bytes = image.len())
    )]
    async fn analyze(&self, image: &[u8], location_hint: Option<&Coordinate>) -> Result<AiAnalysis> {
        let start = Instant::now();

        let data_url = format!("data:image/jpeg;base64,{}", encode_image(image)?);
        let prompt = build_prompt(&self.profile, location_hint);
        let body = ChatRequest {
            model: &self.config.model,
            messages: [ChatMessage {
                role: "user",
                content: [
                    ContentPart::Text { text: &prompt },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: &data_url,
                            detail: "high",
                        },
                    },
                ],
            }],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        let result = retry_notify(
            self.build_backoff(),
            || async { self.request_once(&body).await },
            |err: TimelensError, duration: Duration| {
                warn!(
                    error = %err,
                    retry_after_ms = duration.as_millis() as u64,
                    "Retry scheduled"
                );
            },
        )
        .await;

        let total_latency_ms = start.elapsed().as_millis() as u64;
        match result {
            Ok(text) => {
                info!(total_latency_ms, chars = text.len(), "OpenAI vision analysis completed");
                Ok(parse_analysis(&text, &self.profile))
            }
            Err(e) => {
                warn!(error = %e, total_latency_ms, "OpenAI vision analysis failed after retries");
                Err(e)
            }
        }
    }

    fn source_id(&self) -> VisionSource {
        VisionSource::OpenAi {
            model: self.config.model.clone(),
        }
    }
}

/// Downscale to [`MAX_IMAGE_DIMENSION`] and re-encode as base64 JPEG.
pub fn encode_image(bytes: &[u8]) -> Result<String> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| TimelensError::Vision(format!("Failed to decode image: {e}")))?;

    let img = if img.width() > MAX_IMAGE_DIMENSION || img.height() > MAX_IMAGE_DIMENSION {
        img.thumbnail(MAX_IMAGE_DIMENSION, MAX_IMAGE_DIMENSION)
    } else {
        img
    };

    let rgb = img.to_rgb8();
    let mut jpeg = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY)
        .encode_image(&rgb)
        .map_err(|e| TimelensError::Vision(format!("Failed to encode JPEG: {e}")))?;

    Ok(base64::engine::general_purpose::STANDARD.encode(jpeg.into_inner()))
}

fn build_prompt(profile: &LocaleProfile, location_hint: Option<&Coordinate>) -> String {
    let region = &profile.name;
    let hint = location_hint
        .map(|c| {
            format!(
                "\nThe photo was taken near coordinates {:.4}, {:.4}.",
                c.latitude(),
                c.longitude()
            )
        })
        .unwrap_or_default();

    format!(
        "Analyze this photo and help identify the location. Please describe:\n\
         1. Location: what city or area this appears to be, from architecture, signs and landmarks.\n\
         2. Landmarks: specific buildings, monuments or notable structures you can see.\n\
         3. Street features: layout, intersections, distinctive urban features.\n\
         4. Time period clues: architecture, vehicles, clothing.\n\
         5. Geographic clues: signs, license plates or other text.\n\
         6. {region}: does anything suggest this could be {region}? Name any recognizable {region} landmarks.\n\
         {hint}\n\
         Be specific about what you can see versus what you are inferring."
    )
}

/// Check if a reqwest error is transient and should be retried.
fn is_transient_error(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect() || error.is_request()
}

/// Check if an HTTP status code indicates a transient error.
fn is_transient_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
            | StatusCode::BAD_GATEWAY
    )
}

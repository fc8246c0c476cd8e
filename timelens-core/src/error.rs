use thiserror::Error;

#[derive(Error, Debug)]
pub enum TimelensError {
    #[error("Invalid coordinate: latitude={latitude}, longitude={longitude}")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    #[error("Invalid viewing arc: {0}")]
    InvalidViewingArc(String),

    #[error("Score out of range [0, 1]: {field}={value}")]
    InvalidScore { field: &'static str, value: f64 },

    #[error("Invalid search radius: {0} km")]
    InvalidRadius(f64),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Vision provider error: {0}")]
    Vision(String),

    #[error("Vision provider timed out after {timeout_ms}ms")]
    VisionTimeout { timeout_ms: u64 },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[cfg(feature = "network")]
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
}

impl From<serde_json::Error> for TimelensError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TimelensError>;

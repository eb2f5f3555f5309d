// Error types for the emotion announcer pipeline

use thiserror::Error;

/// Main error type for the emotion announcer
#[derive(Debug, Error)]
pub enum EmotionPipelineError {
    #[error("Invalid region ({left}, {top}, {right}, {bottom}) for a {width}x{height} image")]
    InvalidRegion {
        left: i32,
        top: i32,
        right: i32,
        bottom: i32,
        width: u32,
        height: u32,
    },

    #[error("Dimension mismatch: expected {expected_width}x{expected_height}, got {width}x{height}")]
    DimensionMismatch {
        expected_width: u32,
        expected_height: u32,
        width: u32,
        height: u32,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Nothing to aggregate: the label sequence is empty")]
    EmptyInput,

    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Manifest loading failed: {0}")]
    ManifestLoad(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image decoding error: {0}")]
    ImageDecode(#[from] image::ImageError),
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, EmotionPipelineError>;

impl From<serde_json::Error> for EmotionPipelineError {
    fn from(err: serde_json::Error) -> Self {
        EmotionPipelineError::Config(err.to_string())
    }
}

/// Error types for Sketch Studio
///
/// Every failure is caught at the boundary of the action that triggered it
/// (upload, transform, download) and reduced to a displayable string:
/// - Image encoding and data URL failures
/// - Transform backend failures (upstream, timeout, malformed response)
/// - Upload validation failures
/// - Configuration loading failures
use std::time::Duration;
use thiserror::Error;

/// Image encoding / data URL errors
#[derive(Debug, Error)]
pub enum EncodingError {
    /// Not a `data:<mime>;base64,<payload>` string
    #[error("malformed data URL: {0}")]
    MalformedDataUrl(String),

    /// Payload is not valid base64
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Image could not be decoded or encoded
    #[error("image codec error: {0}")]
    Image(#[from] image::ImageError),

    /// Writing the image to disk failed
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Transform request errors
///
/// `Clone` because results travel back to the UI inside iced messages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    /// The sketch payload could not be turned into a request
    #[error("invalid sketch: {0}")]
    InvalidPayload(String),

    /// Backend answered with a non-success status
    #[error("backend error: {status} - {body}")]
    Upstream {
        /// HTTP status code
        status: u16,
        /// Error body as returned (JSON when the backend sent JSON)
        body: String,
    },

    /// Success status but no image in the response
    #[error("no image returned")]
    NoImage,

    /// Request exceeded the fixed duration bound
    #[error("request aborted: timed out after {after:?}")]
    Timeout {
        /// Configured bound
        after: Duration,
    },

    /// Connection or transport failure
    #[error("request aborted: {0}")]
    Network(String),

    /// Another transform is still in flight
    #[error("a transform is already in progress")]
    Busy,
}

impl TransformError {
    /// HTTP status of an upstream failure, if there was one
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Upload validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error("No file provided")]
    NoFile,

    #[error("File must be an image")]
    NotAnImage,

    #[error("File size exceeds 10MB limit")]
    TooLarge,

    /// Reading the upload failed
    #[error("Failed to process upload: {0}")]
    Read(String),
}

impl UploadError {
    /// Status code the relay answers with
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            Self::Read(_) => 500,
            _ => 400,
        }
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),

    /// An environment override holds an unusable value
    #[error("invalid value for {key}: {value}")]
    InvalidEnv { key: &'static str, value: String },

    /// Canvas dimensions outside what the surface can hold
    #[error("invalid canvas size {width}x{height}: each side must be within 1..={max}")]
    InvalidCanvas { width: u32, height: u32, max: u32 },
}

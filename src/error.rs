use serde::Serialize;
use thiserror::Error;

/// Failures that end a capture call. Everything else degrades to absent data.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Video capture is not supported")]
    Unsupported,

    #[error("No window selected for capture")]
    NoWindowProvided,

    #[error("No region selected for capture")]
    NoRegionProvided,

    #[error("Invalid capture region: {0}")]
    InvalidRegion(String),

    #[error("No display available for capture")]
    NoDisplayFound,

    #[error("Screen recording permission not granted")]
    PermissionDenied,

    #[error("Capture failed: {0}")]
    Backend(String),

    #[error("Failed to encode image as PNG: {0}")]
    Encoding(String),

    #[error("Failed to persist capture: {0}")]
    Persistence(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Serialize for CaptureError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CaptureError>;

/// Failures of a single external command run through the shell gateway.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShellError {
    #[error("Command timed out")]
    Timeout,

    #[error("No output from command")]
    EmptyOutput,

    #[error("Process exited with code {0}")]
    ExecutionFailed(i32),

    #[error("Unknown shell error: {0}")]
    Unknown(String),
}

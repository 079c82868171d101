use std::path::PathBuf;
use thiserror::Error;

/// Failures reading a persisted region record
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Region file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Malformed region record: {0}")]
    MalformedRecord(String),

    #[error("Failed to read region file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failures inside a recognition engine
#[derive(Error, Debug)]
pub enum OcrError {
    #[error("Failed to initialize OCR engine: {0}")]
    InitializationError(String),

    #[error("Failed to process image: {0}")]
    ProcessingError(String),

    #[error("Invalid region of interest: {0}")]
    InvalidRegion(String),
}

/// Failures producing the cropped preview artifact
#[derive(Error, Debug)]
pub enum CropError {
    #[error("Crop rectangle {rect} lies outside the {width}x{height} image")]
    OutOfBounds {
        rect: String,
        width: u32,
        height: u32,
    },

    #[error("Failed to write cropped image: {0}")]
    Encode(#[from] image::ImageError),
}

/// Conditions that end a session without a recognition result
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Invalid arguments: {0}")]
    Argument(String),

    #[error("Failed to load image from {}: {reason}", .path.display())]
    ImageLoad { path: PathBuf, reason: String },

    #[error(transparent)]
    RegionParse(#[from] ParseError),

    #[error("Selection window failed: {0}")]
    Window(#[source] anyhow::Error),

    #[error("Selection cancelled")]
    Cancelled,
}

impl SessionError {
    /// Process exit status for this condition
    pub fn exit_code(&self) -> u8 {
        match self {
            SessionError::Argument(_)
            | SessionError::ImageLoad { .. }
            | SessionError::RegionParse(_)
            | SessionError::Window(_)
            | SessionError::Cancelled => 1,
        }
    }

    pub fn is_cancellation(&self) -> bool {
        matches!(self, SessionError::Cancelled)
    }
}

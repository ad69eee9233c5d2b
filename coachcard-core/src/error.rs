//! Error types for the capture pipeline

use thiserror::Error;

/// Message used whenever a capture fails without a usable description
pub const GENERIC_CAPTURE_FAILURE: &str = "Failed to capture image";

/// The remote rendering API was selected but credentials are missing
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Missing rendering API credentials. Configure them in settings.")]
pub struct CredentialsError;

impl CredentialsError {
    /// The remote API answers a bad-credentials request with 400
    pub const STATUS: u16 = 400;
}

/// A single capture call failed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// The rasterizer reported an error; its message is kept verbatim
    #[error("{0}")]
    Raster(String),

    /// The rasterizer failed without a message (panic, lost task)
    #[error("Failed to capture image")]
    Unknown,

    /// Capture was attempted with nothing mounted in the staging area
    #[error("Capture target is not mounted")]
    MissingTarget,

    #[error(transparent)]
    Credentials(#[from] CredentialsError),

    /// The remote rendering API answered with a non-success status
    #[error("Remote rendering API error: {message}")]
    Remote { status: u16, message: String },
}

impl CaptureError {
    pub fn raster(message: impl Into<String>) -> Self {
        CaptureError::Raster(message.into())
    }

    /// HTTP status that best describes this failure to a caller
    pub fn status_code(&self) -> u16 {
        match self {
            CaptureError::Credentials(_) => CredentialsError::STATUS,
            CaptureError::Remote { status, .. } => *status,
            _ => 500,
        }
    }
}

/// `generate_all` stopped before producing a complete set of images
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BatchAbortError {
    #[error("week {week_number}, day {day_number} ({day_label}) failed: {source}")]
    DayFailed {
        week_number: u32,
        day_number: u32,
        day_label: String,
        #[source]
        source: CaptureError,
    },

    #[error("generation cancelled after {completed} of {total} days")]
    Cancelled { completed: usize, total: usize },
}

/// The document could not be assembled
#[derive(Error, Debug)]
pub enum AssemblyError {
    #[error("cannot assemble a document from zero images")]
    EmptyInput,

    #[error("image {index} could not be loaded: {message}")]
    Source { index: usize, message: String },

    #[error("image {index} could not be decoded: {source}")]
    Decode {
        index: usize,
        #[source]
        source: image::ImageError,
    },

    #[error("PDF generation failed: {0}")]
    Pdf(String),
}

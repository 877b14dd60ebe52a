// markdown-pdf-converter/src/error.rs

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConversionError>;

#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("Metadata lookup failed for {bucket}/{object}: {reason}")]
    Metadata {
        bucket: String,
        object: String,
        reason: String,
    },

    #[error("Download failed for {bucket}/{object}: {reason}")]
    Download {
        bucket: String,
        object: String,
        reason: String,
    },

    #[error("Upload failed for {bucket}/{object}: {reason}")]
    Upload {
        bucket: String,
        object: String,
        reason: String,
    },

    #[error("Source is not valid UTF-8 text: {0}")]
    Decode(#[from] std::string::FromUtf8Error),

    #[error("Rendering error: {0}")]
    Render(String),

    #[error("IO error: {0}")]
    Filesystem(#[from] std::io::Error),

    #[error("Invalid storage event: {0}")]
    InvalidEvent(String),

    #[error("Invocation cancelled")]
    Cancelled,
}

impl ConversionError {
    /// Stable tag attached to failure logs.
    pub fn error_type(&self) -> &'static str {
        match self {
            ConversionError::Metadata { .. } => "metadata_error",
            ConversionError::Download { .. } => "download_error",
            ConversionError::Upload { .. } => "upload_error",
            ConversionError::Decode(_) => "decode_error",
            ConversionError::Render(_) => "render_error",
            ConversionError::Filesystem(_) => "filesystem_error",
            ConversionError::InvalidEvent(_) => "invalid_event",
            ConversionError::Cancelled => "cancelled",
        }
    }
}

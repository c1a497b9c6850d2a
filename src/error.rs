//! Error taxonomy for the classification pipeline.
//!
//! Each stage wraps its underlying faults (hound, realfft, ort) into one of
//! these categories before they cross the pipeline boundary; the HTTP layer
//! only ever sees a `ClassifyError`.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while classifying a clip
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("audio file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("unreadable audio: {0}")]
    AudioUnreadable(String),

    #[error("feature extraction failed: {0}")]
    FeatureError(String),

    #[error("failed to load model: {0}")]
    ModelLoadError(String),

    #[error("inference failed: {0}")]
    InferenceError(String),
}

impl ClassifyError {
    /// Whether the caller supplied bad input, as opposed to a processing
    /// fault on our side. Drives the HTTP status classification.
    pub fn is_client_error(&self) -> bool {
        matches!(self, ClassifyError::InvalidInput(_))
    }
}

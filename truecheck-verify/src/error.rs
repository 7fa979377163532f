//! Error types for truecheck-verify
//!
//! Two categories matter to the user:
//! - intake/validation errors, each with its own alert text
//! - analysis errors (network, HTTP status, response shape), all reported
//!   with the same generic alert
//!
//! The category is kept internally for logging.

use thiserror::Error;

/// Alert shown for any analysis failure
pub const ANALYSIS_FAILED_ALERT: &str = "Analysis failed. Please try again.";

/// Alert shown for files above the upload ceiling
pub const FILE_TOO_LARGE_ALERT: &str = "File size must be less than 4MB";

/// Verify flow error type
#[derive(Debug, Error)]
pub enum VerifyError {
    /// File exceeds the upload ceiling
    #[error("File too large: {size} bytes (limit {limit} bytes)")]
    FileTooLarge { size: u64, limit: u64 },

    /// File is neither image nor video
    #[error("Unsupported media type: {0}")]
    UnsupportedMedia(String),

    /// Action not allowed while a request is pending
    #[error("Analysis already in progress")]
    AnalysisInProgress,

    /// Transport failure (connect, timeout, body read)
    #[error("Network error: {0}")]
    Network(String),

    /// Endpoint answered with a non-success status
    #[error("API error {0}: {1}")]
    Api(u16, String),

    /// Response body did not match the expected contract
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// truecheck-common error
    #[error("Common error: {0}")]
    Common(#[from] truecheck_common::Error),
}

impl VerifyError {
    /// True for errors raised by the analysis request itself
    pub fn is_analysis_failure(&self) -> bool {
        matches!(
            self,
            VerifyError::Network(_) | VerifyError::Api(..) | VerifyError::MalformedResponse(_)
        )
    }

    /// User-facing alert text
    pub fn alert(&self) -> String {
        match self {
            VerifyError::FileTooLarge { .. } => FILE_TOO_LARGE_ALERT.to_string(),
            VerifyError::UnsupportedMedia(_) => "Please select an image or video file".to_string(),
            VerifyError::AnalysisInProgress => "Please wait for the current analysis to finish".to_string(),
            VerifyError::Network(_) | VerifyError::Api(..) | VerifyError::MalformedResponse(_) => {
                ANALYSIS_FAILED_ALERT.to_string()
            }
            VerifyError::Io(err) => format!("Could not read file: {}", err),
            VerifyError::Common(err) => err.to_string(),
        }
    }
}

impl From<reqwest::Error> for VerifyError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            VerifyError::MalformedResponse(err.to_string())
        } else {
            VerifyError::Network(err.to_string())
        }
    }
}

/// Result type for the verify flow
pub type VerifyResult<T> = Result<T, VerifyError>;

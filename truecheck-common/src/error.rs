//! Common error types for TrueCheck

use thiserror::Error;

/// Common result type for TrueCheck operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across TrueCheck crates
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}

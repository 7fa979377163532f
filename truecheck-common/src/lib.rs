//! # TrueCheck Common Library
//!
//! Shared code for the TrueCheck crates including:
//! - Error types
//! - Bootstrap configuration loading (TOML)
//! - Flow event types and the EventBus

pub mod config;
pub mod error;
pub mod events;

pub use error::{Error, Result};
pub use events::{EventBus, FlowEvent};

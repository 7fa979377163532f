//! Test Helper Utilities
//!
//! Shared utilities for testing truecheck-verify

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use truecheck_verify::{FlowProfile, HttpDispatcher, VerifyFlow};

/// ASCII stand-in for image content so body matchers can read it
pub const IMAGE_BYTES: &[u8] = b"PNGDATA-0123456789";

/// Flow with a real HTTP dispatcher and a short timeout
pub fn http_flow(profile: FlowProfile) -> VerifyFlow<HttpDispatcher> {
    let dispatcher = HttpDispatcher::new(Some(Duration::from_secs(5))).unwrap();
    VerifyFlow::new(profile, dispatcher)
}

/// Write a media file into `dir` and return its path
pub fn write_media(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

/// Remove every TRUECHECK_* variable the resolver reads
pub fn clear_truecheck_env() {
    for var in [
        truecheck_verify::config::ENV_MODE,
        truecheck_verify::config::ENV_ENDPOINT,
        truecheck_verify::config::ENV_HF_MODEL,
        truecheck_verify::config::ENV_HF_TOKEN,
        truecheck_verify::config::ENV_HF_BASE_URL,
        truecheck_verify::config::ENV_TIMEOUT_SECS,
    ] {
        std::env::remove_var(var);
    }
}

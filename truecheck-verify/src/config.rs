//! Settings resolution for truecheck-verify
//!
//! Each setting is resolved independently with priority
//! command line → environment → TOML → built-in default.
//!
//! `endpoint` is only the site hosting the analysis function. `direct` mode
//! never reads it: the inference host comes from `huggingface.base_url`,
//! so a site base configured for the other modes cannot receive raw media
//! or the Hugging Face token.

use std::time::Duration;

use tracing::{debug, warn};
use truecheck_common::config::TomlConfig;
use truecheck_common::{Error, Result};

use crate::endpoint::{EndpointDescriptor, FlowMode, FlowProfile, DEFAULT_HF_MODEL};

/// Site base used when no endpoint is configured (`netlify dev` default)
pub const DEFAULT_SITE_BASE: &str = "http://localhost:8888";

/// Request timeout used when none is configured
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

pub const ENV_MODE: &str = "TRUECHECK_MODE";
pub const ENV_ENDPOINT: &str = "TRUECHECK_ENDPOINT";
pub const ENV_HF_MODEL: &str = "TRUECHECK_HF_MODEL";
pub const ENV_HF_TOKEN: &str = "TRUECHECK_HF_TOKEN";
pub const ENV_HF_BASE_URL: &str = "TRUECHECK_HF_BASE_URL";
pub const ENV_TIMEOUT_SECS: &str = "TRUECHECK_TIMEOUT_SECS";

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub mode: Option<FlowMode>,
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub token: Option<String>,
    pub hf_base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Fully resolved settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSettings {
    pub mode: FlowMode,
    pub profile: FlowProfile,
    /// `None` waits indefinitely
    pub timeout: Option<Duration>,
    pub log_level: String,
}

/// Resolve every setting and build the flow profile
pub fn resolve_settings(cli: &CliOverrides, toml_config: &TomlConfig) -> Result<ResolvedSettings> {
    let mode = match resolve_tier(
        "mode",
        cli.mode.map(|m| m.as_str().to_string()),
        ENV_MODE,
        toml_config.mode.clone(),
    ) {
        Some(text) => text.parse::<FlowMode>()?,
        None => FlowMode::Multipart,
    };

    let timeout_secs = match resolve_tier(
        "timeout_secs",
        cli.timeout_secs.map(|t| t.to_string()),
        ENV_TIMEOUT_SECS,
        toml_config.timeout_secs.map(|t| t.to_string()),
    ) {
        Some(text) => text
            .trim()
            .parse::<u64>()
            .map_err(|e| Error::Config(format!("Invalid timeout '{}': {}", text, e)))?,
        None => DEFAULT_TIMEOUT_SECS,
    };
    let timeout = (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs));

    let profile = match mode {
        FlowMode::Multipart => FlowProfile::multipart(&resolve_site_base(cli, toml_config)),
        FlowMode::DataUri => FlowProfile::data_uri(&resolve_site_base(cli, toml_config)),
        FlowMode::Direct => {
            let model_id = resolve_tier(
                "huggingface.model",
                cli.model.clone(),
                ENV_HF_MODEL,
                toml_config.huggingface.model.clone(),
            )
            .unwrap_or_else(|| DEFAULT_HF_MODEL.to_string());
            let token = resolve_tier(
                "huggingface.token",
                cli.token.clone(),
                ENV_HF_TOKEN,
                toml_config.huggingface.token.clone(),
            );

            let inference_base = resolve_tier(
                "huggingface.base_url",
                cli.hf_base_url.clone(),
                ENV_HF_BASE_URL,
                toml_config.huggingface.base_url.clone(),
            );

            let mut profile = FlowProfile::direct(model_id, token);
            if let (Some(base), EndpointDescriptor::Inference { base_url, .. }) =
                (inference_base, &mut profile.endpoint)
            {
                *base_url = base;
            }
            profile
        }
    };
    profile.validate()?;

    Ok(ResolvedSettings {
        mode,
        profile,
        timeout,
        log_level: toml_config.logging.level.clone(),
    })
}

/// Site hosting the analysis function
fn resolve_site_base(cli: &CliOverrides, toml_config: &TomlConfig) -> String {
    resolve_tier(
        "endpoint",
        cli.endpoint.clone(),
        ENV_ENDPOINT,
        toml_config.endpoint.clone(),
    )
    .unwrap_or_else(|| DEFAULT_SITE_BASE.to_string())
}

/// Pick the highest-priority valid value for one setting
fn resolve_tier(
    setting: &str,
    cli: Option<String>,
    env_var: &str,
    toml_value: Option<String>,
) -> Option<String> {
    let env_value = std::env::var(env_var).ok();
    let candidates = [
        ("command line", cli),
        ("environment", env_value),
        ("TOML", toml_value),
    ];

    let sources: Vec<&str> = candidates
        .iter()
        .filter(|(_, value)| value.as_deref().is_some_and(is_valid_value))
        .map(|(source, _)| *source)
        .collect();
    if sources.len() > 1 {
        warn!(
            "{} found in multiple sources: {}. Using {} (highest priority).",
            setting,
            sources.join(", "),
            sources[0]
        );
    }

    candidates.into_iter().find_map(|(source, value)| {
        value.filter(|v| is_valid_value(v)).map(|v| {
            debug!("{} loaded from {}", setting, source);
            v
        })
    })
}

/// Non-empty, non-whitespace
pub fn is_valid_value(value: &str) -> bool {
    !value.trim().is_empty()
}

//! Unit tests for settings resolution
//!
//! Priority per setting: command line → environment → TOML → default.
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that manipulate TRUECHECK_* variables are marked with #[serial].

mod helpers;

use std::time::Duration;

use helpers::clear_truecheck_env;
use serial_test::serial;
use truecheck_common::config::{HuggingFaceConfig, LoggingConfig, TomlConfig};
use truecheck_verify::config::{
    resolve_settings, CliOverrides, DEFAULT_SITE_BASE, DEFAULT_TIMEOUT_SECS, ENV_ENDPOINT,
    ENV_HF_BASE_URL, ENV_HF_TOKEN, ENV_MODE, ENV_TIMEOUT_SECS,
};
use truecheck_verify::encode::EncodingStrategy;
use truecheck_verify::endpoint::{EndpointDescriptor, DEFAULT_HF_MODEL};
use truecheck_verify::FlowMode;

fn toml_with(mode: Option<&str>, endpoint: Option<&str>) -> TomlConfig {
    TomlConfig {
        mode: mode.map(str::to_string),
        endpoint: endpoint.map(str::to_string),
        timeout_secs: None,
        huggingface: HuggingFaceConfig::default(),
        logging: LoggingConfig::default(),
    }
}

#[test]
#[serial]
fn test_defaults_without_any_source() {
    clear_truecheck_env();

    let settings = resolve_settings(&CliOverrides::default(), &TomlConfig::default()).unwrap();
    assert_eq!(settings.mode, FlowMode::Multipart);
    assert_eq!(settings.profile.encoding, EncodingStrategy::Multipart);
    assert_eq!(
        settings.profile.endpoint.url(),
        format!("{}/.netlify/functions/analyze", DEFAULT_SITE_BASE)
    );
    assert_eq!(settings.timeout, Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)));
    assert_eq!(settings.log_level, "info");
}

#[test]
#[serial]
fn test_cli_overrides_env_and_toml() {
    clear_truecheck_env();
    std::env::set_var(ENV_ENDPOINT, "http://env.example");
    std::env::set_var(ENV_MODE, "multipart");

    let cli = CliOverrides {
        mode: Some(FlowMode::DataUri),
        endpoint: Some("http://cli.example".to_string()),
        ..Default::default()
    };
    let settings = resolve_settings(&cli, &toml_with(Some("direct"), Some("http://toml.example")))
        .unwrap();

    assert_eq!(settings.mode, FlowMode::DataUri);
    assert_eq!(settings.profile.encoding, EncodingStrategy::DataUri);
    assert_eq!(
        settings.profile.endpoint.url(),
        "http://cli.example/.netlify/functions/analyze"
    );

    clear_truecheck_env();
}

#[test]
#[serial]
fn test_env_overrides_toml() {
    clear_truecheck_env();
    std::env::set_var(ENV_ENDPOINT, "http://env.example");

    let settings =
        resolve_settings(&CliOverrides::default(), &toml_with(None, Some("http://toml.example")))
            .unwrap();
    assert_eq!(
        settings.profile.endpoint.url(),
        "http://env.example/.netlify/functions/analyze"
    );

    clear_truecheck_env();
}

#[test]
#[serial]
fn test_toml_used_when_nothing_else_set() {
    clear_truecheck_env();

    let settings = resolve_settings(
        &CliOverrides::default(),
        &toml_with(Some("data-uri"), Some("https://truecheck.example")),
    )
    .unwrap();
    assert_eq!(settings.mode, FlowMode::DataUri);
    assert_eq!(
        settings.profile.endpoint.url(),
        "https://truecheck.example/.netlify/functions/analyze"
    );
}

#[test]
#[serial]
fn test_whitespace_values_are_ignored() {
    clear_truecheck_env();
    std::env::set_var(ENV_ENDPOINT, "   ");

    let settings =
        resolve_settings(&CliOverrides::default(), &toml_with(None, Some("http://toml.example")))
            .unwrap();
    assert_eq!(
        settings.profile.endpoint.url(),
        "http://toml.example/.netlify/functions/analyze"
    );

    clear_truecheck_env();
}

#[test]
#[serial]
fn test_direct_mode_defaults_to_hugging_face() {
    clear_truecheck_env();
    std::env::set_var(ENV_HF_TOKEN, "hf_env");

    let settings =
        resolve_settings(&CliOverrides::default(), &toml_with(Some("direct"), None)).unwrap();
    assert_eq!(settings.profile.encoding, EncodingStrategy::RawBlob);
    assert_eq!(
        settings.profile.endpoint.url(),
        format!("https://api-inference.huggingface.co/models/{}", DEFAULT_HF_MODEL)
    );
    assert_eq!(settings.profile.endpoint.bearer_token(), Some("hf_env"));

    clear_truecheck_env();
}

#[test]
#[serial]
fn test_direct_mode_ignores_site_endpoint() {
    clear_truecheck_env();
    std::env::set_var(ENV_ENDPOINT, "https://env-site.example");
    std::env::set_var(ENV_HF_TOKEN, "hf_secret");

    let cli = CliOverrides {
        mode: Some(FlowMode::Direct),
        endpoint: Some("https://cli-site.example".to_string()),
        ..Default::default()
    };
    let settings =
        resolve_settings(&cli, &toml_with(None, Some("https://truecheck.example"))).unwrap();

    let url = settings.profile.endpoint.url();
    assert_eq!(
        url,
        format!("https://api-inference.huggingface.co/models/{}", DEFAULT_HF_MODEL)
    );
    assert!(!url.contains("example"));
    assert_eq!(settings.profile.endpoint.bearer_token(), Some("hf_secret"));

    clear_truecheck_env();
}

#[test]
#[serial]
fn test_inference_base_url_from_toml() {
    clear_truecheck_env();

    let mut toml_config = toml_with(Some("direct"), Some("https://truecheck.example"));
    toml_config.huggingface.model = Some("org/detector".to_string());
    toml_config.huggingface.base_url = Some("http://127.0.0.1:9000/models".to_string());

    let settings = resolve_settings(&CliOverrides::default(), &toml_config).unwrap();
    assert_eq!(
        settings.profile.endpoint,
        EndpointDescriptor::Inference {
            base_url: "http://127.0.0.1:9000/models".to_string(),
            model_id: "org/detector".to_string(),
            token: None,
        }
    );
    assert_eq!(
        settings.profile.endpoint.url(),
        "http://127.0.0.1:9000/models/org/detector"
    );
}

#[test]
#[serial]
fn test_inference_base_url_priority() {
    clear_truecheck_env();
    std::env::set_var(ENV_HF_BASE_URL, "http://env-inference:9000/models");

    let mut toml_config = toml_with(Some("direct"), None);
    toml_config.huggingface.base_url = Some("http://toml-inference:9000/models".to_string());

    let settings = resolve_settings(&CliOverrides::default(), &toml_config).unwrap();
    assert!(settings
        .profile
        .endpoint
        .url()
        .starts_with("http://env-inference:9000/models/"));

    let cli = CliOverrides {
        hf_base_url: Some("http://cli-inference:9000/models".to_string()),
        ..Default::default()
    };
    let settings = resolve_settings(&cli, &toml_config).unwrap();
    assert!(settings
        .profile
        .endpoint
        .url()
        .starts_with("http://cli-inference:9000/models/"));

    clear_truecheck_env();
}

#[test]
#[serial]
fn test_timeout_zero_disables_timeout() {
    clear_truecheck_env();
    std::env::set_var(ENV_TIMEOUT_SECS, "0");

    let settings = resolve_settings(&CliOverrides::default(), &TomlConfig::default()).unwrap();
    assert_eq!(settings.timeout, None);

    let cli = CliOverrides {
        timeout_secs: Some(5),
        ..Default::default()
    };
    let settings = resolve_settings(&cli, &TomlConfig::default()).unwrap();
    assert_eq!(settings.timeout, Some(Duration::from_secs(5)));

    clear_truecheck_env();
}

#[test]
#[serial]
fn test_invalid_values_rejected() {
    clear_truecheck_env();

    assert!(resolve_settings(&CliOverrides::default(), &toml_with(Some("carrier-pigeon"), None))
        .is_err());

    std::env::set_var(ENV_TIMEOUT_SECS, "soon");
    assert!(resolve_settings(&CliOverrides::default(), &TomlConfig::default()).is_err());

    clear_truecheck_env();
}

//! Endpoint descriptors and flow profiles
//!
//! A [`FlowProfile`] pairs an encoding strategy with an endpoint and is
//! chosen once at startup.

use serde::{Deserialize, Serialize};
use truecheck_common::Error;

use crate::encode::EncodingStrategy;

/// Path of the same-origin analysis function
pub const ANALYZE_FUNCTION_PATH: &str = "/.netlify/functions/analyze";

/// Hugging Face inference API base
pub const HF_INFERENCE_BASE_URL: &str = "https://api-inference.huggingface.co/models/";

/// Model used for direct inference when none is configured
pub const DEFAULT_HF_MODEL: &str = "umm-maybe/AI-image-detector";

/// Expected response body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseContract {
    /// JSON object with `verdict`/`isAI`, confidence and optional breakdown
    VerdictObject,
    /// JSON array of `{label, score}` pairs
    LabelScores,
}

/// Where the analysis request goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointDescriptor {
    /// Analysis function hosted next to the UI
    LocalFunction { url: String },
    /// Third-party model endpoint called directly
    Inference {
        base_url: String,
        model_id: String,
        token: Option<String>,
    },
}

impl EndpointDescriptor {
    /// Analysis function under `site_base`, e.g. `https://truecheck.example`
    pub fn local_function(site_base: &str) -> Self {
        EndpointDescriptor::LocalFunction {
            url: format!("{}{}", site_base.trim_end_matches('/'), ANALYZE_FUNCTION_PATH),
        }
    }

    /// Hugging Face model endpoint
    pub fn hugging_face(model_id: impl Into<String>, token: Option<String>) -> Self {
        EndpointDescriptor::Inference {
            base_url: HF_INFERENCE_BASE_URL.to_string(),
            model_id: model_id.into(),
            token,
        }
    }

    pub fn url(&self) -> String {
        match self {
            EndpointDescriptor::LocalFunction { url } => url.clone(),
            EndpointDescriptor::Inference {
                base_url, model_id, ..
            } => format!("{}/{}", base_url.trim_end_matches('/'), model_id.trim_start_matches('/')),
        }
    }

    pub fn contract(&self) -> ResponseContract {
        match self {
            EndpointDescriptor::LocalFunction { .. } => ResponseContract::VerdictObject,
            EndpointDescriptor::Inference { .. } => ResponseContract::LabelScores,
        }
    }

    pub fn bearer_token(&self) -> Option<&str> {
        match self {
            EndpointDescriptor::Inference { token: Some(t), .. } if !t.trim().is_empty() => {
                Some(t.as_str())
            }
            _ => None,
        }
    }

    /// Model id for direct inference endpoints
    pub fn model_id(&self) -> Option<&str> {
        match self {
            EndpointDescriptor::Inference { model_id, .. } => Some(model_id),
            EndpointDescriptor::LocalFunction { .. } => None,
        }
    }
}

/// The three supported flow presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum FlowMode {
    /// Multipart upload to the analysis function
    Multipart,
    /// Raw bytes straight to the Hugging Face model
    Direct,
    /// Base64 data URI as JSON to the analysis function
    DataUri,
}

impl FlowMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowMode::Multipart => "multipart",
            FlowMode::Direct => "direct",
            FlowMode::DataUri => "data-uri",
        }
    }

    pub fn encoding(&self) -> EncodingStrategy {
        match self {
            FlowMode::Multipart => EncodingStrategy::Multipart,
            FlowMode::Direct => EncodingStrategy::RawBlob,
            FlowMode::DataUri => EncodingStrategy::DataUri,
        }
    }
}

impl std::str::FromStr for FlowMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "multipart" => Ok(FlowMode::Multipart),
            "direct" => Ok(FlowMode::Direct),
            "data-uri" | "data_uri" | "datauri" => Ok(FlowMode::DataUri),
            other => Err(Error::Config(format!(
                "Unknown mode '{}' (expected multipart, direct or data-uri)",
                other
            ))),
        }
    }
}

/// Encoding strategy plus endpoint, fixed for the lifetime of a flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowProfile {
    pub encoding: EncodingStrategy,
    pub endpoint: EndpointDescriptor,
}

impl FlowProfile {
    pub fn new(encoding: EncodingStrategy, endpoint: EndpointDescriptor) -> Result<Self, Error> {
        let profile = Self { encoding, endpoint };
        profile.validate()?;
        Ok(profile)
    }

    /// Multipart upload to `<site_base>/.netlify/functions/analyze`
    pub fn multipart(site_base: &str) -> Self {
        Self {
            encoding: EncodingStrategy::Multipart,
            endpoint: EndpointDescriptor::local_function(site_base),
        }
    }

    /// Raw bytes to a Hugging Face model
    pub fn direct(model_id: impl Into<String>, token: Option<String>) -> Self {
        Self {
            encoding: EncodingStrategy::RawBlob,
            endpoint: EndpointDescriptor::hugging_face(model_id, token),
        }
    }

    /// Base64 JSON to `<site_base>/.netlify/functions/analyze`
    pub fn data_uri(site_base: &str) -> Self {
        Self {
            encoding: EncodingStrategy::DataUri,
            endpoint: EndpointDescriptor::local_function(site_base),
        }
    }

    /// Reject pairs the endpoints cannot accept
    ///
    /// Inference endpoints take raw bytes only; the analysis function takes
    /// the multipart field or the JSON data URI, never a bare body.
    pub fn validate(&self) -> Result<(), Error> {
        match &self.endpoint {
            EndpointDescriptor::Inference { model_id, .. } => {
                if self.encoding != EncodingStrategy::RawBlob {
                    return Err(Error::Config(format!(
                        "Inference endpoints require raw bytes, got {:?}",
                        self.encoding
                    )));
                }
                if model_id.trim().is_empty() {
                    return Err(Error::Config("Inference model id is empty".to_string()));
                }
            }
            EndpointDescriptor::LocalFunction { .. } => {
                if self.encoding == EncodingStrategy::RawBlob {
                    return Err(Error::Config(
                        "The analysis function accepts multipart or data URI uploads, not raw bytes"
                            .to_string(),
                    ));
                }
            }
        }
        Ok(())
    }
}

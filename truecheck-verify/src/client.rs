//! Analysis dispatch
//!
//! Sends exactly one POST per analysis and normalizes the reply. No retry.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::multipart;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::encode::{AnalysisRequest, MULTIPART_FIELD};
use crate::endpoint::{EndpointDescriptor, ResponseContract};
use crate::error::{VerifyError, VerifyResult};
use crate::result::AnalysisResult;

const USER_AGENT: &str = concat!("truecheck-verify/", env!("CARGO_PKG_VERSION"));

/// Largest error body kept for logging
const MAX_ERROR_BODY: usize = 512;

/// Sends an encoded request and returns the normalized result
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn dispatch(
        &self,
        endpoint: &EndpointDescriptor,
        request: AnalysisRequest,
    ) -> VerifyResult<AnalysisResult>;
}

/// reqwest-backed dispatcher
pub struct HttpDispatcher {
    http_client: reqwest::Client,
}

impl HttpDispatcher {
    /// Build a dispatcher; `timeout` of `None` waits indefinitely
    pub fn new(timeout: Option<Duration>) -> VerifyResult<Self> {
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder
            .build()
            .map_err(|e| VerifyError::Network(e.to_string()))?;

        Ok(Self { http_client })
    }

    fn build_request(
        &self,
        endpoint: &EndpointDescriptor,
        request: AnalysisRequest,
    ) -> VerifyResult<reqwest::RequestBuilder> {
        let mut builder = self.http_client.post(endpoint.url());
        if let Some(token) = endpoint.bearer_token() {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
        }

        let builder = match request {
            AnalysisRequest::Multipart {
                file_name,
                mime,
                bytes,
            } => {
                let part = multipart::Part::bytes(bytes.to_vec())
                    .file_name(file_name)
                    .mime_str(&mime)
                    .map_err(|e| VerifyError::UnsupportedMedia(format!("{}: {}", mime, e)))?;
                builder.multipart(multipart::Form::new().part(MULTIPART_FIELD, part))
            }
            AnalysisRequest::RawBlob { mime, bytes } => {
                builder.header(CONTENT_TYPE, mime).body(bytes.to_vec())
            }
            AnalysisRequest::DataUri(payload) => builder.json(&payload),
        };

        Ok(builder)
    }
}

#[async_trait]
impl Dispatcher for HttpDispatcher {
    async fn dispatch(
        &self,
        endpoint: &EndpointDescriptor,
        request: AnalysisRequest,
    ) -> VerifyResult<AnalysisResult> {
        let url = endpoint.url();
        debug!(
            url = %url,
            strategy = ?request.strategy(),
            body_len = request.body_len(),
            "Sending analysis request"
        );

        let response = self.build_request(endpoint, request)?.send().await?;

        let status = response.status();
        if !status.is_success() {
            let mut error_text = response.text().await.unwrap_or_default();
            if error_text.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !error_text.is_char_boundary(cut) {
                    cut -= 1;
                }
                error_text.truncate(cut);
            }
            warn!(url = %url, status = status.as_u16(), "Analysis endpoint returned error status");
            return Err(VerifyError::Api(status.as_u16(), error_text));
        }

        let body: Value = response.json().await?;

        let result = match endpoint.contract() {
            ResponseContract::VerdictObject => AnalysisResult::from_verdict_object(body)?,
            ResponseContract::LabelScores => {
                AnalysisResult::from_label_scores(body, endpoint.model_id())?
            }
        };

        info!(
            url = %url,
            verdict = result.verdict.as_str(),
            confidence = ?result.confidence,
            models = result.models.len(),
            "Analysis response received"
        );

        Ok(result)
    }
}

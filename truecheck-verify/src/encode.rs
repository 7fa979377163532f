//! Request encoding strategies
//!
//! Every strategy turns one [`MediaFile`] into one [`AnalysisRequest`];
//! they differ only in wire shape.

use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};

use crate::media::{MediaFile, MediaKind};

/// Multipart form field carrying the file
pub const MULTIPART_FIELD: &str = "file";

/// Wire shape of the outbound request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncodingStrategy {
    /// `multipart/form-data` with the file in field `file`
    Multipart,
    /// Raw bytes with the original MIME type as content type
    RawBlob,
    /// JSON `{ "media": <data uri>, "type": "image" | "video" }`
    DataUri,
}

/// JSON body for [`EncodingStrategy::DataUri`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataUriPayload {
    pub media: String,
    #[serde(rename = "type")]
    pub kind: MediaKind,
}

/// Single-use encoded request
#[derive(Debug, Clone)]
pub enum AnalysisRequest {
    Multipart {
        file_name: String,
        mime: String,
        bytes: Arc<[u8]>,
    },
    RawBlob {
        mime: String,
        bytes: Arc<[u8]>,
    },
    DataUri(DataUriPayload),
}

impl AnalysisRequest {
    /// Body size in bytes, for logging
    pub fn body_len(&self) -> usize {
        match self {
            AnalysisRequest::Multipart { bytes, .. } | AnalysisRequest::RawBlob { bytes, .. } => {
                bytes.len()
            }
            AnalysisRequest::DataUri(payload) => payload.media.len(),
        }
    }

    pub fn strategy(&self) -> EncodingStrategy {
        match self {
            AnalysisRequest::Multipart { .. } => EncodingStrategy::Multipart,
            AnalysisRequest::RawBlob { .. } => EncodingStrategy::RawBlob,
            AnalysisRequest::DataUri(_) => EncodingStrategy::DataUri,
        }
    }
}

impl EncodingStrategy {
    pub fn encode(&self, file: &MediaFile) -> AnalysisRequest {
        match self {
            EncodingStrategy::Multipart => AnalysisRequest::Multipart {
                file_name: file.name().to_string(),
                mime: file.mime().to_string(),
                bytes: file.bytes(),
            },
            EncodingStrategy::RawBlob => AnalysisRequest::RawBlob {
                mime: file.mime().to_string(),
                bytes: file.bytes(),
            },
            EncodingStrategy::DataUri => AnalysisRequest::DataUri(DataUriPayload {
                media: data_uri(file.mime(), &file.bytes()),
                kind: file.kind(),
            }),
        }
    }
}

/// `data:<mime>;base64,<payload>` using the standard alphabet with padding
pub fn data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, general_purpose::STANDARD.encode(bytes))
}

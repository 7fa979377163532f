//! Media intake
//!
//! Turns a user-selected file into a [`MediaFile`]: enforces the upload
//! ceiling and the image/video accept filter, resolves the MIME type.
//!
//! MIME resolution order: declared type, file extension, content sniffing.
//! The extension wins over the content, so a renamed file passes the
//! accept filter just as it would in a browser file picker.

use std::path::Path;
use std::sync::Arc;

use mime_guess::Mime;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::error::{VerifyError, VerifyResult};

/// Upload ceiling: 4 MiB
pub const MAX_UPLOAD_BYTES: u64 = 4 * 1024 * 1024;

/// Broad media category accepted by intake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Classify a MIME type; `None` for anything outside `image/*` and `video/*`
    pub fn from_mime(mime: &str) -> Option<Self> {
        let top = mime.split('/').next()?.trim().to_ascii_lowercase();
        match top.as_str() {
            "image" => Some(MediaKind::Image),
            "video" => Some(MediaKind::Video),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reject sizes above [`MAX_UPLOAD_BYTES`]
///
/// Exactly 4 MiB is accepted.
pub fn check_size(size: u64) -> VerifyResult<()> {
    if size > MAX_UPLOAD_BYTES {
        return Err(VerifyError::FileTooLarge {
            size,
            limit: MAX_UPLOAD_BYTES,
        });
    }
    Ok(())
}

/// User-supplied media file held in memory
#[derive(Debug, Clone)]
pub struct MediaFile {
    name: String,
    mime: String,
    kind: MediaKind,
    bytes: Arc<[u8]>,
    digest: String,
}

impl MediaFile {
    /// Build a media file from bytes already in memory
    pub fn from_bytes(
        name: impl Into<String>,
        bytes: Vec<u8>,
        declared_mime: Option<&str>,
    ) -> VerifyResult<Self> {
        let name = name.into();
        check_size(bytes.len() as u64)?;

        let mime = resolve_mime(&name, declared_mime, &bytes)?
            .ok_or_else(|| VerifyError::UnsupportedMedia("unknown".to_string()))?;
        let kind = MediaKind::from_mime(&mime)
            .ok_or_else(|| VerifyError::UnsupportedMedia(mime.clone()))?;

        let digest = format!("{:x}", Sha256::digest(&bytes));

        debug!(
            file = %name,
            mime = %mime,
            size = bytes.len(),
            "Media file accepted"
        );

        Ok(Self {
            name,
            mime,
            kind,
            bytes: Arc::from(bytes),
            digest,
        })
    }

    /// Read a media file from disk
    ///
    /// The size is checked from metadata first so oversize files are never read.
    pub async fn open(path: &Path) -> VerifyResult<Self> {
        let metadata = tokio::fs::metadata(path).await?;
        if let Err(e) = check_size(metadata.len()) {
            warn!(path = %path.display(), size = metadata.len(), "Rejected oversize file");
            return Err(e);
        }

        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Self::from_bytes(name, bytes, None)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Shared content bytes
    pub fn bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.bytes)
    }

    /// SHA-256 of the content, lowercase hex
    pub fn digest(&self) -> &str {
        &self.digest
    }
}

/// Resolve the MIME type for a file
///
/// A declared type that does not parse is rejected here rather than at
/// dispatch.
fn resolve_mime(name: &str, declared: Option<&str>, bytes: &[u8]) -> VerifyResult<Option<String>> {
    if let Some(declared) = declared.map(str::trim).filter(|m| !m.is_empty()) {
        let mime = parse_declared(declared)?;
        if mime.essence_str() != OCTET_STREAM {
            return Ok(Some(mime.essence_str().to_string()));
        }
    }

    let from_extension = mime_guess::from_path(name)
        .iter_raw()
        .find(|mime| MediaKind::from_mime(mime).is_some());
    if let Some(mime) = from_extension {
        return Ok(Some(mime.to_string()));
    }

    Ok(infer::get(bytes).map(|t| t.mime_type().to_string()))
}

const OCTET_STREAM: &str = "application/octet-stream";

fn parse_declared(declared: &str) -> VerifyResult<Mime> {
    let mime: Mime = declared
        .parse()
        .map_err(|e| VerifyError::UnsupportedMedia(format!("{}: {}", declared, e)))?;

    // `mime` accepts an empty subtype
    let subtype = mime.subtype();
    if subtype.as_str().is_empty() || subtype == mime_guess::mime::STAR {
        return Err(VerifyError::UnsupportedMedia(declared.to_string()));
    }
    Ok(mime)
}

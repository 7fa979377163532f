//! Revocable preview handles
//!
//! A preview handle is the local stand-in for a browser object URL: an
//! opaque `preview:<uuid>` reference that resolves to the file bytes until
//! it is revoked.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::media::{MediaFile, MediaKind};

/// Ephemeral reference to the bytes of the live media file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewHandle {
    id: Uuid,
    kind: MediaKind,
    mime: String,
}

impl PreviewHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Image or video; decides how a front-end renders the preview
    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn uri(&self) -> String {
        format!("preview:{}", self.id)
    }
}

/// Owner of all live preview handles
#[derive(Debug, Default)]
pub struct PreviewRegistry {
    live: HashMap<Uuid, Arc<[u8]>>,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new handle for `file`
    pub fn create(&mut self, file: &MediaFile) -> PreviewHandle {
        let handle = PreviewHandle {
            id: Uuid::new_v4(),
            kind: file.kind(),
            mime: file.mime().to_string(),
        };
        self.live.insert(handle.id, file.bytes());
        handle
    }

    /// Bytes behind a handle, or `None` once revoked
    pub fn resolve(&self, handle: &PreviewHandle) -> Option<Arc<[u8]>> {
        self.live.get(&handle.id).cloned()
    }

    /// Release a handle; returns false if it was already revoked
    pub fn revoke(&mut self, handle: &PreviewHandle) -> bool {
        self.live.remove(&handle.id).is_some()
    }

    /// Number of handles not yet revoked
    pub fn live_count(&self) -> usize {
        self.live.len()
    }
}

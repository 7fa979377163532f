//! Event types for the upload-and-verify flow
//!
//! Provides the flow event definitions and the EventBus that carries them.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Flow event types
///
/// Emitted by the verify session on every state transition. Front-ends
/// subscribe to drive progress output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum FlowEvent {
    /// A file passed intake and is now the live file
    FileSelected {
        session_id: Uuid,
        file_name: String,
        /// `image` or `video`
        kind: String,
        size_bytes: u64,
        preview_uri: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A file was refused at intake; session state is unchanged
    FileRejected {
        session_id: Uuid,
        file_name: String,
        size_bytes: u64,
        reason: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Analysis request is about to be sent
    AnalysisStarted {
        session_id: Uuid,
        file_name: String,
        generation: u64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Analysis finished with a verdict
    AnalysisCompleted {
        session_id: Uuid,
        generation: u64,
        verdict: String,
        confidence: Option<u8>,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Analysis failed; the file stays selected
    AnalysisFailed {
        session_id: Uuid,
        generation: u64,
        message: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Session returned to idle via an explicit user action
    SessionReset {
        session_id: Uuid,
        /// `clear`, `upload_another` or `back_to_home`
        action: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl FlowEvent {
    /// Get the session this event belongs to
    pub fn session_id(&self) -> Uuid {
        match self {
            FlowEvent::FileSelected { session_id, .. }
            | FlowEvent::FileRejected { session_id, .. }
            | FlowEvent::AnalysisStarted { session_id, .. }
            | FlowEvent::AnalysisCompleted { session_id, .. }
            | FlowEvent::AnalysisFailed { session_id, .. }
            | FlowEvent::SessionReset { session_id, .. } => *session_id,
        }
    }

    /// Event type name as serialized in the `type` tag
    pub fn event_type(&self) -> &'static str {
        match self {
            FlowEvent::FileSelected { .. } => "FileSelected",
            FlowEvent::FileRejected { .. } => "FileRejected",
            FlowEvent::AnalysisStarted { .. } => "AnalysisStarted",
            FlowEvent::AnalysisCompleted { .. } => "AnalysisCompleted",
            FlowEvent::AnalysisFailed { .. } => "AnalysisFailed",
            FlowEvent::SessionReset { .. } => "SessionReset",
        }
    }
}

/// Central event distribution bus
///
/// Thin wrapper over a tokio broadcast channel. Cloning shares the channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<FlowEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Examples
    ///
    /// ```
    /// use truecheck_common::events::EventBus;
    ///
    /// let event_bus = EventBus::new(16);
    /// assert_eq!(event_bus.capacity(), 16);
    /// ```
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<FlowEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: FlowEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

//! Upload-and-verify session state machine
//!
//! ```text
//! Idle ──select──▶ FileSelected ──begin──▶ Analyzing ──finish(ok)──▶ ResultShown
//!                       ▲                      │                        │
//!                       └──────finish(err)─────┘◀────────begin──────────┘
//! any state ──reset──▶ Idle
//! ```
//!
//! At most one file, one preview and one result are live at a time.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info, warn};
use truecheck_common::events::{EventBus, FlowEvent};
use uuid::Uuid;

use crate::error::{VerifyError, VerifyResult};
use crate::media::MediaFile;
use crate::preview::{PreviewHandle, PreviewRegistry};
use crate::result::AnalysisResult;

/// User actions that return the session to idle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetAction {
    Clear,
    UploadAnother,
    BackToHome,
}

impl ResetAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResetAction::Clear => "clear",
            ResetAction::UploadAnother => "upload_another",
            ResetAction::BackToHome => "back_to_home",
        }
    }
}

/// Payload-free view of the current state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    FileSelected,
    Analyzing,
    ResultShown,
}

/// Session view state; each variant carries exactly what it needs
#[derive(Debug, Default)]
pub enum ViewState {
    #[default]
    Idle,
    FileSelected {
        file: Arc<MediaFile>,
        preview: PreviewHandle,
    },
    Analyzing {
        file: Arc<MediaFile>,
        preview: PreviewHandle,
        generation: u64,
    },
    ResultShown {
        file: Arc<MediaFile>,
        preview: PreviewHandle,
        result: AnalysisResult,
    },
}

impl ViewState {
    pub fn phase(&self) -> Phase {
        match self {
            ViewState::Idle => Phase::Idle,
            ViewState::FileSelected { .. } => Phase::FileSelected,
            ViewState::Analyzing { .. } => Phase::Analyzing,
            ViewState::ResultShown { .. } => Phase::ResultShown,
        }
    }
}

/// Permission to run one analysis, handed out by [`Session::begin_analysis`]
#[derive(Debug)]
pub struct AnalysisTicket {
    generation: u64,
    file: Arc<MediaFile>,
}

impl AnalysisTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn file(&self) -> &MediaFile {
        &self.file
    }
}

/// One user's upload-and-verify session
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    state: ViewState,
    previews: PreviewRegistry,
    next_generation: u64,
    events: Option<EventBus>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            state: ViewState::Idle,
            previews: PreviewRegistry::new(),
            next_generation: 1,
            events: None,
        }
    }

    /// Session that publishes every transition on `events`
    pub fn with_events(events: EventBus) -> Self {
        Self {
            events: Some(events),
            ..Self::new()
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn is_analyzing(&self) -> bool {
        matches!(self.state, ViewState::Analyzing { .. })
    }

    pub fn file(&self) -> Option<&MediaFile> {
        match &self.state {
            ViewState::Idle => None,
            ViewState::FileSelected { file, .. }
            | ViewState::Analyzing { file, .. }
            | ViewState::ResultShown { file, .. } => Some(file),
        }
    }

    pub fn preview(&self) -> Option<&PreviewHandle> {
        match &self.state {
            ViewState::Idle => None,
            ViewState::FileSelected { preview, .. }
            | ViewState::Analyzing { preview, .. }
            | ViewState::ResultShown { preview, .. } => Some(preview),
        }
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        match &self.state {
            ViewState::ResultShown { result, .. } => Some(result),
            _ => None,
        }
    }

    /// Bytes behind the current preview handle
    pub fn resolve_preview(&self) -> Option<Arc<[u8]>> {
        self.preview().and_then(|p| self.previews.resolve(p))
    }

    /// Bytes behind any handle, `None` once it has been revoked
    pub fn resolve_handle(&self, handle: &PreviewHandle) -> Option<Arc<[u8]>> {
        self.previews.resolve(handle)
    }

    /// Number of preview handles not yet revoked (0 or 1)
    pub fn live_previews(&self) -> usize {
        self.previews.live_count()
    }

    /// Make `file` the live file
    ///
    /// Revokes the previous preview and drops any previous result. Refused
    /// while an analysis is pending.
    pub fn select_file(&mut self, file: MediaFile) -> VerifyResult<PreviewHandle> {
        if self.is_analyzing() {
            warn!(session = %self.id, file = %file.name(), "File selection refused during analysis");
            return Err(VerifyError::AnalysisInProgress);
        }

        self.release_current();

        let preview = self.previews.create(&file);
        info!(
            session = %self.id,
            file = %file.name(),
            kind = %file.kind(),
            size = file.size(),
            digest = %file.digest(),
            "File selected"
        );
        self.emit(FlowEvent::FileSelected {
            session_id: self.id,
            file_name: file.name().to_string(),
            kind: file.kind().to_string(),
            size_bytes: file.size(),
            preview_uri: preview.uri(),
            timestamp: chrono::Utc::now(),
        });

        self.state = ViewState::FileSelected {
            file: Arc::new(file),
            preview: preview.clone(),
        };
        Ok(preview)
    }

    /// Record a file refused at intake; state is left untouched
    pub fn note_rejection(&self, file_name: &str, size_bytes: u64, reason: &VerifyError) {
        warn!(session = %self.id, file = %file_name, size = size_bytes, "File rejected: {}", reason);
        self.emit(FlowEvent::FileRejected {
            session_id: self.id,
            file_name: file_name.to_string(),
            size_bytes,
            reason: reason.alert(),
            timestamp: chrono::Utc::now(),
        });
    }

    /// Enter `Analyzing`
    ///
    /// Returns `None` without changing anything when there is no file or a
    /// request is already pending.
    pub fn begin_analysis(&mut self) -> Option<AnalysisTicket> {
        match std::mem::take(&mut self.state) {
            ViewState::FileSelected { file, preview }
            | ViewState::ResultShown { file, preview, .. } => {
                let generation = self.next_generation;
                self.next_generation += 1;

                info!(session = %self.id, file = %file.name(), generation, "Analysis started");
                self.emit(FlowEvent::AnalysisStarted {
                    session_id: self.id,
                    file_name: file.name().to_string(),
                    generation,
                    timestamp: chrono::Utc::now(),
                });

                self.state = ViewState::Analyzing {
                    file: Arc::clone(&file),
                    preview,
                    generation,
                };
                Some(AnalysisTicket { generation, file })
            }
            other => {
                debug!(session = %self.id, phase = ?other.phase(), "Analyze ignored");
                self.state = other;
                None
            }
        }
    }

    /// Apply the outcome of the request started with `ticket`
    ///
    /// Outcomes for a ticket that is no longer current (the session was reset
    /// or re-selected meanwhile) are discarded and yield `Ok(None)`.
    pub fn finish_analysis(
        &mut self,
        ticket: AnalysisTicket,
        outcome: VerifyResult<AnalysisResult>,
    ) -> VerifyResult<Option<AnalysisResult>> {
        let current = matches!(
            self.state,
            ViewState::Analyzing { generation, .. } if generation == ticket.generation
        );
        if !current {
            debug!(
                session = %self.id,
                generation = ticket.generation,
                "Discarding stale analysis outcome"
            );
            return Ok(None);
        }

        let ViewState::Analyzing { file, preview, .. } = std::mem::take(&mut self.state) else {
            return Ok(None);
        };

        match outcome {
            Ok(result) => {
                info!(
                    session = %self.id,
                    generation = ticket.generation,
                    verdict = result.verdict.as_str(),
                    confidence = ?result.confidence,
                    "Analysis complete"
                );
                self.emit(FlowEvent::AnalysisCompleted {
                    session_id: self.id,
                    generation: ticket.generation,
                    verdict: result.verdict.as_str().to_string(),
                    confidence: result.confidence,
                    timestamp: chrono::Utc::now(),
                });
                self.state = ViewState::ResultShown {
                    file,
                    preview,
                    result: result.clone(),
                };
                Ok(Some(result))
            }
            Err(e) => {
                error!(
                    session = %self.id,
                    generation = ticket.generation,
                    "Analysis error: {}",
                    e
                );
                self.emit(FlowEvent::AnalysisFailed {
                    session_id: self.id,
                    generation: ticket.generation,
                    message: e.alert(),
                    timestamp: chrono::Utc::now(),
                });
                self.state = ViewState::FileSelected { file, preview };
                Err(e)
            }
        }
    }

    /// Return to `Idle` from any state
    pub fn reset(&mut self, action: ResetAction) {
        self.release_current();
        self.state = ViewState::Idle;

        info!(session = %self.id, action = action.as_str(), "Session reset");
        self.emit(FlowEvent::SessionReset {
            session_id: self.id,
            action: action.as_str().to_string(),
            timestamp: chrono::Utc::now(),
        });
    }

    /// Revoke the current preview and clear the state
    fn release_current(&mut self) {
        if let Some(preview) = self.preview().cloned() {
            self.previews.revoke(&preview);
            debug!(session = %self.id, preview = %preview.uri(), "Preview revoked");
        }
        self.state = ViewState::Idle;
    }

    fn emit(&self, event: FlowEvent) {
        if let Some(events) = &self.events {
            events.emit_lossy(event);
        }
    }
}

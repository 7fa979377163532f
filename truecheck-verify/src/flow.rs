//! Linear upload-and-verify pipeline
//!
//! intake → encode → dispatch → present, with `?` at every stage. The
//! session lock is never held across the network call, so a second
//! `analyze` while one is pending sees `Analyzing` and returns at once.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info};
use truecheck_common::events::{EventBus, FlowEvent};

use crate::client::Dispatcher;
use crate::endpoint::FlowProfile;
use crate::error::VerifyResult;
use crate::media::MediaFile;
use crate::preview::PreviewHandle;
use crate::result::AnalysisResult;
use crate::session::{ResetAction, Session};

/// Session shared between the flow and its front-end
pub type SharedSession = Arc<Mutex<Session>>;

/// Event channel capacity per flow
const EVENT_CAPACITY: usize = 64;

/// Upload-and-verify flow bound to one profile and dispatcher
pub struct VerifyFlow<D: Dispatcher> {
    profile: FlowProfile,
    dispatcher: D,
    session: SharedSession,
    events: EventBus,
}

impl<D: Dispatcher> VerifyFlow<D> {
    pub fn new(profile: FlowProfile, dispatcher: D) -> Self {
        let events = EventBus::new(EVENT_CAPACITY);
        let session = Arc::new(Mutex::new(Session::with_events(events.clone())));
        Self {
            profile,
            dispatcher,
            session,
            events,
        }
    }

    pub fn profile(&self) -> &FlowProfile {
        &self.profile
    }

    pub fn session(&self) -> SharedSession {
        Arc::clone(&self.session)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FlowEvent> {
        self.events.subscribe()
    }

    /// Intake a file from disk
    pub async fn select_path(&self, path: &Path) -> VerifyResult<PreviewHandle> {
        let name = path.display().to_string();
        match MediaFile::open(path).await {
            Ok(file) => self.session.lock().await.select_file(file),
            Err(e) => {
                let size = tokio::fs::metadata(path).await.map(|m| m.len()).unwrap_or(0);
                self.session.lock().await.note_rejection(&name, size, &e);
                Err(e)
            }
        }
    }

    /// Intake a file already in memory (e.g. a dropped file)
    pub async fn select_bytes(
        &self,
        name: &str,
        bytes: Vec<u8>,
        mime: Option<&str>,
    ) -> VerifyResult<PreviewHandle> {
        let size = bytes.len() as u64;
        match MediaFile::from_bytes(name, bytes, mime) {
            Ok(file) => self.session.lock().await.select_file(file),
            Err(e) => {
                self.session.lock().await.note_rejection(name, size, &e);
                Err(e)
            }
        }
    }

    /// Run one analysis of the live file
    ///
    /// Returns `Ok(None)` without sending anything when no file is selected,
    /// when another analysis is pending, or when the session was reset
    /// before the reply arrived.
    pub async fn analyze(&self) -> VerifyResult<Option<AnalysisResult>> {
        let Some(ticket) = self.session.lock().await.begin_analysis() else {
            debug!("Analyze is a no-op in the current state");
            return Ok(None);
        };

        let request = self.profile.encoding.encode(ticket.file());
        info!(
            file = %ticket.file().name(),
            endpoint = %self.profile.endpoint.url(),
            strategy = ?self.profile.encoding,
            "Dispatching analysis"
        );

        let outcome = self
            .dispatcher
            .dispatch(&self.profile.endpoint, request)
            .await;

        self.session.lock().await.finish_analysis(ticket, outcome)
    }

    pub async fn reset(&self, action: ResetAction) {
        self.session.lock().await.reset(action);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::{AnalysisRequest, EncodingStrategy};
    use crate::endpoint::EndpointDescriptor;
    use crate::error::VerifyError;
    use crate::media::MAX_UPLOAD_BYTES;
    use crate::result::Verdict;
    use crate::session::Phase;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    /// Dispatcher that blocks until released and counts calls
    struct GatedDispatcher {
        calls: AtomicUsize,
        gate: Arc<Notify>,
        reply: fn() -> VerifyResult<AnalysisResult>,
    }

    #[async_trait]
    impl Dispatcher for GatedDispatcher {
        async fn dispatch(
            &self,
            _endpoint: &EndpointDescriptor,
            request: AnalysisRequest,
        ) -> VerifyResult<AnalysisResult> {
            assert_eq!(request.strategy(), EncodingStrategy::Multipart);
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.gate.notified().await;
            (self.reply)()
        }
    }

    fn flow(reply: fn() -> VerifyResult<AnalysisResult>) -> (Arc<VerifyFlow<GatedDispatcher>>, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let dispatcher = GatedDispatcher {
            calls: AtomicUsize::new(0),
            gate: Arc::clone(&gate),
            reply,
        };
        let flow = VerifyFlow::new(FlowProfile::multipart("http://localhost:8888"), dispatcher);
        (Arc::new(flow), gate)
    }

    fn ai_reply() -> VerifyResult<AnalysisResult> {
        Ok(AnalysisResult::new(Verdict::AiGenerated, Some(91)))
    }

    fn failing_reply() -> VerifyResult<AnalysisResult> {
        Err(VerifyError::MalformedResponse("empty label list".into()))
    }

    async fn wait_until_analyzing(flow: &VerifyFlow<GatedDispatcher>) {
        while flow.dispatcher.calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
        assert!(flow.session.lock().await.is_analyzing());
    }

    #[tokio::test]
    async fn test_second_analyze_while_pending_is_noop() {
        let (flow, gate) = flow(ai_reply);
        flow.select_bytes("a.png", vec![1, 2, 3], None).await.unwrap();

        let running = tokio::spawn({
            let flow = Arc::clone(&flow);
            async move { flow.analyze().await }
        });
        wait_until_analyzing(&flow).await;

        assert!(flow.analyze().await.unwrap().is_none());
        assert_eq!(flow.dispatcher.calls.load(Ordering::SeqCst), 1);

        gate.notify_one();
        let result = running.await.unwrap().unwrap().unwrap();
        assert_eq!(result.verdict, Verdict::AiGenerated);
        assert_eq!(flow.session.lock().await.phase(), Phase::ResultShown);
    }

    #[tokio::test]
    async fn test_failure_clears_analyzing_flag() {
        let (flow, gate) = flow(failing_reply);
        flow.select_bytes("a.png", vec![1, 2, 3], None).await.unwrap();

        gate.notify_one();
        let err = flow.analyze().await.unwrap_err();
        assert_eq!(err.alert(), crate::error::ANALYSIS_FAILED_ALERT);

        let session = flow.session.lock().await;
        assert!(!session.is_analyzing());
        assert!(session.file().is_some());
        assert!(session.result().is_none());
    }

    #[tokio::test]
    async fn test_oversize_selection_keeps_state() {
        let (flow, gate) = flow(ai_reply);
        flow.select_bytes("a.png", vec![1, 2, 3], None).await.unwrap();
        gate.notify_one();
        flow.analyze().await.unwrap();
        let before = flow.session.lock().await.preview().cloned();

        let err = flow
            .select_bytes("big.png", vec![0; (MAX_UPLOAD_BYTES + 1) as usize], None)
            .await
            .unwrap_err();
        assert!(matches!(err, VerifyError::FileTooLarge { .. }));

        let session = flow.session.lock().await;
        assert_eq!(session.phase(), Phase::ResultShown);
        assert_eq!(session.file().map(|f| f.name()), Some("a.png"));
        assert_eq!(session.preview().cloned(), before);
        assert!(session.result().is_some());
    }

    #[tokio::test]
    async fn test_analyze_without_file_sends_nothing() {
        let (flow, _gate) = flow(ai_reply);
        assert!(flow.analyze().await.unwrap().is_none());
        assert_eq!(flow.dispatcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_reset_during_analysis_discards_reply() {
        let (flow, gate) = flow(ai_reply);
        flow.select_bytes("a.png", vec![1, 2, 3], None).await.unwrap();

        let running = tokio::spawn({
            let flow = Arc::clone(&flow);
            async move { flow.analyze().await }
        });
        wait_until_analyzing(&flow).await;

        flow.reset(ResetAction::BackToHome).await;
        gate.notify_one();

        assert!(running.await.unwrap().unwrap().is_none());
        let session = flow.session.lock().await;
        assert_eq!(session.phase(), Phase::Idle);
        assert!(session.result().is_none());
    }
}

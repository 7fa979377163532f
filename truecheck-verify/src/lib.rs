//! truecheck-verify library interface
//!
//! Upload-and-verify flow: intake a media file, encode it, send it to an
//! analysis endpoint and present the verdict.

pub mod client;
pub mod config;
pub mod encode;
pub mod endpoint;
pub mod error;
pub mod flow;
pub mod media;
pub mod present;
pub mod preview;
pub mod result;
pub mod session;

pub use crate::client::{Dispatcher, HttpDispatcher};
pub use crate::endpoint::{EndpointDescriptor, FlowMode, FlowProfile};
pub use crate::error::{VerifyError, VerifyResult};
pub use crate::flow::VerifyFlow;
pub use crate::media::{MediaFile, MediaKind, MAX_UPLOAD_BYTES};
pub use crate::result::{AnalysisResult, Verdict};
pub use crate::session::{Phase, ResetAction, Session};

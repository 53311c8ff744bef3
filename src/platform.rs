//! The seam between this crate and the host's speech engine.
//!
//! Platform speech engines (the Web Speech API, SAPI, speech-dispatcher...)
//! are fire-and-forget: an utterance is submitted, and completion, failure or
//! captured audio arrive later through callbacks. Hosts forward those
//! callbacks as [`SynthesisEvent`]s to whichever component owns the request.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::voice::Voice;

static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies one synthesis submission.
///
/// Ids are unique within the process and strictly increasing, so a late
/// callback from a superseded request can always be told apart from the
/// current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(u64);

impl RequestId {
    /// Allocate a fresh id.
    pub fn fresh() -> Self {
        Self(NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One submission to the platform speech engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub request: RequestId,
    pub text: String,
    /// Language code the utterance is tagged with (e.g. `"en-US"`).
    pub language: String,
    pub voice: Voice,
    pub rate: f32,
    pub pitch: f32,
}

/// Asynchronous outcome of a submitted utterance, reported by the host.
#[derive(Debug, Clone, PartialEq)]
pub enum SynthesisEvent {
    /// The utterance finished speaking.
    Completed(RequestId),
    /// The platform reported a synthesis error.
    Failed { request: RequestId, reason: String },
    /// A chunk of rendered audio, for hosts that can capture output.
    Audio {
        request: RequestId,
        samples: Vec<f32>,
        sample_rate: u32,
    },
}

impl SynthesisEvent {
    /// The request this event belongs to.
    pub fn request(&self) -> RequestId {
        match self {
            Self::Completed(request) => *request,
            Self::Failed { request, .. } | Self::Audio { request, .. } => *request,
        }
    }
}

/// Synchronous rejection of a submission by the platform.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("speech platform rejected the utterance: {0}")]
pub struct PlatformError(pub String);

/// A platform speech engine.
///
/// Implementations must not block in any method. Cancelling a request that
/// already finished, or that the platform never saw, is a no-op.
pub trait SpeechPlatform {
    /// Voices currently installed. May be empty until the platform has
    /// finished loading its voice list.
    fn voices(&self) -> Vec<Voice>;

    /// Submit an utterance. Its outcome arrives later as a [`SynthesisEvent`].
    fn speak(&mut self, utterance: Utterance) -> Result<(), PlatformError>;

    /// Best-effort cancellation of one request. Audio may not stop at once.
    fn cancel(&mut self, request: RequestId);
}

/// Shares a single platform engine between several owners on one thread.
impl<P: SpeechPlatform> SpeechPlatform for Rc<RefCell<P>> {
    fn voices(&self) -> Vec<Voice> {
        self.borrow().voices()
    }

    fn speak(&mut self, utterance: Utterance) -> Result<(), PlatformError> {
        self.borrow_mut().speak(utterance)
    }

    fn cancel(&mut self, request: RequestId) {
        self.borrow_mut().cancel(request)
    }
}

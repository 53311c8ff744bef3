//! Seekable playback on top of a fire-and-forget speech platform.
//!
//! Platform speech engines cannot report their position, pause at a position
//! or resume from one. [`PlaybackEngine`] fakes continuous, seekable playback:
//!
//! - a simulated progress clock runs from the estimated duration of the text
//!   instead of from real synthesis progress;
//! - seeking cancels the live utterance and speaks only the tail of the text,
//!   starting at the character offset proportional to the seek target;
//! - every submission carries a fresh [`RequestId`], and callbacks from any
//!   request other than the live one are dropped.
//!
//! The proportional offset assumes a uniform speaking rate across the text,
//! so the audible position after a seek is approximate.
//!
//! The host drives the engine from a single UI thread: it forwards user
//! intents, calls [`PlaybackEngine::tick`] once per animation frame, and
//! passes platform callbacks to [`PlaybackEngine::handle_event`].

use serde::{Deserialize, Serialize};

use crate::catalog::Language;
use crate::clock::{Clock, SystemClock};
use crate::duration::{format_clock, DurationEstimator};
use crate::platform::{RequestId, SpeechPlatform, SynthesisEvent, Utterance};
use crate::voice::resolve_voice;
use crate::SpeechError;

pub const MIN_RATE: f32 = 0.5;
pub const MAX_RATE: f32 = 1.5;
pub const MIN_PITCH: f32 = 0.8;
pub const MAX_PITCH: f32 = 1.2;

/// Step used by the rewind and fast-forward buttons.
pub const SKIP_STEP_SECS: f64 = 10.0;

/// There is no paused state: pausing is stopping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackStatus {
    Idle,
    Playing,
}

/// Everything a presentation layer needs to render the transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackSnapshot {
    pub status: PlaybackStatus,
    /// Displayed position in seconds.
    pub elapsed: f64,
    pub estimated_duration: f64,
    pub rate: f32,
    pub pitch: f32,
    /// User-facing message of the last error, if any.
    pub last_error: Option<String>,
}

impl PlaybackSnapshot {
    /// Position as a percentage of the estimated duration.
    pub fn progress_percent(&self) -> f64 {
        if self.estimated_duration > 0.0 {
            (self.elapsed / self.estimated_duration * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        }
    }

    pub fn elapsed_label(&self) -> String {
        format_clock(self.elapsed)
    }

    pub fn duration_label(&self) -> String {
        format_clock(self.estimated_duration)
    }
}

/// The part of `text` to speak when playback resumes at `target` seconds.
///
/// Starts at character `floor(target / duration * len)`.
pub fn text_tail(text: &str, target: f64, duration: f64) -> &str {
    if target <= 0.0 || duration <= 0.0 {
        return text;
    }
    let len = text.chars().count();
    let offset = (target / duration * len as f64).floor() as usize;
    match text.char_indices().nth(offset) {
        Some((idx, _)) => &text[idx..],
        None => "",
    }
}

/// Play/stop/seek/skip state machine for one text.
pub struct PlaybackEngine<P: SpeechPlatform, C: Clock = SystemClock> {
    platform: P,
    clock: C,
    estimator: DurationEstimator,
    text: String,
    language: Language,
    rate: f32,
    pitch: f32,
    estimated_duration: f64,
    elapsed: f64,
    status: PlaybackStatus,
    /// The only request whose callbacks are honoured.
    active_request: Option<RequestId>,
    /// Clock reading (seconds) at which `elapsed` was zero.
    started_at: f64,
    last_error: Option<SpeechError>,
}

impl<P: SpeechPlatform> PlaybackEngine<P> {
    /// Create an engine driven by real time.
    pub fn new(platform: P, language: Language) -> Self {
        Self::with_clock(platform, SystemClock::new(), language)
    }
}

impl<P: SpeechPlatform, C: Clock> PlaybackEngine<P, C> {
    pub fn with_clock(platform: P, clock: C, language: Language) -> Self {
        let estimator = DurationEstimator::default();
        let estimated_duration = estimator.estimate("", &language.code);
        Self {
            platform,
            clock,
            estimator,
            text: String::new(),
            language,
            rate: 1.0,
            pitch: 1.0,
            estimated_duration,
            elapsed: 0.0,
            status: PlaybackStatus::Idle,
            active_request: None,
            started_at: 0.0,
            last_error: None,
        }
    }

    /// Replace the duration estimator.
    pub fn with_estimator(mut self, estimator: DurationEstimator) -> Self {
        self.estimator = estimator;
        self.estimated_duration = self.estimator.estimate(&self.text, &self.language.code);
        self
    }

    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    pub fn is_playing(&self) -> bool {
        self.status == PlaybackStatus::Playing
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn estimated_duration(&self) -> f64 {
        self.estimated_duration
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn language(&self) -> &Language {
        &self.language
    }

    pub fn last_error(&self) -> Option<&SpeechError> {
        self.last_error.as_ref()
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    /// The request currently owning playback, if any.
    pub fn active_request(&self) -> Option<RequestId> {
        self.active_request
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            status: self.status,
            elapsed: self.elapsed,
            estimated_duration: self.estimated_duration,
            rate: self.rate,
            pitch: self.pitch,
            last_error: self.last_error.as_ref().map(|e| e.to_string()),
        }
    }

    /// Toggle playback: start from the beginning when idle, stop when playing.
    pub fn play(&mut self) {
        if self.is_playing() {
            self.stop();
            return;
        }
        if self.text.trim().is_empty() {
            self.fail(SpeechError::EmptyInput);
            return;
        }

        self.last_error = None;
        self.start_request(0.0);
    }

    /// Stop playback and rewind to zero.
    pub fn stop(&mut self) {
        if self.is_playing() {
            log::debug!("Playback stopped at {:.2}s", self.elapsed);
        }
        self.reset_to_idle();
    }

    /// Jump to `target` seconds.
    ///
    /// Targets outside `0..=duration` are clamped. Seeking to the end behaves
    /// like a natural end of playback. While playing, the live utterance is
    /// replaced by one that speaks the rest of the text from the target.
    pub fn seek(&mut self, target: f64) {
        if !target.is_finite() {
            log::warn!("Ignoring seek to non-finite position {target}");
            return;
        }

        let target = target.clamp(0.0, self.estimated_duration);
        if target >= self.estimated_duration {
            log::debug!("Seek to end, stopping");
            self.reset_to_idle();
            return;
        }

        self.elapsed = target;
        if self.is_playing() {
            self.cancel_active();
            self.start_request(target);
        }
    }

    /// Move by `delta` seconds relative to the displayed position.
    pub fn skip(&mut self, delta: f64) {
        let target = (self.elapsed + delta).clamp(0.0, self.estimated_duration);
        self.seek(target);
    }

    pub fn skip_forward(&mut self) {
        self.skip(SKIP_STEP_SECS);
    }

    pub fn skip_backward(&mut self) {
        self.skip(-SKIP_STEP_SECS);
    }

    /// Set the speaking rate; takes effect on the next (re)start.
    pub fn set_rate(&mut self, rate: f32) {
        self.rate = clamp_param(rate, MIN_RATE, MAX_RATE, self.rate);
    }

    /// Set the pitch; takes effect on the next (re)start.
    pub fn set_pitch(&mut self, pitch: f32) {
        self.pitch = clamp_param(pitch, MIN_PITCH, MAX_PITCH, self.pitch);
    }

    /// Replace the text. Any playback is cancelled and the timeline reset.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.reset_to_idle();
        self.text = text.into();
        self.recompute_duration();
    }

    /// Switch language. Any playback is cancelled and the timeline reset.
    pub fn set_language(&mut self, language: Language) {
        self.reset_to_idle();
        self.language = language;
        self.recompute_duration();
    }

    /// Advance the progress clock. Call once per frame while playing.
    ///
    /// Reaching the estimated duration ends playback even if the platform
    /// never reports completion.
    pub fn tick(&mut self) -> PlaybackStatus {
        if !self.is_playing() {
            return self.status;
        }

        let elapsed = self.now_secs() - self.started_at;
        self.elapsed = elapsed.clamp(0.0, self.estimated_duration);
        if elapsed >= self.estimated_duration {
            log::debug!(
                "Progress clock reached {:.2}s, treating as end of speech",
                self.estimated_duration
            );
            self.reset_to_idle();
        }
        self.status
    }

    /// Apply a platform callback. Events for any request other than the
    /// live one are dropped.
    pub fn handle_event(&mut self, event: SynthesisEvent) {
        let request = event.request();
        if self.active_request != Some(request) {
            log::debug!("Discarding stale event for request {request}");
            return;
        }

        match event {
            SynthesisEvent::Completed(_) => {
                log::info!("Speech request {request} completed");
                self.active_request = None;
                self.reset_to_idle();
            }
            SynthesisEvent::Failed { reason, .. } => {
                self.active_request = None;
                self.fail(SpeechError::Synthesis {
                    language: self.language.name.clone(),
                    reason,
                });
            }
            SynthesisEvent::Audio { .. } => {}
        }
    }

    /// Cancel everything in flight. Called on drop.
    pub fn shutdown(&mut self) {
        self.reset_to_idle();
    }

    fn start_request(&mut self, target: f64) {
        let voices = self.platform.voices();
        let Some(voice) = resolve_voice(&voices, &self.language.code).cloned() else {
            self.fail(SpeechError::VoiceUnavailable {
                language: self.language.name.clone(),
            });
            return;
        };

        let request = RequestId::fresh();
        let utterance = Utterance {
            request,
            text: text_tail(&self.text, target, self.estimated_duration).to_string(),
            language: self.language.code.clone(),
            voice,
            rate: self.rate,
            pitch: self.pitch,
        };

        log::debug!(
            "Submitting request {request} at {target:.2}s with voice {:?}",
            utterance.voice.name
        );
        if let Err(e) = self.platform.speak(utterance) {
            self.fail(SpeechError::Synthesis {
                language: self.language.name.clone(),
                reason: e.to_string(),
            });
            return;
        }

        self.active_request = Some(request);
        self.started_at = self.now_secs() - target;
        self.elapsed = target;
        self.status = PlaybackStatus::Playing;
    }

    fn cancel_active(&mut self) {
        if let Some(request) = self.active_request.take() {
            self.platform.cancel(request);
        }
    }

    fn reset_to_idle(&mut self) {
        self.cancel_active();
        self.status = PlaybackStatus::Idle;
        self.elapsed = 0.0;
    }

    fn fail(&mut self, error: SpeechError) {
        log::warn!("Playback error: {error}");
        self.reset_to_idle();
        self.last_error = Some(error);
    }

    fn recompute_duration(&mut self) {
        self.estimated_duration = self.estimator.estimate(&self.text, &self.language.code);
    }

    fn now_secs(&self) -> f64 {
        self.clock.now().as_secs_f64()
    }
}

impl<P: SpeechPlatform, C: Clock> Drop for PlaybackEngine<P, C> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn clamp_param(value: f32, min: f32, max: f32, current: f32) -> f32 {
    if value.is_nan() {
        current
    } else {
        value.clamp(min, max)
    }
}

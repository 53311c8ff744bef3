//! # tts-transport
//!
//! Seekable playback transport and WAV export for fire-and-forget speech
//! synthesis engines such as the browser's `speechSynthesis`.
//!
//! ## Features
//!
//! - **Simulated timeline**: duration is estimated from the text, and a
//!   progress clock runs against it while speech plays
//! - **Seek and skip**: implemented by re-speaking the tail of the text from a
//!   proportional character offset
//! - **Race-free callbacks**: every submission carries a fresh request id, and
//!   callbacks from superseded requests are dropped
//! - **Voice catalog**: narrows the offered languages to those with installed voices
//! - **WAV export**: records captured platform audio into a downloadable file
//!
//! ## Quick Start
//!
//! ```ignore
//! use tts_transport::{Language, PlaybackEngine, SynthesisEvent};
//!
//! let mut engine = PlaybackEngine::new(platform, Language::new("en-US", "English (US)"));
//! engine.set_text("Hello, world!");
//! engine.play();
//!
//! // once per animation frame
//! engine.tick();
//!
//! // from the platform's completion callback
//! engine.handle_event(SynthesisEvent::Completed(request));
//! ```

pub mod catalog;
pub mod clock;
pub mod duration;
pub mod engine;
pub mod error;
pub mod export;
pub mod platform;
pub mod voice;

#[cfg(test)]
mod testing;

pub use catalog::{default_languages, Language, VoiceCatalog};
pub use clock::{Clock, ManualClock, SystemClock};
pub use duration::{estimate_duration, format_clock, DurationEstimator, SpeakingProfile};
pub use engine::{PlaybackEngine, PlaybackSnapshot, PlaybackStatus};
pub use error::SpeechError;
pub use export::{AudioExporter, ExportRequest, ExportRequestBuilder, ExportedAudio};
pub use platform::{PlatformError, RequestId, SpeechPlatform, SynthesisEvent, Utterance};
pub use voice::{resolve_voice, Voice};

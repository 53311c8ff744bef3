//! Capture synthesized speech into a WAV file.
//!
//! An export submits its own utterance to the platform and collects the
//! audio chunks the host captures from the platform's output. It never
//! touches the playback engine's request, so a user can export while
//! listening.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use derive_builder::Builder;

use crate::catalog::Language;
use crate::platform::{RequestId, SpeechPlatform, SynthesisEvent, Utterance};
use crate::voice::resolve_voice;
use crate::SpeechError;

/// What to export.
#[derive(Debug, Clone, PartialEq, Builder)]
#[builder(setter(into))]
pub struct ExportRequest {
    pub text: String,
    pub language: Language,
    #[builder(default = "1.0")]
    pub rate: f32,
    #[builder(default = "1.0")]
    pub pitch: f32,
}

impl ExportRequest {
    pub fn builder() -> ExportRequestBuilder {
        ExportRequestBuilder::default()
    }
}

/// A finished recording, ready to be offered as a download.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedAudio {
    /// Suggested file name, `speech_<language>.wav`.
    pub file_name: String,
    pub sample_rate: u32,
    /// Complete WAV file contents.
    pub bytes: Vec<u8>,
    sample_count: usize,
}

impl ExportedAudio {
    /// Duration of the audio in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.sample_count as f64 / self.sample_rate as f64
    }

    /// Write the file into `dir` under its suggested name.
    pub fn save(&self, dir: &Path) -> Result<PathBuf, SpeechError> {
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.bytes)?;
        log::info!("Saved {} ({} bytes)", path.display(), self.bytes.len());
        Ok(path)
    }
}

/// Download name for a language code.
pub fn export_file_name(language_code: &str) -> String {
    format!("speech_{language_code}.wav")
}

struct Recording {
    request: RequestId,
    language: Language,
    samples: Vec<f32>,
    sample_rate: Option<u32>,
}

/// Records one utterance at a time through a speech platform.
pub struct AudioExporter<P: SpeechPlatform> {
    platform: P,
    recording: Option<Recording>,
}

impl<P: SpeechPlatform> AudioExporter<P> {
    pub fn new(platform: P) -> Self {
        Self {
            platform,
            recording: None,
        }
    }

    /// Whether a recording is in progress.
    pub fn is_recording(&self) -> bool {
        self.recording.is_some()
    }

    /// Request id of the recording in progress.
    pub fn active_request(&self) -> Option<RequestId> {
        self.recording.as_ref().map(|r| r.request)
    }

    /// Start recording. A recording already in progress is abandoned.
    pub fn start(&mut self, request: ExportRequest) -> Result<RequestId, SpeechError> {
        if request.text.trim().is_empty() {
            return Err(SpeechError::EmptyInput);
        }

        let voices = self.platform.voices();
        let voice = resolve_voice(&voices, &request.language.code)
            .cloned()
            .ok_or_else(|| SpeechError::VoiceUnavailable {
                language: request.language.name.clone(),
            })?;

        self.abandon();

        let id = RequestId::fresh();
        self.platform
            .speak(Utterance {
                request: id,
                text: request.text,
                language: request.language.code.clone(),
                voice,
                rate: request.rate,
                pitch: request.pitch,
            })
            .map_err(|e| SpeechError::Export(e.to_string()))?;

        log::info!("Recording {} speech as request {id}", request.language.code);
        self.recording = Some(Recording {
            request: id,
            language: request.language,
            samples: Vec::new(),
            sample_rate: None,
        });
        Ok(id)
    }

    /// Cancel the recording in progress, if any.
    pub fn abandon(&mut self) {
        if let Some(recording) = self.recording.take() {
            log::debug!("Abandoning recording {}", recording.request);
            self.platform.cancel(recording.request);
        }
    }

    /// Feed a platform callback.
    ///
    /// Returns `Some` once the recording finishes, with the encoded file or
    /// the reason it failed. Events for other requests return `None`.
    pub fn handle_event(
        &mut self,
        event: SynthesisEvent,
    ) -> Option<Result<ExportedAudio, SpeechError>> {
        let recording = self.recording.as_mut()?;
        if recording.request != event.request() {
            return None;
        }

        match event {
            SynthesisEvent::Audio {
                samples,
                sample_rate,
                ..
            } => {
                let expected = *recording.sample_rate.get_or_insert(sample_rate);
                if expected == sample_rate {
                    recording.samples.extend_from_slice(&samples);
                    return None;
                }

                let request = recording.request;
                self.recording = None;
                self.platform.cancel(request);
                Some(Err(SpeechError::Export(format!(
                    "sample rate changed from {expected} Hz to {sample_rate} Hz"
                ))))
            }
            SynthesisEvent::Completed(_) => {
                let recording = self.recording.take()?;
                Some(encode(recording))
            }
            SynthesisEvent::Failed { reason, .. } => {
                self.recording = None;
                log::warn!("Export failed: {reason}");
                Some(Err(SpeechError::Export(reason)))
            }
        }
    }
}

impl<P: SpeechPlatform> Drop for AudioExporter<P> {
    fn drop(&mut self) {
        self.abandon();
    }
}

fn encode(recording: Recording) -> Result<ExportedAudio, SpeechError> {
    let sample_rate = match recording.sample_rate {
        Some(rate) if !recording.samples.is_empty() => rate,
        _ => return Err(SpeechError::Export("no audio was captured".to_string())),
    };

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut cursor = Cursor::new(Vec::new());
    let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
    for &sample in &recording.samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;

    let bytes = cursor.into_inner();
    log::info!(
        "Encoded {} samples at {sample_rate} Hz ({} bytes)",
        recording.samples.len(),
        bytes.len()
    );
    Ok(ExportedAudio {
        file_name: export_file_name(&recording.language.code),
        sample_rate,
        bytes,
        sample_count: recording.samples.len(),
    })
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::testing::{english_voices, FakePlatform};

    fn english() -> Language {
        Language::new("en-US", "English (US)")
    }

    fn request(text: &str) -> ExportRequest {
        ExportRequest::builder()
            .text(text)
            .language(english())
            .build()
            .unwrap()
    }

    fn exporter() -> (AudioExporter<Rc<RefCell<FakePlatform>>>, Rc<RefCell<FakePlatform>>) {
        let platform = FakePlatform::shared(english_voices());
        (AudioExporter::new(platform.clone()), platform)
    }

    fn audio(request: RequestId, samples: Vec<f32>, sample_rate: u32) -> SynthesisEvent {
        SynthesisEvent::Audio {
            request,
            samples,
            sample_rate,
        }
    }

    #[test]
    fn builder_defaults_rate_and_pitch() {
        let request = request("hi");
        assert_eq!(request.rate, 1.0);
        assert_eq!(request.pitch, 1.0);
    }

    #[test]
    fn builder_requires_text() {
        assert!(ExportRequest::builder().language(english()).build().is_err());
    }

    #[test]
    fn records_chunks_into_wav() {
        let (mut exporter, platform) = exporter();
        let id = exporter
            .start(
                ExportRequest::builder()
                    .text("Hello world")
                    .language(english())
                    .rate(1.3_f32)
                    .build()
                    .unwrap(),
            )
            .unwrap();
        assert_eq!(platform.borrow().last_spoken().unwrap().rate, 1.3);

        assert!(exporter.handle_event(audio(id, vec![0.0, 0.5], 16_000)).is_none());
        assert!(exporter.handle_event(audio(id, vec![-0.5, 0.25], 16_000)).is_none());
        let file = exporter
            .handle_event(SynthesisEvent::Completed(id))
            .unwrap()
            .unwrap();

        assert_eq!(file.file_name, "speech_en-US.wav");
        assert_eq!(file.sample_rate, 16_000);
        assert_eq!(file.duration_secs(), 4.0 / 16_000.0);
        assert!(!exporter.is_recording());

        let mut reader = hound::WavReader::new(Cursor::new(file.bytes)).unwrap();
        assert_eq!(reader.spec().channels, 1);
        let samples: Vec<f32> = reader.samples::<f32>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![0.0, 0.5, -0.5, 0.25]);
    }

    #[test]
    fn rejects_empty_text_and_missing_voice() {
        let (mut exporter, platform) = exporter();
        assert_eq!(exporter.start(request(" ")), Err(SpeechError::EmptyInput));

        let marathi = ExportRequest::builder()
            .text("नमस्कार")
            .language(Language::new("mr-IN", "मराठी (Marathi)"))
            .build()
            .unwrap();
        assert!(matches!(
            exporter.start(marathi),
            Err(SpeechError::VoiceUnavailable { .. })
        ));
        assert!(platform.borrow().spoken.is_empty());
    }

    #[test]
    fn platform_failure_is_export_error() {
        let (mut exporter, _) = exporter();
        let id = exporter.start(request("Hello")).unwrap();
        let result = exporter.handle_event(SynthesisEvent::Failed {
            request: id,
            reason: "synthesis-failed".into(),
        });
        assert_eq!(
            result,
            Some(Err(SpeechError::Export("synthesis-failed".into())))
        );
        assert!(!exporter.is_recording());
    }

    #[test]
    fn completion_without_audio_fails() {
        let (mut exporter, _) = exporter();
        let id = exporter.start(request("Hello")).unwrap();
        assert!(matches!(
            exporter.handle_event(SynthesisEvent::Completed(id)),
            Some(Err(SpeechError::Export(_)))
        ));
    }

    #[test]
    fn sample_rate_change_aborts() {
        let (mut exporter, platform) = exporter();
        let id = exporter.start(request("Hello")).unwrap();
        exporter.handle_event(audio(id, vec![0.1], 22_050));
        let result = exporter.handle_event(audio(id, vec![0.1], 44_100));
        assert!(matches!(result, Some(Err(SpeechError::Export(_)))));
        assert_eq!(platform.borrow().cancelled, vec![id]);
    }

    #[test]
    fn ignores_events_for_other_requests() {
        let (mut exporter, _) = exporter();
        let first = exporter.start(request("one")).unwrap();
        let second = exporter.start(request("two")).unwrap();

        assert!(exporter.handle_event(audio(first, vec![0.3], 8_000)).is_none());
        assert!(exporter.handle_event(SynthesisEvent::Completed(first)).is_none());
        assert_eq!(exporter.active_request(), Some(second));
    }

    #[test]
    fn new_export_cancels_only_its_own_request() {
        let (mut exporter, platform) = exporter();
        let first = exporter.start(request("one")).unwrap();
        exporter.start(request("two")).unwrap();
        assert_eq!(platform.borrow().cancelled, vec![first]);
    }

    #[test]
    fn saves_to_directory() {
        let (mut exporter, _) = exporter();
        let id = exporter.start(request("Hello")).unwrap();
        exporter.handle_event(audio(id, vec![0.0; 80], 8_000));
        let file = exporter
            .handle_event(SynthesisEvent::Completed(id))
            .unwrap()
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = file.save(dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), "speech_en-US.wav");
        assert_eq!(std::fs::read(path).unwrap(), file.bytes);
    }
}

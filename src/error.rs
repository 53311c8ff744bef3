/// Errors surfaced by playback and export.
///
/// The `Display` text of each variant is the message shown to the user.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SpeechError {
    #[error("Please enter some text")]
    EmptyInput,
    #[error("No voice available for {language}")]
    VoiceUnavailable { language: String },
    #[error("Error playing {language} speech. Please try again.")]
    Synthesis { language: String, reason: String },
    #[error("Error generating audio file: {0}")]
    Export(String),
    #[error("I/O error: {0}")]
    Io(String),
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<std::io::Error> for SpeechError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<hound::Error> for SpeechError {
    fn from(err: hound::Error) -> Self {
        Self::Export(err.to_string())
    }
}

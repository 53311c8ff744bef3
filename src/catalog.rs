use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::platform::SpeechPlatform;
use crate::voice::{resolve_voice, supports_language, Voice};
use crate::SpeechError;

/// A language the user can pick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    pub code: String,
    pub name: String,
    /// Name of the voice that will speak this language, once resolved.
    #[serde(default)]
    pub voice: Option<String>,
}

impl Language {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            voice: None,
        }
    }
}

/// Languages offered when no config is given.
pub fn default_languages() -> Vec<Language> {
    vec![
        Language::new("en-US", "English (US)"),
        Language::new("hi-IN", "हिंदी (Hindi)"),
        Language::new("mr-IN", "मराठी (Marathi)"),
    ]
}

/// Tracks the platform's voices and the languages they can speak.
///
/// Platforms often report an empty voice list at startup and announce the
/// real list later, possibly several times. Call [`VoiceCatalog::refresh`]
/// on every such notification.
#[derive(Debug, Clone)]
pub struct VoiceCatalog {
    candidates: Vec<Language>,
    voices: Vec<Voice>,
    available: Vec<Language>,
}

impl Default for VoiceCatalog {
    fn default() -> Self {
        Self::with_languages(default_languages())
    }
}

impl VoiceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog over a custom candidate list.
    pub fn with_languages(candidates: Vec<Language>) -> Self {
        Self {
            available: candidates.clone(),
            candidates,
            voices: Vec::new(),
        }
    }

    /// Load the candidate list from a JSON array of languages.
    ///
    /// Falls back to [`default_languages`] when the file does not exist.
    pub fn from_config(path: &Path) -> Result<Self, SpeechError> {
        if !path.exists() {
            log::warn!(
                "Language config {} not found, using default languages",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let candidates: Vec<Language> = serde_json::from_str(&content)
            .map_err(|e| SpeechError::Config(format!("Failed to parse languages: {e}")))?;
        if candidates.is_empty() {
            return Err(SpeechError::Config("Language list is empty".to_string()));
        }

        log::info!("Loaded {} candidate languages", candidates.len());
        Ok(Self::with_languages(candidates))
    }

    /// Replace the voice list and re-filter the languages.
    ///
    /// Only languages with at least one voice are kept. If none qualify, the
    /// full candidate list is exposed instead. Returns whether the exposed
    /// language list changed.
    pub fn refresh(&mut self, voices: Vec<Voice>) -> bool {
        let supported: Vec<Language> = self
            .candidates
            .iter()
            .filter(|lang| supports_language(&voices, &lang.code))
            .cloned()
            .collect();

        let available = if supported.is_empty() {
            if !voices.is_empty() {
                log::warn!(
                    "None of {} voices match a candidate language, offering all",
                    voices.len()
                );
            }
            self.candidates.clone()
        } else {
            supported
        };

        log::debug!(
            "Voice list refreshed: {} voices, {} languages",
            voices.len(),
            available.len()
        );
        self.voices = voices;
        let changed = available != self.available;
        self.available = available;
        changed
    }

    /// Pull the current voice list from a platform.
    pub fn refresh_from<P: SpeechPlatform + ?Sized>(&mut self, platform: &P) -> bool {
        self.refresh(platform.voices())
    }

    /// Languages to offer, in candidate order.
    pub fn languages(&self) -> &[Language] {
        &self.available
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    pub fn find(&self, code: &str) -> Option<&Language> {
        self.available.iter().find(|lang| lang.code == code)
    }

    /// Best voice for `code` among the known voices.
    pub fn resolve(&self, code: &str) -> Option<&Voice> {
        resolve_voice(&self.voices, code)
    }

    /// The language to use for `code`, with its voice name filled in.
    ///
    /// Unknown codes select the first offered language.
    pub fn select(&self, code: &str) -> Option<Language> {
        let mut language = self
            .find(code)
            .or_else(|| self.available.first())
            .cloned()?;
        language.voice = self.resolve(&language.code).map(|v| v.name.clone());
        Some(language)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(catalog: &VoiceCatalog) -> Vec<&str> {
        catalog.languages().iter().map(|l| l.code.as_str()).collect()
    }

    #[test]
    fn offers_all_languages_before_voices_load() {
        let catalog = VoiceCatalog::new();
        assert_eq!(codes(&catalog), ["en-US", "hi-IN", "mr-IN"]);
        assert!(catalog.voices().is_empty());
    }

    #[test]
    fn filters_to_languages_with_voices() {
        let mut catalog = VoiceCatalog::new();
        let changed = catalog.refresh(vec![
            Voice::new("Samantha", "en-US", true),
            Voice::new("Lekha", "hi-IN", false),
        ]);
        assert!(changed);
        assert_eq!(codes(&catalog), ["en-US", "hi-IN"]);
    }

    #[test]
    fn falls_back_to_all_when_nothing_matches() {
        let mut catalog = VoiceCatalog::new();
        catalog.refresh(vec![Voice::new("Thomas", "fr-FR", true)]);
        assert_eq!(codes(&catalog), ["en-US", "hi-IN", "mr-IN"]);
        assert_eq!(catalog.voices().len(), 1);
    }

    #[test]
    fn repeated_refresh_reports_no_change() {
        let mut catalog = VoiceCatalog::new();
        let voices = vec![Voice::new("Samantha", "en-US", true)];
        assert!(catalog.refresh(voices.clone()));
        assert!(!catalog.refresh(voices));
    }

    #[test]
    fn select_fills_in_voice_name() {
        let mut catalog = VoiceCatalog::new();
        catalog.refresh(vec![
            Voice::new("Remote", "hi-IN", false),
            Voice::new("Local", "hi-IN", true),
        ]);
        let hindi = catalog.select("hi-IN").unwrap();
        assert_eq!(hindi.voice.as_deref(), Some("Local"));

        // en-US is filtered out, so the first offered language wins
        let fallback = catalog.select("en-US").unwrap();
        assert_eq!(fallback.code, "hi-IN");
    }

    #[test]
    fn loads_languages_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("languages.json");
        std::fs::write(
            &path,
            r#"[{"code": "ta-IN", "name": "தமிழ் (Tamil)"}, {"code": "en-GB", "name": "English (UK)"}]"#,
        )
        .unwrap();

        let catalog = VoiceCatalog::from_config(&path).unwrap();
        assert_eq!(codes(&catalog), ["ta-IN", "en-GB"]);
    }

    #[test]
    fn rejects_empty_language_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("languages.json");
        std::fs::write(&path, "[]").unwrap();
        assert!(matches!(
            VoiceCatalog::from_config(&path),
            Err(SpeechError::Config(_))
        ));
    }
}

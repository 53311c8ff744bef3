use serde::{Deserialize, Serialize};

/// A synthesis voice exposed by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    /// Display name (e.g. `"Google हिन्दी"`).
    pub name: String,
    /// BCP 47 locale tag (e.g. `"hi-IN"`).
    pub locale: String,
    /// True for voices rendered on the device rather than by a remote service.
    pub is_local: bool,
}

impl Voice {
    pub fn new(name: impl Into<String>, locale: impl Into<String>, is_local: bool) -> Self {
        Self {
            name: name.into(),
            locale: locale.into(),
            is_local,
        }
    }

    /// Whether this voice speaks `language_code` (locale prefix match).
    pub fn speaks(&self, language_code: &str) -> bool {
        self.locale.starts_with(language_code)
    }
}

/// Pick the best voice for a language.
///
/// Prefers the first local voice whose locale starts with `language_code`,
/// then the first voice with a matching locale. `None` means no voice is
/// installed for the language.
pub fn resolve_voice<'a>(voices: &'a [Voice], language_code: &str) -> Option<&'a Voice> {
    voices
        .iter()
        .find(|v| v.speaks(language_code) && v.is_local)
        .or_else(|| voices.iter().find(|v| v.speaks(language_code)))
}

/// Whether any voice speaks `language_code`.
pub fn supports_language(voices: &[Voice], language_code: &str) -> bool {
    voices.iter().any(|v| v.speaks(language_code))
}

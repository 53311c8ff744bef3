use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::SpeechError;

/// Shortest duration ever reported, so a timeline never divides by zero.
pub const MIN_DURATION_SECS: f64 = 1.0;

/// Language whose profile is used when a code has no profile of its own.
pub const DEFAULT_PROFILE_LANGUAGE: &str = "en-US";

/// Average speaking pace for one language.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeakingProfile {
    pub words_per_minute: f64,
    pub avg_chars_per_word: f64,
}

impl SpeakingProfile {
    pub const fn new(words_per_minute: f64, avg_chars_per_word: f64) -> Self {
        Self {
            words_per_minute,
            avg_chars_per_word,
        }
    }

    fn is_valid(&self) -> bool {
        self.words_per_minute > 0.0 && self.avg_chars_per_word > 0.0
    }
}

#[derive(Debug, Deserialize)]
struct EstimatorConfig {
    #[serde(default = "default_language")]
    default: String,
    profiles: HashMap<String, SpeakingProfile>,
}

fn default_language() -> String {
    DEFAULT_PROFILE_LANGUAGE.to_string()
}

/// Estimates how long a text takes to speak before any audio exists.
///
/// The estimate is the upper bound of the simulated progress clock, so it is
/// recomputed on every text or language change and never cached.
#[derive(Debug, Clone)]
pub struct DurationEstimator {
    profiles: HashMap<String, SpeakingProfile>,
    default_language: String,
}

impl Default for DurationEstimator {
    fn default() -> Self {
        Self {
            profiles: builtin_profiles(),
            default_language: DEFAULT_PROFILE_LANGUAGE.to_string(),
        }
    }
}

impl DurationEstimator {
    /// Load profiles from a JSON config file.
    ///
    /// Falls back to the built-in profiles when the file does not exist.
    pub fn from_config(path: &Path) -> Result<Self, SpeechError> {
        if !path.exists() {
            log::warn!(
                "Profile config {} not found, using built-in speaking profiles",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse profiles from a JSON document of the form
    /// `{"default": "en-US", "profiles": {"en-US": {...}}}`.
    pub fn from_json(json: &str) -> Result<Self, SpeechError> {
        let config: EstimatorConfig = serde_json::from_str(json)
            .map_err(|e| SpeechError::Config(format!("Failed to parse profiles: {e}")))?;

        if let Some((code, _)) = config.profiles.iter().find(|(_, p)| !p.is_valid()) {
            return Err(SpeechError::Config(format!(
                "Profile for {code:?} must have positive rates"
            )));
        }
        if !config.profiles.contains_key(&config.default) {
            return Err(SpeechError::Config(format!(
                "Default language {:?} has no profile",
                config.default
            )));
        }

        log::info!("Loaded {} speaking profiles", config.profiles.len());
        Ok(Self {
            profiles: config.profiles,
            default_language: config.default,
        })
    }

    /// Profile for `language_code`, or the default profile.
    pub fn profile(&self, language_code: &str) -> SpeakingProfile {
        self.profiles
            .get(language_code)
            .or_else(|| self.profiles.get(&self.default_language))
            .copied()
            .unwrap_or(FALLBACK_PROFILE)
    }

    /// Estimated spoken duration of `text` in seconds, never below one second.
    pub fn estimate(&self, text: &str, language_code: &str) -> f64 {
        let profile = self.profile(language_code);
        let words = text.chars().count() as f64 / profile.avg_chars_per_word;
        let seconds = words * 60.0 / profile.words_per_minute;
        seconds.max(MIN_DURATION_SECS)
    }
}

const FALLBACK_PROFILE: SpeakingProfile = SpeakingProfile::new(150.0, 5.0);

fn builtin_profiles() -> HashMap<String, SpeakingProfile> {
    [
        ("en-US", FALLBACK_PROFILE),
        ("hi-IN", SpeakingProfile::new(125.0, 4.0)),
        ("mr-IN", SpeakingProfile::new(130.0, 4.5)),
    ]
    .into_iter()
    .map(|(code, profile)| (code.to_string(), profile))
    .collect()
}

/// Estimate with the built-in profiles.
pub fn estimate_duration(text: &str, language_code: &str) -> f64 {
    DurationEstimator::default().estimate(text, language_code)
}

/// Format seconds as `m:ss` for timeline labels.
pub fn format_clock(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}

//! Voices offered for speech output

use serde::{Deserialize, Serialize};

/// Voice selected when nothing else is configured
pub const DEFAULT_VOICE: &str = "en-US-AriaNeural";

/// A selectable voice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    /// Backend voice identifier
    pub id: String,
    /// Display name
    pub name: String,
}

impl Voice {
    /// Create a voice entry
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Language tag encoded in the identifier (`en-US-AriaNeural` → `en-US`)
    #[must_use]
    pub fn language(&self) -> Option<&str> {
        voice_language(&self.id)
    }
}

/// Language tag prefix of a neural voice identifier
#[must_use]
pub fn voice_language(voice_id: &str) -> Option<&str> {
    let mut dashes = voice_id.match_indices('-').map(|(i, _)| i);
    let _ = dashes.next()?;
    let end = dashes.next()?;
    Some(&voice_id[..end])
}

/// Read-only mapping from voice identifier to display name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceCatalog {
    voices: Vec<Voice>,
}

impl VoiceCatalog {
    /// Build a catalog from an ordered list of voices
    #[must_use]
    pub const fn new(voices: Vec<Voice>) -> Self {
        Self { voices }
    }

    /// All voices in display order
    #[must_use]
    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    /// Look up a voice by identifier
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Voice> {
        self.voices.iter().find(|v| v.id == id)
    }

    /// Whether the catalog offers `id`
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }
}

impl Default for VoiceCatalog {
    fn default() -> Self {
        Self::new(vec![
            Voice::new("en-US-AriaNeural", "Aria (Female)"),
            Voice::new("en-US-GuyNeural", "Guy (Male)"),
            Voice::new("en-US-JennyNeural", "Jenny (Female)"),
            Voice::new("en-US-DavisNeural", "Davis (Male)"),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_lists_four_voices() {
        let catalog = VoiceCatalog::default();
        assert_eq!(catalog.voices().len(), 4);
        assert!(catalog.contains(DEFAULT_VOICE));
        assert_eq!(catalog.get("en-US-GuyNeural").unwrap().name, "Guy (Male)");
        assert!(!catalog.contains("alloy"));
    }

    #[test]
    fn language_prefix() {
        assert_eq!(voice_language("en-US-AriaNeural"), Some("en-US"));
        assert_eq!(voice_language("alloy"), None);
        assert_eq!(voice_language("en-GB"), None);
    }
}

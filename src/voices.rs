//! Default synthesis voices per language.
//!
//! When a client omits `voiceName`, the voice is picked from this table by
//! `languageCode`. Codes outside the table get the en-US voice. The lookup is
//! pure; extend it by adding rows.

const DEFAULT_VOICES: [(&str, &str); 7] = [
    ("tr-TR", "tr-TR-Wavenet-E"),
    ("en-US", "en-US-Chirp-HD-F"),
    ("nb-NO", "nb-NO-Wavenet-E"),
    ("pl-PL", "pl-PL-Wavenet-E"),
    ("es-ES", "es-ES-Wavenet-D"),
    ("fr-FR", "fr-FR-Wavenet-E"),
    ("de-DE", "de-DE-Wavenet-F"),
];

/// Voice used for language codes not present in the table.
pub const FALLBACK_VOICE: &str = "en-US-Chirp-HD-F";

/// Look up the default voice for a language code.
pub fn default_voice(language_code: &str) -> &'static str {
    DEFAULT_VOICES
        .iter()
        .find(|(code, _)| *code == language_code)
        .map(|(_, voice)| *voice)
        .unwrap_or(FALLBACK_VOICE)
}

//! Resolving label and message keys to display strings.
//!
//! The pipeline only knows keys: channel letters (`"R"`, `"H"`, `"K"`, ...),
//! [`SUM_KEY`] for the aggregate, and the error keys from
//! [`EdgeError::message_key`](crate::types::EdgeError::message_key). The
//! caller passes a [`LabelLookup`] to turn them into text, so the core holds
//! no language state.

use serde::{Deserialize, Serialize};

/// Key of the aggregate plane label.
pub const SUM_KEY: &str = "sum";

/// Key of the per-channel edge plane caption prefix.
pub const EDGE_KEY: &str = "edge";

/// Key of the input preview caption.
pub const ORIGINAL_KEY: &str = "original";

/// Resolves a key to a display string.
pub trait LabelLookup {
    /// The display string for `key`. Unknown keys should come back
    /// unchanged.
    fn label(&self, key: &str) -> String;
}

/// Returns every key unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdentityLookup;

impl LabelLookup for IdentityLookup {
    fn label(&self, key: &str) -> String {
        key.to_owned()
    }
}

impl<F> LabelLookup for F
where
    F: Fn(&str) -> String,
{
    fn label(&self, key: &str) -> String {
        self(key)
    }
}

/// Languages with a built-in table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    Polish,
}

/// Built-in label tables. Keys missing from the table resolve to
/// themselves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Translations {
    language: Language,
}

impl Translations {
    #[must_use]
    pub const fn new(language: Language) -> Self {
        Self { language }
    }

    #[must_use]
    pub const fn language(self) -> Language {
        self.language
    }

    /// The table entry for `key`, if there is one.
    #[must_use]
    pub fn get(self, key: &str) -> Option<&'static str> {
        let text = match (self.language, key) {
            (_, "R") => "R",
            (_, "G") => "G",
            (_, "B") => "B",
            (_, "H") => "H",
            (_, "S") => "S",
            (_, "V") => "V",
            (_, "L") => "L",
            (_, "A") => "A",
            (_, "C") => "C",
            (_, "M") => "M",
            (_, "Y") => "Y",
            (_, "K") => "K",
            (Language::English, SUM_KEY) => "Edge Sum",
            (Language::Polish, SUM_KEY) => "Suma krawędzi",
            (Language::English, EDGE_KEY) => "Edge",
            (Language::Polish, EDGE_KEY) => "Krawędź",
            (Language::English, ORIGINAL_KEY) => "Original",
            (Language::Polish, ORIGINAL_KEY) => "Oryginał",
            (Language::English, "invalid_image") => "Invalid image.",
            (Language::Polish, "invalid_image") => "Nieprawidłowy obraz.",
            (Language::English, "unsupported_method") => "Unknown edge detection method.",
            (Language::Polish, "unsupported_method") => "Nieznana metoda wykrywania krawędzi.",
            (Language::English, "unsupported_color_space") => "Unknown color space.",
            (Language::Polish, "unsupported_color_space") => "Nieznany system kolorów.",
            _ => return None,
        };
        Some(text)
    }
}

impl LabelLookup for Translations {
    fn label(&self, key: &str) -> String {
        self.get(key).map_or_else(|| key.to_owned(), str::to_owned)
    }
}

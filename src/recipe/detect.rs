//! Caption language detection.
//! Hashtags, mentions and URLs are stripped first so they do not skew the
//! trigram statistics. A supported top guess is taken at any confidence.
//! Another language is rejected only when whatlang is sure of it; otherwise
//! the caption's script decides, since each supported locale owns one script.

use regex::Regex;
use whatlang::Script;

use super::Locale;

/// Outcome of classifying a caption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection {
    Supported(Locale),
    /// Detected language outside the supported set, or nothing usable.
    Unsupported { detected: Option<String> },
}

pub trait LanguageDetector: Send + Sync {
    fn detect(&self, text: &str) -> Detection;
}

/// Classifies already-cleaned caption text.
pub fn classify(text: &str) -> Detection {
    let Some(info) = whatlang::detect(text) else {
        return Detection::Unsupported { detected: None };
    };
    let code = lang_to_code(info.lang());
    if let Some(locale) = Locale::from_code(&code) {
        return Detection::Supported(locale);
    }
    if info.is_reliable() {
        return Detection::Unsupported {
            detected: Some(code),
        };
    }
    match locale_for_script(info.script()) {
        Some(locale) => Detection::Supported(locale),
        None => Detection::Unsupported {
            detected: Some(code),
        },
    }
}

fn locale_for_script(script: Script) -> Option<Locale> {
    match script {
        Script::Latin => Some(Locale::En),
        Script::Cyrillic => Some(Locale::Ru),
        _ => None,
    }
}

fn lang_to_code(lang: whatlang::Lang) -> String {
    use whatlang::Lang::*;
    match lang {
        Eng => "en",
        Rus => "ru",
        Ukr => "uk",
        Bel => "be",
        Bul => "bg",
        Fra => "fr",
        Deu => "de",
        Spa => "es",
        Por => "pt",
        Ita => "it",
        Tur => "tr",
        Pol => "pl",
        Nld => "nl",
        other => other.code(),
    }
    .to_string()
}

pub struct WhatlangDetector {
    noise: Vec<Regex>,
    whitespace: Regex,
}

impl WhatlangDetector {
    pub fn new() -> Self {
        Self {
            noise: vec![
                // URLs
                Regex::new(r"https?://\S+").unwrap(),
                // Hashtags and mentions
                Regex::new(r"[#@][\p{L}\p{N}_.]+").unwrap(),
            ],
            whitespace: Regex::new(r"\s+").unwrap(),
        }
    }

    /// Caption text with social-media noise removed.
    pub fn clean_caption(&self, text: &str) -> String {
        let mut cleaned = text.to_string();
        for pat in &self.noise {
            cleaned = pat.replace_all(&cleaned, " ").into_owned();
        }
        self.whitespace.replace_all(cleaned.trim(), " ").into_owned()
    }
}

impl Default for WhatlangDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageDetector for WhatlangDetector {
    fn detect(&self, text: &str) -> Detection {
        classify(&self.clean_caption(text))
    }
}

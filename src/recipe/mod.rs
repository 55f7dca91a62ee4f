//! Recipe domain: locales, reel links, sanitized recipe text, and the
//! service traits the orchestrator drives (metadata, transcription,
//! assembly, translation).

pub mod cache;
pub mod detect;
pub mod gate;
pub mod markup;

use std::borrow::Borrow;
use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

/// Substring that marks a chat message as a reel link.
const REEL_MARKER: &str = "instagram.com/reel/";

/// Supported recipe languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Locale {
    En,
    Ru,
}

impl Locale {
    pub const ALL: [Locale; 2] = [Locale::En, Locale::Ru];

    /// ISO 639-1 code.
    pub fn code(self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Ru => "ru",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "en" => Some(Locale::En),
            "ru" => Some(Locale::Ru),
            _ => None,
        }
    }

    /// The locale offered by the toggle button.
    pub fn other(self) -> Self {
        match self {
            Locale::En => Locale::Ru,
            Locale::Ru => Locale::En,
        }
    }

    pub fn english_name(self) -> &'static str {
        match self {
            Locale::En => "English",
            Locale::Ru => "Russian",
        }
    }

    pub fn flag(self) -> &'static str {
        match self {
            Locale::En => "\u{1F1FA}\u{1F1F8}",
            Locale::Ru => "\u{1F1F7}\u{1F1FA}",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Raw reel link exactly as received from the chat. Two links are the same
/// reel only if the strings match byte for byte.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReelLink(String);

impl ReelLink {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the message text as a link if it looks like a reel.
    pub fn recognize(text: &str) -> Option<Self> {
        text.contains(REEL_MARKER).then(|| Self::new(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ReelLink {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReelLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Recipe body in Telegram HTML, restricted to `<b> <i> <u> <s>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeText(String);

impl RecipeText {
    /// Sanitizes model output into the restricted markup.
    pub fn from_model_output(raw: &str) -> Self {
        Self(markup::sanitize(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Short content fingerprint for logs.
    pub fn digest(&self) -> String {
        let hash = blake3::hash(self.0.as_bytes());
        hash.to_hex()[..12].to_string()
    }
}

impl fmt::Display for RecipeText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What the metadata fetch yields for one reel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReelMetadata {
    pub description: String,
    pub video_url: String,
}

/// Failure talking to an external service.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("request timed out")]
    Timeout,

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to parse response: {0}")]
    Parse(String),

    #[error("service returned an empty response")]
    EmptyResponse,

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl From<reqwest::Error> for ServiceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ServiceError::Timeout
        } else {
            ServiceError::Request(e.to_string())
        }
    }
}

/// Looks up caption and video URL for a reel. `Ok(None)` means the reel
/// does not exist or is not a video.
#[async_trait]
pub trait MetadataFetcher: Send + Sync {
    async fn fetch_reel(&self, link: &ReelLink) -> Result<Option<ReelMetadata>, ServiceError>;
}

/// Speech-to-text over the reel's video.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(
        &self,
        video_url: &str,
        locale: Locale,
    ) -> Result<Option<String>, ServiceError>;
}

/// Builds a recipe in `locale` from caption and transcript.
#[async_trait]
pub trait RecipeAssembler: Send + Sync {
    async fn assemble(
        &self,
        description: &str,
        transcript: &str,
        locale: Locale,
    ) -> Result<Option<RecipeText>, ServiceError>;
}

#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(
        &self,
        recipe: &RecipeText,
        from: Locale,
        to: Locale,
    ) -> Result<RecipeText, ServiceError>;
}

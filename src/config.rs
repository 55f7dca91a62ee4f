//! Environment-driven settings.
//!
//! Required: `REELCIPE_TELEGRAM_TOKEN`, `OPENAI_API_KEY`, `INSTAGRAM_SESSION_ID`.
//! Everything else has a default. Parsing goes through a lookup function so
//! tests never touch the process environment.

use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4-1106-preview";
pub const DEFAULT_TRANSCRIBE_MODEL: &str = "whisper-1";
pub const DEFAULT_INSTAGRAM_API_URL: &str = "https://i.instagram.com/api/v1";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} not found in environment variables")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct OpenAiSettings {
    pub api_key: String,
    /// Base URL including the version segment, e.g. `https://api.openai.com/v1`.
    pub base_url: String,
    pub chat_model: String,
    pub transcribe_model: String,
    /// Minimum spacing between chat-completion requests.
    pub min_interval: Duration,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct InstagramSettings {
    pub session_id: String,
    pub api_url: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub telegram_token: String,
    pub openai: OpenAiSettings,
    pub instagram: InstagramSettings,
    /// Per-locale recipe cache bound; `None` keeps every recipe.
    pub cache_capacity: Option<usize>,
    /// Emit JSON log lines instead of the human-readable format.
    pub log_json: bool,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(lookup);
        let timeout = Duration::from_secs(vars.parsed("REELCIPE_HTTP_TIMEOUT_SECS", 120)?);

        Ok(Self {
            telegram_token: vars.required("REELCIPE_TELEGRAM_TOKEN")?,
            openai: OpenAiSettings {
                api_key: vars.required("OPENAI_API_KEY")?,
                base_url: vars
                    .optional("OPENAI_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string())
                    .trim_end_matches('/')
                    .to_string(),
                chat_model: vars
                    .optional("OPENAI_CHAT_MODEL")
                    .unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
                transcribe_model: vars
                    .optional("OPENAI_TRANSCRIBE_MODEL")
                    .unwrap_or_else(|| DEFAULT_TRANSCRIBE_MODEL.to_string()),
                min_interval: Duration::from_millis(
                    vars.parsed("REELCIPE_LLM_MIN_INTERVAL_MS", 200)?,
                ),
                timeout,
            },
            instagram: InstagramSettings {
                session_id: vars.required("INSTAGRAM_SESSION_ID")?,
                api_url: vars
                    .optional("INSTAGRAM_API_URL")
                    .unwrap_or_else(|| DEFAULT_INSTAGRAM_API_URL.to_string())
                    .trim_end_matches('/')
                    .to_string(),
                timeout,
            },
            cache_capacity: vars
                .optional("REELCIPE_CACHE_CAPACITY")
                .map(|raw| parse_value("REELCIPE_CACHE_CAPACITY", &raw))
                .transpose()?,
            log_json: vars
                .optional("REELCIPE_LOG_FORMAT")
                .is_some_and(|format| format.eq_ignore_ascii_case("json")),
        })
    }
}

struct Vars<F>(F);

impl<F: Fn(&str) -> Option<String>> Vars<F> {
    /// Set and non-blank.
    fn optional(&self, name: &str) -> Option<String> {
        (self.0)(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(&self, name: &'static str) -> Result<String, ConfigError> {
        self.optional(name).ok_or(ConfigError::Missing(name))
    }

    fn parsed<T: std::str::FromStr>(&self, name: &'static str, default: T) -> Result<T, ConfigError> {
        match self.optional(name) {
            Some(raw) => parse_value(name, &raw),
            None => Ok(default),
        }
    }
}

fn parse_value<T: std::str::FromStr>(name: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.parse().map_err(|_| ConfigError::Invalid {
        name,
        value: raw.to_string(),
    })
}

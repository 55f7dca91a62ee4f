//! OpenAI-compatible chat-completions client.
//! Assembles recipes and translates them. Requests are spaced by a simple
//! min-interval limiter shared across both uses.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::prompt::{self, SYSTEM_PROMPT};
use super::{check_status, http_client};
use crate::config::OpenAiSettings;
use crate::recipe::{Locale, RecipeAssembler, RecipeText, ServiceError, Translator};

pub struct OpenAiChatClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    /// Tracks the next allowed request time.
    next_allowed: Arc<tokio::sync::Mutex<Instant>>,
    min_interval: Duration,
}

impl OpenAiChatClient {
    pub fn new(settings: &OpenAiSettings) -> Result<Self, ServiceError> {
        Ok(Self {
            http: http_client(settings.timeout)?,
            api_key: settings.api_key.clone(),
            base_url: settings.base_url.clone(),
            model: settings.chat_model.clone(),
            next_allowed: Arc::new(tokio::sync::Mutex::new(Instant::now())),
            min_interval: settings.min_interval,
        })
    }

    async fn rate_limit_wait(&self) {
        let mut next = self.next_allowed.lock().await;
        let now = Instant::now();
        if *next > now {
            tokio::time::sleep(*next - now).await;
        }
        *next = Instant::now() + self.min_interval;
    }

    /// One non-streaming completion. Returns the trimmed message content.
    async fn complete(&self, user_prompt: String) -> Result<String, ServiceError> {
        self.rate_limit_wait().await;

        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": user_prompt}
            ],
            "temperature": 0.2
        });

        let start = Instant::now();
        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        let raw = check_status(response).await?.text().await?;
        let content = completion_content(&raw)?;

        debug!(
            model = %self.model,
            chars = content.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "chat completion received"
        );
        Ok(content)
    }
}

#[async_trait]
impl RecipeAssembler for OpenAiChatClient {
    async fn assemble(
        &self,
        description: &str,
        transcript: &str,
        locale: Locale,
    ) -> Result<Option<RecipeText>, ServiceError> {
        let content = self
            .complete(prompt::build_assembly_prompt(description, transcript, locale))
            .await?;
        let recipe = RecipeText::from_model_output(&content);
        Ok((!recipe.is_blank()).then_some(recipe))
    }
}

#[async_trait]
impl Translator for OpenAiChatClient {
    async fn translate(
        &self,
        recipe: &RecipeText,
        from: Locale,
        to: Locale,
    ) -> Result<RecipeText, ServiceError> {
        let content = self
            .complete(prompt::build_translation_prompt(recipe.as_str(), from, to))
            .await?;
        let translated = RecipeText::from_model_output(&content);
        if translated.is_blank() {
            return Err(ServiceError::EmptyResponse);
        }
        Ok(translated)
    }
}

/// Pulls the first choice's content out of a completion body. A missing or
/// blank content comes back as an empty string.
fn completion_content(raw: &str) -> Result<String, ServiceError> {
    let parsed: ChatCompletion =
        serde_json::from_str(raw).map_err(|e| ServiceError::Parse(e.to_string()))?;
    let content = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .unwrap_or_default();
    Ok(prompt::strip_code_fence(&content).to_string())
}

// --- Response types ---

#[derive(Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

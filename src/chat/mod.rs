//! Chat-facing side of the bot: identifiers, the translation toggle button
//! and its callback payloads, user-visible texts, and the [`ChatTransport`]
//! trait the orchestrator sends through.

pub mod session;
pub mod telegram;

use async_trait::async_trait;
use thiserror::Error;

use crate::recipe::{Locale, RecipeText};

/// Chat id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// Message id within a chat (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub i32);

/// A stable reference to a sent message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatKind {
    Private,
    Group,
}

/// User-visible texts.
pub mod texts {
    pub const START_MESSAGE: &str = "Welcome to Reelcipe! Send me a link to an Instagram reel \
        and I will transcribe it into a step-by-step recipe.";
    pub const INVALID_MESSAGE: &str = "Hmm... Does not look like an Instagram Reel link to me! \
        Please send me a link to an Instagram Reel and I will convert it to a recipe.";
    pub const ERROR_MESSAGE: &str =
        "Error processing the reel. Please try again with a different link.";
    pub const PROCESSING: &str = "Processing...";
    pub const LOADING: &str = "Loading...";
}

const TRANSLATE_TO_PREFIX: &str = "translate_to_";
const GHOST_PAYLOAD: &str = "none";

/// What a button click asks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToggleAction {
    TranslateTo(Locale),
    /// Click on the placeholder button shown while a translation loads.
    Ghost,
}

impl ToggleAction {
    pub fn parse(payload: &str) -> Option<Self> {
        if payload == GHOST_PAYLOAD {
            return Some(ToggleAction::Ghost);
        }
        payload
            .strip_prefix(TRANSLATE_TO_PREFIX)
            .and_then(Locale::from_code)
            .map(ToggleAction::TranslateTo)
    }

    pub fn payload(self) -> String {
        match self {
            ToggleAction::TranslateTo(locale) => format!("{TRANSLATE_TO_PREFIX}{}", locale.code()),
            ToggleAction::Ghost => GHOST_PAYLOAD.to_string(),
        }
    }
}

/// Single inline button attached under a recipe.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub callback_data: String,
}

impl Button {
    pub fn translate_to(target: Locale) -> Self {
        Self {
            label: format!("Translate to {} {}", target.english_name(), target.flag()),
            callback_data: ToggleAction::TranslateTo(target).payload(),
        }
    }

    pub fn loading() -> Self {
        Self {
            label: texts::LOADING.to_string(),
            callback_data: ToggleAction::Ghost.payload(),
        }
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("chat API request failed: {0}")]
    Api(String),
}

/// Outgoing side of the chat platform.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Plain text message.
    async fn send_text(&self, chat: ChatId, text: &str) -> Result<MessageRef, TransportError>;

    /// HTML recipe with one inline button.
    async fn send_recipe(
        &self,
        chat: ChatId,
        recipe: &RecipeText,
        button: &Button,
    ) -> Result<MessageRef, TransportError>;

    async fn edit_text(&self, message: MessageRef, text: &str) -> Result<(), TransportError>;

    async fn edit_recipe(
        &self,
        message: MessageRef,
        recipe: &RecipeText,
        button: &Button,
    ) -> Result<(), TransportError>;

    /// Replaces only the inline button.
    async fn edit_button(&self, message: MessageRef, button: &Button)
        -> Result<(), TransportError>;

    async fn delete_message(&self, message: MessageRef) -> Result<(), TransportError>;
}

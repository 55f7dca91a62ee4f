//! Reelcipe: Telegram bot that turns Instagram cooking reels into recipes
//! and translates them between English and Russian on demand.
//! Library root: tracing setup and service wiring.

pub mod chat;
pub mod config;
pub mod metrics;
pub mod orchestrator;
pub mod recipe;
pub mod services;
pub mod state_machine;

use std::sync::Arc;

use teloxide::Bot;
use tracing::info;

use chat::telegram::{self, TelegramTransport};
use config::Settings;
use orchestrator::{Collaborators, ConversationOrchestrator, SharedState};
use recipe::cache::RecipeCache;
use recipe::detect::WhatlangDetector;
use services::{InstagramClient, OpenAiChatClient, WhisperTranscriber};

const DEFAULT_LOG_FILTER: &str = "reelcipe=debug,teloxide=info";

/// Installs the global tracing subscriber. `RUST_LOG` overrides the default
/// filter.
pub fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Builds every adapter from `settings` and runs the bot until Ctrl-C.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let bot = Bot::new(settings.telegram_token.clone());
    let chat_client = Arc::new(OpenAiChatClient::new(&settings.openai)?);

    let services = Collaborators {
        fetcher: Arc::new(InstagramClient::new(&settings.instagram)?),
        detector: Arc::new(WhatlangDetector::new()),
        transcriber: Arc::new(WhisperTranscriber::new(&settings.openai)?),
        assembler: chat_client.clone(),
        translator: chat_client,
        transport: Arc::new(TelegramTransport::new(bot.clone())),
    };
    let state = SharedState::new(RecipeCache::from_capacity(settings.cache_capacity));
    let orchestrator = Arc::new(ConversationOrchestrator::new(services, state));

    info!(
        chat_model = %settings.openai.chat_model,
        transcribe_model = %settings.openai.transcribe_model,
        cache_capacity = ?settings.cache_capacity,
        "reelcipe starting"
    );
    telegram::run_dispatcher(bot, orchestrator.clone()).await;

    info!(cached_recipes = orchestrator.cache().len(), "reelcipe shutting down");
    orchestrator.metrics().log_summary();
    Ok(())
}

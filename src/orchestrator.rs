//! Conversation orchestrator: turns an incoming reel link into a delivered
//! recipe and serves the translation toggle.
//!
//! Main flow per reel, strictly sequential:
//! fetch metadata → detect language → transcribe → assemble → cache → present.
//! Every failure lands in a single error message; none propagate.
//!
//! Toggle flow: session lookup → gate → cache or translator → present.
//! The gate guard is held for the whole toggle and released on every exit.

use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::chat::session::{SessionContext, SessionStore};
use crate::chat::{
    texts, Button, ChatId, ChatKind, ChatTransport, MessageRef, ToggleAction, TransportError,
};
use crate::metrics::{metric_names, MetricsRegistry};
use crate::recipe::cache::RecipeCache;
use crate::recipe::detect::{Detection, LanguageDetector};
use crate::recipe::gate::TranslationGate;
use crate::recipe::{
    Locale, MetadataFetcher, RecipeAssembler, RecipeText, ReelLink, ReelMetadata, Transcriber,
    Translator,
};
use crate::state_machine::{FlowState, FlowTracker};

/// Why a reel flow ended in `Error`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    #[error("reel metadata unavailable")]
    MetadataUnavailable,

    #[error("unsupported caption language: {}", .0.as_deref().unwrap_or("undetermined"))]
    UnsupportedLanguage(Option<String>),

    #[error("transcription failed")]
    TranscriptionFailed,

    #[error("recipe assembly failed")]
    AssemblyFailed,
}

/// How an incoming message was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowOutcome {
    NotAReel,
    Delivered {
        link: ReelLink,
        locale: Locale,
        message: MessageRef,
    },
    Failed {
        at: FlowState,
        error: FlowError,
    },
}

/// How a toggle click was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// Ghost click, or no reel delivered in this chat yet.
    Ignored,
    /// Another click for the same reel is still translating.
    AlreadyInProgress,
    Shown { locale: Locale, from_cache: bool },
    /// Translator failed; the toggle button was put back.
    TranslationFailed,
}

/// External services the orchestrator drives.
pub struct Collaborators {
    pub fetcher: Arc<dyn MetadataFetcher>,
    pub detector: Arc<dyn LanguageDetector>,
    pub transcriber: Arc<dyn Transcriber>,
    pub assembler: Arc<dyn RecipeAssembler>,
    pub translator: Arc<dyn Translator>,
    pub transport: Arc<dyn ChatTransport>,
}

/// Shared state owned for the process lifetime.
pub struct SharedState {
    pub cache: Arc<RecipeCache>,
    pub gate: Arc<TranslationGate>,
    pub sessions: Arc<SessionStore>,
    pub metrics: Arc<MetricsRegistry>,
}

impl SharedState {
    pub fn new(cache: RecipeCache) -> Self {
        Self {
            cache: Arc::new(cache),
            gate: Arc::new(TranslationGate::new()),
            sessions: Arc::new(SessionStore::new()),
            metrics: Arc::new(MetricsRegistry::new()),
        }
    }
}

pub struct ConversationOrchestrator {
    fetcher: Arc<dyn MetadataFetcher>,
    detector: Arc<dyn LanguageDetector>,
    transcriber: Arc<dyn Transcriber>,
    assembler: Arc<dyn RecipeAssembler>,
    translator: Arc<dyn Translator>,
    transport: Arc<dyn ChatTransport>,
    cache: Arc<RecipeCache>,
    gate: Arc<TranslationGate>,
    sessions: Arc<SessionStore>,
    metrics: Arc<MetricsRegistry>,
}

impl ConversationOrchestrator {
    pub fn new(services: Collaborators, state: SharedState) -> Self {
        Self {
            fetcher: services.fetcher,
            detector: services.detector,
            transcriber: services.transcriber,
            assembler: services.assembler,
            translator: services.translator,
            transport: services.transport,
            cache: state.cache,
            gate: state.gate,
            sessions: state.sessions,
            metrics: state.metrics,
        }
    }

    pub fn cache(&self) -> &Arc<RecipeCache> {
        &self.cache
    }

    pub fn gate(&self) -> &Arc<TranslationGate> {
        &self.gate
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    /// `/start` command.
    pub async fn on_start(&self, chat: ChatId) -> Result<(), TransportError> {
        self.transport.send_text(chat, texts::START_MESSAGE).await?;
        Ok(())
    }

    /// Handles a text message. Non-reel text gets a hint in private chats and
    /// is ignored in groups.
    pub async fn on_incoming_message(
        &self,
        chat: ChatId,
        kind: ChatKind,
        text: &str,
    ) -> Result<FlowOutcome, TransportError> {
        let Some(link) = ReelLink::recognize(text) else {
            debug!(chat = chat.0, ?kind, "message is not a reel link");
            if kind == ChatKind::Private {
                self.transport.send_text(chat, texts::INVALID_MESSAGE).await?;
            }
            return Ok(FlowOutcome::NotAReel);
        };

        let span = info_span!("reel_flow", flow_id = %Uuid::new_v4(), chat = chat.0, link = %link);
        self.process_reel(chat, link).instrument(span).await
    }

    /// Runs one reel flow and records its duration under the outcome.
    async fn process_reel(
        &self,
        chat: ChatId,
        link: ReelLink,
    ) -> Result<FlowOutcome, TransportError> {
        let started = Instant::now();
        let result = self.run_reel_flow(chat, link).await;
        let metric = match &result {
            Ok(FlowOutcome::Delivered { .. }) => metric_names::FLOW_DELIVERED,
            Ok(_) => metric_names::FLOW_FAILED,
            Err(_) => metric_names::FLOW_ABORTED,
        };
        self.metrics.record_since(metric, started);
        result
    }

    async fn run_reel_flow(
        &self,
        chat: ChatId,
        link: ReelLink,
    ) -> Result<FlowOutcome, TransportError> {
        let progress = self.transport.send_text(chat, texts::PROCESSING).await?;
        let mut flow = FlowTracker::new();

        self.advance(&mut flow, progress, FlowState::FetchingMetadata).await?;
        let Some(metadata) = self.fetch_metadata(&link).await else {
            return self.fail(&mut flow, progress, FlowError::MetadataUnavailable).await;
        };

        self.advance(&mut flow, progress, FlowState::DetectingLanguage).await?;
        let locale = match self.detector.detect(&metadata.description) {
            Detection::Supported(locale) => locale,
            Detection::Unsupported { detected } => {
                let error = FlowError::UnsupportedLanguage(detected);
                return self.fail(&mut flow, progress, error).await;
            }
        };
        info!(locale = %locale, "caption_language_detected");

        self.advance(&mut flow, progress, FlowState::Transcribing).await?;
        let Some(transcript) = self.transcribe(&metadata.video_url, locale).await else {
            return self.fail(&mut flow, progress, FlowError::TranscriptionFailed).await;
        };

        self.advance(&mut flow, progress, FlowState::AssemblingRecipe).await?;
        let Some(recipe) = self.assemble(&metadata, &transcript, locale).await else {
            return self.fail(&mut flow, progress, FlowError::AssemblyFailed).await;
        };

        self.cache.put(locale, link.clone(), recipe.clone());
        info!(locale = %locale, recipe = %recipe.digest(), "recipe_cached");
        self.sessions.set(
            chat,
            SessionContext {
                reel_link: link.clone(),
                source_locale: locale,
            },
        );

        if let Err(e) = self.transport.delete_message(progress).await {
            warn!(error = %e, "failed to delete progress message");
        }
        let message = self
            .transport
            .send_recipe(chat, &recipe, &Button::translate_to(locale.other()))
            .await?;
        if flow.transition(FlowState::Delivered).is_ok() {
            info!(recipe = %recipe.digest(), "reel_delivered");
        }

        Ok(FlowOutcome::Delivered {
            link,
            locale,
            message,
        })
    }

    /// Moves to `next` and shows its progress text in place.
    async fn advance(
        &self,
        flow: &mut FlowTracker,
        progress: MessageRef,
        next: FlowState,
    ) -> Result<(), TransportError> {
        if flow.transition(next).is_ok() {
            if let Some(text) = next.progress_text() {
                self.transport.edit_text(progress, text).await?;
            }
        }
        Ok(())
    }

    async fn fail(
        &self,
        flow: &mut FlowTracker,
        progress: MessageRef,
        error: FlowError,
    ) -> Result<FlowOutcome, TransportError> {
        let at = flow.current();
        if flow.transition(FlowState::Error).is_ok() {
            warn!(state = %at, error = %error, "reel_flow_failed");
        }
        self.transport.edit_text(progress, texts::ERROR_MESSAGE).await?;
        Ok(FlowOutcome::Failed { at, error })
    }

    async fn fetch_metadata(&self, link: &ReelLink) -> Option<ReelMetadata> {
        let started = Instant::now();
        let result = self.fetcher.fetch_reel(link).await;
        self.metrics.record_since(metric_names::FETCH_METADATA, started);
        match result {
            Ok(Some(metadata)) if !metadata.video_url.trim().is_empty() => Some(metadata),
            Ok(Some(_)) => {
                warn!("reel has no video url");
                None
            }
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "metadata fetch failed");
                None
            }
        }
    }

    async fn transcribe(&self, video_url: &str, locale: Locale) -> Option<String> {
        let started = Instant::now();
        let result = self.transcriber.transcribe(video_url, locale).await;
        self.metrics.record_since(metric_names::TRANSCRIBE, started);
        match result {
            Ok(Some(transcript)) if !transcript.trim().is_empty() => {
                debug!(chars = transcript.len(), "transcript_ready");
                Some(transcript)
            }
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "transcription failed");
                None
            }
        }
    }

    async fn assemble(
        &self,
        metadata: &ReelMetadata,
        transcript: &str,
        locale: Locale,
    ) -> Option<RecipeText> {
        let started = Instant::now();
        let result = self
            .assembler
            .assemble(&metadata.description, transcript, locale)
            .await;
        self.metrics.record_since(metric_names::ASSEMBLE, started);
        match result {
            Ok(Some(recipe)) if !recipe.is_blank() => Some(recipe),
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "recipe assembly failed");
                None
            }
        }
    }

    /// Handles a click on a recipe's toggle button. Safe under repeated or
    /// re-delivered clicks: only one translation per reel runs at a time.
    pub async fn on_translation_toggle(
        &self,
        chat: ChatId,
        message: MessageRef,
        action: ToggleAction,
    ) -> Result<ToggleOutcome, TransportError> {
        let ToggleAction::TranslateTo(target) = action else {
            return Ok(ToggleOutcome::Ignored);
        };
        let Some(session) = self.sessions.get(chat) else {
            debug!(chat = chat.0, "toggle without a delivered reel");
            return Ok(ToggleOutcome::Ignored);
        };

        let span = info_span!("translation_toggle", chat = chat.0, link = %session.reel_link, target = %target);
        self.toggle(message, session, target).instrument(span).await
    }

    async fn toggle(
        &self,
        message: MessageRef,
        session: SessionContext,
        target: Locale,
    ) -> Result<ToggleOutcome, TransportError> {
        let link = &session.reel_link;
        let Some(_in_flight) = self.gate.enter(link) else {
            info!("translation already in progress");
            return Ok(ToggleOutcome::AlreadyInProgress);
        };

        self.transport.edit_button(message, &Button::loading()).await?;

        let (recipe, from_cache) = match self.cache.get(target, link) {
            Some(cached) => {
                info!(recipe = %cached.digest(), "translation_cache_hit");
                (cached, true)
            }
            None => match self.translate(link, session.source_locale, target).await {
                Some(translated) => (translated, false),
                None => {
                    self.transport
                        .edit_button(message, &Button::translate_to(target))
                        .await?;
                    return Ok(ToggleOutcome::TranslationFailed);
                }
            },
        };

        let shown = self
            .transport
            .edit_recipe(message, &recipe, &Button::translate_to(target.other()))
            .await;
        if let Err(e) = shown {
            warn!(error = %e, "failed to show recipe, restoring toggle");
            if let Err(restore) = self
                .transport
                .edit_button(message, &Button::translate_to(target))
                .await
            {
                warn!(error = %restore, "failed to restore toggle button");
            }
            return Err(e);
        }
        Ok(ToggleOutcome::Shown {
            locale: target,
            from_cache,
        })
    }

    /// Translates the cached original into `target` and caches the result.
    async fn translate(
        &self,
        link: &ReelLink,
        source: Locale,
        target: Locale,
    ) -> Option<RecipeText> {
        let from = if source == target { target.other() } else { source };
        let Some(original) = self.cache.get(from, link) else {
            warn!(from = %from, "no cached recipe to translate from");
            return None;
        };
        info!(from = %from, "translation_cache_miss");

        let started = Instant::now();
        let result = self.translator.translate(&original, from, target).await;
        self.metrics.record_since(metric_names::TRANSLATE, started);
        match result {
            Ok(translated) if !translated.is_blank() => {
                self.cache.put(target, link.clone(), translated.clone());
                info!(recipe = %translated.digest(), "translation_cached");
                Some(translated)
            }
            Ok(_) => {
                warn!("translator returned an empty recipe");
                None
            }
            Err(e) => {
                warn!(error = %e, "translation failed");
                None
            }
        }
    }
}

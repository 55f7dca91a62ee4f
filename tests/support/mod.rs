#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use reelcipe::chat::{Button, ChatId, ChatTransport, MessageId, MessageRef, TransportError};
use reelcipe::orchestrator::{Collaborators, ConversationOrchestrator, SharedState};
use reelcipe::recipe::cache::RecipeCache;
use reelcipe::recipe::detect::{Detection, LanguageDetector};
use reelcipe::recipe::{
    Locale, MetadataFetcher, RecipeAssembler, RecipeText, ReelLink, ReelMetadata, ServiceError,
    Transcriber, Translator,
};

pub const CHAT: ChatId = ChatId(42);
pub const REEL: &str = "https://www.instagram.com/reel/ABC123/";
pub const RECIPE_EN: &str = "<b>Pasta</b>\n- 200g pasta\n- tomato sauce";

pub fn reel_metadata() -> ReelMetadata {
    ReelMetadata {
        description: "Pasta recipe".to_string(),
        video_url: "https://cdn.example/reel.mp4".to_string(),
    }
}

// --- Fake collaborators ---

pub struct StubFetcher {
    pub metadata: Option<ReelMetadata>,
    pub calls: AtomicUsize,
}

#[async_trait]
impl MetadataFetcher for StubFetcher {
    async fn fetch_reel(&self, _link: &ReelLink) -> Result<Option<ReelMetadata>, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.metadata.clone())
    }
}

pub struct StubDetector {
    pub detection: Detection,
    pub calls: AtomicUsize,
}

impl LanguageDetector for StubDetector {
    fn detect(&self, _text: &str) -> Detection {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.detection.clone()
    }
}

pub struct StubTranscriber {
    pub transcript: Option<String>,
    pub calls: AtomicUsize,
}

#[async_trait]
impl Transcriber for StubTranscriber {
    async fn transcribe(
        &self,
        _video_url: &str,
        _locale: Locale,
    ) -> Result<Option<String>, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.transcript.clone())
    }
}

pub struct StubAssembler {
    pub recipe: Option<String>,
    pub calls: AtomicUsize,
}

#[async_trait]
impl RecipeAssembler for StubAssembler {
    async fn assemble(
        &self,
        _description: &str,
        _transcript: &str,
        _locale: Locale,
    ) -> Result<Option<RecipeText>, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.recipe.as_deref().map(RecipeText::from_model_output))
    }
}

/// Prefixes the recipe with the target code. Can fail on demand, or park
/// every call until `release` is notified.
pub struct StubTranslator {
    pub calls: AtomicUsize,
    /// `(from, to)` of every call, in order.
    pub requests: Mutex<Vec<(Locale, Locale)>>,
    pub fail: bool,
    pub hold: bool,
    /// Notified once per call, after the call is counted.
    pub entered: Notify,
    pub release: Notify,
}

#[async_trait]
impl Translator for StubTranslator {
    async fn translate(
        &self,
        recipe: &RecipeText,
        from: Locale,
        to: Locale,
    ) -> Result<RecipeText, ServiceError> {
        self.requests.lock().push((from, to));
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();
        if self.hold {
            self.release.notified().await;
        }
        if self.fail {
            return Err(ServiceError::Status {
                status: 500,
                body: "upstream down".to_string(),
            });
        }
        Ok(RecipeText::from_model_output(&format!(
            "[{}] {}",
            to.code(),
            recipe.as_str()
        )))
    }
}

pub fn translated(recipe: &str, to: Locale) -> String {
    format!("[{}] {}", to.code(), recipe)
}

// --- Recording transport ---

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    SendText { chat: ChatId, text: String },
    SendRecipe { chat: ChatId, text: String, button: Button },
    EditText { message: MessageRef, text: String },
    EditRecipe { message: MessageRef, text: String, button: Button },
    EditButton { message: MessageRef, button: Button },
    Delete { message: MessageRef },
}

#[derive(Default)]
pub struct RecordingTransport {
    calls: Mutex<Vec<Call>>,
    next_id: AtomicI32,
    /// Makes `edit_recipe` fail after recording the attempt.
    pub fail_recipe_edits: AtomicBool,
}

impl RecordingTransport {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }

    fn push(&self, call: Call) {
        self.calls.lock().push(call);
    }

    fn next_ref(&self, chat: ChatId) -> MessageRef {
        MessageRef {
            chat_id: chat,
            message_id: MessageId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1),
        }
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn send_text(&self, chat: ChatId, text: &str) -> Result<MessageRef, TransportError> {
        self.push(Call::SendText {
            chat,
            text: text.to_string(),
        });
        Ok(self.next_ref(chat))
    }

    async fn send_recipe(
        &self,
        chat: ChatId,
        recipe: &RecipeText,
        button: &Button,
    ) -> Result<MessageRef, TransportError> {
        self.push(Call::SendRecipe {
            chat,
            text: recipe.as_str().to_string(),
            button: button.clone(),
        });
        Ok(self.next_ref(chat))
    }

    async fn edit_text(&self, message: MessageRef, text: &str) -> Result<(), TransportError> {
        self.push(Call::EditText {
            message,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn edit_recipe(
        &self,
        message: MessageRef,
        recipe: &RecipeText,
        button: &Button,
    ) -> Result<(), TransportError> {
        self.push(Call::EditRecipe {
            message,
            text: recipe.as_str().to_string(),
            button: button.clone(),
        });
        if self.fail_recipe_edits.load(Ordering::SeqCst) {
            return Err(TransportError::Api("message is not modified".to_string()));
        }
        Ok(())
    }

    async fn edit_button(
        &self,
        message: MessageRef,
        button: &Button,
    ) -> Result<(), TransportError> {
        self.push(Call::EditButton {
            message,
            button: button.clone(),
        });
        Ok(())
    }

    async fn delete_message(&self, message: MessageRef) -> Result<(), TransportError> {
        self.push(Call::Delete { message });
        Ok(())
    }
}

// --- Harness ---

pub struct Scenario {
    pub metadata: Option<ReelMetadata>,
    pub detection: Detection,
    pub transcript: Option<String>,
    pub recipe: Option<String>,
    pub translator_fails: bool,
    pub translator_holds: bool,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            metadata: Some(reel_metadata()),
            detection: Detection::Supported(Locale::En),
            transcript: Some("boil pasta add sauce".to_string()),
            recipe: Some(RECIPE_EN.to_string()),
            translator_fails: false,
            translator_holds: false,
        }
    }
}

pub struct Harness {
    pub orchestrator: Arc<ConversationOrchestrator>,
    pub fetcher: Arc<StubFetcher>,
    pub detector: Arc<StubDetector>,
    pub transcriber: Arc<StubTranscriber>,
    pub assembler: Arc<StubAssembler>,
    pub translator: Arc<StubTranslator>,
    pub transport: Arc<RecordingTransport>,
}

impl Harness {
    pub fn new(scenario: Scenario) -> Self {
        let fetcher = Arc::new(StubFetcher {
            metadata: scenario.metadata,
            calls: AtomicUsize::new(0),
        });
        let detector = Arc::new(StubDetector {
            detection: scenario.detection,
            calls: AtomicUsize::new(0),
        });
        let transcriber = Arc::new(StubTranscriber {
            transcript: scenario.transcript,
            calls: AtomicUsize::new(0),
        });
        let assembler = Arc::new(StubAssembler {
            recipe: scenario.recipe,
            calls: AtomicUsize::new(0),
        });
        let translator = Arc::new(StubTranslator {
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            fail: scenario.translator_fails,
            hold: scenario.translator_holds,
            entered: Notify::new(),
            release: Notify::new(),
        });
        let transport = Arc::new(RecordingTransport::default());

        let services = Collaborators {
            fetcher: fetcher.clone(),
            detector: detector.clone(),
            transcriber: transcriber.clone(),
            assembler: assembler.clone(),
            translator: translator.clone(),
            transport: transport.clone(),
        };
        let orchestrator = Arc::new(ConversationOrchestrator::new(
            services,
            SharedState::new(RecipeCache::unbounded()),
        ));

        Self {
            orchestrator,
            fetcher,
            detector,
            transcriber,
            assembler,
            translator,
            transport,
        }
    }

    pub fn translate_calls(&self) -> usize {
        self.translator.calls.load(Ordering::SeqCst)
    }

    pub fn translate_requests(&self) -> Vec<(Locale, Locale)> {
        self.translator.requests.lock().clone()
    }
}

//! Telegram transport (teloxide) and the update dispatcher.
//! Updates are handled fully concurrently, including several clicks from
//! the same chat, so the translation gate sees real races.

use std::convert::Infallible;
use std::sync::Arc;

use async_trait::async_trait;
use teloxide::dispatching::{Dispatcher, HandlerExt, UpdateFilterExt};
use teloxide::dptree;
use teloxide::payloads::{
    EditMessageReplyMarkupSetters, EditMessageTextSetters, SendMessageSetters,
};
use teloxide::requests::Requester;
use teloxide::types::{
    CallbackQuery, ChatId as TgChatId, InlineKeyboardButton, InlineKeyboardMarkup, Message,
    MessageId as TgMessageId, ParseMode, Update,
};
use teloxide::utils::command::BotCommands;
use teloxide::{Bot, RequestError};
use tracing::{info, warn};

use super::{
    Button, ChatId, ChatKind, ChatTransport, MessageId, MessageRef, ToggleAction, TransportError,
};
use crate::orchestrator::ConversationOrchestrator;
use crate::recipe::RecipeText;

type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

impl From<RequestError> for TransportError {
    fn from(e: RequestError) -> Self {
        TransportError::Api(e.to_string())
    }
}

pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

fn keyboard(button: &Button) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        button.label.clone(),
        button.callback_data.clone(),
    )]])
}

fn message_ref(message: &Message) -> MessageRef {
    MessageRef {
        chat_id: ChatId(message.chat.id.0),
        message_id: MessageId(message.id.0),
    }
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    async fn send_text(&self, chat: ChatId, text: &str) -> Result<MessageRef, TransportError> {
        let sent = self.bot.send_message(TgChatId(chat.0), text).await?;
        Ok(message_ref(&sent))
    }

    async fn send_recipe(
        &self,
        chat: ChatId,
        recipe: &RecipeText,
        button: &Button,
    ) -> Result<MessageRef, TransportError> {
        let sent = self
            .bot
            .send_message(TgChatId(chat.0), recipe.as_str())
            .parse_mode(ParseMode::Html)
            .reply_markup(keyboard(button))
            .await?;
        Ok(message_ref(&sent))
    }

    async fn edit_text(&self, message: MessageRef, text: &str) -> Result<(), TransportError> {
        self.bot
            .edit_message_text(
                TgChatId(message.chat_id.0),
                TgMessageId(message.message_id.0),
                text,
            )
            .await?;
        Ok(())
    }

    async fn edit_recipe(
        &self,
        message: MessageRef,
        recipe: &RecipeText,
        button: &Button,
    ) -> Result<(), TransportError> {
        self.bot
            .edit_message_text(
                TgChatId(message.chat_id.0),
                TgMessageId(message.message_id.0),
                recipe.as_str(),
            )
            .parse_mode(ParseMode::Html)
            .reply_markup(keyboard(button))
            .await?;
        Ok(())
    }

    async fn edit_button(
        &self,
        message: MessageRef,
        button: &Button,
    ) -> Result<(), TransportError> {
        self.bot
            .edit_message_reply_markup(
                TgChatId(message.chat_id.0),
                TgMessageId(message.message_id.0),
            )
            .reply_markup(keyboard(button))
            .await?;
        Ok(())
    }

    async fn delete_message(&self, message: MessageRef) -> Result<(), TransportError> {
        self.bot
            .delete_message(
                TgChatId(message.chat_id.0),
                TgMessageId(message.message_id.0),
            )
            .await?;
        Ok(())
    }
}

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Supported commands:")]
enum Command {
    #[command(description = "show the welcome message")]
    Start,
}

/// Runs the long-polling dispatcher until Ctrl-C.
pub async fn run_dispatcher(bot: Bot, orchestrator: Arc<ConversationOrchestrator>) {
    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .branch(
                    dptree::entry()
                        .filter_command::<Command>()
                        .endpoint(handle_command),
                )
                .branch(dptree::endpoint(handle_message)),
        )
        .branch(Update::filter_callback_query().endpoint(handle_callback));

    info!("telegram dispatcher starting");
    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![orchestrator])
        .distribution_function(|_| None::<Infallible>)
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
    info!("telegram dispatcher stopped");
}

async fn handle_command(
    msg: Message,
    cmd: Command,
    orchestrator: Arc<ConversationOrchestrator>,
) -> HandlerResult {
    match cmd {
        Command::Start => orchestrator.on_start(ChatId(msg.chat.id.0)).await?,
    }
    Ok(())
}

async fn handle_message(msg: Message, orchestrator: Arc<ConversationOrchestrator>) -> HandlerResult {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let kind = if msg.chat.is_private() {
        ChatKind::Private
    } else {
        ChatKind::Group
    };
    let outcome = orchestrator
        .on_incoming_message(ChatId(msg.chat.id.0), kind, text)
        .await?;
    info!(chat = msg.chat.id.0, ?outcome, "message_handled");
    Ok(())
}

async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    orchestrator: Arc<ConversationOrchestrator>,
) -> HandlerResult {
    bot.answer_callback_query(q.id.clone()).await?;

    let (Some(data), Some(message)) = (q.data.as_deref(), q.message.as_ref()) else {
        return Ok(());
    };
    let Some(action) = ToggleAction::parse(data) else {
        warn!(payload = data, "unknown callback payload");
        return Ok(());
    };

    let target = message_ref(message);
    let outcome = orchestrator
        .on_translation_toggle(target.chat_id, target, action)
        .await?;
    info!(chat = target.chat_id.0, ?outcome, "toggle_handled");
    Ok(())
}

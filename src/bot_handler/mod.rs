mod callback_actions;
mod callbacks;
mod commands;
mod steps;
#[cfg(test)]
mod test_helpers;
#[cfg(test)]
mod tests;

use std::sync::Arc;

pub use callback_actions::CallbackAction;
use serde::{Deserialize, Serialize};
use teloxide::{
    dispatching::dialogue::{Dialogue, SqliteStorage, serializer},
    prelude::*,
    types::{ChatId, Message, MessageId, User as TelegramUser},
    utils::command::BotCommands,
};
use thiserror::Error;

use crate::{
    messaging::{MessagingError, MessagingService},
    repository::PortalService,
};

/// Dialogue storage backing conversation state. Sqlite-backed so that an
/// in-flight dialogue survives a process restart.
pub type DialogueStorage = SqliteStorage<serializer::Json>;
pub type BotDialogue = Dialogue<ConversationState, DialogueStorage>;

#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase", description = "Доступные команды:")]
pub enum Command {
    #[command(description = "Запустить бота и показать меню.")]
    Start,
}

#[derive(Debug, Error)]
pub enum BotHandlerError {
    #[error("Failed to send message: {0}")]
    Messaging(#[from] MessagingError),
    #[error("Dialogue storage error: {0}")]
    Dialogue(String),
    #[error("Unknown callback data: {0}")]
    UnknownCallback(String),
}

pub type BotHandlerResult<T> = Result<T, BotHandlerError>;

fn dialogue_err(e: impl std::fmt::Display) -> BotHandlerError {
    BotHandlerError::Dialogue(e.to_string())
}

/// Resolved identity of the person a request is created for.
///
/// Request steps are only reachable once one of the variants has been
/// captured, so a request can never be created with placeholder fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RequestIdentity {
    /// Snapshot of a linked portal account.
    Known { user_id: i64, name: String, phone: String, email: Option<String> },
    /// Name and phone captured in the dialogue, no account.
    Anonymous { name: String, phone: String },
}

impl RequestIdentity {
    pub fn user_id(&self) -> Option<i64> {
        match self {
            Self::Known { user_id, .. } => Some(*user_id),
            Self::Anonymous { .. } => None,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Known { name, .. } | Self::Anonymous { name, .. } => name,
        }
    }

    pub fn phone(&self) -> &str {
        match self {
            Self::Known { phone, .. } | Self::Anonymous { phone, .. } => phone,
        }
    }

    pub fn email(&self) -> Option<String> {
        match self {
            Self::Known { email, .. } => email.clone(),
            Self::Anonymous { .. } => None,
        }
    }
}

/// Per-user conversation state, keyed by Telegram user id.
///
/// Each step carries the fields accumulated so far, so a step is only
/// constructible after its prerequisites have been captured and no handler
/// needs to re-validate them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum ConversationState {
    /// No active dialogue. Stored entries never hold this; it is the value a
    /// missing entry decodes to.
    #[default]
    Idle,
    /// Waiting for a shared contact or a phone number typed as text.
    WaitingPhoneText,
    /// Phone captured but unknown to the portal; the user is choosing between
    /// registration and an anonymous request.
    PhoneCaptured { name: String, phone: String },
    /// Registration: waiting for a name. `phone` is carried over when it was
    /// already captured.
    WaitingRegName { phone: Option<String> },
    /// Registration: waiting for a phone number.
    WaitingRegPhone { name: String },
    /// Request flow: waiting for the car brand and model.
    WaitingCar { identity: RequestIdentity },
    /// Request flow: waiting for the car year.
    WaitingCarYear { identity: RequestIdentity, car: String },
    /// Request flow: waiting for the problem description.
    WaitingMessage { identity: RequestIdentity, car: String, car_year: i64 },
    /// Client is typing a reply to request `request_id`.
    WaitingReply { request_id: i64 },
    /// Admin is typing a company reply to request `request_id`.
    WaitingAdminReply { request_id: i64 },
}

/// Groups the data needed by command, callback and step handlers.
pub struct Context<'a> {
    pub handler: &'a BotHandler,
    pub chat_id: ChatId,
    /// Message carrying the pressed inline keyboard, for in-place edits.
    pub message_id: Option<MessageId>,
    pub user: &'a TelegramUser,
    pub dialogue: &'a BotDialogue,
}

impl Context<'_> {
    pub fn telegram_id(&self) -> i64 {
        self.user.id.0 as i64
    }

    pub fn username(&self) -> Option<String> {
        self.user.username.clone()
    }

    pub fn first_name(&self) -> &str {
        &self.user.first_name
    }

    pub async fn state(&self) -> BotHandlerResult<ConversationState> {
        Ok(self.dialogue.get().await.map_err(dialogue_err)?.unwrap_or_default())
    }

    pub async fn set_state(&self, state: ConversationState) -> BotHandlerResult<()> {
        self.dialogue.update(state).await.map_err(dialogue_err)
    }

    /// Removes the conversation entry entirely. Safe to call when none exists.
    pub async fn clear_state(&self) -> BotHandlerResult<()> {
        if self.dialogue.get().await.map_err(dialogue_err)?.is_some() {
            self.dialogue.exit().await.map_err(dialogue_err)?;
        }
        Ok(())
    }
}

/// The dialogue controller: routes updates to per-step handlers.
pub struct BotHandler {
    pub(crate) messaging_service: Arc<dyn MessagingService>,
    pub(crate) portal_service: Arc<dyn PortalService>,
}

impl BotHandler {
    /// Creates a new `BotHandler` instance.
    pub fn new(
        messaging_service: Arc<dyn MessagingService>,
        portal_service: Arc<dyn PortalService>,
    ) -> Self {
        Self { messaging_service, portal_service }
    }

    /// Handles an incoming message: contact payloads first (they carry empty
    /// text), then commands, then the current dialogue step.
    pub async fn handle_message(
        &self,
        msg: &Message,
        dialogue: &BotDialogue,
    ) -> BotHandlerResult<()> {
        let Some(user) = msg.from.as_ref() else {
            return Ok(());
        };
        let ctx = Context { handler: self, chat_id: msg.chat.id, message_id: None, user, dialogue };

        if let Some(contact) = msg.contact() {
            return steps::phone::handle_contact(ctx, contact).await;
        }

        let text = msg.text().unwrap_or_default();
        if text.starts_with('/') {
            if let Ok(command) = Command::parse(text, "") {
                return self.handle_command(ctx, command).await;
            }
        }

        match ctx.state().await? {
            ConversationState::Idle | ConversationState::PhoneCaptured { .. } => {
                tracing::debug!(chat_id = %msg.chat.id, "message outside a dialogue step, ignored");
                Ok(())
            }
            ConversationState::WaitingPhoneText => steps::phone::handle_phone_text(ctx, text).await,
            ConversationState::WaitingRegName { phone } => {
                steps::registration::handle_name(ctx, text, phone).await
            }
            ConversationState::WaitingRegPhone { name } => {
                steps::registration::handle_phone(ctx, text, name).await
            }
            ConversationState::WaitingCar { identity } => {
                steps::request::handle_car(ctx, text, identity).await
            }
            ConversationState::WaitingCarYear { identity, car } => {
                steps::request::handle_car_year(ctx, text, identity, car).await
            }
            ConversationState::WaitingMessage { identity, car, car_year } => {
                steps::request::handle_description(ctx, text, identity, car, car_year).await
            }
            ConversationState::WaitingReply { request_id } => {
                steps::reply::handle_client_text(ctx, text, request_id).await
            }
            ConversationState::WaitingAdminReply { request_id } => {
                steps::reply::handle_company_text(ctx, text, request_id).await
            }
        }
    }

    /// Dispatches a parsed command to its handler.
    async fn handle_command(&self, ctx: Context<'_>, command: Command) -> BotHandlerResult<()> {
        match command {
            Command::Start => commands::start::handle(ctx).await,
        }
    }

    /// Handles a callback query by decoding its `callback_data`.
    pub async fn handle_callback_query(
        &self,
        query: &CallbackQuery,
        dialogue: &BotDialogue,
    ) -> BotHandlerResult<()> {
        // Clear the button spinner first; a stale query id is not fatal.
        if let Err(e) = self.messaging_service.answer_callback_query(&query.id).await {
            tracing::warn!(error = %e, "failed to answer callback query");
        }

        let Some(data) = query.data.as_deref() else {
            return Ok(());
        };
        let action = CallbackAction::parse(data)
            .ok_or_else(|| BotHandlerError::UnknownCallback(data.to_string()))?;

        let (chat_id, message_id) = match query.message.as_ref() {
            Some(message) => (message.chat().id, Some(message.id())),
            None => (ChatId(query.from.id.0 as i64), None),
        };
        let ctx = Context { handler: self, chat_id, message_id, user: &query.from, dialogue };

        match action {
            CallbackAction::MainMenu => callbacks::main_menu::handle(ctx).await,
            CallbackAction::Register => callbacks::register::handle(ctx).await,
            CallbackAction::NewRequest => callbacks::new_request::handle(ctx).await,
            CallbackAction::MyRequests => callbacks::my_requests::handle(ctx).await,
            CallbackAction::Cancel => callbacks::cancel::handle(ctx).await,
            CallbackAction::ForgotPassword => callbacks::forgot_password::handle(ctx).await,
            CallbackAction::Reply(request_id) => callbacks::reply::handle_client(ctx, request_id).await,
            CallbackAction::AdminReply(request_id) => {
                callbacks::reply::handle_admin(ctx, request_id).await
            }
        }
    }
}

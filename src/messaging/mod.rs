pub mod keyboards;

use async_trait::async_trait;
use mockall::automock;
use teloxide::{
    prelude::*,
    types::{ChatId, MessageId, ParseMode},
    utils::{command::BotCommands, html},
};
use thiserror::Error;

use crate::{
    bot_handler::Command,
    phone,
    storage::{RequestStatus, ServiceRequest},
};

#[derive(Debug, Error)]
pub enum MessagingError {
    #[error("Teloxide API request failed: {0}")]
    TeloxideRequest(#[from] teloxide::RequestError),
}

type Result<T> = std::result::Result<T, MessagingError>;

/// Trait for sending messages to users and the admin channel.
///
/// No retry and no backoff anywhere: a failed call surfaces as a
/// `MessagingError` and the caller decides whether it is fatal (user-facing
/// sends) or best-effort (admin notifications).
#[automock]
#[async_trait]
pub trait MessagingService: Send + Sync {
    /// Shows the main menu: edits `message_id` in place when the menu is
    /// reached from an inline button, sends a new message otherwise.
    async fn show_main_menu(
        &self,
        chat_id: ChatId,
        message_id: Option<MessageId>,
        text: String,
        registered: bool,
    ) -> Result<()>;

    /// Shows a dialogue prompt with a cancel button.
    async fn show_prompt(
        &self,
        chat_id: ChatId,
        message_id: Option<MessageId>,
        text: String,
    ) -> Result<()>;

    /// Shows the user's requests with status labels.
    async fn show_requests_list(
        &self,
        chat_id: ChatId,
        message_id: Option<MessageId>,
        requests: Vec<ServiceRequest>,
    ) -> Result<()>;

    /// Asks for a phone number with a contact-sharing reply keyboard.
    async fn send_contact_request(&self, chat_id: ChatId, text: String) -> Result<()>;

    /// Offers registration or an anonymous request after a phone lookup miss.
    async fn send_register_offer(&self, chat_id: ChatId, text: String) -> Result<()>;

    /// Sends a plain text message.
    async fn send_text(&self, chat_id: ChatId, text: String) -> Result<()>;

    /// Confirms a completed registration and delivers the generated password.
    async fn send_registration_complete(
        &self,
        chat_id: ChatId,
        name: String,
        phone: String,
        password: String,
    ) -> Result<()>;

    /// Confirms request creation.
    async fn send_request_created(&self, chat_id: ChatId, request_id: i64) -> Result<()>;

    /// Delivers a freshly reset password.
    async fn send_new_password(&self, chat_id: ChatId, password: String) -> Result<()>;

    /// Answers a callback query to clear the button spinner.
    async fn answer_callback_query(&self, query_id: &str) -> Result<()>;

    /// Notifies the admin channel about a new request.
    async fn notify_admin_new_request(
        &self,
        request_id: i64,
        name: &str,
        phone: &str,
        car: &str,
        description: &str,
    ) -> Result<()>;

    /// Notifies the admin channel about a client message in a request thread.
    async fn notify_admin_client_reply(
        &self,
        request_id: i64,
        client_name: &str,
        text: &str,
    ) -> Result<()>;

    /// Notifies a client about a company reply in their request thread.
    async fn notify_client_reply(&self, chat_id: ChatId, request_id: i64, text: &str)
    -> Result<()>;

    /// Registers the bot command list with Telegram.
    async fn register_commands(&self) -> Result<()>;
}

/// Telegram messaging service.
pub struct TelegramMessagingService {
    bot: Bot,
    admin_chat_id: ChatId,
    site_url: String,
}

impl TelegramMessagingService {
    pub fn new(bot: Bot, admin_chat_id: ChatId, site_url: String) -> Self {
        Self { bot, admin_chat_id, site_url }
    }

    /// Edit `message_id` in place when present, otherwise send a new message.
    /// Inline-button flows edit the menu message; text flows send fresh ones.
    async fn edit_or_send(
        &self,
        chat_id: ChatId,
        message_id: Option<MessageId>,
        text: String,
        keyboard: teloxide::types::InlineKeyboardMarkup,
    ) -> Result<()> {
        match message_id {
            Some(message_id) => self
                .bot
                .edit_message_text(chat_id, message_id, text)
                .reply_markup(keyboard)
                .await
                .map(|_| ())
                .map_err(MessagingError::TeloxideRequest),
            None => self
                .bot
                .send_message(chat_id, text)
                .reply_markup(keyboard)
                .await
                .map(|_| ())
                .map_err(MessagingError::TeloxideRequest),
        }
    }
}

fn status_label(status: RequestStatus) -> &'static str {
    match status {
        RequestStatus::Pending => "🆕 Новая",
        RequestStatus::InProgress => "⏳ В работе",
        RequestStatus::Completed => "✅ Завершена",
        RequestStatus::Cancelled => "❌ Отменена",
    }
}

fn format_created_at(timestamp: i64) -> String {
    chrono::DateTime::from_timestamp(timestamp, 0)
        .map(|dt| dt.format("%d.%m.%Y %H:%M").to_string())
        .unwrap_or_default()
}

fn format_requests_list(requests: &[ServiceRequest]) -> String {
    let mut text = String::from("📋 Ваши заявки:\n\n");
    for request in requests {
        text.push_str(&format!(
            "{} — заявка #{}\nАвтомобиль: {}\nДата: {}\n\n",
            status_label(request.status),
            request.id,
            request.car(),
            format_created_at(request.created_at),
        ));
    }
    text
}

#[async_trait]
impl MessagingService for TelegramMessagingService {
    async fn show_main_menu(
        &self,
        chat_id: ChatId,
        message_id: Option<MessageId>,
        text: String,
        registered: bool,
    ) -> Result<()> {
        let keyboard = keyboards::main_menu(registered, &self.site_url);
        self.edit_or_send(chat_id, message_id, text, keyboard).await
    }

    async fn show_prompt(
        &self,
        chat_id: ChatId,
        message_id: Option<MessageId>,
        text: String,
    ) -> Result<()> {
        self.edit_or_send(chat_id, message_id, text, keyboards::cancel_keyboard()).await
    }

    async fn show_requests_list(
        &self,
        chat_id: ChatId,
        message_id: Option<MessageId>,
        requests: Vec<ServiceRequest>,
    ) -> Result<()> {
        let (text, keyboard) = if requests.is_empty() {
            ("📋 У вас пока нет заявок".to_string(), keyboards::empty_requests_keyboard())
        } else {
            (format_requests_list(&requests), keyboards::requests_list_keyboard())
        };
        self.edit_or_send(chat_id, message_id, text, keyboard).await
    }

    async fn send_contact_request(&self, chat_id: ChatId, text: String) -> Result<()> {
        self.bot
            .send_message(chat_id, text)
            .reply_markup(keyboards::contact_keyboard())
            .await
            .map(|_| ())
            .map_err(MessagingError::TeloxideRequest)
    }

    async fn send_register_offer(&self, chat_id: ChatId, text: String) -> Result<()> {
        self.bot
            .send_message(chat_id, text)
            .reply_markup(keyboards::register_offer_keyboard())
            .await
            .map(|_| ())
            .map_err(MessagingError::TeloxideRequest)
    }

    async fn send_text(&self, chat_id: ChatId, text: String) -> Result<()> {
        self.bot
            .send_message(chat_id, text)
            .await
            .map(|_| ())
            .map_err(MessagingError::TeloxideRequest)
    }

    async fn send_registration_complete(
        &self,
        chat_id: ChatId,
        name: String,
        phone: String,
        password: String,
    ) -> Result<()> {
        let text = format!(
            "✅ Регистрация завершена!\n\n👤 Имя: {}\n📱 Телефон: {}\n\n🔐 Пароль для входа \
             в личный кабинет: <code>{}</code>\n\nСохраните его — он показывается один раз.",
            html::escape(&name),
            phone::format_display(&phone),
            html::escape(&password),
        );
        self.bot
            .send_message(chat_id, text)
            .parse_mode(ParseMode::Html)
            .reply_markup(keyboards::after_registration_keyboard(&self.site_url))
            .await
            .map(|_| ())
            .map_err(MessagingError::TeloxideRequest)
    }

    async fn send_request_created(&self, chat_id: ChatId, request_id: i64) -> Result<()> {
        let text = format!(
            "✅ Заявка #{request_id} создана!\n\n📞 Мы свяжемся с вами в ближайшее время."
        );
        self.bot
            .send_message(chat_id, text)
            .reply_markup(keyboards::after_request_keyboard(&self.site_url))
            .await
            .map(|_| ())
            .map_err(MessagingError::TeloxideRequest)
    }

    async fn send_new_password(&self, chat_id: ChatId, password: String) -> Result<()> {
        let text = format!(
            "🔐 Ваш новый пароль: <code>{}</code>\n\nИспользуйте его для входа в личный \
             кабинет на сайте.",
            html::escape(&password),
        );
        self.bot
            .send_message(chat_id, text)
            .parse_mode(ParseMode::Html)
            .await
            .map(|_| ())
            .map_err(MessagingError::TeloxideRequest)
    }

    async fn answer_callback_query(&self, query_id: &str) -> Result<()> {
        self.bot
            .answer_callback_query(query_id)
            .await
            .map(|_| ())
            .map_err(MessagingError::TeloxideRequest)
    }

    async fn notify_admin_new_request(
        &self,
        request_id: i64,
        name: &str,
        phone: &str,
        car: &str,
        description: &str,
    ) -> Result<()> {
        let text = format!(
            "🔔 <b>Новая заявка из Telegram</b>\n\n📝 Заявка #{}\n👤 Имя: {}\n📱 Телефон: \
             {}\n🚗 Автомобиль: {}\n💬 Сообщение: {}",
            request_id,
            html::escape(name),
            phone::format_display(phone),
            html::escape(car),
            html::escape(description),
        );
        self.bot
            .send_message(self.admin_chat_id, text)
            .parse_mode(ParseMode::Html)
            .reply_markup(keyboards::admin_reply_keyboard(request_id))
            .await
            .map(|_| ())
            .map_err(MessagingError::TeloxideRequest)
    }

    async fn notify_admin_client_reply(
        &self,
        request_id: i64,
        client_name: &str,
        text: &str,
    ) -> Result<()> {
        let text = format!(
            "💬 <b>Новое сообщение от клиента</b>\n\n📝 Заявка #{}\n👤 Клиент: {}\n\n💭 \
             Сообщение: {}",
            request_id,
            html::escape(client_name),
            html::escape(text),
        );
        self.bot
            .send_message(self.admin_chat_id, text)
            .parse_mode(ParseMode::Html)
            .reply_markup(keyboards::admin_reply_keyboard(request_id))
            .await
            .map(|_| ())
            .map_err(MessagingError::TeloxideRequest)
    }

    async fn notify_client_reply(
        &self,
        chat_id: ChatId,
        request_id: i64,
        text: &str,
    ) -> Result<()> {
        let text = format!(
            "💬 <b>Ответ по заявке #{}</b>\n\n{}",
            request_id,
            html::escape(text),
        );
        self.bot
            .send_message(chat_id, text)
            .parse_mode(ParseMode::Html)
            .reply_markup(keyboards::client_reply_keyboard(request_id))
            .await
            .map(|_| ())
            .map_err(MessagingError::TeloxideRequest)
    }

    async fn register_commands(&self) -> Result<()> {
        self.bot
            .set_my_commands(Command::bot_commands())
            .await
            .map(|_| ())
            .map_err(MessagingError::TeloxideRequest)
    }
}

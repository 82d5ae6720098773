use lazy_static::lazy_static;
use teloxide::types::{
    ButtonRequest, InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup,
    WebAppInfo,
};
use url::Url;

use crate::bot_handler::CallbackAction;

/// Site button opening the partner portal inside Telegram. Skipped when the
/// configured URL does not parse.
fn site_button(site_url: &str) -> Option<InlineKeyboardButton> {
    let url = Url::parse(site_url).ok()?;
    Some(InlineKeyboardButton::web_app("🌐 Перейти на сайт", WebAppInfo { url }))
}

pub fn main_menu(registered: bool, site_url: &str) -> InlineKeyboardMarkup {
    let mut rows = Vec::new();

    if registered {
        rows.push(vec![InlineKeyboardButton::callback(
            "🆕 Создать заявку",
            CallbackAction::NewRequest.as_data(),
        )]);
        rows.push(vec![InlineKeyboardButton::callback(
            "📋 Мои заявки",
            CallbackAction::MyRequests.as_data(),
        )]);
        rows.push(vec![InlineKeyboardButton::callback(
            "🔐 Восстановить пароль",
            CallbackAction::ForgotPassword.as_data(),
        )]);
    } else {
        rows.push(vec![InlineKeyboardButton::callback(
            "✅ Зарегистрироваться",
            CallbackAction::Register.as_data(),
        )]);
        rows.push(vec![InlineKeyboardButton::callback(
            "📝 Создать заявку без регистрации",
            CallbackAction::NewRequest.as_data(),
        )]);
    }

    if let Some(button) = site_button(site_url) {
        rows.push(vec![button]);
    }

    InlineKeyboardMarkup::new(rows)
}

pub fn cancel_keyboard() -> InlineKeyboardMarkup {
    CANCEL_KEYBOARD.clone()
}

/// Reply keyboard with a contact-sharing button. Stays on screen until the
/// flow replaces it.
pub fn contact_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![vec![
        KeyboardButton::new("📱 Отправить номер телефона").request(ButtonRequest::Contact),
    ]])
}

pub fn register_offer_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(
            "✅ Зарегистрироваться",
            CallbackAction::Register.as_data(),
        )],
        vec![InlineKeyboardButton::callback(
            "📝 Создать заявку без регистрации",
            CallbackAction::NewRequest.as_data(),
        )],
        vec![InlineKeyboardButton::callback(
            "◀️ Главное меню",
            CallbackAction::MainMenu.as_data(),
        )],
    ])
}

pub fn after_registration_keyboard(site_url: &str) -> InlineKeyboardMarkup {
    let mut rows = vec![vec![InlineKeyboardButton::callback(
        "🆕 Создать заявку",
        CallbackAction::NewRequest.as_data(),
    )]];
    if let Some(button) = site_button(site_url) {
        rows.push(vec![button]);
    }
    InlineKeyboardMarkup::new(rows)
}

pub fn after_request_keyboard(site_url: &str) -> InlineKeyboardMarkup {
    let mut rows = vec![
        vec![InlineKeyboardButton::callback(
            "🆕 Создать ещё заявку",
            CallbackAction::NewRequest.as_data(),
        )],
        vec![InlineKeyboardButton::callback(
            "📋 Мои заявки",
            CallbackAction::MyRequests.as_data(),
        )],
    ];
    if let Some(button) = site_button(site_url) {
        rows.push(vec![button]);
    }
    InlineKeyboardMarkup::new(rows)
}

pub fn empty_requests_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(
            "🆕 Создать заявку",
            CallbackAction::NewRequest.as_data(),
        )],
        vec![InlineKeyboardButton::callback(
            "◀️ Главное меню",
            CallbackAction::MainMenu.as_data(),
        )],
    ])
}

pub fn requests_list_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(
            "🆕 Создать новую заявку",
            CallbackAction::NewRequest.as_data(),
        )],
        vec![InlineKeyboardButton::callback(
            "◀️ Главное меню",
            CallbackAction::MainMenu.as_data(),
        )],
    ])
}

pub fn admin_reply_keyboard(request_id: i64) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        "💬 Ответить",
        CallbackAction::AdminReply(request_id).as_data(),
    )]])
}

pub fn client_reply_keyboard(request_id: i64) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        "💬 Ответить",
        CallbackAction::Reply(request_id).as_data(),
    )]])
}

lazy_static! {
    static ref CANCEL_KEYBOARD: InlineKeyboardMarkup =
        InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
            "❌ Отменить",
            CallbackAction::Cancel.as_data(),
        )]]);
}

use teloxide::types::Contact;
use tracing::warn;

use crate::{
    bot_handler::{BotHandlerResult, Context, ConversationState},
    phone,
};

const INVALID_PHONE_MSG: &str =
    "❌ Некорректный номер. Отправьте номер телефона в формате +7 999 123-45-67:";

/// A shared contact. Handled regardless of the current step, because the
/// contact-sharing UI produces messages with empty text.
pub async fn handle_contact(ctx: Context<'_>, contact: &Contact) -> BotHandlerResult<()> {
    let name = if contact.first_name.trim().is_empty() {
        ctx.first_name().to_string()
    } else {
        contact.first_name.clone()
    };

    match phone::normalize(&contact.phone_number) {
        Some(canonical) => process_phone(ctx, canonical, name).await,
        None => {
            ctx.set_state(ConversationState::WaitingPhoneText).await?;
            ctx.handler
                .messaging_service
                .send_text(ctx.chat_id, INVALID_PHONE_MSG.to_string())
                .await?;
            Ok(())
        }
    }
}

/// A phone number typed as text while in `WaitingPhoneText`.
pub async fn handle_phone_text(ctx: Context<'_>, text: &str) -> BotHandlerResult<()> {
    match phone::normalize(text) {
        Some(canonical) => {
            let name = ctx.first_name().to_string();
            process_phone(ctx, canonical, name).await
        }
        None => {
            // Step unchanged: the user simply retries.
            ctx.handler
                .messaging_service
                .send_text(ctx.chat_id, INVALID_PHONE_MSG.to_string())
                .await?;
            Ok(())
        }
    }
}

async fn process_phone(ctx: Context<'_>, canonical: String, name: String) -> BotHandlerResult<()> {
    let telegram_id = ctx.telegram_id();

    match ctx.handler.portal_service.find_user_by_phone(&canonical).await {
        Some(user) => {
            let linked = ctx
                .handler
                .portal_service
                .link_telegram(user.id, telegram_id, ctx.username())
                .await;
            if !linked {
                warn!(user_id = user.id, "telegram link was not persisted");
            }

            ctx.clear_state().await?;
            let text = format!(
                "✅ Номер подтверждён. С возвращением, {}!\n\nВыберите действие:",
                user.name,
            );
            ctx.handler.messaging_service.show_main_menu(ctx.chat_id, None, text, true).await?;
        }
        None => {
            let text = format!(
                "📱 Номер {} не найден среди клиентов сервиса.\n\nЗарегистрируйтесь или \
                 создайте заявку без регистрации:",
                phone::format_display(&canonical),
            );
            ctx.set_state(ConversationState::PhoneCaptured { name, phone: canonical }).await?;
            ctx.handler.messaging_service.send_register_offer(ctx.chat_id, text).await?;
        }
    }

    Ok(())
}

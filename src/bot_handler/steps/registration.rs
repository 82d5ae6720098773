use crate::{
    bot_handler::{BotHandlerResult, Context, ConversationState},
    phone, repository,
};

/// Name supplied during registration. When a phone was already captured the
/// registration completes here.
pub async fn handle_name(
    ctx: Context<'_>,
    text: &str,
    phone: Option<String>,
) -> BotHandlerResult<()> {
    let name = text.trim();
    if name.chars().count() < 2 {
        ctx.handler
            .messaging_service
            .show_prompt(ctx.chat_id, None, "❌ Имя слишком короткое. Введите ваше имя:".to_string())
            .await?;
        return Ok(());
    }

    match phone {
        Some(phone) => finalize(ctx, name.to_string(), phone).await,
        None => {
            ctx.set_state(ConversationState::WaitingRegPhone { name: name.to_string() }).await?;
            ctx.handler
                .messaging_service
                .show_prompt(ctx.chat_id, None, "📱 Укажите номер телефона:".to_string())
                .await?;
            Ok(())
        }
    }
}

/// Phone supplied during registration.
pub async fn handle_phone(ctx: Context<'_>, text: &str, name: String) -> BotHandlerResult<()> {
    match phone::normalize(text) {
        Some(canonical) => finalize(ctx, name, canonical).await,
        None => {
            ctx.handler
                .messaging_service
                .show_prompt(
                    ctx.chat_id,
                    None,
                    "❌ Некорректный номер. Введите номер телефона:".to_string(),
                )
                .await?;
            Ok(())
        }
    }
}

async fn finalize(ctx: Context<'_>, name: String, phone: String) -> BotHandlerResult<()> {
    let password = repository::generate_password();
    let registered = ctx
        .handler
        .portal_service
        .register_user(
            ctx.telegram_id(),
            ctx.username(),
            name.clone(),
            phone.clone(),
            password.clone(),
        )
        .await;

    ctx.clear_state().await?;

    if registered {
        ctx.handler
            .messaging_service
            .send_registration_complete(ctx.chat_id, name, phone, password)
            .await?;
    } else {
        ctx.handler
            .messaging_service
            .send_text(
                ctx.chat_id,
                "❌ Ошибка регистрации. Возможно, номер уже используется.\n\n/start — вернуться \
                 в меню"
                    .to_string(),
            )
            .await?;
    }

    Ok(())
}

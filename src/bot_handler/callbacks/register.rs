use crate::bot_handler::{BotHandlerResult, Context, ConversationState};

pub async fn handle(ctx: Context<'_>) -> BotHandlerResult<()> {
    // Carry over a phone captured during the lookup flow.
    let phone = match ctx.state().await? {
        ConversationState::PhoneCaptured { phone, .. } => Some(phone),
        _ => None,
    };

    ctx.set_state(ConversationState::WaitingRegName { phone }).await?;
    ctx.handler
        .messaging_service
        .show_prompt(
            ctx.chat_id,
            ctx.message_id,
            "✅ Регистрация на сервисе\n\n📝 Как вас зовут?".to_string(),
        )
        .await?;
    Ok(())
}

use crate::bot_handler::{BotHandlerResult, Context, ConversationState};

/// `reply_<id>` pressed by a client under a company-reply notification.
pub async fn handle_client(ctx: Context<'_>, request_id: i64) -> BotHandlerResult<()> {
    ctx.set_state(ConversationState::WaitingReply { request_id }).await?;
    // Sent as a new message so the notification text stays visible.
    ctx.handler
        .messaging_service
        .show_prompt(ctx.chat_id, None, format!("💬 Напишите сообщение по заявке #{request_id}:"))
        .await?;
    Ok(())
}

/// `admin_reply_<id>` pressed in the admin channel.
pub async fn handle_admin(ctx: Context<'_>, request_id: i64) -> BotHandlerResult<()> {
    ctx.set_state(ConversationState::WaitingAdminReply { request_id }).await?;
    ctx.handler
        .messaging_service
        .show_prompt(ctx.chat_id, None, format!("💬 Напишите ответ клиенту по заявке #{request_id}:"))
        .await?;
    Ok(())
}

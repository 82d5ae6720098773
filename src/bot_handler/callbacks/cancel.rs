use crate::bot_handler::{BotHandlerResult, Context};

/// Cancel at any step wipes the conversation entry entirely.
pub async fn handle(ctx: Context<'_>) -> BotHandlerResult<()> {
    ctx.clear_state().await?;

    let registered =
        ctx.handler.portal_service.find_user_by_telegram(ctx.telegram_id()).await.is_some();

    ctx.handler
        .messaging_service
        .show_main_menu(
            ctx.chat_id,
            ctx.message_id,
            "❌ Операция отменена\n\nВыберите действие:".to_string(),
            registered,
        )
        .await?;
    Ok(())
}

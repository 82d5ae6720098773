use crate::bot_handler::{BotHandlerResult, Context};

pub async fn handle(ctx: Context<'_>) -> BotHandlerResult<()> {
    let requests =
        ctx.handler.portal_service.list_requests_by_telegram(ctx.telegram_id()).await;

    ctx.handler
        .messaging_service
        .show_requests_list(ctx.chat_id, ctx.message_id, requests)
        .await?;
    Ok(())
}

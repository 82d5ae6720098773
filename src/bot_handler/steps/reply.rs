use teloxide::types::ChatId;
use tracing::warn;

use crate::{
    bot_handler::{BotHandlerResult, Context},
    storage::SenderType,
};

/// Free text while a client reply is pending: append to the thread and ping
/// the admin channel.
pub async fn handle_client_text(
    ctx: Context<'_>,
    text: &str,
    request_id: i64,
) -> BotHandlerResult<()> {
    let appended =
        ctx.handler.portal_service.append_message(request_id, SenderType::Client, text).await;

    ctx.clear_state().await?;

    if !appended {
        ctx.handler
            .messaging_service
            .send_text(ctx.chat_id, "❌ Не удалось отправить сообщение. Попробуйте позже.".to_string())
            .await?;
        return Ok(());
    }

    let client_name = match ctx.handler.portal_service.request_with_user(request_id).await {
        Some((request, _)) => request.client_name,
        None => ctx.first_name().to_string(),
    };
    if let Err(e) = ctx
        .handler
        .messaging_service
        .notify_admin_client_reply(request_id, &client_name, text)
        .await
    {
        warn!(error = %e, request_id, "admin reply notification failed");
    }

    ctx.handler
        .messaging_service
        .send_text(ctx.chat_id, format!("✅ Сообщение по заявке #{request_id} отправлено."))
        .await?;
    Ok(())
}

/// Free text while an admin reply is pending: append a company message and
/// notify the linked client, if there is one to notify.
pub async fn handle_company_text(
    ctx: Context<'_>,
    text: &str,
    request_id: i64,
) -> BotHandlerResult<()> {
    let appended =
        ctx.handler.portal_service.append_message(request_id, SenderType::Company, text).await;

    ctx.clear_state().await?;

    if !appended {
        ctx.handler
            .messaging_service
            .send_text(ctx.chat_id, "❌ Не удалось отправить ответ. Попробуйте позже.".to_string())
            .await?;
        return Ok(());
    }

    // Clients without a linked telegram id are silently skipped.
    if let Some((_, Some(user))) = ctx.handler.portal_service.request_with_user(request_id).await {
        if let Some(telegram_id) = user.telegram_id {
            if let Err(e) = ctx
                .handler
                .messaging_service
                .notify_client_reply(ChatId(telegram_id), request_id, text)
                .await
            {
                warn!(error = %e, request_id, "client reply notification failed");
            }
        }
    }

    ctx.handler
        .messaging_service
        .send_text(ctx.chat_id, format!("✅ Ответ по заявке #{request_id} сохранён."))
        .await?;
    Ok(())
}

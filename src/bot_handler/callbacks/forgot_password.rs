use crate::bot_handler::{BotHandlerResult, Context};

/// Resets the password of the account linked to the pressing user. The
/// telegram link itself is the authentication.
pub async fn handle(ctx: Context<'_>) -> BotHandlerResult<()> {
    let Some(user) = ctx.handler.portal_service.find_user_by_telegram(ctx.telegram_id()).await
    else {
        ctx.handler
            .messaging_service
            .send_text(
                ctx.chat_id,
                "❌ Аккаунт не найден. Сначала зарегистрируйтесь через /start.".to_string(),
            )
            .await?;
        return Ok(());
    };

    match ctx.handler.portal_service.reset_password(user.id).await {
        Some(password) => {
            ctx.handler.messaging_service.send_new_password(ctx.chat_id, password).await?;
        }
        None => {
            ctx.handler
                .messaging_service
                .send_text(ctx.chat_id, "❌ Не удалось сбросить пароль. Попробуйте позже.".to_string())
                .await?;
        }
    }

    Ok(())
}

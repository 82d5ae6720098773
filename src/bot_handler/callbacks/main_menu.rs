use crate::bot_handler::{BotHandlerResult, Context};

pub async fn handle(ctx: Context<'_>) -> BotHandlerResult<()> {
    ctx.clear_state().await?;

    let user = ctx.handler.portal_service.find_user_by_telegram(ctx.telegram_id()).await;
    let (text, registered) = match &user {
        Some(user) => {
            (format!("👋 С возвращением, {}!\n\nВыберите действие:", user.name), true)
        }
        None => (format!("👋 Привет, {}!\n\nВыберите действие:", ctx.first_name()), false),
    };

    ctx.handler.messaging_service.show_main_menu(ctx.chat_id, ctx.message_id, text, registered).await?;
    Ok(())
}

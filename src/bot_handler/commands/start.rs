use crate::bot_handler::{BotHandlerResult, Context, ConversationState};

pub async fn handle(ctx: Context<'_>) -> BotHandlerResult<()> {
    let telegram_id = ctx.telegram_id();

    match ctx.handler.portal_service.find_user_by_telegram(telegram_id).await {
        Some(user) => {
            // A restart always drops whatever flow was in progress.
            ctx.clear_state().await?;
            let text = format!(
                "👋 С возвращением, {}!\n\n🚗 Сервис русификации мультимедиа готов \
                 помочь.\n\nВыберите действие:",
                user.name,
            );
            ctx.handler.messaging_service.show_main_menu(ctx.chat_id, None, text, true).await?;
        }
        None => {
            ctx.set_state(ConversationState::WaitingPhoneText).await?;
            let text = format!(
                "👋 Привет, {}!\n\n🚗 Я бот сервиса русификации автомобильных \
                 мультимедиа.\n\n📌 Я помогу:\n• Оставить заявку на русификацию\n• Следить за \
                 статусом заявок\n• Получать ответы сервиса\n\n📱 Поделитесь номером телефона \
                 кнопкой ниже или отправьте его сообщением:",
                ctx.first_name(),
            );
            ctx.handler.messaging_service.send_contact_request(ctx.chat_id, text).await?;
        }
    }

    Ok(())
}

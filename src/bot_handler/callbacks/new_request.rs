use crate::bot_handler::{BotHandlerResult, Context, ConversationState, RequestIdentity};

const CAR_PROMPT: &str = "🚗 Какой у вас автомобиль? (марка и модель)";

pub async fn handle(ctx: Context<'_>) -> BotHandlerResult<()> {
    if let Some(user) = ctx.handler.portal_service.find_user_by_telegram(ctx.telegram_id()).await {
        let name = user.name.clone();
        let identity = RequestIdentity::Known {
            user_id: user.id,
            name: user.name,
            phone: user.phone,
            email: user.email,
        };
        ctx.set_state(ConversationState::WaitingCar { identity }).await?;
        ctx.handler
            .messaging_service
            .show_prompt(
                ctx.chat_id,
                ctx.message_id,
                format!("✅ Вы вошли как {name}\n\n{CAR_PROMPT}"),
            )
            .await?;
        return Ok(());
    }

    match ctx.state().await? {
        ConversationState::PhoneCaptured { name, phone } => {
            let identity = RequestIdentity::Anonymous { name, phone };
            ctx.set_state(ConversationState::WaitingCar { identity }).await?;
            ctx.handler
                .messaging_service
                .show_prompt(
                    ctx.chat_id,
                    ctx.message_id,
                    format!("📝 Создание заявки\n\n{CAR_PROMPT}"),
                )
                .await?;
        }
        _ => {
            // No identity at all yet: capture a phone first.
            ctx.set_state(ConversationState::WaitingPhoneText).await?;
            ctx.handler
                .messaging_service
                .send_contact_request(
                    ctx.chat_id,
                    "📝 Создание заявки\n\n📱 Сначала поделитесь номером телефона кнопкой ниже \
                     или отправьте его сообщением:"
                        .to_string(),
                )
                .await?;
        }
    }

    Ok(())
}

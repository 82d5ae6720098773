use tracing::warn;

use crate::bot_handler::{BotHandlerResult, Context, ConversationState, RequestIdentity};

pub const CAR_YEAR_PROMPT: &str = "📅 Укажите год выпуска автомобиля:";
pub const DESCRIPTION_PROMPT: &str = "💬 Опишите проблему или нужную услугу:";

const MIN_CAR_YEAR: i64 = 1990;
const MAX_CAR_YEAR: i64 = 2030;

/// Car brand and model.
pub async fn handle_car(
    ctx: Context<'_>,
    text: &str,
    identity: RequestIdentity,
) -> BotHandlerResult<()> {
    let car = text.trim();
    if car.chars().count() < 2 {
        ctx.handler
            .messaging_service
            .show_prompt(ctx.chat_id, None, "❌ Укажите марку и модель автомобиля:".to_string())
            .await?;
        return Ok(());
    }

    ctx.set_state(ConversationState::WaitingCarYear { identity, car: car.to_string() }).await?;
    ctx.handler
        .messaging_service
        .show_prompt(ctx.chat_id, None, CAR_YEAR_PROMPT.to_string())
        .await?;
    Ok(())
}

/// Car year. Anything but a 4-digit number in range re-prompts without
/// touching the fields captured so far.
pub async fn handle_car_year(
    ctx: Context<'_>,
    text: &str,
    identity: RequestIdentity,
    car: String,
) -> BotHandlerResult<()> {
    match parse_year(text) {
        Some(car_year) => {
            ctx.set_state(ConversationState::WaitingMessage { identity, car, car_year }).await?;
            ctx.handler
                .messaging_service
                .show_prompt(ctx.chat_id, None, DESCRIPTION_PROMPT.to_string())
                .await?;
        }
        None => {
            ctx.handler
                .messaging_service
                .show_prompt(
                    ctx.chat_id,
                    None,
                    format!(
                        "❌ Укажите корректный год выпуска ({MIN_CAR_YEAR}–{MAX_CAR_YEAR}):"
                    ),
                )
                .await?;
        }
    }
    Ok(())
}

/// Problem description: the final step, creates the request.
pub async fn handle_description(
    ctx: Context<'_>,
    text: &str,
    identity: RequestIdentity,
    car: String,
    car_year: i64,
) -> BotHandlerResult<()> {
    let description = text.trim();

    let request_id = ctx
        .handler
        .portal_service
        .create_request(
            identity.user_id(),
            identity.name().to_string(),
            identity.phone().to_string(),
            identity.email(),
            car.clone(),
            Some(car_year),
            description.to_string(),
        )
        .await;

    ctx.clear_state().await?;

    match request_id {
        Some(request_id) => {
            // Best-effort: a failed admin notification never blocks the
            // user-facing confirmation.
            if let Err(e) = ctx
                .handler
                .messaging_service
                .notify_admin_new_request(
                    request_id,
                    identity.name(),
                    identity.phone(),
                    &car,
                    description,
                )
                .await
            {
                warn!(error = %e, request_id, "admin notification failed");
            }

            ctx.handler.messaging_service.send_request_created(ctx.chat_id, request_id).await?;
        }
        None => {
            ctx.handler
                .messaging_service
                .send_text(
                    ctx.chat_id,
                    "❌ Ошибка создания заявки. Попробуйте позже.\n\n/start — вернуться в меню"
                        .to_string(),
                )
                .await?;
        }
    }

    Ok(())
}

fn parse_year(text: &str) -> Option<i64> {
    let trimmed = text.trim();
    if trimmed.len() != 4 || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let year: i64 = trimmed.parse().ok()?;
    (MIN_CAR_YEAR..=MAX_CAR_YEAR).contains(&year).then_some(year)
}

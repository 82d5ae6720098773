use std::sync::Arc;

use axum::{Json, Router, body::Bytes, extract::State, routing::post};
use serde_json::{Value, json};
use teloxide::types::Update;
use tower_http::cors::CorsLayer;
use tracing::warn;

use crate::{dispatcher::BotDispatcher, messaging::MessagingService};

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<BotDispatcher>,
    pub messaging: Arc<dyn MessagingService>,
}

/// Webhook router.
///
/// `POST /` takes a Telegram update; the response is `200 {"ok": true}` no
/// matter what happened inside, because anything else makes Telegram retry
/// the same update in a loop. `GET /` re-registers the bot commands as a side
/// effect. Preflight `OPTIONS` is answered by the permissive CORS layer.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", post(receive_update).get(refresh_commands))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn receive_update(State(state): State<AppState>, body: Bytes) -> Json<Value> {
    match serde_json::from_slice::<Update>(&body) {
        Ok(update) => state.dispatcher.route_update(update).await,
        Err(e) => warn!(error = %e, "failed to parse webhook update"),
    }
    Json(json!({ "ok": true }))
}

async fn refresh_commands(State(state): State<AppState>) -> Json<Value> {
    if let Err(e) = state.messaging.register_commands().await {
        warn!(error = %e, "failed to register bot commands");
    }
    Json(json!({ "ok": true }))
}

#![warn(missing_docs)]
//! A Telegram bot for an automotive multimedia-russification service.
//!
//! The bot runs behind a Telegram webhook and drives a per-user conversation:
//! phone capture and account linking, registration, request creation and
//! reply threading between clients and the admin channel.

/// The dialogue controller and conversation state machine.
pub mod bot_handler;
/// The configuration for the application.
pub mod config;
/// The dispatcher routing webhook updates to the handlers.
pub mod dispatcher;
/// The service for sending messages to users and the admin channel.
pub mod messaging;
/// Phone number normalization.
pub mod phone;
/// The portal service consumed by the dialogue controller.
pub mod repository;
/// The storage layer for users, requests and request messages.
pub mod storage;
/// The webhook HTTP server.
pub mod webhook;

use std::sync::Arc;

use teloxide::{dispatching::dialogue::serializer, prelude::*, types::ChatId};

use crate::{
    bot_handler::{BotHandler, DialogueStorage},
    config::Config,
    dispatcher::BotDispatcher,
    messaging::{MessagingService, TelegramMessagingService},
    repository::DefaultPortalService,
    storage::sqlite::SqliteStorage,
    webhook::AppState,
};

/// Runs the bot.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;

    let storage = Arc::new(SqliteStorage::new(&config.database_url).await?);
    let bot = Bot::new(config.telegram_bot_token.clone());

    let messaging_service: Arc<dyn MessagingService> = Arc::new(TelegramMessagingService::new(
        bot,
        ChatId(config.admin_chat_id),
        config.site_url.clone(),
    ));
    let portal_service = Arc::new(DefaultPortalService::new(storage));
    let handler = Arc::new(BotHandler::new(messaging_service.clone(), portal_service));

    // Dialogue state shares the application database so it survives restarts.
    let dialogue_storage = DialogueStorage::open(&config.database_url, serializer::Json).await?;
    let dispatcher = Arc::new(BotDispatcher::new(handler, dialogue_storage));

    let app = webhook::router(AppState { dispatcher, messaging: messaging_service });
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "webhook server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

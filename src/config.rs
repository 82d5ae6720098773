use std::env;

use thiserror::Error;

const DEFAULT_DATABASE_URL: &str = "sqlite:data/data.db";
const DEFAULT_SITE_URL: &str = "https://russify.example.com";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable {0}")]
    MissingVar(&'static str),
    #[error("TELEGRAM_CHAT_ID must be an integer: {0}")]
    InvalidAdminChatId(#[from] std::num::ParseIntError),
}

/// Represents the application configuration.
#[derive(Debug)]
pub struct Config {
    /// The Telegram bot token.
    pub telegram_bot_token: String,
    /// Chat id that receives admin notifications (new requests, replies).
    pub admin_chat_id: i64,
    /// The URL of the database.
    pub database_url: String,
    /// Partner-portal URL used for web-app buttons.
    pub site_url: String,
    /// Address the webhook server listens on.
    pub bind_addr: String,
}

impl Config {
    /// Creates a new `Config` instance from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            telegram_bot_token: env::var("TELEGRAM_BOT_TOKEN")
                .map_err(|_| ConfigError::MissingVar("TELEGRAM_BOT_TOKEN"))?,
            admin_chat_id: env::var("TELEGRAM_CHAT_ID")
                .map_err(|_| ConfigError::MissingVar("TELEGRAM_CHAT_ID"))?
                .parse()?,
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            site_url: env::var("SITE_URL").unwrap_or_else(|_| DEFAULT_SITE_URL.to_string()),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
        })
    }
}

mod entities;
pub mod sqlite;

use async_trait::async_trait;
pub use entities::{NewRequest, NewUser, RequestStatus, SenderType, ServiceRequest, User};
use mockall::automock;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    DbError(#[from] sqlx::Error),
    #[error("Migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Persistence layer consumed by the portal service.
#[automock]
#[async_trait]
pub trait BotStorage: Send + Sync {
    /// Look up a user by their linked Telegram id.
    async fn find_user_by_telegram(&self, telegram_id: i64) -> StorageResult<Option<User>>;

    /// Look up a user by canonical phone number.
    async fn find_user_by_phone(&self, phone: &str) -> StorageResult<Option<User>>;

    /// Attach a Telegram id (and username) to an existing user row.
    async fn link_telegram(
        &self,
        user_id: i64,
        telegram_id: i64,
        telegram_username: Option<String>,
    ) -> StorageResult<bool>;

    /// Insert a new user row, returning its id. Fails on duplicate phone or
    /// telegram id (unique columns).
    async fn insert_user(&self, user: NewUser) -> StorageResult<i64>;

    /// Replace the stored password hash for a user.
    async fn update_password_hash(&self, user_id: i64, password_hash: &str) -> StorageResult<bool>;

    /// Insert a new service request with status `pending`, returning its id.
    async fn insert_request(&self, request: NewRequest) -> StorageResult<i64>;

    /// Requests belonging to the user linked to `telegram_id`, newest first.
    async fn requests_by_telegram(
        &self,
        telegram_id: i64,
        limit: i64,
    ) -> StorageResult<Vec<ServiceRequest>>;

    /// Append a message to a request thread. Returns `false` when the request
    /// row does not exist.
    async fn insert_message(
        &self,
        request_id: i64,
        sender_type: SenderType,
        text: &str,
    ) -> StorageResult<bool>;

    /// A request together with its linked user, if any.
    async fn request_with_user(
        &self,
        request_id: i64,
    ) -> StorageResult<Option<(ServiceRequest, Option<User>)>>;
}

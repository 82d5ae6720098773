use chrono::Utc;
use sqlx::{Pool, Sqlite, SqlitePool};
use tracing::debug;

use crate::storage::{
    BotStorage, NewRequest, NewUser, SenderType, ServiceRequest, StorageResult, User,
};
use async_trait::async_trait;

const USER_COLUMNS: &str =
    "id, name, phone, email, password_hash, telegram_id, telegram_username, user_role";
const REQUEST_COLUMNS: &str = "id, user_id, client_name, client_phone, client_email, car_brand, \
                               car_model, car_year, description, status, created_at";

pub struct SqliteStorage {
    pool: Pool<Sqlite>,
}

impl SqliteStorage {
    pub async fn new(database_url: &str) -> StorageResult<Self> {
        debug!("Connecting to SQLite database: {}", database_url);
        let pool = SqlitePool::connect(database_url).await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        debug!("SQLite database migrated");

        Ok(Self { pool })
    }
}

#[async_trait]
impl BotStorage for SqliteStorage {
    async fn find_user_by_telegram(&self, telegram_id: i64) -> StorageResult<Option<User>> {
        debug!("Looking up user by telegram id: {}", telegram_id);

        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE telegram_id = ?"
        ))
        .bind(telegram_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user_by_phone(&self, phone: &str) -> StorageResult<Option<User>> {
        debug!("Looking up user by phone: {}", phone);

        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE phone = ?"
        ))
        .bind(phone)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn link_telegram(
        &self,
        user_id: i64,
        telegram_id: i64,
        telegram_username: Option<String>,
    ) -> StorageResult<bool> {
        debug!("Linking telegram id {} to user {}", telegram_id, user_id);

        let result =
            sqlx::query("UPDATE users SET telegram_id = ?, telegram_username = ? WHERE id = ?")
                .bind(telegram_id)
                .bind(telegram_username)
                .bind(user_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_user(&self, user: NewUser) -> StorageResult<i64> {
        debug!("Inserting user: {}", user.name);

        let result = sqlx::query(
            "INSERT INTO users (telegram_id, telegram_username, name, phone, email, \
             password_hash, user_role) VALUES (?, ?, ?, ?, ?, ?, 'user')",
        )
        .bind(user.telegram_id)
        .bind(user.telegram_username)
        .bind(user.name)
        .bind(user.phone)
        .bind(user.email)
        .bind(user.password_hash)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn update_password_hash(&self, user_id: i64, password_hash: &str) -> StorageResult<bool> {
        debug!("Updating password hash for user {}", user_id);

        let result = sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
            .bind(password_hash)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_request(&self, request: NewRequest) -> StorageResult<i64> {
        debug!("Inserting request for {}", request.client_name);

        let created_at = Utc::now().timestamp();

        let result = sqlx::query(
            "INSERT INTO russification_requests (user_id, client_name, client_phone, \
             client_email, car_brand, car_model, car_year, description, status, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, 'pending', ?)",
        )
        .bind(request.user_id)
        .bind(request.client_name)
        .bind(request.client_phone)
        .bind(request.client_email)
        .bind(request.car_brand)
        .bind(request.car_model)
        .bind(request.car_year)
        .bind(request.description)
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn requests_by_telegram(
        &self,
        telegram_id: i64,
        limit: i64,
    ) -> StorageResult<Vec<ServiceRequest>> {
        debug!("Listing requests for telegram id: {}", telegram_id);

        let requests = sqlx::query_as::<_, ServiceRequest>(
            "SELECT r.id, r.user_id, r.client_name, r.client_phone, r.client_email, \
             r.car_brand, r.car_model, r.car_year, r.description, r.status, r.created_at \
             FROM russification_requests r \
             JOIN users u ON r.user_id = u.id \
             WHERE u.telegram_id = ? \
             ORDER BY r.created_at DESC, r.id DESC LIMIT ?",
        )
        .bind(telegram_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(requests)
    }

    async fn insert_message(
        &self,
        request_id: i64,
        sender_type: SenderType,
        text: &str,
    ) -> StorageResult<bool> {
        debug!("Appending {} message to request {}", sender_type.as_str(), request_id);

        let exists = sqlx::query("SELECT id FROM russification_requests WHERE id = ?")
            .bind(request_id)
            .fetch_optional(&self.pool)
            .await?;
        if exists.is_none() {
            return Ok(false);
        }

        let created_at = Utc::now().timestamp();

        sqlx::query(
            "INSERT INTO request_messages (request_id, sender_type, message_text, created_at) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(request_id)
        .bind(sender_type)
        .bind(text)
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        Ok(true)
    }

    async fn request_with_user(
        &self,
        request_id: i64,
    ) -> StorageResult<Option<(ServiceRequest, Option<User>)>> {
        debug!("Fetching request {} with its user", request_id);

        let request = sqlx::query_as::<_, ServiceRequest>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM russification_requests WHERE id = ?"
        ))
        .bind(request_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(request) = request else {
            return Ok(None);
        };

        let user = match request.user_id {
            Some(user_id) => {
                sqlx::query_as::<_, User>(&format!(
                    "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
                ))
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?
            }
            None => None,
        };

        Ok(Some((request, user)))
    }
}


use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use rand::{Rng, distributions::Alphanumeric};
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::storage::{BotStorage, NewRequest, NewUser, SenderType, ServiceRequest, User};

const PASSWORD_LEN: usize = 12;
const REQUESTS_PAGE_LIMIT: i64 = 10;

/// Generates a random alphanumeric password for a new or reset account.
pub fn generate_password() -> String {
    rand::thread_rng().sample_iter(&Alphanumeric).take(PASSWORD_LEN).map(char::from).collect()
}

fn sha256_hex(input: &str) -> String {
    Sha256::digest(input.as_bytes()).iter().map(|b| format!("{b:02x}")).collect()
}

/// Portal-side operations consumed by the dialogue controller.
///
/// Every operation is fail-soft: a `None`/`false`/empty return means "report a
/// generic failure to the user", never a distinguished error code. Storage
/// errors are logged here and mapped to misses.
#[automock]
#[async_trait]
pub trait PortalService: Send + Sync {
    async fn find_user_by_telegram(&self, telegram_id: i64) -> Option<User>;

    async fn find_user_by_phone(&self, phone: &str) -> Option<User>;

    async fn link_telegram(
        &self,
        user_id: i64,
        telegram_id: i64,
        telegram_username: Option<String>,
    ) -> bool;

    /// Registers a new user with the supplied plaintext password; only its
    /// SHA-256 hash is stored.
    async fn register_user(
        &self,
        telegram_id: i64,
        telegram_username: Option<String>,
        name: String,
        phone: String,
        password: String,
    ) -> bool;

    /// Replaces the user's password with a freshly generated one and returns
    /// the plaintext for one-time delivery.
    async fn reset_password(&self, user_id: i64) -> Option<String>;

    /// Creates a `pending` request. `car` is split into brand and model at
    /// the first space.
    #[allow(clippy::too_many_arguments)]
    async fn create_request(
        &self,
        user_id: Option<i64>,
        name: String,
        phone: String,
        email: Option<String>,
        car: String,
        car_year: Option<i64>,
        description: String,
    ) -> Option<i64>;

    async fn list_requests_by_telegram(&self, telegram_id: i64) -> Vec<ServiceRequest>;

    async fn append_message(&self, request_id: i64, sender_type: SenderType, text: &str) -> bool;

    async fn request_with_user(&self, request_id: i64) -> Option<(ServiceRequest, Option<User>)>;
}

pub struct DefaultPortalService {
    storage: Arc<dyn BotStorage>,
}

impl DefaultPortalService {
    pub fn new(storage: Arc<dyn BotStorage>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl PortalService for DefaultPortalService {
    async fn find_user_by_telegram(&self, telegram_id: i64) -> Option<User> {
        match self.storage.find_user_by_telegram(telegram_id).await {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, telegram_id, "user lookup by telegram id failed");
                None
            }
        }
    }

    async fn find_user_by_phone(&self, phone: &str) -> Option<User> {
        match self.storage.find_user_by_phone(phone).await {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "user lookup by phone failed");
                None
            }
        }
    }

    async fn link_telegram(
        &self,
        user_id: i64,
        telegram_id: i64,
        telegram_username: Option<String>,
    ) -> bool {
        match self.storage.link_telegram(user_id, telegram_id, telegram_username).await {
            Ok(linked) => linked,
            Err(e) => {
                warn!(error = %e, user_id, "linking telegram id failed");
                false
            }
        }
    }

    async fn register_user(
        &self,
        telegram_id: i64,
        telegram_username: Option<String>,
        name: String,
        phone: String,
        password: String,
    ) -> bool {
        let user = NewUser {
            telegram_id: Some(telegram_id),
            telegram_username,
            name,
            phone,
            email: None,
            password_hash: sha256_hex(&password),
        };

        match self.storage.insert_user(user).await {
            Ok(_) => true,
            Err(e) => {
                // Most commonly a duplicate phone or telegram id.
                warn!(error = %e, "user registration failed");
                false
            }
        }
    }

    async fn reset_password(&self, user_id: i64) -> Option<String> {
        let password = generate_password();

        match self.storage.update_password_hash(user_id, &sha256_hex(&password)).await {
            Ok(true) => Some(password),
            Ok(false) => None,
            Err(e) => {
                warn!(error = %e, user_id, "password reset failed");
                None
            }
        }
    }

    async fn create_request(
        &self,
        user_id: Option<i64>,
        name: String,
        phone: String,
        email: Option<String>,
        car: String,
        car_year: Option<i64>,
        description: String,
    ) -> Option<i64> {
        let (car_brand, car_model) = match car.split_once(' ') {
            Some((brand, model)) => (brand.to_string(), model.to_string()),
            None => (car, String::new()),
        };

        let request = NewRequest {
            user_id,
            client_name: name,
            client_phone: phone,
            client_email: email,
            car_brand,
            car_model,
            car_year,
            description,
        };

        match self.storage.insert_request(request).await {
            Ok(id) => Some(id),
            Err(e) => {
                warn!(error = %e, "request creation failed");
                None
            }
        }
    }

    async fn list_requests_by_telegram(&self, telegram_id: i64) -> Vec<ServiceRequest> {
        match self.storage.requests_by_telegram(telegram_id, REQUESTS_PAGE_LIMIT).await {
            Ok(requests) => requests,
            Err(e) => {
                warn!(error = %e, telegram_id, "request listing failed");
                Vec::new()
            }
        }
    }

    async fn append_message(&self, request_id: i64, sender_type: SenderType, text: &str) -> bool {
        match self.storage.insert_message(request_id, sender_type, text).await {
            Ok(appended) => appended,
            Err(e) => {
                warn!(error = %e, request_id, "message append failed");
                false
            }
        }
    }

    async fn request_with_user(&self, request_id: i64) -> Option<(ServiceRequest, Option<User>)> {
        match self.storage.request_with_user(request_id).await {
            Ok(found) => found,
            Err(e) => {
                warn!(error = %e, request_id, "request lookup failed");
                None
            }
        }
    }
}

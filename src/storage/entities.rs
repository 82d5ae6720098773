use std::fmt;

/// A partner-portal user row.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub password_hash: String,
    pub telegram_id: Option<i64>,
    pub telegram_username: Option<String>,
    pub user_role: String,
}

/// Fields required to insert a new user.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub telegram_id: Option<i64>,
    pub telegram_username: Option<String>,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub password_hash: String,
}

/// Lifecycle of a russification request. Transitions beyond `Pending` happen
/// in the admin subsystem; the bot only creates and displays them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl RequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A russification request row. `user_id` is `None` for anonymous requests.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct ServiceRequest {
    pub id: i64,
    pub user_id: Option<i64>,
    pub client_name: String,
    pub client_phone: String,
    pub client_email: Option<String>,
    pub car_brand: String,
    pub car_model: String,
    pub car_year: Option<i64>,
    pub description: String,
    pub status: RequestStatus,
    /// Unix seconds.
    pub created_at: i64,
}

impl ServiceRequest {
    /// `car_brand` and `car_model` joined for display.
    pub fn car(&self) -> String {
        if self.car_model.is_empty() {
            self.car_brand.clone()
        } else {
            format!("{} {}", self.car_brand, self.car_model)
        }
    }
}

/// Fields required to insert a new request.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRequest {
    pub user_id: Option<i64>,
    pub client_name: String,
    pub client_phone: String,
    pub client_email: Option<String>,
    pub car_brand: String,
    pub car_model: String,
    pub car_year: Option<i64>,
    pub description: String,
}

/// Which side of a request thread a message came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
pub enum SenderType {
    Client,
    Company,
}

impl SenderType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Company => "company",
        }
    }
}

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub uuid: Uuid,
    pub is_active: bool,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

/// Registration input; `password_hash` is already a PHC string
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
}

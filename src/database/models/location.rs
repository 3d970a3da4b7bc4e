use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Location {
    pub id: i64,
    pub user_id: i64,
    pub uuid: Uuid,
    pub name: String,
    pub address: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewLocation {
    pub user_id: i64,
    pub name: String,
    pub address: String,
}

/// Listing filter for a user's locations
#[derive(Debug, Clone, Default)]
pub struct LocationFilter {
    pub user_id: i64,
    /// Only locations that at least one container is attached to
    pub attached_to_container: bool,
}

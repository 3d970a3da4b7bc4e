use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// A box owned directly by a user, optionally placed at one of that user's locations.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Container {
    pub id: i64,
    pub user_id: i64,
    pub location_id: Option<i64>,
    pub uuid: Uuid,
    pub name: String,
    pub item_count: i64,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewContainer {
    pub user_id: i64,
    pub location_id: Option<i64>,
    pub name: String,
}

#[derive(Debug, Clone, Default)]
pub struct ContainerFilter {
    pub user_id: i64,
    /// Empty means any location, including none
    pub location_ids: Vec<i64>,
}

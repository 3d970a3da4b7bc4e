use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use super::Container;

/// An item together with the container it lives in.
///
/// The container is always loaded because authorization is decided by the
/// container's owner.
#[derive(Debug, Clone, Serialize)]
pub struct Item {
    pub id: i64,
    pub container_id: i64,
    #[serde(skip)]
    pub container: Container,
    pub uuid: Uuid,
    pub body: String,
    pub quantity: i32,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

/// Row shape of `container_items` before its container is attached
#[derive(Debug, Clone, FromRow)]
pub struct ItemRow {
    pub id: i64,
    pub container_id: i64,
    pub uuid: Uuid,
    pub body: String,
    pub quantity: i32,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl ItemRow {
    pub fn with_container(self, container: Container) -> Item {
        Item {
            id: self.id,
            container_id: self.container_id,
            container,
            uuid: self.uuid,
            body: self.body,
            quantity: self.quantity,
            created: self.created,
            modified: self.modified,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewItem {
    pub container_id: i64,
    pub body: String,
    pub quantity: i32,
}

/// Collapse items to the distinct users that own their containers.
pub fn owners_of<'a>(items: impl IntoIterator<Item = &'a Item>) -> Vec<i64> {
    let mut owners: Vec<i64> = Vec::new();
    for item in items {
        if !owners.contains(&item.container.user_id) {
            owners.push(item.container.user_id);
        }
    }
    owners
}

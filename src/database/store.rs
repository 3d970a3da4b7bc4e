use async_trait::async_trait;
use thiserror::Error;

use crate::database::models::{
    Container, ContainerFilter, Item, Location, LocationFilter, NewContainer, NewItem, NewLocation, NewUser, User,
};
use crate::database::pagination::{Limit, Page, SortBy};

/// Errors from the record stores
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_) | StoreError::Sqlx(sqlx::Error::RowNotFound))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn user_by_id(&self, id: i64) -> StoreResult<User>;

    async fn user_by_email(&self, email: &str) -> StoreResult<User>;

    /// Fails with `Conflict` when the email is already registered
    async fn create_user(&self, new: NewUser) -> StoreResult<User>;
}

#[async_trait]
pub trait LocationStore: Send + Sync {
    async fn location_by_id(&self, id: i64) -> StoreResult<Location>;

    async fn create_location(&self, new: NewLocation) -> StoreResult<Location>;

    async fn update_location(&self, location: &Location) -> StoreResult<()>;

    /// Containers at the location are detached, not removed
    async fn delete_location(&self, id: i64) -> StoreResult<()>;

    async fn filtered_locations(&self, filter: &LocationFilter, sort: SortBy, limit: Limit) -> StoreResult<Page<Location>>;
}

#[async_trait]
pub trait ContainerStore: Send + Sync {
    async fn container_by_id(&self, id: i64) -> StoreResult<Container>;

    async fn create_container(&self, new: NewContainer) -> StoreResult<Container>;

    /// Persists `name` and `location_id`
    async fn update_container(&self, container: &Container) -> StoreResult<()>;

    /// Removes the container and every item in it
    async fn delete_container(&self, id: i64) -> StoreResult<()>;

    async fn filtered_containers(
        &self,
        filter: &ContainerFilter,
        sort: SortBy,
        limit: Limit,
    ) -> StoreResult<Page<Container>>;
}

#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Loads the item with its container attached
    async fn item_by_id(&self, id: i64) -> StoreResult<Item>;

    async fn create_item(&self, new: NewItem) -> StoreResult<Item>;

    /// Persists `body` and `quantity`
    async fn update_item(&self, item: &Item) -> StoreResult<()>;

    async fn delete_item(&self, item: &Item) -> StoreResult<()>;

    /// Removes all given items as one unit, returning how many rows went away
    async fn delete_items(&self, items: &[Item]) -> StoreResult<u64>;

    async fn container_items(&self, container: &Container, sort: SortBy, limit: Limit) -> StoreResult<Page<Item>>;

    /// Case-insensitive substring match on item bodies across the user's containers
    async fn search_items(&self, user_id: i64, term: &str, sort: SortBy, limit: Limit) -> StoreResult<Page<Item>>;
}

/// Everything the HTTP layer needs from persistence
#[async_trait]
pub trait Store: UserStore + LocationStore + ContainerStore + ItemStore {
    /// Liveness check used by the health endpoint
    async fn ping(&self) -> StoreResult<()>;
}

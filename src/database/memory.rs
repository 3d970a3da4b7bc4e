use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::models::{
    Container, ContainerFilter, Item, ItemRow, Location, LocationFilter, NewContainer, NewItem, NewLocation, NewUser,
    User,
};
use crate::database::pagination::{Limit, Page, SortBy, SortDirection, SortField};
use crate::database::store::{ContainerStore, ItemStore, LocationStore, Store, StoreError, StoreResult, UserStore};

#[derive(Default)]
struct Tables {
    next_id: i64,
    users: BTreeMap<i64, User>,
    locations: BTreeMap<i64, Location>,
    containers: BTreeMap<i64, Container>,
    items: BTreeMap<i64, ItemRow>,
}

impl Tables {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn container(&self, id: i64) -> StoreResult<Container> {
        let mut container = self
            .containers
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("container {}", id)))?;
        container.item_count = self.items.values().filter(|i| i.container_id == id).count() as i64;
        Ok(container)
    }

    fn item(&self, row: &ItemRow) -> StoreResult<Item> {
        Ok(row.clone().with_container(self.container(row.container_id)?))
    }
}

/// In-process record store. Used by `--memory` runs and the test suites.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    delete_batches: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `delete_items` calls served so far
    pub fn delete_batches(&self) -> usize {
        self.delete_batches.load(AtomicOrdering::SeqCst)
    }
}

enum SortKey<'a> {
    Text(&'a str),
    Number(i64),
    Time(DateTime<Utc>),
}

impl SortKey<'_> {
    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortKey::Text(a), SortKey::Text(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
            (SortKey::Number(a), SortKey::Number(b)) => a.cmp(b),
            (SortKey::Time(a), SortKey::Time(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

trait Sortable {
    fn id(&self) -> i64;
    fn key(&self, field: SortField) -> SortKey<'_>;
}

impl Sortable for Location {
    fn id(&self) -> i64 {
        self.id
    }

    fn key(&self, field: SortField) -> SortKey<'_> {
        match field {
            SortField::Address => SortKey::Text(&self.address),
            SortField::Created => SortKey::Time(self.created),
            SortField::Modified => SortKey::Time(self.modified),
            _ => SortKey::Text(&self.name),
        }
    }
}

impl Sortable for Container {
    fn id(&self) -> i64 {
        self.id
    }

    fn key(&self, field: SortField) -> SortKey<'_> {
        match field {
            SortField::Created => SortKey::Time(self.created),
            SortField::Modified => SortKey::Time(self.modified),
            _ => SortKey::Text(&self.name),
        }
    }
}

impl Sortable for Item {
    fn id(&self) -> i64 {
        self.id
    }

    fn key(&self, field: SortField) -> SortKey<'_> {
        match field {
            SortField::Quantity => SortKey::Number(i64::from(self.quantity)),
            SortField::Modified => SortKey::Time(self.modified),
            SortField::Body | SortField::Name | SortField::Address => SortKey::Text(&self.body),
            SortField::Created => SortKey::Time(self.created),
        }
    }
}

fn paginate<T: Sortable>(mut rows: Vec<T>, sort: SortBy, limit: Limit) -> Page<T> {
    rows.sort_by(|a, b| {
        let ordering = a
            .key(sort.field)
            .compare(&b.key(sort.field))
            .then_with(|| a.id().cmp(&b.id()));
        match sort.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
    let total = rows.len() as i64;
    let data = rows
        .into_iter()
        .skip(limit.offset() as usize)
        .take(limit.per_page as usize)
        .collect();
    Page::new(data, total, limit)
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn user_by_id(&self, id: i64) -> StoreResult<User> {
        let tables = self.tables.read().await;
        tables
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("user {}", id)))
    }

    async fn user_by_email(&self, email: &str) -> StoreResult<User> {
        let tables = self.tables.read().await;
        tables
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("user {}", email)))
    }

    async fn create_user(&self, new: NewUser) -> StoreResult<User> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email.eq_ignore_ascii_case(&new.email)) {
            return Err(StoreError::Conflict("user already exists with given email".to_string()));
        }
        let now = Utc::now();
        let user = User {
            id: tables.allocate_id(),
            email: new.email,
            password: new.password_hash,
            uuid: Uuid::new_v4(),
            is_active: true,
            created: now,
            modified: now,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }
}

#[async_trait]
impl LocationStore for MemoryStore {
    async fn location_by_id(&self, id: i64) -> StoreResult<Location> {
        let tables = self.tables.read().await;
        tables
            .locations
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("location {}", id)))
    }

    async fn create_location(&self, new: NewLocation) -> StoreResult<Location> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let location = Location {
            id: tables.allocate_id(),
            user_id: new.user_id,
            uuid: Uuid::new_v4(),
            name: new.name,
            address: new.address,
            created: now,
            modified: now,
        };
        tables.locations.insert(location.id, location.clone());
        Ok(location)
    }

    async fn update_location(&self, location: &Location) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .locations
            .get_mut(&location.id)
            .ok_or_else(|| StoreError::NotFound(format!("location {}", location.id)))?;
        stored.name = location.name.clone();
        stored.address = location.address.clone();
        stored.modified = Utc::now();
        Ok(())
    }

    async fn delete_location(&self, id: i64) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        tables
            .locations
            .remove(&id)
            .ok_or_else(|| StoreError::NotFound(format!("location {}", id)))?;
        for container in tables.containers.values_mut() {
            if container.location_id == Some(id) {
                container.location_id = None;
            }
        }
        Ok(())
    }

    async fn filtered_locations(&self, filter: &LocationFilter, sort: SortBy, limit: Limit) -> StoreResult<Page<Location>> {
        let tables = self.tables.read().await;
        let rows = tables
            .locations
            .values()
            .filter(|l| l.user_id == filter.user_id)
            .filter(|l| {
                !filter.attached_to_container || tables.containers.values().any(|c| c.location_id == Some(l.id))
            })
            .cloned()
            .collect();
        Ok(paginate(rows, sort, limit))
    }
}

#[async_trait]
impl ContainerStore for MemoryStore {
    async fn container_by_id(&self, id: i64) -> StoreResult<Container> {
        self.tables.read().await.container(id)
    }

    async fn create_container(&self, new: NewContainer) -> StoreResult<Container> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let container = Container {
            id: tables.allocate_id(),
            user_id: new.user_id,
            location_id: new.location_id,
            uuid: Uuid::new_v4(),
            name: new.name,
            item_count: 0,
            created: now,
            modified: now,
        };
        tables.containers.insert(container.id, container.clone());
        Ok(container)
    }

    async fn update_container(&self, container: &Container) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .containers
            .get_mut(&container.id)
            .ok_or_else(|| StoreError::NotFound(format!("container {}", container.id)))?;
        stored.name = container.name.clone();
        stored.location_id = container.location_id;
        stored.modified = Utc::now();
        Ok(())
    }

    async fn delete_container(&self, id: i64) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        tables
            .containers
            .remove(&id)
            .ok_or_else(|| StoreError::NotFound(format!("container {}", id)))?;
        tables.items.retain(|_, row| row.container_id != id);
        Ok(())
    }

    async fn filtered_containers(
        &self,
        filter: &ContainerFilter,
        sort: SortBy,
        limit: Limit,
    ) -> StoreResult<Page<Container>> {
        let tables = self.tables.read().await;
        let rows = tables
            .containers
            .values()
            .filter(|c| c.user_id == filter.user_id)
            .filter(|c| {
                filter.location_ids.is_empty()
                    || c.location_id.map_or(false, |id| filter.location_ids.contains(&id))
            })
            .map(|c| tables.container(c.id))
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(paginate(rows, sort, limit))
    }
}

#[async_trait]
impl ItemStore for MemoryStore {
    async fn item_by_id(&self, id: i64) -> StoreResult<Item> {
        let tables = self.tables.read().await;
        let row = tables
            .items
            .get(&id)
            .ok_or_else(|| StoreError::NotFound(format!("item {}", id)))?;
        tables.item(row)
    }

    async fn create_item(&self, new: NewItem) -> StoreResult<Item> {
        let mut tables = self.tables.write().await;
        if !tables.containers.contains_key(&new.container_id) {
            return Err(StoreError::NotFound(format!("container {}", new.container_id)));
        }
        let now = Utc::now();
        let row = ItemRow {
            id: tables.allocate_id(),
            container_id: new.container_id,
            uuid: Uuid::new_v4(),
            body: new.body,
            quantity: new.quantity,
            created: now,
            modified: now,
        };
        tables.items.insert(row.id, row.clone());
        tables.item(&row)
    }

    async fn update_item(&self, item: &Item) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .items
            .get_mut(&item.id)
            .ok_or_else(|| StoreError::NotFound(format!("item {}", item.id)))?;
        stored.body = item.body.clone();
        stored.quantity = item.quantity;
        stored.modified = Utc::now();
        Ok(())
    }

    async fn delete_item(&self, item: &Item) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        tables
            .items
            .remove(&item.id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("item {}", item.id)))
    }

    async fn delete_items(&self, items: &[Item]) -> StoreResult<u64> {
        self.delete_batches.fetch_add(1, AtomicOrdering::SeqCst);
        let mut tables = self.tables.write().await;
        let removed = items
            .iter()
            .filter(|item| tables.items.remove(&item.id).is_some())
            .count();
        Ok(removed as u64)
    }

    async fn container_items(&self, container: &Container, sort: SortBy, limit: Limit) -> StoreResult<Page<Item>> {
        let tables = self.tables.read().await;
        let rows = tables
            .items
            .values()
            .filter(|row| row.container_id == container.id)
            .map(|row| tables.item(row))
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(paginate(rows, sort, limit))
    }

    async fn search_items(&self, user_id: i64, term: &str, sort: SortBy, limit: Limit) -> StoreResult<Page<Item>> {
        let needle = term.to_lowercase();
        let tables = self.tables.read().await;
        let rows = tables
            .items
            .values()
            .filter(|row| row.body.to_lowercase().contains(&needle))
            .map(|row| tables.item(row))
            .filter(|item| item.as_ref().map_or(true, |i| i.container.user_id == user_id))
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(paginate(rows, sort, limit))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::pagination::{SortDirection, SortField};

    fn sort(field: SortField, direction: SortDirection) -> SortBy {
        SortBy { field, direction }
    }

    async fn seeded() -> (MemoryStore, Container) {
        let store = MemoryStore::new();
        let container = store
            .create_container(NewContainer { user_id: 1, location_id: None, name: "garage".into() })
            .await
            .unwrap();
        for (body, quantity) in [("Red socks", 4), ("blue socks", 2), ("hammer", 1)] {
            store
                .create_item(NewItem { container_id: container.id, body: body.into(), quantity })
                .await
                .unwrap();
        }
        (store, container)
    }

    #[tokio::test]
    async fn item_count_tracks_contents() {
        let (store, container) = seeded().await;
        assert_eq!(store.container_by_id(container.id).await.unwrap().item_count, 3);
    }

    #[tokio::test]
    async fn search_is_case_insensitive_and_scoped_to_owner() {
        let (store, _) = seeded().await;
        let page = store
            .search_items(1, "SOCKS", sort(SortField::Quantity, SortDirection::Asc), Limit::new(1, 20))
            .await
            .unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.data[0].body, "blue socks");

        let other = store
            .search_items(2, "socks", sort(SortField::Created, SortDirection::Desc), Limit::new(1, 20))
            .await
            .unwrap();
        assert_eq!(other.total, 0);
    }

    #[tokio::test]
    async fn deleting_a_location_detaches_containers() {
        let store = MemoryStore::new();
        let location = store
            .create_location(NewLocation { user_id: 1, name: "home".into(), address: String::new() })
            .await
            .unwrap();
        let container = store
            .create_container(NewContainer { user_id: 1, location_id: Some(location.id), name: "attic".into() })
            .await
            .unwrap();

        store.delete_location(location.id).await.unwrap();
        assert_eq!(store.container_by_id(container.id).await.unwrap().location_id, None);
    }

    #[tokio::test]
    async fn pages_are_sliced_after_sorting() {
        let (store, container) = seeded().await;
        let page = store
            .container_items(&container, sort(SortField::Body, SortDirection::Asc), Limit::new(2, 2))
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].body, "Red socks");
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let store = MemoryStore::new();
        let new = NewUser { email: "a@example.com".into(), password_hash: "x".into() };
        store.create_user(new.clone()).await.unwrap();
        let err = store
            .create_user(NewUser { email: "A@example.com".into(), ..new })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }
}

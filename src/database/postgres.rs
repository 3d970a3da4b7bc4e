use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::database::models::{
    Container, ContainerFilter, Item, ItemRow, Location, LocationFilter, NewContainer, NewItem, NewLocation, NewUser,
    User,
};
use crate::database::pagination::{Limit, Page, SortBy};
use crate::database::store::{ContainerStore, ItemStore, LocationStore, Store, StoreError, StoreResult, UserStore};

const USER_COLUMNS: &str = "id, email, password, uuid, is_active, created, modified";

const LOCATION_COLUMNS: &str = "l.id, l.user_id, l.uuid, l.name, l.address, l.created, l.modified";

const CONTAINER_COLUMNS: &str = r#"
    c.id, c.user_id, c.location_id, c.uuid, c.name, c.created, c.modified,
    (SELECT COUNT(*) FROM container_items ci WHERE ci.container_id = c.id) AS item_count
"#;

const ITEM_COLUMNS: &str = "i.id, i.container_id, i.uuid, i.body, i.quantity, i.created, i.modified";

/// Record store backed by a Postgres connection pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        let url = config.url.as_deref().ok_or(StoreError::ConfigMissing("DATABASE_URL"))?;
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(url)
            .await?;
        info!("Created database pool (max {} connections)", config.max_connections);
        Ok(Self { pool })
    }

    /// Apply the bundled schema migrations
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    async fn containers_by_ids(&self, ids: Vec<i64>) -> StoreResult<HashMap<i64, Container>> {
        let sql = format!("SELECT {} FROM containers c WHERE c.id = ANY($1)", CONTAINER_COLUMNS);
        let containers = sqlx::query_as::<_, Container>(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(containers.into_iter().map(|c| (c.id, c)).collect())
    }

    async fn attach_containers(&self, rows: Vec<ItemRow>) -> StoreResult<Vec<Item>> {
        let mut ids: Vec<i64> = rows.iter().map(|r| r.container_id).collect();
        ids.sort_unstable();
        ids.dedup();
        let containers = self.containers_by_ids(ids).await?;

        rows.into_iter()
            .map(|row| {
                let container = containers
                    .get(&row.container_id)
                    .cloned()
                    .ok_or_else(|| StoreError::NotFound(format!("container {} of item {}", row.container_id, row.id)))?;
                Ok(row.with_container(container))
            })
            .collect()
    }
}

fn not_found(kind: &str, id: i64) -> StoreError {
    StoreError::NotFound(format!("{} {}", kind, id))
}

fn order_by(alias: &str, sort: SortBy) -> String {
    format!(
        "ORDER BY {alias}.{} {}, {alias}.id {}",
        sort.field.column(),
        sort.direction.as_sql(),
        sort.direction.as_sql(),
        alias = alias
    )
}

#[async_trait]
impl UserStore for PgStore {
    async fn user_by_id(&self, id: i64) -> StoreResult<User> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found("user", id))
    }

    async fn user_by_email(&self, email: &str) -> StoreResult<User> {
        let sql = format!("SELECT {} FROM users WHERE lower(email) = lower($1)", USER_COLUMNS);
        sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("user {}", email)))
    }

    async fn create_user(&self, new: NewUser) -> StoreResult<User> {
        let sql = format!(
            "INSERT INTO users (email, password, uuid, is_active, created, modified) \
             VALUES ($1, $2, $3, true, now(), now()) RETURNING {}",
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(&new.email)
            .bind(&new.password_hash)
            .bind(Uuid::new_v4())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    StoreError::Conflict("user already exists with given email".to_string())
                }
                other => other.into(),
            })
    }
}

#[async_trait]
impl LocationStore for PgStore {
    async fn location_by_id(&self, id: i64) -> StoreResult<Location> {
        let sql = format!("SELECT {} FROM locations l WHERE l.id = $1", LOCATION_COLUMNS);
        sqlx::query_as::<_, Location>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found("location", id))
    }

    async fn create_location(&self, new: NewLocation) -> StoreResult<Location> {
        let sql = format!(
            "INSERT INTO locations AS l (user_id, uuid, name, address, created, modified) \
             VALUES ($1, $2, $3, $4, now(), now()) RETURNING {}",
            LOCATION_COLUMNS
        );
        Ok(sqlx::query_as::<_, Location>(&sql)
            .bind(new.user_id)
            .bind(Uuid::new_v4())
            .bind(&new.name)
            .bind(&new.address)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update_location(&self, location: &Location) -> StoreResult<()> {
        let result = sqlx::query("UPDATE locations SET name = $1, address = $2, modified = now() WHERE id = $3")
            .bind(&location.name)
            .bind(&location.address)
            .bind(location.id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(not_found("location", location.id));
        }
        Ok(())
    }

    async fn delete_location(&self, id: i64) -> StoreResult<()> {
        // containers.location_id is ON DELETE SET NULL
        let result = sqlx::query("DELETE FROM locations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(not_found("location", id));
        }
        Ok(())
    }

    async fn filtered_locations(&self, filter: &LocationFilter, sort: SortBy, limit: Limit) -> StoreResult<Page<Location>> {
        let condition = "l.user_id = $1 \
             AND ($2 = false OR EXISTS (SELECT 1 FROM containers c WHERE c.location_id = l.id))";

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM locations l WHERE {}", condition))
            .bind(filter.user_id)
            .bind(filter.attached_to_container)
            .fetch_one(&self.pool)
            .await?;

        let sql = format!(
            "SELECT {} FROM locations l WHERE {} {} LIMIT $3 OFFSET $4",
            LOCATION_COLUMNS,
            condition,
            order_by("l", sort)
        );
        let rows = sqlx::query_as::<_, Location>(&sql)
            .bind(filter.user_id)
            .bind(filter.attached_to_container)
            .bind(i64::from(limit.per_page))
            .bind(limit.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok(Page::new(rows, total, limit))
    }
}

#[async_trait]
impl ContainerStore for PgStore {
    async fn container_by_id(&self, id: i64) -> StoreResult<Container> {
        let sql = format!("SELECT {} FROM containers c WHERE c.id = $1", CONTAINER_COLUMNS);
        sqlx::query_as::<_, Container>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found("container", id))
    }

    async fn create_container(&self, new: NewContainer) -> StoreResult<Container> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO containers (user_id, location_id, uuid, name, created, modified) \
             VALUES ($1, $2, $3, $4, now(), now()) RETURNING id",
        )
        .bind(new.user_id)
        .bind(new.location_id)
        .bind(Uuid::new_v4())
        .bind(&new.name)
        .fetch_one(&self.pool)
        .await?;
        self.container_by_id(id).await
    }

    async fn update_container(&self, container: &Container) -> StoreResult<()> {
        let result =
            sqlx::query("UPDATE containers SET name = $1, location_id = $2, modified = now() WHERE id = $3")
                .bind(&container.name)
                .bind(container.location_id)
                .bind(container.id)
                .execute(&self.pool)
                .await?;
        if result.rows_affected() == 0 {
            return Err(not_found("container", container.id));
        }
        Ok(())
    }

    async fn delete_container(&self, id: i64) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM container_items WHERE container_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM containers WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(not_found("container", id));
        }
        tx.commit().await?;
        Ok(())
    }

    async fn filtered_containers(
        &self,
        filter: &ContainerFilter,
        sort: SortBy,
        limit: Limit,
    ) -> StoreResult<Page<Container>> {
        let condition = "c.user_id = $1 AND (cardinality($2::bigint[]) = 0 OR c.location_id = ANY($2))";

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM containers c WHERE {}", condition))
            .bind(filter.user_id)
            .bind(&filter.location_ids)
            .fetch_one(&self.pool)
            .await?;

        let sql = format!(
            "SELECT {} FROM containers c WHERE {} {} LIMIT $3 OFFSET $4",
            CONTAINER_COLUMNS,
            condition,
            order_by("c", sort)
        );
        let rows = sqlx::query_as::<_, Container>(&sql)
            .bind(filter.user_id)
            .bind(&filter.location_ids)
            .bind(i64::from(limit.per_page))
            .bind(limit.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok(Page::new(rows, total, limit))
    }
}

#[async_trait]
impl ItemStore for PgStore {
    async fn item_by_id(&self, id: i64) -> StoreResult<Item> {
        let sql = format!("SELECT {} FROM container_items i WHERE i.id = $1", ITEM_COLUMNS);
        let row = sqlx::query_as::<_, ItemRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found("item", id))?;
        let container = self.container_by_id(row.container_id).await?;
        Ok(row.with_container(container))
    }

    async fn create_item(&self, new: NewItem) -> StoreResult<Item> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO container_items (container_id, uuid, body, quantity, created, modified) \
             VALUES ($1, $2, $3, $4, now(), now()) RETURNING id",
        )
        .bind(new.container_id)
        .bind(Uuid::new_v4())
        .bind(&new.body)
        .bind(new.quantity)
        .fetch_one(&self.pool)
        .await?;
        self.item_by_id(id).await
    }

    async fn update_item(&self, item: &Item) -> StoreResult<()> {
        let result =
            sqlx::query("UPDATE container_items SET body = $1, quantity = $2, modified = now() WHERE id = $3")
                .bind(&item.body)
                .bind(item.quantity)
                .bind(item.id)
                .execute(&self.pool)
                .await?;
        if result.rows_affected() == 0 {
            return Err(not_found("item", item.id));
        }
        Ok(())
    }

    async fn delete_item(&self, item: &Item) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM container_items WHERE id = $1")
            .bind(item.id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(not_found("item", item.id));
        }
        Ok(())
    }

    async fn delete_items(&self, items: &[Item]) -> StoreResult<u64> {
        let ids: Vec<i64> = items.iter().map(|i| i.id).collect();
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("DELETE FROM container_items WHERE id = ANY($1)")
            .bind(&ids)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected())
    }

    async fn container_items(&self, container: &Container, sort: SortBy, limit: Limit) -> StoreResult<Page<Item>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM container_items WHERE container_id = $1")
            .bind(container.id)
            .fetch_one(&self.pool)
            .await?;

        let sql = format!(
            "SELECT {} FROM container_items i WHERE i.container_id = $1 {} LIMIT $2 OFFSET $3",
            ITEM_COLUMNS,
            order_by("i", sort)
        );
        let rows = sqlx::query_as::<_, ItemRow>(&sql)
            .bind(container.id)
            .bind(i64::from(limit.per_page))
            .bind(limit.offset())
            .fetch_all(&self.pool)
            .await?;

        let items = rows.into_iter().map(|row| row.with_container(container.clone())).collect();
        Ok(Page::new(items, total, limit))
    }

    async fn search_items(&self, user_id: i64, term: &str, sort: SortBy, limit: Limit) -> StoreResult<Page<Item>> {
        let pattern = format!("%{}%", escape_like(term));
        let condition = "c.user_id = $1 AND i.body ILIKE $2";

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM container_items i JOIN containers c ON c.id = i.container_id WHERE {}",
            condition
        ))
        .bind(user_id)
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;

        let sql = format!(
            "SELECT {} FROM container_items i JOIN containers c ON c.id = i.container_id WHERE {} {} LIMIT $3 OFFSET $4",
            ITEM_COLUMNS,
            condition,
            order_by("i", sort)
        );
        let rows = sqlx::query_as::<_, ItemRow>(&sql)
            .bind(user_id)
            .bind(&pattern)
            .bind(i64::from(limit.per_page))
            .bind(limit.offset())
            .fetch_all(&self.pool)
            .await?;

        let items = self.attach_containers(rows).await?;
        Ok(Page::new(items, total, limit))
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::pagination::{SortDirection, SortField};

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("socks"), "socks");
    }

    #[test]
    fn order_by_uses_whitelisted_column() {
        let sort = SortBy { field: SortField::Quantity, direction: SortDirection::Asc };
        assert_eq!(order_by("i", sort), "ORDER BY i.quantity ASC, i.id ASC");
    }
}

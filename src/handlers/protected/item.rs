use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;

use crate::auth::{authorize_container, authorize_item};
use crate::database::models::{Item, NewItem};
use crate::database::pagination::{Page, PageQuery, ITEM_SORT};
use crate::error::{ApiError, ApiResult};
use crate::handlers::extract::{ApiForm, ApiJson, ApiPath, ApiQuery};
use crate::handlers::{allowed, found, non_blank};
use crate::middleware::AuthUser;
use crate::services::bulk_delete;
use crate::state::AppState;

use super::Created;

#[derive(Debug, Deserialize)]
pub struct ItemForm {
    pub body: Option<String>,
    pub quantity: Option<String>,
}

impl ItemForm {
    /// Quantities that are missing, unreadable or not positive are ignored.
    fn quantity(&self) -> Option<i32> {
        self.quantity
            .as_deref()
            .and_then(|q| q.trim().parse::<i32>().ok())
            .filter(|q| *q > 0)
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub term: Option<String>,
    #[serde(flatten)]
    pub page: PageQuery,
}

#[derive(Debug, Deserialize)]
pub struct BulkDeleteRequest {
    #[serde(default)]
    pub ids: Vec<i64>,
}

/// POST /api/container/:id/item - add an item to a container
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(container_id): ApiPath<i64>,
    ApiForm(form): ApiForm<ItemForm>,
) -> ApiResult<Json<Created>> {
    let container = found(state.store.container_by_id(container_id).await, -1, "Container not found.")?;
    allowed(authorize_container(&user, &container), &user, -2, "Not allowed to modify this container.")?;

    let quantity = form.quantity().unwrap_or(1);
    let item = state
        .store
        .create_item(NewItem {
            container_id: container.id,
            body: non_blank(form.body).unwrap_or_default(),
            quantity,
        })
        .await
        .map_err(|e| ApiError::storage(-4, "Unable to create container item.", e))?;

    Ok(Json(Created { id: item.id }))
}

/// PUT /api/container/:id/item/:item_id - change an item's body or quantity
pub async fn modify(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath((container_id, item_id)): ApiPath<(i64, i64)>,
    ApiForm(form): ApiForm<ItemForm>,
) -> ApiResult<Json<Created>> {
    let container = found(state.store.container_by_id(container_id).await, -1, "Container not found.")?;
    allowed(authorize_container(&user, &container), &user, -2, "Not allowed to modify this container.")?;

    let mut item = found(state.store.item_by_id(item_id).await, -3, "Unable to retrieve item to modify.")?;
    if item.container_id != container.id {
        return Err(ApiError::not_found(-3, "Unable to retrieve item to modify."));
    }

    if let Some(quantity) = form.quantity() {
        item.quantity = quantity;
    }
    if let Some(body) = non_blank(form.body.clone()) {
        item.body = body;
    }
    state
        .store
        .update_item(&item)
        .await
        .map_err(|e| ApiError::storage(-4, "Unable to update container item.", e))?;

    Ok(Json(Created { id: item.id }))
}

/// DELETE /api/container/:id/item/:item_id
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath((container_id, item_id)): ApiPath<(i64, i64)>,
) -> ApiResult<StatusCode> {
    let item = found(state.store.item_by_id(item_id).await, -1, "Item not found.")?;
    allowed(authorize_item(&user, &item), &user, -2, "Not allowed to delete this item.")?;
    if item.container_id != container_id {
        return Err(ApiError::not_found(-1, "Item not found."));
    }

    state
        .store
        .delete_item(&item)
        .await
        .map_err(|e| ApiError::storage(-3, "Unable to delete this item.", e))?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/container/item/bulk-delete - delete many items at once
///
/// All items must exist and belong to the caller, otherwise nothing is removed.
pub async fn bulk_delete_items(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(request): ApiJson<BulkDeleteRequest>,
) -> ApiResult<StatusCode> {
    bulk_delete(&state.store, &user, &request.ids).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/container/:id/item - items in one container
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(container_id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResult<Json<Page<Item>>> {
    let container = found(state.store.container_by_id(container_id).await, -1, "Container not found.")?;
    allowed(authorize_container(&user, &container), &user, -2, "Not allowed to view items in this container.")?;

    let page = state
        .store
        .container_items(&container, ITEM_SORT.parse_or_default(&query), query.limit())
        .await
        .map_err(|e| ApiError::storage(-3, "Unable to retrieve container items.", e))?;

    Ok(Json(page))
}

/// GET /api/item/search?term= - search item bodies across the caller's containers
pub async fn search(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> ApiResult<Json<Page<Item>>> {
    let term = non_blank(query.term.clone()).ok_or_else(|| ApiError::bad_request(-1, "Must provide a search term."))?;

    let page = state
        .store
        .search_items(user.user_id, term.trim(), ITEM_SORT.parse_or_default(&query.page), query.page.limit())
        .await
        .map_err(|e| ApiError::storage(-2, "Unable to retrieve items.", e))?;

    Ok(Json(page))
}

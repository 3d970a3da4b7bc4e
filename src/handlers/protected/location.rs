use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;

use crate::auth::authorize_location;
use crate::database::models::{Location, LocationFilter, NewLocation};
use crate::database::pagination::{Page, PageQuery, LOCATION_SORT};
use crate::error::{ApiError, ApiResult};
use crate::handlers::extract::{ApiForm, ApiPath, ApiQuery};
use crate::handlers::{allowed, found};
use crate::middleware::AuthUser;
use crate::state::AppState;

use super::Created;

#[derive(Debug, Deserialize)]
pub struct LocationForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
}

#[derive(Debug, Deserialize)]
pub struct LocationListQuery {
    #[serde(flatten)]
    pub page: PageQuery,
    pub is_attached_to_container: Option<String>,
}

/// POST /api/location - create a location for the caller
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    ApiForm(form): ApiForm<LocationForm>,
) -> ApiResult<Json<Created>> {
    let owner = found(
        state.store.user_by_id(user.user_id).await,
        -1,
        "Unable to find user to associate this location.",
    )?;

    let location = state
        .store
        .create_location(NewLocation {
            user_id: owner.id,
            name: form.name,
            address: form.address,
        })
        .await
        .map_err(|e| ApiError::storage(-2, "Unable to store location.", e))?;

    Ok(Json(Created { id: location.id }))
}

/// PUT /api/location/:id - rename or re-address a location
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiForm(form): ApiForm<LocationForm>,
) -> ApiResult<StatusCode> {
    let mut location = found(state.store.location_by_id(id).await, -1, "Location not found.")?;
    allowed(authorize_location(&user, &location), &user, -2, "Not allowed to modify this location.")?;

    location.name = form.name;
    location.address = form.address;
    state
        .store
        .update_location(&location)
        .await
        .map_err(|e| ApiError::storage(-3, "Failed to update location.", e))?;

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/location/:id - remove a location; its containers are detached
pub async fn delete(State(state): State<AppState>, user: AuthUser, ApiPath(id): ApiPath<i64>) -> ApiResult<StatusCode> {
    let location = found(state.store.location_by_id(id).await, -1, "Location not found.")?;
    allowed(authorize_location(&user, &location), &user, -2, "Not allowed to remove this location.")?;

    state
        .store
        .delete_location(location.id)
        .await
        .map_err(|e| ApiError::storage(-3, "Unable to remove location.", e))?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/location - the caller's locations
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<LocationListQuery>,
) -> ApiResult<Json<Page<Location>>> {
    let sort = LOCATION_SORT
        .parse(&query.page)
        .map_err(|_| ApiError::bad_request(-1, "Invalid sort field"))?;

    let owner = state.store.user_by_id(user.user_id).await.map_err(|e| {
        if e.is_not_found() {
            ApiError::unauthorized(-2, "User not found.")
        } else {
            ApiError::storage(-3, "Unable to get locations.", e)
        }
    })?;

    let filter = LocationFilter {
        user_id: owner.id,
        attached_to_container: query.is_attached_to_container.as_deref() == Some("T"),
    };
    let page = state
        .store
        .filtered_locations(&filter, sort, query.page.limit())
        .await
        .map_err(|e| ApiError::storage(-3, "Unable to get locations.", e))?;

    Ok(Json(page))
}

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;

use crate::auth::{authorize_attachment, authorize_container, authorize_location, AttachmentDenied, Claims};
use crate::database::models::{Container, ContainerFilter, Location, NewContainer};
use crate::database::pagination::{Page, PageQuery, CONTAINER_SORT};
use crate::error::{ApiError, ApiResult};
use crate::handlers::extract::{ApiForm, ApiPath, ApiQuery};
use crate::handlers::{allowed, found, non_blank};
use crate::middleware::AuthUser;
use crate::state::AppState;

use super::Created;

const LOCATION_NOT_ATTACHABLE: &str = "Not allowed to attach supplied location to this container.";

#[derive(Debug, Deserialize)]
pub struct ContainerForm {
    #[serde(default)]
    pub name: String,
    pub location_id: Option<String>,
}

/// Resolve the optional `location_id` form field. A blank field detaches.
async fn requested_location(state: &AppState, raw: Option<String>) -> ApiResult<Option<Location>> {
    let Some(raw) = non_blank(raw) else {
        return Ok(None);
    };
    let id: i64 = raw
        .trim()
        .parse()
        .map_err(|_| ApiError::not_found(-5, "Location not found."))?;
    found(state.store.location_by_id(id).await, -5, "Location not found.").map(Some)
}

/// POST /api/container - create a container, optionally at a location
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    ApiForm(form): ApiForm<ContainerForm>,
) -> ApiResult<Json<Created>> {
    let owner = found(state.store.user_by_id(user.user_id).await, -1, "User specified not found.")?;

    let location = requested_location(&state, form.location_id).await?;
    if let Some(location) = &location {
        allowed(authorize_location(&user, location), &user, -3, LOCATION_NOT_ATTACHABLE)?;
    }

    let container = state
        .store
        .create_container(NewContainer {
            user_id: owner.id,
            location_id: location.map(|l| l.id),
            name: form.name,
        })
        .await
        .map_err(|e| ApiError::storage(-2, "Failed to create the container.", e))?;

    Ok(Json(Created { id: container.id }))
}

fn attach(claims: &Claims, container: &mut Container, location: Option<&Location>) -> ApiResult<()> {
    match location {
        None => container.location_id = None,
        Some(location) => {
            authorize_attachment(claims, container, location).map_err(|denied| {
                tracing::warn!("User {} denied attaching location {}: {:?}", claims.user_id, location.id, denied);
                match denied {
                    AttachmentDenied::Container => ApiError::forbidden(-2, "Not allowed to edit this container."),
                    AttachmentDenied::Location => ApiError::forbidden(-3, LOCATION_NOT_ATTACHABLE),
                }
            })?;
            container.location_id = Some(location.id);
        }
    }
    Ok(())
}

/// PUT /api/container/:id - rename a container and attach or detach its location
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiForm(form): ApiForm<ContainerForm>,
) -> ApiResult<StatusCode> {
    let mut container = found(state.store.container_by_id(id).await, -1, "Container not found.")?;
    allowed(authorize_container(&user, &container), &user, -2, "Not allowed to edit this container.")?;

    let location = requested_location(&state, form.location_id).await?;
    attach(&user, &mut container, location.as_ref())?;
    container.name = form.name;

    state
        .store
        .update_container(&container)
        .await
        .map_err(|e| ApiError::storage(-4, "Failed to update the container.", e))?;

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/container/:id - remove a container and everything in it
pub async fn delete(State(state): State<AppState>, user: AuthUser, ApiPath(id): ApiPath<i64>) -> ApiResult<StatusCode> {
    let container = found(state.store.container_by_id(id).await, -1, "Container not found.")?;
    allowed(authorize_container(&user, &container), &user, -2, "Not allowed to edit this container.")?;

    state
        .store
        .delete_container(container.id)
        .await
        .map_err(|e| ApiError::storage(-3, "Error deleting container.", e))?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/container/:id
pub async fn get(State(state): State<AppState>, user: AuthUser, ApiPath(id): ApiPath<i64>) -> ApiResult<Json<Container>> {
    let container = found(state.store.container_by_id(id).await, -1, "Container not found.")?;
    allowed(authorize_container(&user, &container), &user, -2, "Not allowed to view this container.")?;
    Ok(Json(container))
}

/// GET /api/container - the caller's containers, optionally filtered by
/// one or more `location_id` parameters
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(params): ApiQuery<Vec<(String, String)>>,
) -> ApiResult<Json<Page<Container>>> {
    let mut page = PageQuery::default();
    let mut location_ids = Vec::new();
    for (key, value) in params {
        match key.as_str() {
            "page" => page.page = Some(value),
            "sort_field" => page.sort_field = Some(value),
            "sort_dir" => page.sort_dir = Some(value),
            "location_id" => location_ids.push(
                value
                    .trim()
                    .parse::<i64>()
                    .map_err(|_| ApiError::bad_request(-3, "Invalid location_id."))?,
            ),
            _ => {}
        }
    }

    let owner = found(state.store.user_by_id(user.user_id).await, -1, "Unable to get user information.")?;

    let filter = ContainerFilter {
        user_id: owner.id,
        location_ids,
    };
    let result = state
        .store
        .filtered_containers(&filter, CONTAINER_SORT.parse_or_default(&page), page.limit())
        .await
        .map_err(|e| ApiError::storage(-2, "Unable to retrieve containers.", e))?;

    Ok(Json(result))
}

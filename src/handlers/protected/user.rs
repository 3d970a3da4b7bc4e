use axum::{extract::State, Json};

use crate::database::models::User;
use crate::error::ApiResult;
use crate::handlers::found;
use crate::middleware::AuthUser;
use crate::state::AppState;

/// GET /api/user/current - the authenticated user's profile
pub async fn current(State(state): State<AppState>, user: AuthUser) -> ApiResult<Json<User>> {
    let profile = found(state.store.user_by_id(user.user_id).await, -1, "User specified not found.")?;
    Ok(Json(profile))
}

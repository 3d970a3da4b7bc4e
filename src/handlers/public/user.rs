use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::{hash_password, verify_password, PasswordError};
use crate::database::models::NewUser;
use crate::database::StoreError;
use crate::error::{ApiError, ApiResult};
use crate::handlers::extract::ApiForm;
use crate::middleware::cookie::{clear_session_cookie, session_cookie};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CredentialsForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// POST /api/user/login - exchange email and password for a credential
///
/// The credential is returned in the body for API clients and set as the
/// session cookie for browsers. Cookie clients must echo the `xsrfToken`
/// claim in `x-xsrf-token`.
pub async fn login(State(state): State<AppState>, ApiForm(form): ApiForm<CredentialsForm>) -> ApiResult<Response> {
    let failure = || ApiError::unauthorized(-1, "Authentication failure.");

    let user = match state.store.user_by_email(form.email.trim()).await {
        Ok(user) => user,
        Err(e) if e.is_not_found() => {
            warn!("Login attempt for unknown email");
            return Err(failure());
        }
        Err(e) => return Err(ApiError::storage(-2, "Unable to log in.", e)),
    };

    if !user.is_active || !verify_password(&form.password, &user.password) {
        warn!("Login failure for user {}", user.id);
        return Err(failure());
    }

    let session_uuid = Uuid::new_v4().to_string();
    let issued = state
        .codec
        .issue(user.id, &session_uuid)
        .map_err(|e| ApiError::storage(-2, "Unable to log in.", e))?;

    let cookie = session_cookie(&issued.token, issued.claims.expires_at(), state.config.security.cookie_secure)
        .map_err(|e| ApiError::storage(-2, "Unable to log in.", e))?;

    info!("User {} logged in (session {})", user.id, session_uuid);
    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(json!({ "token": issued.token })),
    )
        .into_response())
}

/// GET /api/user/logout - expire the session cookie
pub async fn logout() -> impl IntoResponse {
    (StatusCode::NO_CONTENT, [(header::SET_COOKIE, clear_session_cookie())])
}

/// POST /api/user/register - create an account
pub async fn register(State(state): State<AppState>, ApiForm(form): ApiForm<CredentialsForm>) -> ApiResult<impl IntoResponse> {
    let email = form.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::bad_request(-1, "A valid email address is required."));
    }

    let password_hash = hash_password(&form.password).map_err(|e| match e {
        PasswordError::TooShort => ApiError::bad_request(-1, e.to_string()),
        PasswordError::Hash(_) => ApiError::storage(-2, "Unable to register.", e),
    })?;

    let user = state
        .store
        .create_user(NewUser {
            email: email.to_string(),
            password_hash,
        })
        .await
        .map_err(|e| match e {
            StoreError::Conflict(text) => ApiError::bad_request(-1, text),
            other => ApiError::storage(-2, "Unable to register.", other),
        })?;

    info!("Registered user {}", user.id);
    Ok(Json(json!({ "id": user.id })))
}

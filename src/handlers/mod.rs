// handlers/mod.rs - Two-tier handler layout
//
// Public (no credential) → Protected (credential verified by middleware::auth)
//
// Every protected handler follows the same order: load the resource (404 when
// absent), check ownership (403), then mutate or read. Storage failures are
// logged and surface as 500 with the endpoint's own code.
pub mod extract;
pub mod protected;
pub mod public;

use tracing::warn;

use crate::auth::{Claims, Decision};
use crate::database::StoreResult;
use crate::error::{ApiError, ApiResult};

/// Map a lookup to 404 when the row is missing and to 500 when storage failed.
pub(crate) fn found<T>(result: StoreResult<T>, code: i32, text: &str) -> ApiResult<T> {
    result.map_err(|e| {
        if e.is_not_found() {
            ApiError::not_found(code, text)
        } else {
            ApiError::storage(code, text, e)
        }
    })
}

/// Turn a denied ownership check into a 403.
pub(crate) fn allowed(decision: Decision, claims: &Claims, code: i32, text: &str) -> ApiResult<()> {
    match decision {
        Decision::Allow => Ok(()),
        Decision::Deny => {
            warn!("User {} denied: {}", claims.user_id, text);
            Err(ApiError::forbidden(code, text))
        }
    }
}

/// Blank form fields count as absent.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// handlers/protected/mod.rs - Handlers behind middleware::auth::require_auth
//
// The caller is always taken from the `AuthUser` extractor; nothing reads the
// credential a second time.
pub mod container;
pub mod item;
pub mod location;
pub mod user;

use serde::Serialize;

/// Body returned by every create endpoint
#[derive(Debug, Serialize)]
pub struct Created {
    pub id: i64,
}

// handlers/public/mod.rs - Handlers reachable without a credential
//
// Login and registration hand out credentials; logout only clears the cookie,
// so it needs no credential either.
pub mod index;
pub mod user;

pub use index::{health, index};
pub use user::{login, logout, register};

pub mod auth;
pub mod cookie;

pub use auth::{authenticate, require_auth, AuthError, AuthUser, Transport, XSRF_HEADER};
pub use cookie::{clear_session_cookie, parse_cookie, session_cookie, SESSION_COOKIE};

pub mod hooks;

use std::time::Duration;

use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    routing::get,
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::config::SecurityConfig;
use crate::handlers::public;
use crate::middleware::XSRF_HEADER;
use crate::state::AppState;

pub use hooks::{builtin_hooks, extension_hooks, RouteHook};

/// Build the complete application router.
pub fn app(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/", get(public::index))
        .route("/health", get(public::health));

    let hooks = builtin_hooks()
        .into_iter()
        .chain(extension_hooks(&state.config.extensions));
    for hook in hooks {
        info!("Applying route hook '{}'", hook.name());
        router = hook.apply(router, &state);
    }

    router
        .layer(cors_layer(&state.config.security))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) if value != "*" => Some(value),
            _ => {
                warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            HeaderName::from_static(XSRF_HEADER),
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
        ])
        .max_age(Duration::from_secs(600))
}

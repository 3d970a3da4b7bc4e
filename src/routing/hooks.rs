//! Route hooks: each feature area contributes its routes to the router.
//!
//! The built-in areas are always applied. Optional extensions are named in
//! configuration (`EXTENSIONS`) and resolved against a static registry.

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};
use tracing::{debug, warn};

use crate::handlers::{protected, public};
use crate::middleware::require_auth;
use crate::state::AppState;

pub trait RouteHook: Send + Sync {
    fn name(&self) -> &'static str;

    /// Add this hook's routes. Protected routes must carry `require_auth`.
    fn apply(&self, router: Router<AppState>, state: &AppState) -> Router<AppState>;
}

fn protect(routes: Router<AppState>, state: &AppState) -> Router<AppState> {
    routes.route_layer(from_fn_with_state(state.clone(), require_auth))
}

pub struct UserRoutes;

impl RouteHook for UserRoutes {
    fn name(&self) -> &'static str {
        "users"
    }

    fn apply(&self, router: Router<AppState>, state: &AppState) -> Router<AppState> {
        let current = Router::new().route("/api/user/current", get(protected::user::current));
        router
            .route("/api/user/login", post(public::login))
            .route("/api/user/logout", get(public::logout))
            .route("/api/user/register", post(public::register))
            .merge(protect(current, state))
    }
}

pub struct LocationRoutes;

impl RouteHook for LocationRoutes {
    fn name(&self) -> &'static str {
        "locations"
    }

    fn apply(&self, router: Router<AppState>, state: &AppState) -> Router<AppState> {
        use crate::handlers::protected::location;

        let routes = Router::new()
            .route("/api/location", post(location::create).get(location::list))
            .route("/api/location/:id", put(location::update).delete(location::delete));
        router.merge(protect(routes, state))
    }
}

pub struct ContainerRoutes;

impl RouteHook for ContainerRoutes {
    fn name(&self) -> &'static str {
        "containers"
    }

    fn apply(&self, router: Router<AppState>, state: &AppState) -> Router<AppState> {
        use crate::handlers::protected::container;

        let routes = Router::new()
            .route("/api/container", post(container::create).get(container::list))
            .route(
                "/api/container/:id",
                get(container::get).put(container::update).delete(container::delete),
            );
        router.merge(protect(routes, state))
    }
}

pub struct ItemRoutes;

impl RouteHook for ItemRoutes {
    fn name(&self) -> &'static str {
        "items"
    }

    fn apply(&self, router: Router<AppState>, state: &AppState) -> Router<AppState> {
        use crate::handlers::protected::item;

        let routes = Router::new()
            .route("/api/container/:id/item", post(item::create).get(item::list))
            .route("/api/container/:id/item/:item_id", put(item::modify).delete(item::delete))
            .route("/api/container/item/bulk-delete", post(item::bulk_delete_items))
            .route("/api/item/search", get(item::search));
        router.merge(protect(routes, state))
    }
}

/// Container imagery (QR codes) is served by a separately deployed extension;
/// enabling it here only reserves the name.
pub struct ImageryRoutes;

impl RouteHook for ImageryRoutes {
    fn name(&self) -> &'static str {
        "imagery"
    }

    fn apply(&self, router: Router<AppState>, _state: &AppState) -> Router<AppState> {
        router
    }
}

pub fn builtin_hooks() -> Vec<Box<dyn RouteHook>> {
    vec![
        Box::new(UserRoutes),
        Box::new(LocationRoutes),
        Box::new(ContainerRoutes),
        Box::new(ItemRoutes),
    ]
}

/// Resolve configured extension names. Unknown names are logged and skipped.
pub fn extension_hooks(names: &[String]) -> Vec<Box<dyn RouteHook>> {
    names
        .iter()
        .filter_map(|name| match name.as_str() {
            "imagery" => Some(Box::new(ImageryRoutes) as Box<dyn RouteHook>),
            other => {
                warn!("Unknown route extension '{}' ignored", other);
                None
            }
        })
        .inspect(|hook| debug!("Enabled route extension '{}'", hook.name()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_extensions_are_skipped() {
        let names = vec!["imagery".to_string(), "export".to_string()];
        let hooks = extension_hooks(&names);
        assert_eq!(hooks.len(), 1);
        assert_eq!(hooks[0].name(), "imagery");
    }

    #[test]
    fn builtin_areas() {
        let names: Vec<_> = builtin_hooks().iter().map(|h| h.name()).collect();
        assert_eq!(names, ["users", "locations", "containers", "items"]);
    }
}

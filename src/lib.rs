pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routing;
pub mod services;
pub mod state;

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use crate::auth::CredentialCodec;
use crate::config::{AppConfig, StoreBackend};
use crate::database::{MemoryStore, PgStore, Store};
use crate::state::AppState;

/// Open the record store selected by configuration.
pub async fn open_store(config: &AppConfig, migrate: bool) -> anyhow::Result<Arc<dyn Store>> {
    match config.database.backend {
        StoreBackend::Memory => {
            info!("Using in-memory record store");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Postgres => {
            let store = PgStore::connect(&config.database)
                .await
                .context("connecting to Postgres")?;
            if migrate {
                store.migrate().await.context("applying migrations")?;
                info!("Database migrations applied");
            }
            Ok(Arc::new(store))
        }
    }
}

/// Assemble shared state for a configuration and an opened store.
pub fn build_state(config: AppConfig, store: Arc<dyn Store>) -> anyhow::Result<AppState> {
    let codec = CredentialCodec::from_config(&config.security).context("building credential codec")?;
    Ok(AppState::new(config, codec, store))
}

/// Serve the API on an already bound listener until the task is dropped.
pub async fn serve(listener: TcpListener, state: AppState) -> anyhow::Result<()> {
    let app = routing::app(state);
    axum::serve(listener, app).await.context("server error")
}

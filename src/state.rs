use std::sync::Arc;

use crate::auth::CredentialCodec;
use crate::config::AppConfig;
use crate::database::Store;

/// Shared per-process state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub codec: Arc<CredentialCodec>,
    pub store: Arc<dyn Store>,
}

impl AppState {
    pub fn new(config: AppConfig, codec: CredentialCodec, store: Arc<dyn Store>) -> Self {
        Self {
            config: Arc::new(config),
            codec: Arc::new(codec),
            store,
        }
    }
}

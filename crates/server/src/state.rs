use std::sync::Arc;

use bookshelf_core::{CatalogSession, Config, SanitizedConfig};

/// Shared application state
pub struct AppState {
    config: Config,
    session: Arc<CatalogSession>,
}

impl AppState {
    pub fn new(config: Config, session: Arc<CatalogSession>) -> Self {
        Self { config, session }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn session(&self) -> &CatalogSession {
        self.session.as_ref()
    }
}

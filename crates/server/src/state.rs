use std::sync::Arc;

use plexdex_core::{Config, PlexLibrary, SanitizedConfig};

/// Shared application state
pub struct AppState {
    config: Config,
    library: Arc<PlexLibrary>,
}

impl AppState {
    pub fn new(config: Config, library: Arc<PlexLibrary>) -> Self {
        Self { config, library }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn library(&self) -> &PlexLibrary {
        self.library.as_ref()
    }
}

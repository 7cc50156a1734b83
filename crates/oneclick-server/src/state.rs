use oneclick_core::InstallationService;
use std::sync::Arc;

/// Shared state passed to the installer routes and guards.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<InstallationService>,
}

impl AppState {
    pub fn new(service: Arc<InstallationService>) -> Self {
        Self { service }
    }
}

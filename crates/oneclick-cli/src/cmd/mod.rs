pub mod diagnose;
pub mod init;
pub mod install;
pub mod serve;
pub mod status;

use anyhow::Context;
use oneclick_core::InstallationService;
use std::path::Path;

/// Load `installer.yaml` under `root` and build the service.
pub fn load_service(root: &Path) -> anyhow::Result<InstallationService> {
    InstallationService::load(root)
        .with_context(|| format!("failed to load installer configuration from {}", root.display()))
}

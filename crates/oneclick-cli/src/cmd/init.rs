use anyhow::Context;
use oneclick_core::{paths, CheckMethod, Config};
use std::path::Path;

/// Write a default `installer.yaml` under `root`. An existing file is left
/// alone unless `force` is set.
pub fn run(root: &Path, method: CheckMethod, force: bool) -> anyhow::Result<()> {
    println!("Initializing installer in: {}", root.display());

    let config_path = paths::config_path(root);
    if config_path.exists() && !force {
        println!("  exists:  {}", paths::CONFIG_FILE);
        println!("\nRe-run with --force to overwrite it.");
        return Ok(());
    }

    let mut cfg = Config::default();
    cfg.installation_check.method = method.as_str().to_string();
    cfg.save(root)
        .with_context(|| format!("failed to write {}", config_path.display()))?;
    println!("  created: {} (method: {method})", paths::CONFIG_FILE);

    println!("\nNext: oneclick status");
    Ok(())
}

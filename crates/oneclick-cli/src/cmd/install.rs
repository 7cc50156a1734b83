use crate::cmd::load_service;
use crate::output::print_json;
use anyhow::bail;
use std::path::Path;

/// Mark the application installed through the active strategy, then read the
/// marker back.
pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let service = load_service(root)?;
    let method = service.method();

    if !service.mark_as_installed() {
        bail!("failed to mark application as installed via '{method}' (run `oneclick diagnose` for details)");
    }
    let verified = service.is_installed();

    if json {
        return print_json(&serde_json::json!({
            "marked": true,
            "verified": verified,
            "method": method,
        }));
    }

    println!("Application marked as installed ({method}).");
    if verified {
        println!("Verification: installed");
    } else {
        println!("Verification: still reported as NOT installed. Run `oneclick diagnose`.");
    }
    Ok(())
}

use crate::cmd::load_service;
use crate::output::{print_fields, print_json, yes_no};
use anyhow::bail;
use oneclick_core::{InstallationInfo, InstallationService};
use std::path::Path;

pub fn run(
    root: &Path,
    path: &str,
    reset: bool,
    mark_installed: bool,
    json: bool,
) -> anyhow::Result<()> {
    let service = load_service(root)?;

    if reset {
        return run_reset(&service, json);
    }
    if mark_installed {
        return run_mark(&service, json);
    }

    let info = service.installation_info(path);
    if json {
        return print_json(&info);
    }

    print_info(&info);
    println!();
    for hint in next_steps(&info) {
        println!("  {hint}");
    }
    Ok(())
}

fn run_reset(service: &InstallationService, json: bool) -> anyhow::Result<()> {
    if !service.reset_installation() {
        bail!(
            "failed to reset installation status via '{}' (run `oneclick diagnose` for details)",
            service.method()
        );
    }
    if json {
        print_json(&serde_json::json!({ "reset": true, "method": service.method() }))
    } else {
        println!("Installation status reset.");
        Ok(())
    }
}

fn run_mark(service: &InstallationService, json: bool) -> anyhow::Result<()> {
    let already = service.is_installed();
    if !already && !service.mark_as_installed() {
        bail!(
            "failed to mark application as installed via '{}' (run `oneclick diagnose` for details)",
            service.method()
        );
    }
    if json {
        return print_json(&serde_json::json!({
            "installed": true,
            "already_installed": already,
            "method": service.method(),
        }));
    }
    if already {
        println!("Application is already marked as installed.");
    } else {
        println!("Application marked as installed.");
    }
    Ok(())
}

pub(crate) fn print_info(info: &InstallationInfo) {
    let mut rows = vec![
        ("Installed", yes_no(info.is_installed)),
        ("Check Method", info.check_method.clone()),
        ("Installer URL", info.installer_url.clone()),
        ("Should Redirect", yes_no(info.should_redirect)),
        ("Current Route", info.current_route.clone()),
    ];
    rows.extend(info.installation_details.rows());
    print_fields(rows);
}

/// Suggested follow-up commands for the current state.
pub(crate) fn next_steps(info: &InstallationInfo) -> Vec<String> {
    if info.is_installed {
        vec!["Reset installation status:  oneclick status --reset".to_string()]
    } else {
        vec![
            format!("Run the wizard:             {}", info.installer_url),
            "Mark as installed:          oneclick status --mark-installed".to_string(),
            "Investigate the check:      oneclick diagnose".to_string(),
        ]
    }
}

use crate::cmd::load_service;
use crate::cmd::status::{next_steps, print_info};
use crate::output::{or_null, print_fields, print_json, print_table, yes_no};
use oneclick_core::strategy::{EnvValue, StrategyProbe};
use oneclick_core::Diagnosis;
use std::path::Path;

pub fn run(root: &Path, path: &str, json: bool) -> anyhow::Result<()> {
    let service = load_service(root)?;
    let diagnosis = service.diagnose(path);

    if json {
        return print_json(&diagnosis);
    }

    section("Status");
    print_info(&diagnosis.info);

    section("Configuration");
    let check = &service.config().installation_check;
    let method = if diagnosis.method_recognized {
        diagnosis.configured_method.clone()
    } else {
        format!(
            "{} (unrecognized, using {})",
            diagnosis.configured_method, diagnosis.resolved_method
        )
    };
    print_fields(vec![
        ("Root", root.display().to_string()),
        ("Method", method),
        ("Env Key", check.env_key.clone()),
        ("Env File", check.env_file.display().to_string()),
        ("Marker File", check.file_path.display().to_string()),
        ("Database", check.database_path.display().to_string()),
        ("Table", check.database_table.clone()),
        ("Row Key", check.database_key.clone()),
        ("Redirect To", diagnosis.redirect_to.clone()),
    ]);

    section("Active Strategy");
    print_probe(&diagnosis.probe);

    section("Checks");
    print_checks(&diagnosis);

    println!();
    for hint in next_steps(&diagnosis.info) {
        println!("  {hint}");
    }
    Ok(())
}

fn section(title: &str) {
    println!();
    println!("== {title} ==");
}

fn print_probe(probe: &StrategyProbe) {
    let (rows, error) = match probe {
        StrategyProbe::Env(p) => (
            vec![
                ("Key", p.key.clone()),
                ("Env File", p.env_file.display().to_string()),
                ("Env File Exists", yes_no(p.env_file_exists)),
                ("Process Value", or_null(p.process_value.as_deref())),
                ("File Line Value", or_null(p.file_line_value.as_deref())),
                ("File Value Length", or_null(p.file_value_len)),
                ("File Value == \"true\"", or_null(p.file_value_is_true.map(yes_no))),
                ("Parsed File Value", or_null(p.file_value.as_deref())),
                ("Value", render_env_value(&p.value)),
                ("Value Type", p.value_type.to_string()),
                ("Strict (=== \"true\")", yes_no(p.strict_string_match)),
                ("Boolean (=== true)", yes_no(p.boolean_match)),
                ("Loose (truthy)", yes_no(p.loose_match)),
                ("Installed", yes_no(p.installed)),
            ],
            p.error.as_deref(),
        ),
        StrategyProbe::File(p) => (
            vec![
                ("Path", p.path.display().to_string()),
                ("Exists", yes_no(p.exists)),
                ("Contents", or_null(p.contents.as_deref())),
                ("Installed", yes_no(p.installed)),
            ],
            p.error.as_deref(),
        ),
        StrategyProbe::Database(p) => (
            vec![
                ("Database", p.path.display().to_string()),
                ("Database Exists", yes_no(p.database_exists)),
                ("Connected", yes_no(p.connected)),
                ("Table", p.table.clone()),
                ("Key", p.key.clone()),
                ("Table Exists", yes_no(p.table_exists)),
                ("Raw Value", or_null(p.raw_value.as_ref())),
                ("Installed", yes_no(p.installed)),
            ],
            p.error.as_deref(),
        ),
    };
    print_fields(rows);
    if let Some(error) = error {
        println!("error: {error}");
    }
}

fn print_checks(diagnosis: &Diagnosis) {
    let rows = diagnosis
        .checks
        .iter()
        .map(|c| {
            vec![
                c.method.to_string(),
                if c.active { "*" } else { "" }.to_string(),
                yes_no(c.installed),
                c.error.clone().unwrap_or_default(),
            ]
        })
        .collect();
    print_table(&["METHOD", "ACTIVE", "INSTALLED", "ERROR"], rows);
}

fn render_env_value(value: &EnvValue) -> String {
    match value {
        EnvValue::Str(s) => format!("{s:?}"),
        EnvValue::Bool(b) => b.to_string(),
        EnvValue::Null => "NULL".to_string(),
    }
}

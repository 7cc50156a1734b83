//! Persistence strategies for the "installed" marker.
//!
//! Each strategy owns one representation of the flag:
//!
//! | method     | marker                                     | installed when                      |
//! |------------|--------------------------------------------|-------------------------------------|
//! | `env`      | `KEY=value` line in the env file           | value is `"true"` / boolean `true`  |
//! | `file`     | a file at the configured path              | the file exists                     |
//! | `database` | row `(key, value)` in a key-value table    | value is `"true"`, `"1"` or `1`     |
//!
//! Strategies return typed errors; turning failures into the fail-safe
//! boolean is the service's job.

pub mod database;
pub mod env;
pub mod file;

use crate::config::CheckMethod;
use crate::error::Result;
use serde::Serialize;
use std::path::PathBuf;

pub use database::{DatabaseProbe, DatabaseStrategy};
pub use env::{EnvLookup, EnvProbe, EnvValue, EnvironmentStrategy, ProcessEnv};
pub use file::{FileProbe, FileStrategy, MarkerPayload, INSTALLED_BY};

/// Capability shared by the three persistence mechanisms.
pub trait InstallationStrategy: Send + Sync {
    fn method(&self) -> CheckMethod;

    /// Read the marker. `Ok(false)` covers every "not there" case; `Err` is
    /// reserved for I/O and connectivity failures.
    fn check(&self) -> Result<bool>;

    /// Record the application as installed.
    fn mark(&self) -> Result<()>;

    /// Restore the "not installed" state.
    fn reset(&self) -> Result<()>;

    /// Method-specific summary for status reports. Never fails.
    fn details(&self) -> InstallationDetails;

    /// Raw values and comparison results for the diagnostic report.
    fn probe(&self) -> StrategyProbe;
}

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum InstallationDetails {
    Env {
        env_key: String,
        env_value: Option<String>,
    },
    File {
        file_path: PathBuf,
        file_exists: bool,
    },
    Database {
        table: String,
        key: String,
        table_exists: bool,
    },
}

impl InstallationDetails {
    /// `(label, value)` pairs in display order. Booleans render as
    /// `true`/`false`, missing values as `NULL`.
    pub fn rows(&self) -> Vec<(&'static str, String)> {
        match self {
            InstallationDetails::Env { env_key, env_value } => vec![
                ("Env Key", env_key.clone()),
                (
                    "Env Value",
                    env_value.clone().unwrap_or_else(|| "NULL".to_string()),
                ),
            ],
            InstallationDetails::File {
                file_path,
                file_exists,
            } => vec![
                ("File Path", file_path.display().to_string()),
                ("File Exists", file_exists.to_string()),
            ],
            InstallationDetails::Database {
                table,
                key,
                table_exists,
            } => vec![
                ("Table", table.clone()),
                ("Key", key.clone()),
                ("Table Exists", table_exists.to_string()),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum StrategyProbe {
    Env(EnvProbe),
    File(FileProbe),
    Database(DatabaseProbe),
}

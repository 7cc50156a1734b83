use crate::error::{InstallerError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// File constants
// ---------------------------------------------------------------------------

pub const CONFIG_FILE: &str = "installer.yaml";

pub const DEFAULT_ENV_FILE: &str = ".env";
pub const DEFAULT_MARKER_FILE: &str = "storage/app/installed";
pub const DEFAULT_DATABASE_FILE: &str = "database/database.sqlite";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

/// Resolve a configured path against the application root. Absolute paths
/// are returned unchanged.
pub fn resolve(root: &Path, configured: &Path) -> PathBuf {
    if configured.is_absolute() {
        configured.to_path_buf()
    } else {
        root.join(configured)
    }
}

/// Normalize a request path the way the router reports it: no leading or
/// trailing slash, and `/` for the site root.
pub fn request_path(raw: &str) -> String {
    let trimmed = raw.split(['?', '#']).next().unwrap_or("").trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

// ---------------------------------------------------------------------------
// Identifier validation
// ---------------------------------------------------------------------------

static IDENT_RE: OnceLock<Regex> = OnceLock::new();

fn ident_re() -> &'static Regex {
    IDENT_RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap())
}

/// Validate an environment key or table name. `field` names the config key
/// in the error message.
pub fn validate_identifier(field: &str, value: &str) -> Result<()> {
    if value.len() > 64 || !ident_re().is_match(value) {
        return Err(InstallerError::InvalidConfig(format!(
            "{field} '{value}' must be a letter or underscore followed by letters, digits or underscores"
        )));
    }
    Ok(())
}

static ROUTE_PREFIX_RE: OnceLock<Regex> = OnceLock::new();

fn route_prefix_re() -> &'static Regex {
    ROUTE_PREFIX_RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]+(/[A-Za-z0-9_-]+)*$").unwrap())
}

/// Validate a route prefix with surrounding slashes already trimmed: one or
/// more `/`-separated segments of letters, digits, `-` and `_`. Router
/// syntax such as `{param}` or `*rest` is rejected.
pub fn validate_route_prefix(value: &str) -> Result<()> {
    if !route_prefix_re().is_match(value) {
        return Err(InstallerError::InvalidConfig(format!(
            "route_prefix '{value}' must be path segments of letters, digits, '-' or '_'"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

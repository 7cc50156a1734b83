use crate::error::{InstallerError, Result};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// CheckMethod
// ---------------------------------------------------------------------------

/// The persistence strategy that decides whether the application is installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckMethod {
    Env,
    File,
    Database,
}

impl CheckMethod {
    pub fn all() -> &'static [CheckMethod] {
        &[CheckMethod::Env, CheckMethod::File, CheckMethod::Database]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CheckMethod::Env => "env",
            CheckMethod::File => "file",
            CheckMethod::Database => "database",
        }
    }

    /// Resolve a configured method tag. Anything unrecognized falls back to
    /// the environment strategy.
    pub fn resolve(tag: &str) -> Self {
        match tag {
            "env" => CheckMethod::Env,
            "file" => CheckMethod::File,
            "database" => CheckMethod::Database,
            _ => CheckMethod::Env,
        }
    }

    pub fn is_known(tag: &str) -> bool {
        Self::all().iter().any(|m| m.as_str() == tag)
    }
}

impl std::fmt::Display for CheckMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// InstallationCheckConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallationCheckConfig {
    /// Raw method tag as written in the config file. Kept as a string so an
    /// unknown value is reported verbatim and still resolves to `env`.
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default = "default_env_key")]
    pub env_key: String,
    #[serde(default = "default_env_file")]
    pub env_file: PathBuf,
    #[serde(default = "default_file_path")]
    pub file_path: PathBuf,
    #[serde(default = "default_database_table")]
    pub database_table: String,
    #[serde(default = "default_database_key")]
    pub database_key: String,
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
}

fn default_method() -> String {
    CheckMethod::Env.as_str().to_string()
}

fn default_env_key() -> String {
    "APP_INSTALLED".to_string()
}

fn default_env_file() -> PathBuf {
    PathBuf::from(paths::DEFAULT_ENV_FILE)
}

fn default_file_path() -> PathBuf {
    PathBuf::from(paths::DEFAULT_MARKER_FILE)
}

fn default_database_table() -> String {
    "settings".to_string()
}

fn default_database_key() -> String {
    "app_installed".to_string()
}

fn default_database_path() -> PathBuf {
    PathBuf::from(paths::DEFAULT_DATABASE_FILE)
}

impl Default for InstallationCheckConfig {
    fn default() -> Self {
        Self {
            method: default_method(),
            env_key: default_env_key(),
            env_file: default_env_file(),
            file_path: default_file_path(),
            database_table: default_database_table(),
            database_key: default_database_key(),
            database_path: default_database_path(),
        }
    }
}

impl InstallationCheckConfig {
    pub fn check_method(&self) -> CheckMethod {
        CheckMethod::resolve(&self.method)
    }
}

// ---------------------------------------------------------------------------
// PostInstallationConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostInstallationConfig {
    #[serde(default = "default_redirect_to")]
    pub redirect_to: String,
}

fn default_redirect_to() -> String {
    "/admin/dashboard".to_string()
}

impl Default for PostInstallationConfig {
    fn default() -> Self {
        Self {
            redirect_to: default_redirect_to(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_app_url")]
    pub app_url: String,
    #[serde(default = "default_route_prefix")]
    pub route_prefix: String,
    /// Application version recorded in the marker file.
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub installation_check: InstallationCheckConfig,
    #[serde(default)]
    pub post_installation: PostInstallationConfig,
}

fn default_app_url() -> String {
    "http://localhost".to_string()
}

fn default_route_prefix() -> String {
    "install".to_string()
}

fn default_version() -> String {
    "1.0.0".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_url: default_app_url(),
            route_prefix: default_route_prefix(),
            version: default_version(),
            installation_check: InstallationCheckConfig::default(),
            post_installation: PostInstallationConfig::default(),
        }
    }
}

impl Config {
    /// Load `installer.yaml` from `root`. A missing file yields the defaults.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        cfg.validate()?;
        if !CheckMethod::is_known(&cfg.installation_check.method) {
            tracing::warn!(
                method = %cfg.installation_check.method,
                "unknown installation_check.method, falling back to env"
            );
        }
        Ok(cfg)
    }

    /// Validate and write `installer.yaml` under `root`.
    pub fn save(&self, root: &Path) -> Result<()> {
        self.validate()?;
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    /// Route prefix without surrounding slashes.
    pub fn route_prefix(&self) -> &str {
        self.route_prefix.trim_matches('/')
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    /// Check that every strategy's parameters are well-formed, including the
    /// ones for methods that are not active.
    pub fn validate(&self) -> Result<()> {
        let check = &self.installation_check;

        paths::validate_identifier("installation_check.env_key", &check.env_key)?;
        paths::validate_identifier("installation_check.database_table", &check.database_table)?;

        if check.database_key.trim().is_empty() {
            return Err(InstallerError::InvalidConfig(
                "installation_check.database_key must not be empty".to_string(),
            ));
        }
        for (field, path) in [
            ("installation_check.env_file", &check.env_file),
            ("installation_check.file_path", &check.file_path),
            ("installation_check.database_path", &check.database_path),
        ] {
            if path.as_os_str().is_empty() {
                return Err(InstallerError::InvalidConfig(format!(
                    "{field} must not be empty"
                )));
            }
        }
        paths::validate_route_prefix(self.route_prefix())?;
        if self.post_installation.redirect_to.trim().is_empty() {
            return Err(InstallerError::InvalidConfig(
                "post_installation.redirect_to must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! The installation-state service: the single source of truth for "is the
//! application installed", independent of where the marker lives.
//!
//! Every public operation returns a plain boolean. Strategy errors are logged
//! and degraded to the safe answer (`false`), so a broken database or a
//! read-only disk keeps the wizard reachable instead of taking the host
//! application down. [`InstallationService::diagnose`] is the one place the
//! underlying causes are surfaced.

use crate::config::{CheckMethod, Config};
use crate::error::Result;
use crate::paths;
use crate::strategy::{
    DatabaseStrategy, EnvLookup, EnvironmentStrategy, FileStrategy, InstallationDetails,
    InstallationStrategy, ProcessEnv, StrategyProbe,
};
use serde::Serialize;
use std::path::Path;

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

/// Read-only snapshot for status reporting. Computed on demand.
#[derive(Debug, Clone, Serialize)]
pub struct InstallationInfo {
    pub is_installed: bool,
    /// The method tag exactly as configured (an unknown tag is shown as-is).
    pub check_method: String,
    pub installer_url: String,
    pub should_redirect: bool,
    pub current_route: String,
    pub installation_details: InstallationDetails,
}

/// Result of one strategy check with the cause the boolean API swallows.
#[derive(Debug, Clone, Serialize)]
pub struct StrategyCheck {
    pub method: CheckMethod,
    pub active: bool,
    pub installed: bool,
    pub error: Option<String>,
}

/// Everything the diagnostic report prints.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnosis {
    pub info: InstallationInfo,
    pub configured_method: String,
    pub resolved_method: CheckMethod,
    pub method_recognized: bool,
    pub redirect_to: String,
    /// Raw values for the active strategy.
    pub probe: StrategyProbe,
    /// Check results for all three strategies.
    pub checks: Vec<StrategyCheck>,
}

// ---------------------------------------------------------------------------
// InstallationService
// ---------------------------------------------------------------------------

pub struct InstallationService {
    config: Config,
    method: CheckMethod,
    env: EnvironmentStrategy,
    file: FileStrategy,
    database: DatabaseStrategy,
}

impl InstallationService {
    /// Build the service for an application rooted at `root`, reading the
    /// real process environment. The configuration is validated first: table
    /// names reach SQL and the route prefix reaches the router.
    pub fn new(config: Config, root: &Path) -> Result<Self> {
        Self::with_env_lookup(config, root, ProcessEnv)
    }

    /// Like [`InstallationService::new`] with an injected environment source.
    pub fn with_env_lookup(
        config: Config,
        root: &Path,
        lookup: impl EnvLookup + 'static,
    ) -> Result<Self> {
        config.validate()?;
        let check = &config.installation_check;
        let env = EnvironmentStrategy::with_lookup(
            check.env_key.clone(),
            paths::resolve(root, &check.env_file),
            lookup,
        );
        let file = FileStrategy::new(
            paths::resolve(root, &check.file_path),
            config.version.clone(),
        );
        let database = DatabaseStrategy::new(
            paths::resolve(root, &check.database_path),
            check.database_table.clone(),
            check.database_key.clone(),
        );
        let method = check.check_method();
        Ok(Self {
            config,
            method,
            env,
            file,
            database,
        })
    }

    /// Load `installer.yaml` from `root` and build the service.
    pub fn load(root: &Path) -> Result<Self> {
        let config = Config::load(root)?;
        Self::new(config, root)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The active method, fixed at construction.
    pub fn method(&self) -> CheckMethod {
        self.method
    }

    pub fn strategy(&self, method: CheckMethod) -> &dyn InstallationStrategy {
        match method {
            CheckMethod::Env => &self.env,
            CheckMethod::File => &self.file,
            CheckMethod::Database => &self.database,
        }
    }

    pub fn active(&self) -> &dyn InstallationStrategy {
        self.strategy(self.method)
    }

    pub fn environment(&self) -> &EnvironmentStrategy {
        &self.env
    }

    pub fn file(&self) -> &FileStrategy {
        &self.file
    }

    pub fn database(&self) -> &DatabaseStrategy {
        &self.database
    }

    // -----------------------------------------------------------------------
    // Check / mark / reset
    // -----------------------------------------------------------------------

    pub fn is_installed(&self) -> bool {
        check_or_false(self.active())
    }

    pub fn mark_as_installed(&self) -> bool {
        let strategy = self.active();
        match strategy.mark() {
            Ok(()) => {
                tracing::info!(method = %strategy.method(), "application marked as installed");
                true
            }
            Err(e) => {
                tracing::warn!(method = %strategy.method(), error = %e, "failed to mark application as installed");
                false
            }
        }
    }

    pub fn reset_installation(&self) -> bool {
        let strategy = self.active();
        match strategy.reset() {
            Ok(()) => {
                tracing::info!(method = %strategy.method(), "installation status reset");
                true
            }
            Err(e) => {
                tracing::warn!(method = %strategy.method(), error = %e, "failed to reset installation status");
                false
            }
        }
    }

    pub fn check_by_environment(&self) -> bool {
        check_or_false(&self.env)
    }

    pub fn check_by_file(&self) -> bool {
        check_or_false(&self.file)
    }

    pub fn check_by_database(&self) -> bool {
        check_or_false(&self.database)
    }

    pub fn mark_installed_by_environment(&self) -> bool {
        mark_or_false(&self.env)
    }

    pub fn mark_installed_by_file(&self) -> bool {
        mark_or_false(&self.file)
    }

    pub fn mark_installed_by_database(&self) -> bool {
        mark_or_false(&self.database)
    }

    // -----------------------------------------------------------------------
    // Routing
    // -----------------------------------------------------------------------

    /// Absolute URL of the wizard's entry route.
    pub fn installer_url(&self) -> String {
        format!(
            "{}/{}",
            self.config.app_url.trim_end_matches('/'),
            self.config.route_prefix()
        )
    }

    /// True if `path` is under the wizard's route prefix.
    pub fn is_installer_route(&self, path: &str) -> bool {
        let path = paths::request_path(path);
        let prefix = self.config.route_prefix();
        path.starts_with(prefix) || path == prefix
    }

    pub fn should_redirect_to_installer(&self, path: &str) -> bool {
        if self.is_installer_route(path) {
            return false;
        }
        !self.is_installed()
    }

    // -----------------------------------------------------------------------
    // Reporting
    // -----------------------------------------------------------------------

    pub fn installation_info(&self, path: &str) -> InstallationInfo {
        let is_installed = self.is_installed();
        InstallationInfo {
            is_installed,
            check_method: self.config.installation_check.method.clone(),
            installer_url: self.installer_url(),
            should_redirect: !self.is_installer_route(path) && !is_installed,
            current_route: paths::request_path(path),
            installation_details: self.active().details(),
        }
    }

    /// Read-only diagnostic report: raw values for the active strategy and
    /// every strategy's check result with its error cause.
    pub fn diagnose(&self, path: &str) -> Diagnosis {
        let checks = CheckMethod::all()
            .iter()
            .map(|&method| {
                let (installed, error) = match self.strategy(method).check() {
                    Ok(installed) => (installed, None),
                    Err(e) => (false, Some(e.to_string())),
                };
                StrategyCheck {
                    method,
                    active: method == self.method,
                    installed,
                    error,
                }
            })
            .collect();

        let configured = &self.config.installation_check.method;
        Diagnosis {
            info: self.installation_info(path),
            configured_method: configured.clone(),
            resolved_method: self.method,
            method_recognized: CheckMethod::is_known(configured),
            redirect_to: self.config.post_installation.redirect_to.clone(),
            probe: self.active().probe(),
            checks,
        }
    }
}

fn check_or_false(strategy: &dyn InstallationStrategy) -> bool {
    match strategy.check() {
        Ok(installed) => installed,
        Err(e) => {
            tracing::warn!(method = %strategy.method(), error = %e, "installation check failed, treating as not installed");
            false
        }
    }
}

fn mark_or_false(strategy: &dyn InstallationStrategy) -> bool {
    match strategy.mark() {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(method = %strategy.method(), error = %e, "installation mark failed");
            false
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::INSTALLED_BY;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn service(dir: &TempDir, method: &str) -> InstallationService {
        let mut config = Config::default();
        config.installation_check.method = method.to_string();
        InstallationService::with_env_lookup(
            config,
            dir.path(),
            HashMap::<String, String>::new(),
        )
        .unwrap()
    }

    fn write_env(dir: &TempDir, content: &str) {
        std::fs::write(dir.path().join(".env"), content).unwrap();
    }

    #[test]
    fn mark_then_check_for_every_method() {
        for method in ["env", "file", "database"] {
            let dir = TempDir::new().unwrap();
            write_env(&dir, "APP_NAME=Demo\n");
            let svc = service(&dir, method);
            assert!(!svc.is_installed(), "{method}");
            assert!(svc.mark_as_installed(), "{method}");
            assert!(svc.is_installed(), "{method}");
        }
    }

    #[test]
    fn reset_then_check_for_every_method() {
        for method in ["env", "file", "database"] {
            let dir = TempDir::new().unwrap();
            write_env(&dir, "APP_NAME=Demo\n");
            let svc = service(&dir, method);
            assert!(svc.mark_as_installed(), "{method}");
            assert!(svc.reset_installation(), "{method}");
            assert!(!svc.is_installed(), "{method}");
        }
    }

    #[test]
    fn env_reset_without_key_still_reports_not_installed() {
        let dir = TempDir::new().unwrap();
        write_env(&dir, "APP_NAME=Demo\n");
        let svc = service(&dir, "env");
        assert!(svc.reset_installation());
        assert!(!svc.is_installed());
        assert_eq!(
            std::fs::read_to_string(dir.path().join(".env")).unwrap(),
            "APP_NAME=Demo\n"
        );
    }

    #[test]
    fn env_mark_without_env_file_returns_false() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir, "env");
        assert!(!svc.mark_as_installed());
        assert!(!svc.reset_installation());
        assert!(!svc.is_installed());
    }

    #[test]
    fn file_scenario() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir, "file");
        assert!(!svc.is_installed());

        assert!(svc.mark_as_installed());
        let marker = svc.file().read_marker().unwrap().unwrap();
        assert_eq!(marker.installed_by, INSTALLED_BY);
        assert_eq!(marker.installed_by, "laravel-one-click-installer");
        assert!(svc.is_installed());

        assert!(svc.reset_installation());
        assert!(!svc.file().path().exists());
        assert!(!svc.is_installed());
    }

    #[test]
    fn database_scenario() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir, "database");
        assert!(!svc.is_installed());

        assert!(svc.mark_as_installed());
        assert!(svc.database().table_exists().unwrap());
        assert_eq!(
            svc.database().raw_value().unwrap(),
            Some(rusqlite::types::Value::Text("true".into()))
        );
        assert!(svc.is_installed());
    }

    #[test]
    fn unknown_method_behaves_like_env() {
        let dir = TempDir::new().unwrap();
        write_env(&dir, "APP_INSTALLED=false\n");
        let svc = service(&dir, "xyz");
        assert_eq!(svc.method(), CheckMethod::Env);
        assert!(!svc.is_installed());
        assert!(svc.mark_as_installed());
        assert_eq!(
            std::fs::read_to_string(dir.path().join(".env")).unwrap(),
            "APP_INSTALLED=true\n"
        );
        assert!(svc.is_installed());
        assert!(svc.reset_installation());
        assert!(!svc.is_installed());
        assert_eq!(svc.installation_info("/").check_method, "xyz");
    }

    #[test]
    fn strategy_checks_are_independent_of_active_method() {
        let dir = TempDir::new().unwrap();
        write_env(&dir, "APP_INSTALLED=true\n");
        let svc = service(&dir, "file");
        assert!(svc.check_by_environment());
        assert!(!svc.check_by_file());
        assert!(!svc.check_by_database());
        assert!(!svc.is_installed());

        assert!(svc.mark_installed_by_database());
        assert!(svc.check_by_database());
        assert!(!svc.is_installed());

        assert!(svc.mark_installed_by_file());
        assert!(svc.is_installed());
    }

    #[test]
    fn env_strategy_is_strict() {
        let dir = TempDir::new().unwrap();
        write_env(&dir, "APP_INSTALLED=1\n");
        assert!(!service(&dir, "env").is_installed());
        write_env(&dir, "APP_INSTALLED=true\n");
        assert!(service(&dir, "env").is_installed());
    }

    #[test]
    fn installer_url_and_routes() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.app_url = "https://shop.example.com/".to_string();
        config.route_prefix = "/setup/".to_string();
        let svc = InstallationService::with_env_lookup(
            config,
            dir.path(),
            HashMap::<String, String>::new(),
        )
        .unwrap();

        assert_eq!(svc.installer_url(), "https://shop.example.com/setup");
        assert!(svc.is_installer_route("/setup"));
        assert!(svc.is_installer_route("setup/environment"));
        assert!(svc.is_installer_route("/setup/"));
        assert!(!svc.is_installer_route("/"));
        assert!(!svc.is_installer_route("/admin/setup"));
    }

    #[test]
    fn no_redirect_on_installer_routes_or_when_installed() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir, "file");
        assert!(svc.should_redirect_to_installer("/"));
        assert!(svc.should_redirect_to_installer("/admin/dashboard"));
        assert!(!svc.should_redirect_to_installer("/install"));
        assert!(!svc.should_redirect_to_installer("/install/admin"));

        assert!(svc.mark_as_installed());
        assert!(!svc.should_redirect_to_installer("/"));
        assert!(!svc.should_redirect_to_installer("/install"));
    }

    #[test]
    fn unreachable_database_is_not_installed() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir, "database");
        assert!(!svc.is_installed());
        assert!(!svc.reset_installation());
        assert!(!dir.path().join("database/database.sqlite").exists());
    }

    #[test]
    fn installation_info_snapshot() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir, "file");
        let info = svc.installation_info("/admin/");
        assert!(!info.is_installed);
        assert!(info.should_redirect);
        assert_eq!(info.check_method, "file");
        assert_eq!(info.current_route, "admin");
        assert_eq!(info.installer_url, "http://localhost/install");
        assert!(matches!(
            info.installation_details,
            InstallationDetails::File { file_exists: false, .. }
        ));
    }

    #[test]
    fn reporting_does_not_mutate_state() {
        let dir = TempDir::new().unwrap();
        write_env(&dir, "APP_INSTALLED=false\n");
        let svc = service(&dir, "database");
        let before = std::fs::read_to_string(dir.path().join(".env")).unwrap();

        let _ = svc.installation_info("/");
        let diagnosis = svc.diagnose("/");

        assert_eq!(
            std::fs::read_to_string(dir.path().join(".env")).unwrap(),
            before
        );
        assert!(!dir.path().join("database/database.sqlite").exists());
        assert!(!svc.file().path().exists());
        assert_eq!(diagnosis.checks.len(), 3);
    }

    #[test]
    fn diagnose_surfaces_swallowed_errors() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir, "database");
        let diagnosis = svc.diagnose("/");

        assert_eq!(diagnosis.resolved_method, CheckMethod::Database);
        assert!(diagnosis.method_recognized);
        let db = diagnosis
            .checks
            .iter()
            .find(|c| c.method == CheckMethod::Database)
            .unwrap();
        assert!(db.active);
        assert!(!db.installed);
        assert!(db.error.as_deref().unwrap().contains("database unavailable"));
        assert!(matches!(diagnosis.probe, StrategyProbe::Database(_)));
    }

    #[test]
    fn diagnose_flags_unknown_method() {
        let dir = TempDir::new().unwrap();
        let diagnosis = service(&dir, "xyz").diagnose("/");
        assert_eq!(diagnosis.configured_method, "xyz");
        assert_eq!(diagnosis.resolved_method, CheckMethod::Env);
        assert!(!diagnosis.method_recognized);
        assert!(matches!(diagnosis.probe, StrategyProbe::Env(_)));
    }

    fn build(config: Config, dir: &TempDir) -> Result<InstallationService> {
        InstallationService::with_env_lookup(config, dir.path(), HashMap::<String, String>::new())
    }

    #[test]
    fn hand_built_config_with_injected_table_is_rejected() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("database/database.sqlite");
        std::fs::create_dir_all(db_path.parent().unwrap()).unwrap();
        let conn = rusqlite::Connection::open(&db_path).unwrap();
        conn.execute_batch("CREATE TABLE users (id INTEGER PRIMARY KEY);")
            .unwrap();

        let mut config = Config::default();
        config.installation_check.method = "database".to_string();
        config.installation_check.database_table =
            "settings\" (id INTEGER); DROP TABLE users; --".to_string();

        let err = build(config, &dir).err().unwrap();
        assert!(matches!(err, crate::InstallerError::InvalidConfig(_)));

        let users: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'users'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(users, 1);
    }

    #[test]
    fn hand_built_config_with_unsafe_prefix_is_rejected() {
        let dir = TempDir::new().unwrap();
        for prefix in ["/", "", "{step}", "install/*rest", "in stall", "a//b"] {
            let mut config = Config::default();
            config.route_prefix = prefix.to_string();
            assert!(build(config, &dir).is_err(), "{prefix:?}");
        }

        let mut config = Config::default();
        config.route_prefix = "/setup/wizard-v2/".to_string();
        let svc = build(config, &dir).unwrap();
        assert!(svc.should_redirect_to_installer("/dashboard"));
        assert!(!svc.should_redirect_to_installer("/setup/wizard-v2/admin"));
    }
}

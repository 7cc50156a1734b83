use super::{InstallationDetails, InstallationStrategy, StrategyProbe};
use crate::config::CheckMethod;
use crate::error::{InstallerError, Result};
use chrono::Utc;
use rusqlite::types::Value;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Installed flag stored as a row in a `(id, key, value, created_at,
/// updated_at)` key-value table of a SQLite database.
pub struct DatabaseStrategy {
    path: PathBuf,
    table: String,
    key: String,
}

/// `value` column forms that count as installed: text `"true"`, text `"1"`
/// and integer `1`. SQLite has no boolean type, so `true` arrives as `1`.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Text(s) => s == "true" || s == "1",
        Value::Integer(i) => *i == 1,
        _ => false,
    }
}

impl DatabaseStrategy {
    /// `table` must already be a validated identifier (see
    /// [`crate::config::Config::validate`]).
    pub fn new(path: impl Into<PathBuf>, table: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            table: table.into(),
            key: key.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    fn unavailable(&self, reason: impl std::fmt::Display) -> InstallerError {
        InstallerError::DatabaseUnavailable {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }

    /// Open an existing database and verify it answers a query. Never
    /// creates the database file.
    fn connect(&self) -> Result<Connection> {
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| self.unavailable(e))?;
        ping(&conn).map_err(|e| self.unavailable(e))?;
        Ok(conn)
    }

    /// Open the database, creating the file and its directory when missing.
    fn connect_or_create(&self) -> Result<Connection> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&self.path).map_err(|e| self.unavailable(e))?;
        ping(&conn).map_err(|e| self.unavailable(e))?;
        Ok(conn)
    }

    pub fn table_exists(&self) -> Result<bool> {
        let conn = self.connect()?;
        table_exists(&conn, &self.table)
    }

    /// Raw `value` for the configured key. `Ok(None)` when the table or the
    /// row is missing.
    pub fn raw_value(&self) -> Result<Option<Value>> {
        let conn = self.connect()?;
        if !table_exists(&conn, &self.table)? {
            return Ok(None);
        }
        let value = conn
            .query_row(
                &format!("SELECT value FROM \"{}\" WHERE key = ?1", self.table),
                params![self.key],
                |row| row.get::<_, Value>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Single statement only: `execute` refuses trailing SQL.
    fn create_table(&self, conn: &Connection) -> Result<()> {
        conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS \"{table}\" (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    key TEXT NOT NULL UNIQUE,
                    value TEXT,
                    created_at TEXT,
                    updated_at TEXT
                )",
                table = self.table
            ),
            [],
        )?;
        Ok(())
    }
}

/// Touch the schema so a file that is not a database fails here.
fn ping(conn: &Connection) -> rusqlite::Result<()> {
    conn.query_row("SELECT COUNT(*) FROM sqlite_master", [], |row| {
        row.get::<_, i64>(0)
    })?;
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let exists = conn.query_row(
        "SELECT EXISTS(
           SELECT 1 FROM sqlite_master
           WHERE type = 'table' AND name = ?1 COLLATE NOCASE
         )",
        params![table],
        |row| row.get::<_, i64>(0),
    )?;
    Ok(exists == 1)
}

impl InstallationStrategy for DatabaseStrategy {
    fn method(&self) -> CheckMethod {
        CheckMethod::Database
    }

    fn check(&self) -> Result<bool> {
        Ok(self.raw_value()?.as_ref().is_some_and(is_truthy))
    }

    fn mark(&self) -> Result<()> {
        let conn = self.connect_or_create()?;
        if !table_exists(&conn, &self.table)? {
            tracing::info!(table = %self.table, "creating installation settings table");
            self.create_table(&conn)?;
        }
        let now = Utc::now().to_rfc3339();
        conn.execute(
            &format!(
                "INSERT INTO \"{}\" (key, value, created_at, updated_at)
                 VALUES (?1, 'true', ?2, ?2)
                 ON CONFLICT(key) DO UPDATE SET
                   value = excluded.value,
                   created_at = excluded.created_at,
                   updated_at = excluded.updated_at",
                self.table
            ),
            params![self.key, now],
        )?;
        Ok(())
    }

    fn reset(&self) -> Result<()> {
        let conn = self.connect()?;
        if !table_exists(&conn, &self.table)? {
            return Ok(());
        }
        let deleted = conn.execute(
            &format!("DELETE FROM \"{}\" WHERE key = ?1", self.table),
            params![self.key],
        )?;
        tracing::debug!(table = %self.table, key = %self.key, deleted, "reset installation row");
        Ok(())
    }

    fn details(&self) -> InstallationDetails {
        InstallationDetails::Database {
            table: self.table.clone(),
            key: self.key.clone(),
            table_exists: self.table_exists().unwrap_or(false),
        }
    }

    fn probe(&self) -> StrategyProbe {
        let database_exists = self.path.exists();
        let mut probe = DatabaseProbe {
            path: self.path.clone(),
            table: self.table.clone(),
            key: self.key.clone(),
            database_exists,
            connected: false,
            table_exists: false,
            raw_value: None,
            installed: false,
            error: None,
        };

        let conn = match self.connect() {
            Ok(conn) => conn,
            Err(e) => {
                probe.error = Some(e.to_string());
                return StrategyProbe::Database(probe);
            }
        };
        probe.connected = true;

        match table_exists(&conn, &self.table) {
            Ok(exists) => probe.table_exists = exists,
            Err(e) => probe.error = Some(e.to_string()),
        }
        if probe.table_exists {
            match self.raw_value() {
                Ok(value) => {
                    probe.installed = value.as_ref().is_some_and(is_truthy);
                    probe.raw_value = value.as_ref().map(value_to_json);
                }
                Err(e) => probe.error = Some(e.to_string()),
            }
        }
        StrategyProbe::Database(probe)
    }
}

fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Integer(i) => serde_json::json!(i),
        Value::Real(f) => serde_json::json!(f),
        Value::Text(s) => serde_json::json!(s),
        Value::Blob(b) => serde_json::json!(format!("<blob {} bytes>", b.len())),
    }
}

/// Everything `diagnose` reports for the database strategy.
#[derive(Debug, Clone, Serialize)]
pub struct DatabaseProbe {
    pub path: PathBuf,
    pub table: String,
    pub key: String,
    pub database_exists: bool,
    pub connected: bool,
    pub table_exists: bool,
    pub raw_value: Option<serde_json::Value>,
    pub installed: bool,
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn strategy(dir: &TempDir) -> DatabaseStrategy {
        DatabaseStrategy::new(
            dir.path().join("database/database.sqlite"),
            "settings",
            "app_installed",
        )
    }

    fn seed(s: &DatabaseStrategy, value: Value) {
        let conn = s.connect_or_create().unwrap();
        s.create_table(&conn).unwrap();
        conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)",
            params![s.key(), value],
        )
        .unwrap();
    }

    #[test]
    fn missing_database_is_an_error_not_a_panic() {
        let dir = TempDir::new().unwrap();
        let s = strategy(&dir);
        assert!(matches!(
            s.check(),
            Err(InstallerError::DatabaseUnavailable { .. })
        ));
        assert!(!s.path().exists(), "check must not create the database");
    }

    #[test]
    fn missing_table_is_not_installed() {
        let dir = TempDir::new().unwrap();
        let s = strategy(&dir);
        s.connect_or_create().unwrap();
        assert!(!s.check().unwrap());
        assert!(!s.table_exists().unwrap());
    }

    #[test]
    fn mark_creates_table_and_row() {
        let dir = TempDir::new().unwrap();
        let s = strategy(&dir);
        s.mark().unwrap();
        assert!(s.table_exists().unwrap());
        assert_eq!(s.raw_value().unwrap(), Some(Value::Text("true".into())));
        assert!(s.check().unwrap());
    }

    #[test]
    fn mark_is_an_upsert() {
        let dir = TempDir::new().unwrap();
        let s = strategy(&dir);
        seed(&s, Value::Text("false".into()));
        s.mark().unwrap();
        s.mark().unwrap();

        let conn = s.connect().unwrap();
        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM settings", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
        assert!(s.check().unwrap());
    }

    #[test]
    fn is_truthy_forms() {
        assert!(is_truthy(&Value::Text("true".into())));
        assert!(is_truthy(&Value::Text("1".into())));
        assert!(is_truthy(&Value::Integer(1)));
        assert!(!is_truthy(&Value::Integer(0)));
        assert!(!is_truthy(&Value::Integer(2)));
        assert!(!is_truthy(&Value::Real(1.0)));
        assert!(!is_truthy(&Value::Text("TRUE".into())));
        assert!(!is_truthy(&Value::Null));
    }

    #[test]
    fn truthy_values() {
        for value in [
            Value::Text("true".into()),
            Value::Text("1".into()),
            Value::Integer(1),
        ] {
            let dir = TempDir::new().unwrap();
            let s = strategy(&dir);
            seed(&s, value.clone());
            assert!(s.check().unwrap(), "{value:?}");
        }
    }

    #[test]
    fn falsy_values() {
        for value in [
            Value::Text("false".into()),
            Value::Text("0".into()),
            Value::Integer(0),
            Value::Text("yes".into()),
            Value::Null,
        ] {
            let dir = TempDir::new().unwrap();
            let s = strategy(&dir);
            seed(&s, value.clone());
            assert!(!s.check().unwrap(), "{value:?}");
        }
    }

    #[test]
    fn boolean_parameter_is_stored_as_one() {
        let dir = TempDir::new().unwrap();
        let s = strategy(&dir);
        let conn = s.connect_or_create().unwrap();
        s.create_table(&conn).unwrap();
        conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)",
            params![s.key(), true],
        )
        .unwrap();
        assert!(s.check().unwrap());
    }

    #[test]
    fn reset_deletes_row_and_tolerates_absence() {
        let dir = TempDir::new().unwrap();
        let s = strategy(&dir);
        s.mark().unwrap();
        s.reset().unwrap();
        assert!(!s.check().unwrap());
        assert!(s.table_exists().unwrap());
        s.reset().unwrap();
    }

    #[test]
    fn reset_without_table_succeeds() {
        let dir = TempDir::new().unwrap();
        let s = strategy(&dir);
        s.connect_or_create().unwrap();
        s.reset().unwrap();
    }

    #[test]
    fn reset_without_database_fails() {
        let dir = TempDir::new().unwrap();
        assert!(strategy(&dir).reset().is_err());
    }

    #[test]
    fn non_database_file_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let s = strategy(&dir);
        std::fs::create_dir_all(s.path().parent().unwrap()).unwrap();
        std::fs::write(s.path(), "definitely not sqlite, just some plain text padding").unwrap();
        assert!(matches!(
            s.check(),
            Err(InstallerError::DatabaseUnavailable { .. })
        ));
    }

    #[test]
    fn probe_reports_connection_failure() {
        let dir = TempDir::new().unwrap();
        let StrategyProbe::Database(probe) = strategy(&dir).probe() else {
            panic!("expected database probe");
        };
        assert!(!probe.database_exists);
        assert!(!probe.connected);
        assert!(probe.error.is_some());
    }

    #[test]
    fn probe_reports_raw_value() {
        let dir = TempDir::new().unwrap();
        let s = strategy(&dir);
        seed(&s, Value::Integer(1));
        let StrategyProbe::Database(probe) = s.probe() else {
            panic!("expected database probe");
        };
        assert!(probe.connected);
        assert!(probe.table_exists);
        // TEXT affinity stores the integer as "1".
        assert_eq!(probe.raw_value, Some(serde_json::json!("1")));
        assert!(probe.installed);
    }

    #[test]
    fn table_creation_runs_a_single_statement() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.sqlite");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch("CREATE TABLE users (id INTEGER PRIMARY KEY);")
            .unwrap();

        let s = DatabaseStrategy::new(
            &path,
            "settings\" (id INTEGER); DROP TABLE users; --",
            "app_installed",
        );
        assert!(s.mark().is_err());
        assert!(table_exists(&conn, "users").unwrap());
    }
}

use super::{InstallationDetails, InstallationStrategy, StrategyProbe};
use crate::config::CheckMethod;
use crate::error::Result;
use crate::io;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Identifier written to `installed_by` in every marker file.
pub const INSTALLED_BY: &str = "laravel-one-click-installer";

const PREVIEW_CHARS: usize = 100;

/// Informational content of the marker file. Only the file's existence is
/// authoritative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerPayload {
    pub installed_at: String,
    pub installed_by: String,
    pub version: String,
}

impl MarkerPayload {
    pub fn now(version: &str) -> Self {
        Self {
            installed_at: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
            installed_by: INSTALLED_BY.to_string(),
            version: version.to_string(),
        }
    }
}

pub struct FileStrategy {
    path: PathBuf,
    version: String,
}

impl FileStrategy {
    pub fn new(path: impl Into<PathBuf>, version: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            version: version.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse the marker contents. `Ok(None)` when the file does not exist.
    pub fn read_marker(&self) -> Result<Option<MarkerPayload>> {
        if !self.path.try_exists()? {
            return Ok(None);
        }
        let data = std::fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&data)?))
    }
}

impl InstallationStrategy for FileStrategy {
    fn method(&self) -> CheckMethod {
        CheckMethod::File
    }

    fn check(&self) -> Result<bool> {
        Ok(self.path.try_exists()?)
    }

    fn mark(&self) -> Result<()> {
        let payload = MarkerPayload::now(&self.version);
        let data = serde_json::to_string_pretty(&payload)?;
        io::atomic_write(&self.path, data.as_bytes())
    }

    fn reset(&self) -> Result<()> {
        if io::remove_if_exists(&self.path)? {
            tracing::debug!(path = %self.path.display(), "removed installation marker");
        }
        Ok(())
    }

    fn details(&self) -> InstallationDetails {
        InstallationDetails::File {
            file_path: self.path.clone(),
            file_exists: self.path.exists(),
        }
    }

    fn probe(&self) -> StrategyProbe {
        let (exists, mut error) = match self.path.try_exists() {
            Ok(exists) => (exists, None),
            Err(e) => (false, Some(e.to_string())),
        };
        let contents = if exists {
            match io::read_preview(&self.path, PREVIEW_CHARS) {
                Ok(preview) => Some(preview),
                Err(e) => {
                    error = Some(e.to_string());
                    None
                }
            }
        } else {
            None
        };
        StrategyProbe::File(FileProbe {
            path: self.path.clone(),
            exists,
            contents,
            installed: exists,
            error,
        })
    }
}

/// Everything `diagnose` reports for the marker-file strategy.
#[derive(Debug, Clone, Serialize)]
pub struct FileProbe {
    pub path: PathBuf,
    pub exists: bool,
    /// First characters of the marker file, when present.
    pub contents: Option<String>,
    pub installed: bool,
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn strategy(dir: &TempDir) -> FileStrategy {
        FileStrategy::new(dir.path().join("storage/app/installed"), "2.3.0")
    }

    #[test]
    fn absent_file_is_not_installed() {
        let dir = TempDir::new().unwrap();
        assert!(!strategy(&dir).check().unwrap());
    }

    #[test]
    fn mark_creates_parent_dirs_and_json() {
        let dir = TempDir::new().unwrap();
        let s = strategy(&dir);
        s.mark().unwrap();

        assert!(s.check().unwrap());
        let marker = s.read_marker().unwrap().unwrap();
        assert_eq!(marker.installed_by, INSTALLED_BY);
        assert_eq!(marker.version, "2.3.0");
        assert!(chrono::DateTime::parse_from_rfc3339(&marker.installed_at).is_ok());
    }

    #[test]
    fn content_is_not_authoritative() {
        let dir = TempDir::new().unwrap();
        let s = strategy(&dir);
        std::fs::create_dir_all(s.path().parent().unwrap()).unwrap();
        std::fs::write(s.path(), "").unwrap();
        assert!(s.check().unwrap());
    }

    #[test]
    fn mark_overwrites_existing_marker() {
        let dir = TempDir::new().unwrap();
        let s = strategy(&dir);
        std::fs::create_dir_all(s.path().parent().unwrap()).unwrap();
        std::fs::write(s.path(), "stale").unwrap();
        s.mark().unwrap();
        assert!(s.read_marker().unwrap().is_some());
    }

    #[test]
    fn reset_deletes_and_tolerates_absence() {
        let dir = TempDir::new().unwrap();
        let s = strategy(&dir);
        s.mark().unwrap();
        s.reset().unwrap();
        assert!(!s.check().unwrap());
        s.reset().unwrap();
    }

    #[test]
    fn probe_previews_contents() {
        let dir = TempDir::new().unwrap();
        let s = strategy(&dir);
        s.mark().unwrap();
        let StrategyProbe::File(probe) = s.probe() else {
            panic!("expected file probe");
        };
        assert!(probe.exists);
        assert!(probe.contents.unwrap().contains("installed_by"));
        assert!(probe.error.is_none());
    }
}

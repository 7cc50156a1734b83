use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InstallerError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("environment file not found: {}", .0.display())]
    EnvFileMissing(PathBuf),

    #[error("database unavailable at {}: {reason}", .path.display())]
    DatabaseUnavailable { path: PathBuf, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, InstallerError>;

use super::{InstallationDetails, InstallationStrategy, StrategyProbe};
use crate::config::CheckMethod;
use crate::error::{InstallerError, Result};
use crate::io;
use regex::{NoExpand, Regex};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Environment lookup
// ---------------------------------------------------------------------------

/// Source of process-level environment variables. Injectable so tests never
/// touch the real environment.
pub trait EnvLookup: Send + Sync {
    fn var(&self, key: &str) -> Option<String>;
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvLookup for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvLookup for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

// ---------------------------------------------------------------------------
// EnvValue
// ---------------------------------------------------------------------------

/// An environment value after keyword coercion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum EnvValue {
    Str(String),
    Bool(bool),
    Null,
}

impl EnvValue {
    /// Coerce a raw value: `true`/`(true)` and `false`/`(false)` become
    /// booleans, `null`/`(null)` becomes null, `empty`/`(empty)` becomes the
    /// empty string. Keywords are case-insensitive; anything else is kept.
    pub fn coerce(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "true" | "(true)" => EnvValue::Bool(true),
            "false" | "(false)" => EnvValue::Bool(false),
            "null" | "(null)" => EnvValue::Null,
            "empty" | "(empty)" => EnvValue::Str(String::new()),
            _ => EnvValue::Str(raw.to_string()),
        }
    }

    /// Strict installed test: the string `"true"` or boolean `true` only.
    /// `"1"`, `"yes"` and the empty string do not count.
    pub fn is_installed_flag(&self) -> bool {
        match self {
            EnvValue::Str(s) => s == "true",
            EnvValue::Bool(b) => *b,
            EnvValue::Null => false,
        }
    }

    pub fn is_strict_string_true(&self) -> bool {
        matches!(self, EnvValue::Str(s) if s == "true")
    }

    pub fn is_bool_true(&self) -> bool {
        matches!(self, EnvValue::Bool(true))
    }

    /// Loose truthiness, reported by diagnostics only.
    pub fn is_loosely_true(&self) -> bool {
        match self {
            EnvValue::Str(s) => !s.is_empty() && s != "0",
            EnvValue::Bool(b) => *b,
            EnvValue::Null => false,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            EnvValue::Str(_) => "string",
            EnvValue::Bool(_) => "boolean",
            EnvValue::Null => "null",
        }
    }
}

// ---------------------------------------------------------------------------
// Env file parsing
// ---------------------------------------------------------------------------

fn key_line_re(key: &str) -> Result<Regex> {
    Regex::new(&format!(r"(?m)^{}=([^\r\n]*)", regex::escape(key)))
        .map_err(|e| InstallerError::InvalidConfig(format!("env key '{key}': {e}")))
}

/// Parse the right-hand side of a `KEY=value` line: matching surrounding
/// quotes are stripped, unquoted values lose a trailing ` # comment`.
fn parse_line_value(raw: &str) -> String {
    let trimmed = raw.trim();
    for quote in ['"', '\''] {
        if trimmed.len() >= 2 && trimmed.starts_with(quote) && trimmed.ends_with(quote) {
            return trimmed[1..trimmed.len() - 1].to_string();
        }
    }
    match trimmed.find(" #") {
        Some(idx) => trimmed[..idx].trim_end().to_string(),
        None => trimmed.to_string(),
    }
}

// ---------------------------------------------------------------------------
// EnvironmentStrategy
// ---------------------------------------------------------------------------

/// Installed flag stored as `KEY=true` in an env definition file and read
/// back through the environment. A value already present in the process
/// environment wins over the file.
pub struct EnvironmentStrategy {
    key: String,
    env_file: PathBuf,
    lookup: Box<dyn EnvLookup>,
}

impl EnvironmentStrategy {
    pub fn new(key: impl Into<String>, env_file: impl Into<PathBuf>) -> Self {
        Self::with_lookup(key, env_file, ProcessEnv)
    }

    pub fn with_lookup(
        key: impl Into<String>,
        env_file: impl Into<PathBuf>,
        lookup: impl EnvLookup + 'static,
    ) -> Self {
        Self {
            key: key.into(),
            env_file: env_file.into(),
            lookup: Box::new(lookup),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn env_file(&self) -> &Path {
        &self.env_file
    }

    /// Right-hand side of the first `KEY=` line, trimmed but otherwise as
    /// written (quotes and comments included).
    pub fn file_line_value(&self) -> Result<Option<String>> {
        if !self.env_file.try_exists()? {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.env_file)?;
        let re = key_line_re(&self.key)?;
        Ok(re
            .captures(&content)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string()))
    }

    /// The env file's value for the key after quote and comment stripping.
    pub fn file_value(&self) -> Result<Option<String>> {
        Ok(self.file_line_value()?.map(|raw| parse_line_value(&raw)))
    }

    /// The raw value as the application sees it: process environment first,
    /// then the env file.
    pub fn raw_value(&self) -> Result<Option<String>> {
        if let Some(v) = self.lookup.var(&self.key) {
            return Ok(Some(v));
        }
        self.file_value()
    }

    pub fn value(&self) -> Result<EnvValue> {
        Ok(self
            .raw_value()?
            .map(|raw| EnvValue::coerce(&raw))
            .unwrap_or(EnvValue::Null))
    }

    /// Rewrite every `KEY=...` line to `KEY=<value>`. When the key is absent
    /// the line is appended only if `append_if_missing` is set.
    fn write_value(&self, value: &str, append_if_missing: bool) -> Result<()> {
        if !self.env_file.try_exists()? {
            return Err(InstallerError::EnvFileMissing(self.env_file.clone()));
        }
        let content = std::fs::read_to_string(&self.env_file)?;
        let re = key_line_re(&self.key)?;
        let line = format!("{}={}", self.key, value);

        let updated = if re.is_match(&content) {
            re.replace_all(&content, NoExpand(&line)).into_owned()
        } else if append_if_missing {
            format!("{content}\n{line}\n")
        } else {
            tracing::debug!(key = %self.key, "env key absent, nothing to reset");
            return Ok(());
        };

        io::atomic_write(&self.env_file, updated.as_bytes())
    }
}

impl InstallationStrategy for EnvironmentStrategy {
    fn method(&self) -> CheckMethod {
        CheckMethod::Env
    }

    fn check(&self) -> Result<bool> {
        Ok(self.value()?.is_installed_flag())
    }

    fn mark(&self) -> Result<()> {
        self.write_value("true", true)
    }

    fn reset(&self) -> Result<()> {
        self.write_value("false", false)
    }

    fn details(&self) -> InstallationDetails {
        InstallationDetails::Env {
            env_key: self.key.clone(),
            env_value: self.raw_value().ok().flatten(),
        }
    }

    fn probe(&self) -> StrategyProbe {
        let process_value = self.lookup.var(&self.key);
        let env_file_exists = self.env_file.exists();
        let (file_line_value, file_error) = match self.file_line_value() {
            Ok(v) => (v, None),
            Err(e) => (None, Some(e.to_string())),
        };
        let file_value = file_line_value.as_deref().map(parse_line_value);
        let raw = process_value.clone().or_else(|| file_value.clone());
        let value = raw
            .as_deref()
            .map(EnvValue::coerce)
            .unwrap_or(EnvValue::Null);

        StrategyProbe::Env(EnvProbe {
            key: self.key.clone(),
            env_file: self.env_file.clone(),
            env_file_exists,
            process_value,
            file_value_len: file_line_value.as_ref().map(|v| v.chars().count()),
            file_value_is_true: file_line_value.as_deref().map(|v| v == "true"),
            file_line_value,
            file_value,
            value_type: value.type_name(),
            strict_string_match: value.is_strict_string_true(),
            boolean_match: value.is_bool_true(),
            loose_match: value.is_loosely_true(),
            installed: value.is_installed_flag(),
            value,
            error: file_error,
        })
    }
}

/// Everything `diagnose` reports for the environment strategy.
#[derive(Debug, Clone, Serialize)]
pub struct EnvProbe {
    pub key: String,
    pub env_file: PathBuf,
    pub env_file_exists: bool,
    pub process_value: Option<String>,
    /// The line value as written, before quote and comment stripping.
    pub file_line_value: Option<String>,
    /// The line value as the application reads it.
    pub file_value: Option<String>,
    /// Length of `file_line_value`.
    pub file_value_len: Option<usize>,
    /// Whether `file_line_value` is exactly `true`.
    pub file_value_is_true: Option<bool>,
    pub value: EnvValue,
    pub value_type: &'static str,
    pub strict_string_match: bool,
    pub boolean_match: bool,
    pub loose_match: bool,
    pub installed: bool,
    pub error: Option<String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Configuration file resolution and loading
//!
//! Resolution priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. Compiled default path (fallback)
//!
//! The file itself is TOML. A missing file is not an error: every config
//! struct must supply defaults so the sentinel can start with nothing but
//! environment variables.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Resolve the configuration file path.
///
/// `cli_arg` wins over `env_var_name`, which wins over `default_path`.
pub fn resolve_config_path(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    default_path: &str,
) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    PathBuf::from(default_path)
}

/// Load a TOML configuration file into `T`.
///
/// Returns `T::default()` when the file does not exist; a file that exists
/// but fails to parse is a hard configuration error, never silently ignored.
pub fn load_toml<T>(path: &Path) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    if !path.exists() {
        tracing::debug!(path = %path.display(), "No config file found, using defaults");
        return Ok(T::default());
    }

    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
}

/// Read a non-empty environment variable, trimming whitespace.
pub fn env_value(name: &str) -> Option<String> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => Some(v.trim().to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize)]
    struct TestConfig {
        #[serde(default)]
        name: String,
        #[serde(default)]
        threshold: f64,
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config: TestConfig = load_toml(Path::new("/nonexistent/firewatch.toml")).unwrap();
        assert_eq!(config.name, "");
        assert_eq!(config.threshold, 0.0);
    }

    #[test]
    fn partial_file_fills_remaining_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "threshold = 42.5\n").unwrap();

        let config: TestConfig = load_toml(&path).unwrap();
        assert_eq!(config.threshold, 42.5);
        assert_eq!(config.name, "");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "threshold = [not toml").unwrap();

        let result: Result<TestConfig> = load_toml(&path);
        assert!(result.is_err());
    }

    #[test]
    fn cli_argument_wins() {
        let path = resolve_config_path(
            Some(Path::new("/tmp/from-cli.toml")),
            "FIREWATCH_TEST_CONFIG_UNSET",
            "/etc/firewatch/config.toml",
        );
        assert_eq!(path, PathBuf::from("/tmp/from-cli.toml"));
    }

    #[test]
    fn default_path_is_fallback() {
        let path = resolve_config_path(
            None,
            "FIREWATCH_TEST_CONFIG_UNSET",
            "/etc/firewatch/config.toml",
        );
        assert_eq!(path, PathBuf::from("/etc/firewatch/config.toml"));
    }
}

//! Application configuration.
//!
//! Configuration is loaded from a TOML file at:
//! 1. `$EMLTREE_CONFIG` (environment variable)
//! 2. `~/.config/emltree/config.toml` (Linux/macOS)
//!    `%APPDATA%\emltree\config.toml` (Windows)
//! 3. Built-in defaults

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::parser::eml::{DecodeOptions, DEFAULT_MAX_DEPTH};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General behavior settings.
    pub general: GeneralConfig,
    /// Decoder settings.
    pub decode: DecodeConfig,
    /// Output defaults for the CLI.
    pub output: OutputConfig,
}

/// General behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub log_level: String,
    /// Override cache directory for logs.
    pub cache_dir: Option<PathBuf>,
}

/// Decoder settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeConfig {
    /// Deepest multipart nesting accepted.
    pub max_depth: usize,
    /// Treat entities without a Content-Type as `text/plain; charset=us-ascii`.
    pub default_content_type: bool,
}

/// Output defaults for the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Show raw headers and bodies instead of decoded ones.
    pub show_raw: bool,
    /// Indent JSON output.
    pub pretty_json: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            cache_dir: None,
        }
    }
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            default_content_type: false,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            show_raw: false,
            pretty_json: true,
        }
    }
}

impl DecodeConfig {
    pub fn options(&self) -> DecodeOptions {
        DecodeOptions {
            max_depth: self.max_depth,
            default_content_type: self.default_content_type,
        }
    }
}

/// Load configuration, searching standard locations.
///
/// Returns the default configuration if no file is found or on parse error.
pub fn load_config() -> Config {
    match config_file_path() {
        Some(path) if path.exists() => load_config_from(&path),
        _ => Config::default(),
    }
}

/// Load configuration from `path`, falling back to defaults on any error.
pub fn load_config_from(path: &Path) -> Config {
    match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str::<Config>(&contents) {
            Ok(cfg) => {
                tracing::info!(path = %path.display(), "Loaded config");
                cfg
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Failed to parse config, using defaults"
                );
                Config::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "Failed to read config file, using defaults"
            );
            Config::default()
        }
    }
}

/// Determine the config file path (checking env var first, then standard dirs).
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(env_path) = std::env::var("EMLTREE_CONFIG") {
        return Some(PathBuf::from(env_path));
    }
    dirs::config_dir().map(|d| d.join("emltree").join("config.toml"))
}

/// Return the cache directory for logs.
pub fn cache_dir(config: &Config) -> PathBuf {
    if let Some(ref dir) = config.general.cache_dir {
        return dir.clone();
    }
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("emltree")
}

/// Return the log file path.
pub fn log_file_path(config: &Config) -> PathBuf {
    cache_dir(config).join("emltree.log")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.general.log_level, "warn");
        assert_eq!(cfg.decode.max_depth, DEFAULT_MAX_DEPTH);
        assert!(!cfg.decode.default_content_type);
        assert!(cfg.output.pretty_json);
        assert_eq!(cfg.decode.options(), DecodeOptions::default());
    }

    #[test]
    fn test_serialize_deserialize_roundtrip() {
        let mut cfg = Config::default();
        cfg.decode.max_depth = 4;
        let toml_str = toml::to_string_pretty(&cfg).expect("serialize");
        let parsed: Config = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.decode.max_depth, 4);
        assert_eq!(parsed.general.log_level, cfg.general.log_level);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let partial = r#"
[decode]
default_content_type = true
"#;
        let cfg: Config = toml::from_str(partial).expect("parse partial");
        assert!(cfg.decode.default_content_type);
        assert_eq!(cfg.decode.max_depth, DEFAULT_MAX_DEPTH);
        assert!(!cfg.output.show_raw);
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[general]\nlog_level = \"debug\"\ncache_dir = \"/tmp/x\"\n").unwrap();

        let cfg = load_config_from(&path);
        assert_eq!(cfg.general.log_level, "debug");
        assert_eq!(cache_dir(&cfg), PathBuf::from("/tmp/x"));
        assert_eq!(log_file_path(&cfg), PathBuf::from("/tmp/x/emltree.log"));
    }

    #[test]
    fn test_load_config_from_invalid_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[decode]\nmax_depth = \"deep\"\n").unwrap();
        assert_eq!(load_config_from(&path).decode.max_depth, DEFAULT_MAX_DEPTH);

        let missing = dir.path().join("missing.toml");
        assert_eq!(load_config_from(&missing).general.log_level, "warn");
    }
}

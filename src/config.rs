use crate::cache::DEFAULT_CAPACITY;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = ".argmarshal.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: LogLevel,

    #[serde(default = "default_false")]
    pub json: bool,

    /// Write logs to this file instead of stderr
    #[serde(default)]
    pub file: Option<PathBuf>,

    #[serde(default = "default_false")]
    pub spans: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            json: false,
            file: None,
            spans: false,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: DEFAULT_CAPACITY,
        }
    }
}

fn default_true() -> bool { true }
fn default_false() -> bool { false }
fn default_capacity() -> usize { DEFAULT_CAPACITY }

impl LogLevel {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Some(Self::Trace),
            "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" => Some(Self::Warn),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Read { path: PathBuf, source: std::io::Error },
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "Failed to read config {}: {}", path.display(), source)
            }
            Self::Parse(e) => write!(f, "Failed to parse config: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Parse(e) => Some(e),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::Parse)
    }

    /// Find `.argmarshal.toml` in `start` or its parents, defaults otherwise
    pub fn discover_from(start: &Path) -> Self {
        let mut current = Some(start.to_path_buf());

        while let Some(dir) = current {
            let config_path = dir.join(CONFIG_FILE);
            if config_path.exists() {
                match Self::load(&config_path) {
                    Ok(config) => return config,
                    Err(e) => tracing::warn!(error = %e, "Ignoring unreadable config"),
                }
            }

            current = dir.parent().map(|p| p.to_path_buf());
        }

        Self::default()
    }

    /// [`Config::discover_from`] the current directory
    pub fn discover() -> Self {
        match std::env::current_dir() {
            Ok(dir) => Self::discover_from(&dir),
            Err(_) => Self::default(),
        }
    }

    /// Apply `ARGMARSHAL_*` environment overrides
    pub fn with_env(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        // ARGMARSHAL_LOG_LEVEL: trace, debug, info, warn, error
        if let Some(level) = var("ARGMARSHAL_LOG_LEVEL").as_deref().and_then(LogLevel::parse) {
            self.logging.level = level;
        }

        if var("ARGMARSHAL_LOG_JSON").is_some() {
            self.logging.json = true;
        }

        if let Some(path) = var("ARGMARSHAL_LOG_FILE") {
            self.logging.file = Some(PathBuf::from(path));
        }

        if let Some(capacity) = var("ARGMARSHAL_CACHE_CAPACITY").and_then(|v| v.parse().ok()) {
            self.cache.capacity = capacity;
        }

        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.logging.level, LogLevel::Info);
        assert!(config.cache.enabled);
        assert_eq!(config.cache.capacity, DEFAULT_CAPACITY);
    }

    #[test]
    fn test_parse_sections() {
        let config = Config::parse(
            r#"
            [logging]
            level = "debug"
            json = true

            [cache]
            enabled = false
            capacity = 8
            "#,
        )
        .unwrap();

        assert_eq!(config.logging.level, LogLevel::Debug);
        assert!(config.logging.json);
        assert!(!config.cache.enabled);
        assert_eq!(config.cache.capacity, 8);
    }

    #[test]
    fn test_parse_error() {
        let err = Config::parse("[logging]\nlevel = \"loud\"").unwrap_err();
        assert!(err.to_string().starts_with("Failed to parse config"));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("ARGMARSHAL_LOG_LEVEL", "TRACE"),
            ("ARGMARSHAL_LOG_FILE", "out.log"),
            ("ARGMARSHAL_CACHE_CAPACITY", "16"),
        ]
        .into_iter()
        .collect();

        let config = Config::default().with_overrides(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.logging.level, LogLevel::Trace);
        assert_eq!(config.logging.file, Some(PathBuf::from("out.log")));
        assert_eq!(config.cache.capacity, 16);
        assert!(!config.logging.json);
    }

    #[test]
    fn test_bad_override_ignored() {
        let config = Config::default().with_overrides(|k| {
            (k == "ARGMARSHAL_CACHE_CAPACITY").then(|| "lots".to_string())
        });
        assert_eq!(config.cache.capacity, DEFAULT_CAPACITY);
    }

    #[test]
    fn test_discover_from_parent() {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join(CONFIG_FILE), "[cache]\ncapacity = 3\n").unwrap();
        let nested = root.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();

        let config = Config::discover_from(&nested);
        assert_eq!(config.cache.capacity, 3);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}

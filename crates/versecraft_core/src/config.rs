//! Core configuration.
//!
//! # Responsibility
//! - Parse TOML configuration once at startup.
//! - Apply `VERSECRAFT_*` environment overrides.
//! - Validate values before any collaborator is built from them.
//!
//! # Invariants
//! - Every field has a default; an empty file is a valid configuration.
//! - `oracle.timeout_ms` is always positive.
//! - With the oracle enabled, `database.busy_timeout_ms` exceeds
//!   `oracle.timeout_ms`; a submitter may hold the write lock across one
//!   oracle call.

use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_DB_FILE_NAME: &str = "versecraft.sqlite3";
pub const DEFAULT_DB_BUSY_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_ORACLE_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_ORACLE_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_ORACLE_API_KEY_ENV: &str = "VERSECRAFT_ORACLE_API_KEY";
pub const DEFAULT_ORACLE_TIMEOUT_MS: u64 = 8_000;

/// Configuration load/validation errors.
#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(toml::de::Error),
    Invalid {
        field: &'static str,
        message: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config: {err}"),
            Self::Invalid { field, message } => write!(f, "invalid config `{field}`: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid { .. } => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub oracle: OracleConfig,
    pub prosody: ProsodyConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    /// How long a connection waits for another writer before failing.
    pub busy_timeout_ms: u64,
}

impl DatabaseConfig {
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_DB_FILE_NAME),
            busy_timeout_ms: DEFAULT_DB_BUSY_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `trace|debug|info|warn|error`; build-mode default when absent.
    pub level: Option<String>,
    /// Absolute directory for rolling log files; file logging is off when
    /// absent.
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OracleConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub timeout_ms: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: DEFAULT_ORACLE_ENDPOINT.to_string(),
            model: DEFAULT_ORACLE_MODEL.to_string(),
            api_key_env: DEFAULT_ORACLE_API_KEY_ENV.to_string(),
            timeout_ms: DEFAULT_ORACLE_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProsodyConfig {
    /// CMU-format dictionary merged over the built-in seed.
    ///
    /// The seed holds only a few hundred common words. Without a full
    /// dictionary most words fall back to vowel-run counting, which
    /// miscounts silent and diphthong vowels, so syllable rejections are
    /// less accurate.
    pub dictionary_path: Option<PathBuf>,
}

impl ProsodyConfig {
    pub fn uses_full_dictionary(&self) -> bool {
        self.dictionary_path.is_some()
    }
}

impl CoreConfig {
    /// Reads, overrides from the process environment, and validates.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&text)?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parses TOML text. Does not consult the environment.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Applies `VERSECRAFT_*` overrides read through `lookup`.
    pub fn apply_env_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(value) = read("VERSECRAFT_DB_PATH") {
            self.database.path = PathBuf::from(value);
        }
        if let Some(value) = read("VERSECRAFT_DB_BUSY_TIMEOUT_MS") {
            self.database.busy_timeout_ms =
                value.trim().parse().map_err(|_| ConfigError::Invalid {
                    field: "database.busy_timeout_ms",
                    message: format!("`{value}` is not a positive integer"),
                })?;
        }
        if let Some(value) = read("VERSECRAFT_LOG_LEVEL") {
            self.logging.level = Some(value);
        }
        if let Some(value) = read("VERSECRAFT_LOG_DIR") {
            self.logging.dir = Some(PathBuf::from(value));
        }
        if let Some(value) = read("VERSECRAFT_ORACLE_ENDPOINT") {
            self.oracle.endpoint = value;
        }
        if let Some(value) = read("VERSECRAFT_ORACLE_MODEL") {
            self.oracle.model = value;
        }
        if let Some(value) = read("VERSECRAFT_ORACLE_TIMEOUT_MS") {
            self.oracle.timeout_ms = value.trim().parse().map_err(|_| ConfigError::Invalid {
                field: "oracle.timeout_ms",
                message: format!("`{value}` is not a positive integer"),
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                field: "database.path",
                message: "must not be empty".to_string(),
            });
        }
        if self.oracle.timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "oracle.timeout_ms",
                message: "must be greater than zero".to_string(),
            });
        }
        if self.database.busy_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "database.busy_timeout_ms",
                message: "must be greater than zero".to_string(),
            });
        }
        if self.oracle.enabled {
            if self.database.busy_timeout_ms <= self.oracle.timeout_ms {
                return Err(ConfigError::Invalid {
                    field: "database.busy_timeout_ms",
                    message: format!(
                        "must exceed oracle.timeout_ms ({}) when the oracle is enabled",
                        self.oracle.timeout_ms
                    ),
                });
            }
            if self.oracle.endpoint.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    field: "oracle.endpoint",
                    message: "required when the oracle is enabled".to_string(),
                });
            }
            if self.oracle.model.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    field: "oracle.model",
                    message: "required when the oracle is enabled".to_string(),
                });
            }
        }
        if let Some(dir) = &self.logging.dir {
            if !dir.is_absolute() {
                return Err(ConfigError::Invalid {
                    field: "logging.dir",
                    message: format!("must be an absolute path, got `{}`", dir.display()),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn empty_text_yields_defaults() {
        let config = CoreConfig::from_toml_str("").unwrap();
        assert_eq!(config, CoreConfig::default());
        assert_eq!(config.database.path, PathBuf::from(DEFAULT_DB_FILE_NAME));
        assert!(!config.oracle.enabled);
        assert_eq!(config.oracle.timeout_ms, DEFAULT_ORACLE_TIMEOUT_MS);
        config.validate().unwrap();
    }

    #[test]
    fn parses_all_sections() {
        let text = r#"
            [database]
            path = "/var/lib/versecraft/poems.sqlite3"
            busy_timeout_ms = 20000

            [logging]
            level = "warn"
            dir = "/var/log/versecraft"

            [oracle]
            enabled = true
            endpoint = "http://localhost:8080/v1/chat/completions"
            model = "local-judge"
            api_key_env = "JUDGE_KEY"
            timeout_ms = 1500

            [prosody]
            dictionary_path = "/usr/share/cmudict/cmudict.dict"
        "#;
        let config = CoreConfig::from_toml_str(text).unwrap();
        config.validate().unwrap();
        assert_eq!(config.logging.level.as_deref(), Some("warn"));
        assert_eq!(config.database.busy_timeout(), Duration::from_secs(20));
        assert!(config.oracle.enabled);
        assert_eq!(config.oracle.model, "local-judge");
        assert_eq!(config.oracle.api_key_env, "JUDGE_KEY");
        assert_eq!(config.oracle.timeout_ms, 1500);
        assert_eq!(
            config.prosody.dictionary_path,
            Some(PathBuf::from("/usr/share/cmudict/cmudict.dict"))
        );
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = CoreConfig::from_toml_str("[oracle]\ntimeout = 5\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn env_overrides_replace_file_values() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("VERSECRAFT_DB_PATH", "/tmp/override.sqlite3"),
            ("VERSECRAFT_ORACLE_TIMEOUT_MS", "250"),
            ("VERSECRAFT_DB_BUSY_TIMEOUT_MS", "12000"),
            ("VERSECRAFT_LOG_LEVEL", "  "),
        ]);
        let mut config = CoreConfig::default();
        config
            .apply_env_overrides(|key| env.get(key).map(|value| value.to_string()))
            .unwrap();
        assert_eq!(config.database.path, PathBuf::from("/tmp/override.sqlite3"));
        assert_eq!(config.oracle.timeout_ms, 250);
        assert_eq!(config.database.busy_timeout_ms, 12_000);
        assert_eq!(config.logging.level, None);
    }

    #[test]
    fn bad_timeout_override_is_reported() {
        let mut config = CoreConfig::default();
        let err = config
            .apply_env_overrides(|key| {
                (key == "VERSECRAFT_ORACLE_TIMEOUT_MS").then(|| "soon".to_string())
            })
            .unwrap_err();
        assert!(err.to_string().contains("oracle.timeout_ms"));
    }

    #[test]
    fn validate_rejects_zero_timeout_and_relative_log_dir() {
        let mut config = CoreConfig::default();
        config.oracle.timeout_ms = 0;
        assert!(config.validate().is_err());

        let mut config = CoreConfig::default();
        config.logging.dir = Some(PathBuf::from("logs"));
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("absolute"));
    }

    #[test]
    fn busy_timeout_must_outlast_an_enabled_oracle() {
        let mut config = CoreConfig::default();
        config.database.busy_timeout_ms = 5_000;
        config.validate().expect("oracle disabled, any positive wait is fine");

        config.oracle.enabled = true;
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "database.busy_timeout_ms",
                ..
            }
        ));

        config.database.busy_timeout_ms = config.oracle.timeout_ms + 1;
        config.validate().unwrap();

        config.database.busy_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn default_busy_timeout_exceeds_default_oracle_timeout() {
        let mut config = CoreConfig::default();
        config.oracle.enabled = true;
        assert!(config.database.busy_timeout_ms > config.oracle.timeout_ms);
        config.validate().unwrap();
    }

    #[test]
    fn full_dictionary_is_reported_only_when_configured() {
        assert!(!ProsodyConfig::default().uses_full_dictionary());
        let config = ProsodyConfig {
            dictionary_path: Some(PathBuf::from("/usr/share/cmudict/cmudict.dict")),
        };
        assert!(config.uses_full_dictionary());
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("versecraft.toml");
        std::fs::write(&path, "[oracle]\nenabled = false\ntimeout_ms = 900\n").unwrap();
        let config = CoreConfig::load(&path).unwrap();
        assert!(config.oracle.timeout_ms > 0);
    }
}

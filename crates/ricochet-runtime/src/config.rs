//! Runtime configuration
//!
//! Loaded from TOML, then overridden from `RICOCHET_*` environment
//! variables, then validated:
//!
//! ```toml
//! [parallel]
//! strategy = "pool"     # serial | async | pool
//! threads = 4           # pool only; defaults to one per core
//! thread_name = "ricochet-worker"
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Environment variable overriding [`ParallelConfig::strategy`]
pub const ENV_PARALLEL_STRATEGY: &str = "RICOCHET_PARALLEL_STRATEGY";
/// Environment variable overriding [`ParallelConfig::threads`]
pub const ENV_PARALLEL_THREADS: &str = "RICOCHET_PARALLEL_THREADS";
/// Environment variable overriding [`ParallelConfig::thread_name`]
pub const ENV_PARALLEL_THREAD_NAME: &str = "RICOCHET_PARALLEL_THREAD_NAME";

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// File that was read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The configuration is not valid TOML for this schema
    #[error("Invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration could not be rendered as TOML
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// An environment override could not be parsed
    #[error("Invalid value {value:?} for {var}: {reason}")]
    InvalidEnv {
        /// Variable name
        var: &'static str,
        /// Value found
        value: String,
        /// What was expected
        reason: String,
    },

    /// A field failed validation
    #[error("Field '{field}': {message}")]
    Invalid {
        /// Dotted field path
        field: &'static str,
        /// What is wrong with it
        message: String,
    },

    /// The worker pool could not be started
    #[error("Failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

impl ConfigError {
    fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            message: message.into(),
        }
    }
}

/// How `ParallelEffects` are performed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParallelStrategy {
    /// One child at a time on the caller's thread
    Serial,
    /// All children started at once, results gathered as boxes are written
    #[default]
    Async,
    /// Children sync-performed on a worker thread pool
    Pool,
}

impl ParallelStrategy {
    /// Name used in configuration files and the environment
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Serial => "serial",
            Self::Async => "async",
            Self::Pool => "pool",
        }
    }
}

impl fmt::Display for ParallelStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParallelStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "serial" => Ok(Self::Serial),
            "async" => Ok(Self::Async),
            "pool" => Ok(Self::Pool),
            other => Err(format!("unknown strategy '{other}', expected serial, async or pool")),
        }
    }
}

/// Parallel effect settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParallelConfig {
    /// Performer used for `ParallelEffects`
    pub strategy: ParallelStrategy,
    /// Worker count for the pool strategy; `None` means one per core
    pub threads: Option<usize>,
    /// Prefix for worker thread names
    pub thread_name: String,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            strategy: ParallelStrategy::default(),
            threads: None,
            thread_name: "ricochet-worker".to_string(),
        }
    }
}

/// Top-level runtime configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Parallel effect settings
    pub parallel: ParallelConfig,
}

impl RuntimeConfig {
    /// Parse a TOML document; missing fields take their defaults
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Render as TOML
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string(self)?)
    }

    /// Merge with `RICOCHET_*` environment variables
    pub fn merge_with_env(&mut self) -> Result<(), ConfigError> {
        self.merge_with_vars(|name| std::env::var(name).ok())
    }

    /// Merge overrides looked up through `lookup`
    ///
    /// Only variables that are set are applied.
    pub fn merge_with_vars<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_PARALLEL_STRATEGY) {
            self.parallel.strategy = value.parse().map_err(|reason| ConfigError::InvalidEnv {
                var: ENV_PARALLEL_STRATEGY,
                value: value.clone(),
                reason,
            })?;
        }
        if let Some(value) = lookup(ENV_PARALLEL_THREADS) {
            let threads = value
                .trim()
                .parse::<usize>()
                .map_err(|e| ConfigError::InvalidEnv {
                    var: ENV_PARALLEL_THREADS,
                    value: value.clone(),
                    reason: e.to_string(),
                })?;
            self.parallel.threads = Some(threads);
        }
        if let Some(value) = lookup(ENV_PARALLEL_THREAD_NAME) {
            self.parallel.thread_name = value;
        }
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.parallel.threads == Some(0) {
            return Err(ConfigError::invalid(
                "parallel.threads",
                "must be at least 1 when set",
            ));
        }
        if self.parallel.thread_name.trim().is_empty() {
            return Err(ConfigError::invalid(
                "parallel.thread_name",
                "must not be empty",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = RuntimeConfig::default();
        assert_eq!(config.parallel.strategy, ParallelStrategy::Async);
        assert_eq!(config.parallel.threads, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = RuntimeConfig::from_toml_str("[parallel]\nstrategy = \"pool\"\n").unwrap();
        assert_eq!(config.parallel.strategy, ParallelStrategy::Pool);
        assert_eq!(config.parallel.thread_name, "ricochet-worker");
        assert_eq!(RuntimeConfig::from_toml_str("").unwrap(), RuntimeConfig::default());
    }

    #[test]
    fn test_unknown_strategy_is_rejected() {
        let err = RuntimeConfig::from_toml_str("[parallel]\nstrategy = \"fibers\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        let err = RuntimeConfig::from_toml_str("[parallel]\nworkers = 2\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut config = RuntimeConfig::default();
        config.parallel.strategy = ParallelStrategy::Serial;
        config.parallel.threads = Some(3);
        let parsed = RuntimeConfig::from_toml_str(&config.to_toml_string().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_var_overrides() {
        let mut config = RuntimeConfig::default();
        config
            .merge_with_vars(vars(&[
                (ENV_PARALLEL_STRATEGY, "Pool"),
                (ENV_PARALLEL_THREADS, " 8 "),
                (ENV_PARALLEL_THREAD_NAME, "fx"),
            ]))
            .unwrap();
        assert_eq!(config.parallel.strategy, ParallelStrategy::Pool);
        assert_eq!(config.parallel.threads, Some(8));
        assert_eq!(config.parallel.thread_name, "fx");
    }

    #[test]
    fn test_bad_var_names_variable() {
        let mut config = RuntimeConfig::default();
        let err = config
            .merge_with_vars(vars(&[(ENV_PARALLEL_THREADS, "many")]))
            .unwrap_err();
        match err {
            ConfigError::InvalidEnv { var, value, .. } => {
                assert_eq!(var, ENV_PARALLEL_THREADS);
                assert_eq!(value, "many");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_validation() {
        let mut config = RuntimeConfig::default();
        config.parallel.threads = Some(0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "parallel.threads", .. })
        ));

        let mut config = RuntimeConfig::default();
        config.parallel.thread_name = "  ".to_string();
        assert!(config.validate().is_err());
    }
}

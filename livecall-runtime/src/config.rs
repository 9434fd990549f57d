//! Configuration parsing and management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),
}

/// Main configuration struct matching the livecall.yml schema
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub runtime: RuntimeConfig,

    #[serde(default)]
    pub server: ServerConfig,

    // Internal: path to config file (for relative path resolution)
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

/// Settings for the foreign runtime and the event loop that hosts it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Environment variable holding the runtime's parallelism hint
    #[serde(default = "default_parallelism_env")]
    pub parallelism_env: String,

    /// Value written to `parallelism_env` when it is unset
    #[serde(default = "default_parallelism")]
    pub parallelism_default: String,

    /// Helper script loaded instead of the runtime's built-in one
    #[serde(default)]
    pub helper_script: Option<PathBuf>,

    /// Bounded wait for blocking calls; unset waits forever
    #[serde(default)]
    pub call_timeout_ms: Option<u64>,

    /// Re-install the SIGINT forwarder after the runtime starts
    #[serde(default = "default_true")]
    pub rearm_interrupt: bool,

    #[serde(default = "default_loop_thread_name")]
    pub loop_thread_name: String,
}

fn default_parallelism_env() -> String {
    String::from("LIVECALL_NUM_THREADS")
}

fn default_parallelism() -> String {
    String::from("auto")
}

fn default_loop_thread_name() -> String {
    String::from("livecall-eventloop")
}

fn default_true() -> bool {
    true
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            parallelism_env: default_parallelism_env(),
            parallelism_default: default_parallelism(),
            helper_script: None,
            call_timeout_ms: None,
            rearm_interrupt: true,
            loop_thread_name: default_loop_thread_name(),
        }
    }
}

impl RuntimeConfig {
    pub fn call_timeout(&self) -> Option<Duration> {
        self.call_timeout_ms.map(Duration::from_millis)
    }

    /// Write the parallelism default into the environment if it is unset.
    ///
    /// Returns the effective hint.
    pub fn apply_parallelism_default(&self) -> String {
        match std::env::var(&self.parallelism_env) {
            Ok(value) => value,
            Err(_) => {
                tracing::debug!(
                    var = %self.parallelism_env,
                    value = %self.parallelism_default,
                    "Setting default parallelism hint"
                );
                std::env::set_var(&self.parallelism_env, &self.parallelism_default);
                self.parallelism_default.clone()
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    8501
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = serde_yaml::from_str(&contents)?;

        // Store config file path for relative path resolution
        config.config_path = Some(path.to_path_buf());
        if let Some(helper) = config.runtime.helper_script.take() {
            config.runtime.helper_script = Some(config.resolve_path(&helper));
        }

        Ok(config)
    }

    /// Load the file if it exists, otherwise fall back to defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            Ok(Self::default())
        }
    }

    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            return path.to_path_buf();
        }
        match self.config_path.as_deref().and_then(Path::parent) {
            Some(base) => base.join(path),
            None => path.to_path_buf(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_from_empty_yaml() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.runtime.parallelism_env, "LIVECALL_NUM_THREADS");
        assert_eq!(config.runtime.parallelism_default, "auto");
        assert!(config.runtime.rearm_interrupt);
        assert_eq!(config.runtime.call_timeout(), None);
        assert_eq!(config.server.port, 8501);
    }

    #[test]
    fn test_from_file_resolves_helper_relative_to_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("livecall.yml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "runtime:\n  helper_script: helpers/display.lc\n  call_timeout_ms: 250\nserver:\n  port: 9000"
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(
            config.runtime.helper_script,
            Some(dir.path().join("helpers/display.lc"))
        );
        assert_eq!(
            config.runtime.call_timeout(),
            Some(Duration::from_millis(250))
        );
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(dir.path().join("absent.yml")).unwrap();
        assert_eq!(config.runtime.loop_thread_name, "livecall-eventloop");
    }

    #[test]
    fn test_parallelism_default_respects_existing_value() {
        let runtime = RuntimeConfig {
            parallelism_env: "LIVECALL_TEST_THREADS_PRESET".to_string(),
            ..RuntimeConfig::default()
        };
        std::env::set_var("LIVECALL_TEST_THREADS_PRESET", "4");
        assert_eq!(runtime.apply_parallelism_default(), "4");

        let runtime = RuntimeConfig {
            parallelism_env: "LIVECALL_TEST_THREADS_UNSET".to_string(),
            ..RuntimeConfig::default()
        };
        std::env::remove_var("LIVECALL_TEST_THREADS_UNSET");
        assert_eq!(runtime.apply_parallelism_default(), "auto");
        assert_eq!(
            std::env::var("LIVECALL_TEST_THREADS_UNSET").unwrap(),
            "auto"
        );
    }
}

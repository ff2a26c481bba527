//! Configuration management for the Sovereign console
//!
//! Provides TOML-based configuration with defaults and validation.
//! Location: ~/.sovereign/config.toml

use crate::errors::{ConsoleError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Port the stock agent server script listens on
pub const DEFAULT_AGENT_PORT: u16 = 8888;

/// Complete configuration for the console
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub agent: AgentServiceConfig,
    pub runtime: RuntimeConfig,
    pub store: StoreConfig,
    pub device: DeviceConfig,
    pub paths: PathsConfig,
    pub collaborators: CollaboratorsConfig,
}

/// Agent service endpoint and lazy-start settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentServiceConfig {
    pub host: String,
    /// Handed to a lazily started service as `--port` and `SOVEREIGN_AGENT_PORT`.
    /// Server scripts that ignore both still bind 8888.
    pub port: u16,
    /// Agent identifier sent with every chat request
    pub name: String,
    pub health_timeout_ms: u64,
    pub chat_timeout_ms: u64,
    /// Delay between spawning the service and retrying the request
    pub startup_delay_ms: u64,
    pub python: String,
    pub server_script: String,
}

/// Local model runtime (Ollama)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub binary: String,
    pub probe_timeout_ms: u64,
}

/// On-disk training data store
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub training_dir: String,
    /// Substring a file stem must contain to count as training data
    pub name_contains: String,
    pub extensions: Vec<String>,
}

/// Peer device bridge
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub bridge_binary: String,
    pub companion_package: String,
    pub probe_timeout_ms: u64,
}

/// File system paths configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub agents_dir: String,
    pub history_file: String,
}

/// External programs the dispatcher forwards to
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollaboratorsConfig {
    pub writer: String,
    pub unified: String,
    pub mesh_sync: String,
}

impl Default for AgentServiceConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_AGENT_PORT,
            name: "aura".to_string(),
            health_timeout_ms: 2_000,
            chat_timeout_ms: 60_000,
            startup_delay_ms: 3_000,
            python: "python3".to_string(),
            server_script: "~/.sovereign/training/agent_server.py".to_string(),
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            binary: "ollama".to_string(),
            probe_timeout_ms: 5_000,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            training_dir: "~/.sovereign/training".to_string(),
            name_contains: "training".to_string(),
            extensions: vec!["json".to_string(), "jsonl".to_string()],
        }
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            bridge_binary: "adb".to_string(),
            companion_package: "com.termux".to_string(),
            probe_timeout_ms: 5_000,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            agents_dir: "~/.sovereign/agents".to_string(),
            history_file: "~/.sovereign/chat_history".to_string(),
        }
    }
}

impl Default for CollaboratorsConfig {
    fn default() -> Self {
        Self {
            writer: "sovereign-writer".to_string(),
            unified: "sovereign-unified".to_string(),
            mesh_sync: "sovereign-mesh-sync".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file or use defaults
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        if let Some(config_path) = path {
            Self::load_from_file(&config_path)
        } else {
            Self::load_default()
        }
    }

    /// Load configuration from specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConsoleError::ConfigError(format!("Failed to read config: {}", e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| ConsoleError::ConfigError(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load default configuration from standard location or use built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Some(home) = dirs::home_dir() {
            let config_path = home.join(".sovereign").join("config.toml");
            if config_path.exists() {
                return Self::load_from_file(&config_path);
            }
        }

        Ok(Config::default())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.agent.port == 0 {
            return Err(ConsoleError::ConfigError(
                "agent.port must be greater than 0".to_string(),
            ));
        }

        if self.agent.health_timeout_ms == 0 || self.agent.chat_timeout_ms == 0 {
            return Err(ConsoleError::ConfigError(
                "agent timeouts must be greater than 0".to_string(),
            ));
        }

        if self.runtime.probe_timeout_ms == 0 || self.device.probe_timeout_ms == 0 {
            return Err(ConsoleError::ConfigError(
                "probe timeouts must be greater than 0".to_string(),
            ));
        }

        for (key, value) in [
            ("runtime.binary", &self.runtime.binary),
            ("device.bridge_binary", &self.device.bridge_binary),
            ("agent.python", &self.agent.python),
        ] {
            if value.trim().is_empty() {
                return Err(ConsoleError::ConfigError(format!("{} must not be empty", key)));
            }
        }

        if self.store.extensions.is_empty() {
            return Err(ConsoleError::ConfigError(
                "store.extensions must list at least one extension".to_string(),
            ));
        }

        Ok(())
    }

    /// Get agent service base URL
    pub fn agent_url(&self) -> String {
        format!("http://{}:{}", self.agent.host, self.agent.port)
    }

    pub fn health_timeout(&self) -> Duration {
        Duration::from_millis(self.agent.health_timeout_ms)
    }

    pub fn chat_timeout(&self) -> Duration {
        Duration::from_millis(self.agent.chat_timeout_ms)
    }

    pub fn startup_delay(&self) -> Duration {
        Duration::from_millis(self.agent.startup_delay_ms)
    }

    /// Expand tilde in paths
    pub fn expand_path(path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        }
        PathBuf::from(path)
    }

    pub fn training_dir(&self) -> PathBuf {
        Self::expand_path(&self.store.training_dir)
    }

    pub fn agents_dir(&self) -> PathBuf {
        Self::expand_path(&self.paths.agents_dir)
    }

    pub fn history_file(&self) -> PathBuf {
        Self::expand_path(&self.paths.history_file)
    }

    pub fn server_script(&self) -> PathBuf {
        Self::expand_path(&self.agent.server_script)
    }
}

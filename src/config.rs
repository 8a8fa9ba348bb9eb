use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::services::registry::RegistrySettings;

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";
const CONFIG_PATH_ENV: &str = "MSERVER_CONFIG";
const ENV_PREFIX: &str = "MSERVER_";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Failed to read environment overrides: {0}")]
    Env(#[from] envy::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub registry: RegistryConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// 签名共享密钥
    pub master_key: String,
    /// 心跳超时秒数
    pub heartbeat_timeout: u64,
    pub require_signature: bool,
    /// 后台清理间隔秒数，不设置则只在请求时清理
    pub sweep_interval: Option<u64>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            master_key: String::new(),
            heartbeat_timeout: 60,
            require_signature: true,
            sweep_interval: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// MSERVER_* 环境变量覆盖
#[derive(Debug, Default, Deserialize)]
struct EnvOverrides {
    listen_addr: Option<String>,
    master_key: Option<String>,
    heartbeat_timeout: Option<u64>,
    require_signature: Option<bool>,
    sweep_interval: Option<u64>,
    log_level: Option<String>,
}

impl Config {
    /// 读取 .env、配置文件与环境变量覆盖
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_file(&path)?,
            Err(_) if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_file(DEFAULT_CONFIG_PATH)?
            }
            Err(_) => Self::default(),
        };

        let overrides: EnvOverrides = envy::prefixed(ENV_PREFIX).from_env()?;
        config.apply(overrides);
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config_str = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&config_str)
    }

    pub fn from_toml(config_str: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(config_str)?;
        Ok(config)
    }

    fn apply(&mut self, overrides: EnvOverrides) {
        if let Some(listen_addr) = overrides.listen_addr {
            self.server.listen_addr = listen_addr;
        }
        if let Some(master_key) = overrides.master_key {
            self.registry.master_key = master_key;
        }
        if let Some(timeout) = overrides.heartbeat_timeout {
            self.registry.heartbeat_timeout = timeout;
        }
        if let Some(require_signature) = overrides.require_signature {
            self.registry.require_signature = require_signature;
        }
        if let Some(sweep_interval) = overrides.sweep_interval {
            self.registry.sweep_interval = Some(sweep_interval);
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.listen_addr()?;
        if self.registry.heartbeat_timeout == 0 {
            return Err(ConfigError::Invalid(
                "heartbeat_timeout must be greater than zero".to_string(),
            ));
        }
        if self.registry.require_signature && self.registry.master_key.is_empty() {
            return Err(ConfigError::Invalid(
                "master_key is required when require_signature is enabled".to_string(),
            ));
        }
        if self.registry.sweep_interval == Some(0) {
            return Err(ConfigError::Invalid(
                "sweep_interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server.listen_addr.parse().map_err(|e| {
            ConfigError::Invalid(format!(
                "listen_addr {:?} is not a socket address: {e}",
                self.server.listen_addr
            ))
        })
    }

    pub fn heartbeat_timeout(&self) -> Duration {
        Duration::from_secs(self.registry.heartbeat_timeout)
    }

    pub fn sweep_interval(&self) -> Option<Duration> {
        self.registry.sweep_interval.map(Duration::from_secs)
    }

    pub fn registry_settings(&self) -> RegistrySettings {
        RegistrySettings {
            secret: self.registry.master_key.as_bytes().to_vec(),
            timeout: self.heartbeat_timeout(),
            require_signature: self.registry.require_signature,
        }
    }
}

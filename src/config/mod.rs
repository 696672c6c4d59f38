//! Configuration
//!
//! [`ConfigService`] snapshots the process environment into a shared map;
//! [`ServerConfig`] reads the serving settings out of it.

use crate::error::{PyramidionError, Result};
use dashmap::DashMap;
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

pub const HOST_KEY: &str = "HOST";
pub const PORT_KEY: &str = "PORT";
pub const STARTUP_TIMEOUT_KEY: &str = "STARTUP_TIMEOUT_SECS";
pub const SHUTDOWN_TIMEOUT_KEY: &str = "SHUTDOWN_TIMEOUT_SECS";
pub const ROOT_PATH_KEY: &str = "ROOT_PATH";

/// Configuration service
#[derive(Clone, Default)]
pub struct ConfigService {
    config: Arc<DashMap<String, String>>,
}

impl ConfigService {
    /// Empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration loaded from the current environment
    pub fn from_env() -> Self {
        let service = Self::default();
        for (key, value) in env::vars() {
            service.set(&key, &value);
        }
        service
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.config.get(key).map(|v| v.clone())
    }

    pub fn set(&self, key: &str, value: &str) {
        self.config.insert(key.to_string(), value.to_string());
    }

    /// Parse `key` as `T`; `Ok(None)` when the key is absent
    pub fn get_parsed<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.get(key)
            .map(|raw| {
                raw.trim().parse::<T>().map_err(|e| PyramidionError::Config {
                    key: key.to_string(),
                    message: format!("invalid value {:?}: {}", raw, e),
                })
            })
            .transpose()
    }
}

/// Settings used to serve an application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub root_path: Option<String>,
    pub startup_timeout: Option<Duration>,
    pub shutdown_timeout: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            root_path: None,
            startup_timeout: None,
            shutdown_timeout: None,
        }
    }
}

impl ServerConfig {
    /// Read `HOST`, `PORT`, `ROOT_PATH`, `STARTUP_TIMEOUT_SECS` and
    /// `SHUTDOWN_TIMEOUT_SECS`
    pub fn from_config(config: &ConfigService) -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            host: config.get(HOST_KEY).unwrap_or(defaults.host),
            port: config.get_parsed::<u16>(PORT_KEY)?.unwrap_or(defaults.port),
            root_path: config.get(ROOT_PATH_KEY).filter(|p| !p.is_empty()),
            startup_timeout: config
                .get_parsed::<u64>(STARTUP_TIMEOUT_KEY)?
                .map(Duration::from_secs),
            shutdown_timeout: config
                .get_parsed::<u64>(SHUTDOWN_TIMEOUT_KEY)?
                .map(Duration::from_secs),
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::from_config(&ConfigService::from_env())
    }

    /// The socket address to bind
    pub fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| PyramidionError::Config {
                key: HOST_KEY.to_string(),
                message: format!("invalid address {}:{}: {}", self.host, self.port, e),
            })
    }
}

use crate::error::{Result, TalonError};
use dashmap::DashMap;
use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;

/// Configuration service
///
/// A shared key/value store, usually seeded from the process environment. Clones share the
/// same map. Registered as a singleton by the application builder so injectables can
/// depend on it.
#[derive(Debug, Clone, Default)]
pub struct ConfigService {
    values: Arc<DashMap<String, String>>,
}

impl ConfigService {
    /// An empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// A configuration seeded with every environment variable.
    pub fn from_env() -> Self {
        let service = Self::new();
        for (key, value) in env::vars() {
            service.set(key, value);
        }
        service
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).map(|value| value.clone())
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get_or(&self, key: &str, default: impl Into<String>) -> String {
        self.get(key).unwrap_or_else(|| default.into())
    }

    /// Parse the value under `key`. Absent keys are `Ok(None)`.
    ///
    /// # Errors
    /// `InvalidConfig` when the value does not parse as `T`.
    pub fn get_parsed<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.get(key)
            .map(|raw| {
                raw.trim().parse::<T>().map_err(|e| TalonError::InvalidConfig {
                    key: key.to_string(),
                    message: format!("{:?}: {}", raw, e),
                })
            })
            .transpose()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }
}

/// Listener and HTTP adapter settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Maximum accepted request body, in bytes.
    pub body_limit: usize,
    /// Install a permissive CORS layer.
    pub cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            body_limit: 2 * 1024 * 1024,
            cors: false,
        }
    }
}

impl ServerConfig {
    /// Read `HOST`, `PORT`, `BODY_LIMIT` and `CORS`, falling back to the defaults.
    pub fn from_config(config: &ConfigService) -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            host: config.get_or("HOST", defaults.host),
            port: config.get_parsed("PORT")?.unwrap_or(defaults.port),
            body_limit: config.get_parsed("BODY_LIMIT")?.unwrap_or(defaults.body_limit),
            cors: config.get_parsed("CORS")?.unwrap_or(defaults.cors),
        })
    }
}

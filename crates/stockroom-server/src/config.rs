//! Environment configuration.

use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid {key} value '{value}': {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Which persistence backend to run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Sqlite,
    Json,
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sqlite" => Ok(Backend::Sqlite),
            "json" => Ok(Backend::Json),
            other => Err(format!("expected 'sqlite' or 'json', got '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub backend: Backend,
    pub db_path: PathBuf,
    pub data_file: PathBuf,
}

impl Config {
    /// Read configuration from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            host: try_load(&lookup, "STOCKROOM_HOST", "0.0.0.0")?,
            port: try_load(&lookup, "STOCKROOM_PORT", "5000")?,
            backend: try_load(&lookup, "STOCKROOM_BACKEND", "sqlite")?,
            db_path: try_load(&lookup, "STOCKROOM_DB_PATH", "stockroom.db")?,
            data_file: try_load(&lookup, "STOCKROOM_DATA_FILE", "products.json")?,
        })
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn try_load<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: &str,
) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let value = lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    value.parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        reason: e.to_string(),
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.address(), "0.0.0.0:5000");
        assert_eq!(config.backend, Backend::Sqlite);
        assert_eq!(config.db_path, PathBuf::from("stockroom.db"));
        assert_eq!(config.data_file, PathBuf::from("products.json"));
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("STOCKROOM_PORT", "8080"),
            ("STOCKROOM_BACKEND", "JSON"),
            ("STOCKROOM_DATA_FILE", "/var/lib/stockroom/data.json"),
        ])
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.backend, Backend::Json);
        assert_eq!(
            config.data_file,
            PathBuf::from("/var/lib/stockroom/data.json")
        );
    }

    #[test]
    fn test_invalid_port() {
        let result = config_from(&[("STOCKROOM_PORT", "eighty")]);
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                key: "STOCKROOM_PORT",
                ..
            })
        ));
    }

    #[test]
    fn test_invalid_backend() {
        let result = config_from(&[("STOCKROOM_BACKEND", "postgres")]);
        assert!(result.is_err());
    }
}

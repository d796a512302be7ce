//! Runtime configuration, read from `HBNB_*` environment variables

use crate::error::ConfigError;
use std::path::PathBuf;
use std::str::FromStr;

/// Which storage backend to run against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageType {
    /// Single JSON document on disk
    File,
    /// SQLite database
    Db,
}

impl FromStr for StorageType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" | "" => Ok(StorageType::File),
            "db" => Ok(StorageType::Db),
            _ => Err(ConfigError::InvalidStorageType(s.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub storage_type: StorageType,
    pub file_path: PathBuf,
    pub db_path: PathBuf,
    /// `HBNB_ENV`; "test" wipes the database at startup
    pub env: Option<String>,
    pub host: String,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            storage_type: StorageType::File,
            file_path: PathBuf::from("file.json"),
            db_path: PathBuf::from("hbnb.db"),
            env: None,
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source, falling back to defaults for unset names
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let storage_type = match lookup("HBNB_TYPE_STORAGE") {
            Some(value) => value.parse()?,
            None => defaults.storage_type,
        };

        let port = match lookup("HBNB_API_PORT") {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort(value.clone()))?,
            None => defaults.port,
        };

        Ok(Config {
            storage_type,
            file_path: lookup("HBNB_FILE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.file_path),
            db_path: lookup("HBNB_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            env: lookup("HBNB_ENV"),
            host: lookup("HBNB_API_HOST").unwrap_or(defaults.host),
            port,
        })
    }

    pub fn is_test_env(&self) -> bool {
        self.env.as_deref() == Some("test")
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.storage_type, StorageType::File);
        assert_eq!(config.file_path, PathBuf::from("file.json"));
        assert_eq!(config.bind_address(), "0.0.0.0:5000");
        assert!(!config.is_test_env());
    }

    #[test]
    fn test_reads_every_variable() {
        let config = config_from(&[
            ("HBNB_TYPE_STORAGE", "db"),
            ("HBNB_DB_PATH", "/tmp/hbnb_test.db"),
            ("HBNB_ENV", "test"),
            ("HBNB_API_HOST", "127.0.0.1"),
            ("HBNB_API_PORT", "5001"),
        ])
        .unwrap();

        assert_eq!(config.storage_type, StorageType::Db);
        assert_eq!(config.db_path, PathBuf::from("/tmp/hbnb_test.db"));
        assert!(config.is_test_env());
        assert_eq!(config.bind_address(), "127.0.0.1:5001");
    }

    #[test]
    fn test_rejects_bad_values() {
        assert_eq!(
            config_from(&[("HBNB_TYPE_STORAGE", "mongo")]).unwrap_err(),
            ConfigError::InvalidStorageType("mongo".to_string())
        );
        assert_eq!(
            config_from(&[("HBNB_API_PORT", "http")]).unwrap_err(),
            ConfigError::InvalidPort("http".to_string())
        );
    }
}

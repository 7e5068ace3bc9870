use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::client::DEFAULT_ENDPOINT;

pub const ENDPOINT_ENV_VAR: &str = "SQLAGENT_ENDPOINT";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine config directory")]
    NoConfigDir,
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::get_config_path()?)
    }

    /// Missing file means defaults; a file that exists must parse.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&config_content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let config_content = serde_json::to_string_pretty(self).map_err(|source| {
            ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            }
        })?;
        fs::write(path, config_content).map_err(io_err)
    }

    pub fn save_endpoint(endpoint: &str) -> Result<(), ConfigError> {
        Self::save_endpoint_to(&Self::get_config_path()?, endpoint)
    }

    /// Updates only the endpoint. A malformed file is reported, not replaced.
    pub fn save_endpoint_to(path: &Path, endpoint: &str) -> Result<(), ConfigError> {
        let mut config = Self::load_from(path)?;
        config.endpoint = Some(endpoint.to_string());
        config.save_to(path)
    }

    /// Picks the chat endpoint: explicit override, then `SQLAGENT_ENDPOINT`,
    /// then the config file, then the local development server.
    pub fn resolve_endpoint(&self, cli_override: Option<&str>) -> String {
        let from_env = std::env::var(ENDPOINT_ENV_VAR).ok();
        pick_endpoint(cli_override, from_env.as_deref(), self.endpoint.as_deref())
    }

    pub fn get_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;

        Ok(config_dir.join("sqlagent").join("config.json"))
    }
}

fn pick_endpoint(cli: Option<&str>, env: Option<&str>, file: Option<&str>) -> String {
    [cli, env, file]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
        .unwrap_or(DEFAULT_ENDPOINT)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("nope.json")).unwrap();
        assert_eq!(config, Config::new());
    }

    #[test]
    fn save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = Config {
            endpoint: Some("http://db-agent.internal:8080/api/chat".into()),
            log_file: None,
        };
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn save_endpoint_keeps_other_settings() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        Config {
            endpoint: None,
            log_file: Some(PathBuf::from("/tmp/sqlagent.log")),
        }
        .save_to(&path)
        .unwrap();

        Config::save_endpoint_to(&path, "http://db-agent.internal:8080/api/chat").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.endpoint.as_deref(), Some("http://db-agent.internal:8080/api/chat"));
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/sqlagent.log")));
    }

    #[test]
    fn save_endpoint_refuses_to_overwrite_malformed_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ \"log_file\": ").unwrap();

        let err = Config::save_endpoint_to(&path, "http://localhost:5000/api/chat").unwrap_err();

        assert!(matches!(err, ConfigError::Parse { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), "{ \"log_file\": ");
    }

    #[test]
    fn endpoint_precedence() {
        assert_eq!(
            pick_endpoint(Some("http://cli/api/chat"), Some("http://env/api/chat"), Some("http://file/api/chat")),
            "http://cli/api/chat"
        );
        assert_eq!(
            pick_endpoint(None, Some("http://env/api/chat"), Some("http://file/api/chat")),
            "http://env/api/chat"
        );
        assert_eq!(
            pick_endpoint(None, Some("  "), Some("http://file/api/chat")),
            "http://file/api/chat"
        );
        assert_eq!(pick_endpoint(None, None, None), DEFAULT_ENDPOINT);
    }
}

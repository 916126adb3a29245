use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable that overrides the configured password.
pub const PASSWORD_ENV: &str = "BENCH_PASSWORD";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read service config '{path}': {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("service config '{path}' is invalid: {source}")]
    Parse { path: PathBuf, source: serde_json::Error },
    #[error("service config has an empty base_url")]
    EmptyBaseUrl,
}

/// Status code each operation must answer with to count as a success.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct ExpectedStatus {
    pub key_generation: u16,
    pub save_encounter: u16,
    pub query_encounter: u16,
}

impl Default for ExpectedStatus {
    fn default() -> Self {
        Self {
            key_generation: 200,
            save_encounter: 201,
            query_encounter: 200,
        }
    }
}

/// Everything needed to reach the benchmarked service.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub base_url: String,
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Extra headers sent on every call.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// The service is usually fronted by a self-signed certificate.
    #[serde(default = "default_accept_invalid_certs")]
    pub accept_invalid_certs: bool,
    #[serde(default)]
    pub expected: ExpectedStatus,
}

fn default_accept_invalid_certs() -> bool {
    true
}

impl ServiceConfig {
    pub fn new(base_url: impl Into<String>, username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            username: username.into(),
            password: password.into(),
            headers: BTreeMap::new(),
            accept_invalid_certs: default_accept_invalid_certs(),
            expected: ExpectedStatus::default(),
        }
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: ServiceConfig =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        if let Ok(password) = std::env::var(PASSWORD_ENV) {
            config.password = password;
        }
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::EmptyBaseUrl);
        }
        Ok(())
    }

    /// Joins `path` onto the base URL without doubling the slash.
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

//! Server connection settings.
//!
//! Supplied programmatically or parsed from TOML:
//!
//! ```toml
//! user = "admin"
//! password = "admin"
//! host = "localhost"
//! port = 7777
//! database = "Demo"
//! ```

use serde::{Deserialize, Deserializer};

use crate::error::{Error, Result};

const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    pub user: String,
    pub password: String,
    pub host: String,
    #[serde(deserialize_with = "port_from_number_or_string")]
    pub port: String,
    /// Database every cube handle is opened in
    pub database: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Config {
    pub fn new(
        user: impl Into<String>,
        password: impl Into<String>,
        host: impl Into<String>,
        port: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
            host: host.into(),
            port: port.into(),
            database: database.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        if config.host.is_empty() {
            return Err(Error::Config("host must not be empty".into()));
        }
        Ok(config)
    }

    /// `http://{host}:{port}`
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

fn port_from_number_or_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Number(u16),
        Text(String),
    }

    Ok(match Port::deserialize(deserializer)? {
        Port::Number(n) => n.to_string(),
        Port::Text(s) => s,
    })
}

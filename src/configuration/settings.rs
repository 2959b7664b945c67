use crate::configuration::command_line::Opt;
use crate::configuration::constants::common::*;
use config::{Config, ConfigError, Environment, File};
use serde_derive::Deserialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("missing -{flag} {key} (or ${env})")]
    Missing {
        flag: char,
        key: &'static str,
        env: String,
    },
    #[error("invalid settings: {0}")]
    Config(#[from] ConfigError),
}

#[derive(Deserialize, Clone, PartialEq)]
pub struct Settings {
    pub server: String,
    pub database: String,
    pub user: String,
    pub password: String,
    pub port: u16,
    pub trust_cert: bool,
    #[serde(with = "crate::configuration::deserialize::duration")]
    pub timeout: Duration,
    #[serde(with = "crate::configuration::deserialize::duration")]
    pub connect_timeout: Duration,
    #[serde(with = "crate::configuration::deserialize::duration")]
    pub redraw_interval: Duration,
}

// Hand written so the password never ends up in a log file.
impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("server", &self.server)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("port", &self.port)
            .field("trust_cert", &self.trust_cert)
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("redraw_interval", &self.redraw_interval)
            .finish()
    }
}

const REQUIRED: [(char, &str); 4] = [
    ('s', "server"),
    ('d', "database"),
    ('u', "user"),
    ('p', "password"),
];

impl Settings {
    /// Layers defaults, the optional settings file, `TSQLR_*` variables and flags.
    pub fn load(options: &Opt) -> Result<Self, SettingsError> {
        let mut config = Self::defaults()?;
        if let Some(file) = &options.config {
            config.merge(File::from(file.as_path()))?;
        }
        config.merge(Environment::with_prefix(ENV_PREFIX))?;
        Self::from_config(config, options)
    }

    fn defaults() -> Result<Config, ConfigError> {
        let mut config = Config::new();
        config
            .set_default("port", DEFAULT_PORT)?
            .set_default("timeout", DEFAULT_TIMEOUT)?
            .set_default("connect_timeout", DEFAULT_CONNECT_TIMEOUT)?
            .set_default("redraw_interval", DEFAULT_REDRAW_INTERVAL)?
            .set_default("trust_cert", true)?;
        Ok(config)
    }

    fn from_config(mut config: Config, options: &Opt) -> Result<Self, SettingsError> {
        let overrides = [
            ("server", options.server.clone()),
            ("database", options.database.clone()),
            ("user", options.user.clone()),
            ("password", options.password.clone()),
        ];
        for (key, value) in overrides.iter() {
            if let Some(value) = value {
                config.set(key, value.clone())?;
            }
        }
        if let Some(port) = options.port {
            config.set("port", i64::from(port))?;
        }
        if let Some(timeout) = options.timeout {
            config.set("timeout", format!("{}ms", timeout.as_millis()))?;
        }

        for &(flag, key) in REQUIRED.iter() {
            let present = config
                .get_str(key)
                .map(|value| !value.is_empty())
                .unwrap_or(false);
            if !present {
                return Err(SettingsError::Missing {
                    flag,
                    key,
                    env: format!("{}_{}", ENV_PREFIX, key.to_uppercase()),
                });
            }
        }
        Ok(config.try_into()?)
    }

    /// Host and port to dial. A port in `server` wins over `port`.
    pub fn address(&self) -> (String, u16) {
        if let Some((host, port)) = self.server.rsplit_once(':') {
            if let Ok(port) = port.parse() {
                return (host.to_owned(), port);
            }
        }
        (self.server.clone(), self.port)
    }
}

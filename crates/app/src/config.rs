use std::time::Duration;

use client::AddMode;
use serde::Deserialize;

use crate::{
    commands::Cli,
    error::{AppError, Result},
};

const DEFAULT_CONFIG_PATH: &str = "config/spendsmart.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub email: String,
    /// Only read from the config file or `SPENDSMART_PASSWORD`.
    pub password: String,
    pub add_mode: AddMode,
    pub timeout_secs: Option<u64>,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000/api/".to_string(),
            email: String::new(),
            password: String::new(),
            add_mode: AddMode::Remote,
            timeout_secs: None,
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    pub fn credentials(&self) -> Result<(&str, &str)> {
        if self.email.trim().is_empty() {
            return Err(AppError::Missing("email"));
        }
        if self.password.is_empty() {
            return Err(AppError::Missing("password"));
        }
        Ok((self.email.trim(), self.password.as_str()))
    }
}

/// Layers the optional config file, `SPENDSMART_*` variables and CLI flags.
pub fn load(cli: &Cli) -> Result<AppConfig> {
    let config_path = cli.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
    let mut builder = config::Config::builder();
    builder = builder.add_source(config::File::with_name(config_path).required(false));
    builder = builder.add_source(config::Environment::with_prefix("SPENDSMART"));
    let mut settings: AppConfig = builder.build()?.try_deserialize()?;

    if let Some(base_url) = &cli.base_url {
        settings.base_url = base_url.clone();
    }
    if let Some(email) = &cli.email {
        settings.email = email.clone();
    }

    Ok(settings)
}

use std::{path::PathBuf, str::FromStr};

use secrecy::SecretString;
use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub bot: BotSettings,
    pub store: StoreSettings,
    pub assets: AssetSettings,
}

#[derive(Deserialize, Clone)]
pub struct BotSettings {
    pub token: SecretString,
    pub username: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub creator_id: u64,
}

#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreMode {
    /// Durable SQLite file.
    Online,
    /// In-memory, gone with the process.
    Offline,
}

#[derive(Deserialize, Clone)]
pub struct StoreSettings {
    pub mode: StoreMode,
    pub path: PathBuf,
}

#[derive(Deserialize, Clone)]
pub struct AssetSettings {
    pub logo_url: String,
    pub icon_path: PathBuf,
}

/// Deployment flavour from `APP_ENVIRONMENT`. Picks the overlay file and where to look for it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        std::env::var("APP_ENVIRONMENT").map_or(Ok(Environment::Local), |value| value.parse())
    }

    /// Name of the overlay file next to `base.yaml`.
    pub fn overlay(self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }

    /// Used when `CONFIG_DIR` is unset.
    pub fn default_config_dir(self) -> &'static str {
        match self {
            Environment::Local => "configuration",
            Environment::Production => "/etc/workshop-bot",
        }
    }
}

impl FromStr for Environment {
    type Err = config::ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        [Environment::Local, Environment::Production]
            .into_iter()
            .find(|environment| environment.overlay().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| {
                config::ConfigError::Message(format!(
                    "Unknown environment `{value}`, expected `local` or `production`"
                ))
            })
    }
}

pub fn get_config() -> Result<Settings, config::ConfigError> {
    let environment = Environment::from_env()?;
    let config_dir = std::env::var("CONFIG_DIR")
        .map_or_else(|_| PathBuf::from(environment.default_config_dir()), PathBuf::from);
    config::Config::builder()
        .add_source(config::File::from(config_dir.join("base")).required(true))
        .add_source(config::File::from(config_dir.join(environment.overlay())).required(true))
        .add_source(
            config::Environment::with_prefix("app")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?
        .try_deserialize()
}

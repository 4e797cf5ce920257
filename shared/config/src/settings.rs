//! Main application settings and configuration management

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use validator::Validate;

use crate::{DatabaseConfig, FraudScoreServiceConfig, NotificationsConfig};

/// Top-level settings tree for the fraud scoring service
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AppSettings {
    pub application: ApplicationConfig,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub notifications: NotificationsConfig,
    pub service: FraudScoreServiceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ApplicationConfig {
    #[validate(length(min = 1))]
    pub name: String,

    #[validate(length(min = 1))]
    pub version: String,

    #[validate(length(min = 1))]
    pub environment: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServerConfig {
    #[validate(length(min = 1))]
    pub host: String,

    #[validate(range(min = 1, max = 65535))]
    pub port: u16,
}

impl AppSettings {
    /// Load configuration layered from `config/default.yaml`,
    /// `config/{FRAUDSCORE_ENV}.yaml`, `config/local.yaml`, and
    /// `FRAUDSCORE_`-prefixed environment variables, in that order. Each
    /// layer is optional except the baked-in defaults below, which always
    /// seed the builder first so a bare `FRAUDSCORE_...` env var is enough
    /// to run without any config file on disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_dir("config")
    }

    pub fn load_from_dir<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();
        let defaults = Config::try_from(&AppSettings::default())?;
        let mut builder = Config::builder().add_source(defaults);

        let default_path = config_dir.join("default.yaml");
        if default_path.exists() {
            builder = builder.add_source(File::from(default_path).format(FileFormat::Yaml));
        }

        let env = env::var("FRAUDSCORE_ENV").unwrap_or_else(|_| "development".to_string());
        let env_path = config_dir.join(format!("{}.yaml", env));
        if env_path.exists() {
            builder = builder.add_source(File::from(env_path).format(FileFormat::Yaml));
        }

        let local_path = config_dir.join("local.yaml");
        if local_path.exists() {
            builder = builder.add_source(File::from(local_path).format(FileFormat::Yaml));
        }

        builder = builder.add_source(
            Environment::with_prefix("FRAUDSCORE")
                .separator("_")
                .try_parsing(true),
        );

        let settings: AppSettings = builder.build()?.try_deserialize()?;

        settings
            .validate()
            .map_err(|e| ConfigError::Message(format!("configuration validation failed: {:?}", e)))?;

        Ok(settings)
    }

    pub fn environment(&self) -> &str {
        &self.application.environment
    }

    pub fn is_test(&self) -> bool {
        self.application.environment == "test"
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            application: ApplicationConfig {
                name: "fraudscore".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                environment: "development".to_string(),
            },
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8084,
            },
            database: DatabaseConfig::default(),
            notifications: NotificationsConfig::default(),
            service: FraudScoreServiceConfig::default(),
        }
    }
}

//! Typed configuration for the fraud scoring platform
//!
//! Layers a baked-in [`settings::AppSettings::default`], optional YAML files
//! under a config directory, and `FRAUDSCORE_`-prefixed environment
//! variables, validating the merged result with `validator`.

pub mod settings;
pub mod database;
pub mod notifications;
pub mod service;

pub use settings::*;
pub use database::*;
pub use notifications::*;
pub use service::*;

// Re-export external dependencies
pub use config::{Config, ConfigError, Environment, File, FileFormat};
pub use dotenvy::dotenv;

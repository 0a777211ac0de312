//! Configuration module for the karma runtime.
//!
//! This module provides layered configuration loading (defaults, files,
//! environment) and validation for the bot identity, the store, the handler
//! chain and logging.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile};
pub use schema::{
    BotConfig, KarmaConfig, LogFormat, LogOutput, LoggingConfig, PlusPlusConfig, PluginsConfig,
    SpanEventConfig, StoreConfig,
};
pub use validation::validate_config;

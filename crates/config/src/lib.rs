//! Configuration management for the CityLiving backend
//!
//! Supports loading configuration from:
//! - YAML files (`config/default.yaml`, `config/{env}.yaml`)
//! - Environment variables (`CITY_LIVING_` prefix)
//!
//! Domain vocabulary (city gazetteer, amenity terms, topic keyword lists)
//! ships with compiled-in defaults and can be overridden from a YAML file.

pub mod constants;
pub mod settings;
pub mod vocabulary;

pub use settings::{
    load_settings, LlmSettings, ObservabilityConfig, RuntimeEnvironment, ServerConfig, Settings,
    StoreConfig,
};
pub use vocabulary::DomainVocabulary;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

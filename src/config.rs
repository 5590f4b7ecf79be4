use crate::error::{RegistryError, Result};
use serde::Deserialize;
use std::path::Path;

const ENV_PREFIX: &str = "EVENT_REGISTRY";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Name attached to every log record emitted by the registry
    pub name: String,
    /// Handler name used when a target is registered without one
    pub default_handler: String,
    /// Install the logging recovery hook (otherwise failures are discarded)
    pub log_failures: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            name: "event-registry".to_string(),
            default_handler: "process_event".to_string(),
            log_failures: true,
        }
    }
}

impl RegistryConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(name) = std::env::var("EVENT_REGISTRY_NAME") {
            config.name = name;
        }

        if let Ok(handler) = std::env::var("EVENT_REGISTRY_DEFAULT_HANDLER") {
            config.default_handler = handler;
        }

        if let Ok(log_failures) = std::env::var("EVENT_REGISTRY_LOG_FAILURES") {
            config.log_failures = log_failures.parse().map_err(|e| {
                RegistryError::Configuration(format!("Invalid log_failures: {e}"))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Layer defaults, an optional file and `EVENT_REGISTRY_*` variables
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let defaults = Self::default();
        let mut builder = config::Config::builder()
            .set_default("name", defaults.name)?
            .set_default("default_handler", defaults.default_handler)?
            .set_default("log_failures", defaults.log_failures)?;

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config: Self = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        tracing::debug!(
            name = %config.name,
            default_handler = %config.default_handler,
            log_failures = config.log_failures,
            "Registry configuration loaded"
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_handler.trim().is_empty() {
            return Err(RegistryError::Configuration(
                "default_handler must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

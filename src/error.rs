use thiserror::Error;

/// Boxed error returned by user handlers
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Caller-visible errors raised by registration and configuration
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No event category could be inferred for a listener type
    #[error("No matching event category for listener {listener}")]
    NoEventCategory { listener: &'static str },

    /// No compatible handler was found for a target
    #[error("No handler named '{method}' found for {target} accepting {category}")]
    NoHandler {
        method: String,
        target: &'static str,
        category: &'static str,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<config::ConfigError> for RegistryError {
    fn from(err: config::ConfigError) -> Self {
        RegistryError::Configuration(err.to_string())
    }
}

/// Failure raised while delivering one event to one target
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Handler '{handler}' failed: {source}")]
    Handler {
        handler: String,
        #[source]
        source: BoxError,
    },

    #[error("Target is not a {expected}")]
    TargetMismatch { expected: &'static str },

    #[error("Event {actual} is not a {expected}")]
    EventMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Dispatcher panicked: {message}")]
    Panicked { message: String },
}

impl DispatchError {
    /// Build a `Panicked` error from a caught panic payload
    pub fn from_panic(payload: &(dyn std::any::Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic".to_string()
        };
        DispatchError::Panicked { message }
    }
}

pub type Result<T> = std::result::Result<T, RegistryError>;

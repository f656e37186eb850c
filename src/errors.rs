//! Error handling for the DynHub registry.
//!
//! A single structured error enum covers the store, configuration, and
//! serialization failure modes; the request handler translates anything
//! that reaches it into the generic response envelope.

use thiserror::Error;

/// Main error type for the registry.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Store operation failed: {operation} - {source}")]
    Store {
        operation: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Serialization failed: {context}")]
    Serialization {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Store lock poisoned")]
    LockPoisoned,

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Shorthand for Result with RegistryError.
pub type RegistryResult<T> = Result<T, RegistryError>;

impl RegistryError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn store(
        operation: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Store {
            operation: operation.into(),
            source: Box::new(source),
        }
    }

    pub fn serialization(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serialization {
            context: context.into(),
            source,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl From<sled::Error> for RegistryError {
    fn from(err: sled::Error) -> Self {
        Self::store("sled", err)
    }
}

use thiserror::Error;

/// Infrastructure errors raised by the login core.
///
/// Authentication failures are never reported through this type; they are
/// values of [`crate::LoginOutcome`].
#[derive(Debug, Error)]
pub enum Error {
    #[error("Storage failure for key `{key}`: {message}")]
    Storage { key: String, message: String },
    #[error("Failed to read configuration from environment: {0}")]
    Env(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    pub fn storage(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Storage {
            key: key.into(),
            message: message.into(),
        }
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

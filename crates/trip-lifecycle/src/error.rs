use thiserror::Error;

/// Errors raised by the trip lifecycle crate.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("code: invalid_config, description: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Returns the error code.
    #[must_use]
    pub const fn code(&self) -> &str {
        match self {
            Self::InvalidConfig(_) => "invalid_config",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

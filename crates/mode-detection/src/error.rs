use thiserror::Error;

/// Errors raised while normalizing samples or loading detection settings.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("code: invalid_sample, description: {0}")]
    InvalidSample(String),

    #[error("code: invalid_config, description: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Returns the error code.
    #[must_use]
    pub const fn code(&self) -> &str {
        match self {
            Self::InvalidSample(_) => "invalid_sample",
            Self::InvalidConfig(_) => "invalid_config",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_code() {
        let err = Error::InvalidSample("latitude 95 out of range".to_string());

        assert_eq!(err.to_string(), "code: invalid_sample, description: latitude 95 out of range");
        assert_eq!(err.code(), "invalid_sample");
    }
}

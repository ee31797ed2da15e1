//! Error types and handling for the `va` weather aggregator

use crate::models::Source;
use thiserror::Error;

/// Main error type for the `va` crate
#[derive(Error, Debug)]
pub enum VaError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// A provider request failed (network, HTTP status, retries exhausted)
    #[error("Fetch error ({provider}): {message}")]
    Fetch { provider: Source, message: String },

    /// A provider answered with a payload that could not be normalized
    #[error("Parse error ({provider}): {message}")]
    Parse { provider: Source, message: String },

    /// Cache operation errors
    #[error("Cache error: {message}")]
    Cache { message: String },

    /// The requested city is not in the registry
    #[error("Unknown city: {name}")]
    UnknownCity { name: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// General application errors
    #[error("Application error: {message}")]
    General { message: String },
}

impl VaError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new fetch error for `provider`
    pub fn fetch<S: Into<String>>(provider: Source, message: S) -> Self {
        Self::Fetch {
            provider,
            message: message.into(),
        }
    }

    /// Create a new parse error for `provider`
    pub fn parse<S: Into<String>>(provider: Source, message: S) -> Self {
        Self::Parse {
            provider,
            message: message.into(),
        }
    }

    /// Create a new cache error
    pub fn cache<S: Into<String>>(message: S) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    pub fn unknown_city<S: Into<String>>(name: S) -> Self {
        Self::UnknownCity { name: name.into() }
    }

    /// Create a new general error
    pub fn general<S: Into<String>>(message: S) -> Self {
        Self::General {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            VaError::Config { .. } => {
                "Configuration error. Please check your config file and API keys.".to_string()
            }
            VaError::Fetch { provider, .. } => {
                format!("Unable to reach the {provider} forecast service. Please check your internet connection.")
            }
            VaError::Parse { provider, .. } => {
                format!("The {provider} forecast service returned data that could not be read.")
            }
            VaError::Cache { .. } => {
                "Cache operation failed. You may need to clear your cache.".to_string()
            }
            VaError::UnknownCity { name } => {
                format!("Unknown city '{name}'. Run `va cities` to list supported cities.")
            }
            VaError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
            VaError::General { message } => message.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_err = VaError::config("missing API key");
        assert!(matches!(config_err, VaError::Config { .. }));

        let fetch_err = VaError::fetch(Source::Dmi, "connection failed");
        assert!(matches!(
            fetch_err,
            VaError::Fetch {
                provider: Source::Dmi,
                ..
            }
        ));

        let parse_err = VaError::parse(Source::Yr, "missing timeseries");
        assert_eq!(parse_err.to_string(), "Parse error (yr): missing timeseries");
    }

    #[test]
    fn test_user_messages() {
        let config_err = VaError::config("test");
        assert!(config_err.user_message().contains("Configuration error"));

        let fetch_err = VaError::fetch(Source::Owm, "test");
        assert!(fetch_err.user_message().contains("owm"));

        let city_err = VaError::unknown_city("Gotham");
        assert!(city_err.user_message().contains("Gotham"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let va_err: VaError = io_err.into();
        assert!(matches!(va_err, VaError::Io { .. }));
    }
}

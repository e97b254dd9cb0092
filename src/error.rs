//! Error types and handling for the astro forecast engine

use thiserror::Error;

/// Main error type for the astro forecast engine
#[derive(Error, Debug)]
pub enum AstroForecastError {
    /// A raw hour is missing a mandatory field or carries an implausible value
    #[error("Malformed input: field `{field}` = {value} ({reason})")]
    MalformedInput {
        field: String,
        value: String,
        reason: String,
    },

    /// The adapter was invoked for a provider it does not know
    #[error("Unsupported provider: {provider}")]
    UnsupportedProvider { provider: String },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl AstroForecastError {
    /// Create a new malformed input error for a single raw field
    pub fn malformed<F, V, R>(field: F, value: V, reason: R) -> Self
    where
        F: Into<String>,
        V: ToString,
        R: Into<String>,
    {
        Self::MalformedInput {
            field: field.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// Create a mandatory-field-missing error
    pub fn missing<F: Into<String>>(field: F) -> Self {
        Self::malformed(field, "<absent>", "mandatory field missing")
    }

    /// Create a new unsupported provider error
    pub fn unsupported_provider<S: Into<String>>(provider: S) -> Self {
        Self::UnsupportedProvider {
            provider: provider.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Whether the error only affects a single hour of a payload
    #[must_use]
    pub fn is_hour_local(&self) -> bool {
        matches!(self, Self::MalformedInput { .. })
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            AstroForecastError::MalformedInput { field, value, .. } => {
                format!("Forecast data contained an unusable value for {field}: {value}")
            }
            AstroForecastError::UnsupportedProvider { provider } => {
                format!("Weather provider '{provider}' is not supported.")
            }
            AstroForecastError::Config { .. } => {
                "Configuration error. Please check your config file.".to_string()
            }
            AstroForecastError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            AstroForecastError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let malformed = AstroForecastError::malformed("relative_humidity", 140.0, "outside 0..=100");
        assert!(matches!(malformed, AstroForecastError::MalformedInput { .. }));
        assert!(malformed.is_hour_local());

        let provider = AstroForecastError::unsupported_provider("wetter.com");
        assert!(matches!(provider, AstroForecastError::UnsupportedProvider { .. }));
        assert!(!provider.is_hour_local());

        let config_err = AstroForecastError::config("all weights are zero");
        assert!(matches!(config_err, AstroForecastError::Config { .. }));
    }

    #[test]
    fn test_malformed_message_carries_field_and_value() {
        let err = AstroForecastError::malformed("relative_humidity", 140.5, "outside 0..=100");
        let message = err.to_string();
        assert!(message.contains("relative_humidity"));
        assert!(message.contains("140.5"));

        let missing = AstroForecastError::missing("air_temperature");
        assert!(missing.to_string().contains("mandatory field missing"));
    }

    #[test]
    fn test_user_messages() {
        let config_err = AstroForecastError::config("test");
        assert!(config_err.user_message().contains("Configuration error"));

        let provider = AstroForecastError::unsupported_provider("acme");
        assert!(provider.user_message().contains("acme"));

        let validation_err = AstroForecastError::validation("latitude 91");
        assert!(validation_err.user_message().contains("latitude 91"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: AstroForecastError = io_err.into();
        assert!(matches!(err, AstroForecastError::Io { .. }));
    }
}

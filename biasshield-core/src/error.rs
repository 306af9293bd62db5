//! Error types for the BiasShield core library.
//!
//! Only the backend client and configuration loading can fail. The analytics
//! modules never return errors: out-of-range values are clamped and undefined
//! rates are reported as `None`.

/// Top-level error type for the BiasShield core library.
#[derive(Debug, thiserror::Error)]
pub enum BiasShieldError {
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML serialization error: {0}")]
    Toml(#[from] toml::ser::Error),
}

/// Errors from the prediction backend.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("Backend is disabled in configuration")]
    Disabled,

    #[error("Request to {endpoint} failed: {source}")]
    Request {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} returned status {status}")]
    Status { endpoint: String, status: u16 },

    #[error("Failed to decode response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },
}

impl BiasShieldError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

/// Result alias used across the core library.
pub type Result<T> = std::result::Result<T, BiasShieldError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_display() {
        let err = BackendError::Status {
            endpoint: "/fairness".into(),
            status: 503,
        };
        assert_eq!(err.to_string(), "/fairness returned status 503");

        let wrapped: BiasShieldError = err.into();
        assert!(wrapped.to_string().starts_with("Backend error:"));
    }

    #[test]
    fn test_invalid_input_helper() {
        let err = BiasShieldError::invalid_input("strength must be finite");
        assert_eq!(err.to_string(), "Invalid input: strength must be finite");
    }
}

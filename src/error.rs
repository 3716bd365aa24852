//! Error types and handling for Wanas
//!
//! Every I/O path returns a tagged error instead of panicking or throwing
//! across component boundaries. The poll coordinator folds all of them into
//! a single "update failed" signal for observers, while actuator writes hand
//! them back to the caller unchanged.

use thiserror::Error;

/// Result type alias for Wanas operations
pub type Result<T> = std::result::Result<T, WanasError>;

/// Main error type for Wanas
#[derive(Debug, Error)]
pub enum WanasError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Validation errors
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    /// The transport could not establish a connection to the device
    #[error("Failed to connect to Modbus device at {host}:{port}: {message}")]
    Connect {
        host: String,
        port: u16,
        message: String,
    },

    /// The device answered with an exception response
    #[error("Modbus error at register {address}: {message}")]
    Protocol { address: u16, message: String },

    /// Unexpected I/O failure on an established connection
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// Timeout errors
    #[error("Timeout error: {message}")]
    Timeout { message: String },

    /// File I/O errors
    #[error("I/O error: {message}")]
    Io { message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Lookup of a sensor or switch key that is not in the catalog
    #[error("Unknown entity: {key}")]
    UnknownEntity { key: String },

    /// HTTP/Web server errors
    #[error("Web server error: {message}")]
    Web { message: String },
}

impl WanasError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        WanasError::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(field: S, message: S) -> Self {
        WanasError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new connect error for the given endpoint
    pub fn connect<H: Into<String>, S: Into<String>>(host: H, port: u16, message: S) -> Self {
        WanasError::Connect {
            host: host.into(),
            port,
            message: message.into(),
        }
    }

    /// Create a new protocol (exception response) error
    pub fn protocol<S: Into<String>>(address: u16, message: S) -> Self {
        WanasError::Protocol {
            address,
            message: message.into(),
        }
    }

    /// Create a new transport error
    pub fn transport<S: Into<String>>(message: S) -> Self {
        WanasError::Transport {
            message: message.into(),
        }
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(message: S) -> Self {
        WanasError::Timeout {
            message: message.into(),
        }
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        WanasError::Io {
            message: message.into(),
        }
    }

    /// Create a new unknown entity error
    pub fn unknown_entity<S: Into<String>>(key: S) -> Self {
        WanasError::UnknownEntity { key: key.into() }
    }

    /// Create a new web error
    pub fn web<S: Into<String>>(message: S) -> Self {
        WanasError::Web {
            message: message.into(),
        }
    }

    /// Whether the connection this error came from must be thrown away.
    ///
    /// A clean exception response leaves the socket usable; anything that
    /// happened below the protocol layer does not.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            WanasError::Transport { .. } | WanasError::Timeout { .. } | WanasError::Io { .. }
        )
    }
}

impl From<std::io::Error> for WanasError {
    fn from(err: std::io::Error) -> Self {
        WanasError::io(err.to_string())
    }
}

impl From<serde_yaml::Error> for WanasError {
    fn from(err: serde_yaml::Error) -> Self {
        WanasError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for WanasError {
    fn from(err: serde_json::Error) -> Self {
        WanasError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<tokio_modbus::Error> for WanasError {
    fn from(err: tokio_modbus::Error) -> Self {
        WanasError::transport(err.to_string())
    }
}

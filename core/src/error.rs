//! Error types for the user directory client.
//!
//! # Design
//! `ApiError` covers everything that can go wrong between issuing a request
//! and holding a typed value: the transport never produced a response, the
//! server answered with a failure status, or a payload did not (de)serialize.
//! Field-level form problems live in `validation` and never reach this type.

use thiserror::Error;

/// Errors returned by the adapter and the `DirectoryClient` parse methods.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No response was received (connection refused, DNS, timeout).
    #[error("network failure: {0}")]
    Network(String),

    /// The server answered with a non-success status. `message` is the
    /// `error` field of the JSON body when the server supplied one.
    #[error("HTTP {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Http { status: u16, message: Option<String> },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// The text shown to the user: the server's message if it sent one,
    /// otherwise the operation's fixed `fallback`.
    pub fn display_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Http {
                message: Some(message),
                ..
            } if !message.is_empty() => message.clone(),
            _ => fallback.to_string(),
        }
    }
}

/// Errors raised by a `CredentialStore` backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("credential store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("credential store is corrupt: {0}")]
    Format(#[from] serde_json::Error),
}

/// Errors raised while loading a `ClientConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

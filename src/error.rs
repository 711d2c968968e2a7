//! Error types for the dns-proxy-store crate.
//!
//! This module defines all error types used throughout the crate,
//! providing structured error handling with context.

use thiserror::Error;

/// Main error type for configuration store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Persisted configuration content could not be decoded.
    #[error("Failed to decode configuration: {message}")]
    Decode { message: String },

    /// No environment with the given name exists.
    #[error("Environment not found: {name}")]
    EnvNotFound { name: String },

    /// The environment exists but holds no mapping for the hostname.
    #[error("Hostname not found in environment '{env}': {hostname}")]
    HostnameNotFound { env: String, hostname: String },

    /// An index-based removal was given an out-of-range index.
    #[error("Index {index} out of range (length {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// I/O error wrapper.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Creates a new decode error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Creates a new environment-not-found error.
    pub fn env_not_found(name: impl Into<String>) -> Self {
        Self::EnvNotFound { name: name.into() }
    }

    /// Creates a new hostname-not-found error.
    pub fn hostname_not_found(env: impl Into<String>, hostname: impl Into<String>) -> Self {
        Self::HostnameNotFound {
            env: env.into(),
            hostname: hostname.into(),
        }
    }
}

/// Result type alias using StoreError.
pub type Result<T> = std::result::Result<T, StoreError>;

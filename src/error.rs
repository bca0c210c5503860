//! Error types for VeriGeek forum operations.

use thiserror::Error;

/// Result type alias for VeriGeek operations.
pub type Result<T> = std::result::Result<T, VeriGeekError>;

/// Main error type for VeriGeek operations.
///
/// Variants map one-to-one onto the HTTP failure taxonomy exposed by the
/// server: validation failures reject the request with no state change,
/// auth failures are reported before any store access, and storage
/// failures surface as generic server errors.
#[derive(Error, Debug)]
pub enum VeriGeekError {
    /// Malformed or missing required input
    #[error("Validation error: {0}")]
    Validation(String),

    /// No entity exists for the given identifier
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing or invalid credential on a protected operation
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but insufficient privilege
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Underlying store failures (open, read, write, delete)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Password hashing or verification errors
    #[error("Password error: {0}")]
    Password(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl VeriGeekError {
    /// Creates a new validation error.
    pub fn validation<T: ToString>(msg: T) -> Self {
        Self::Validation(msg.to_string())
    }

    /// Creates a new not-found error.
    pub fn not_found<T: ToString>(msg: T) -> Self {
        Self::NotFound(msg.to_string())
    }

    /// Creates a new unauthorized error.
    pub fn unauthorized<T: ToString>(msg: T) -> Self {
        Self::Unauthorized(msg.to_string())
    }

    /// Creates a new forbidden error.
    pub fn forbidden<T: ToString>(msg: T) -> Self {
        Self::Forbidden(msg.to_string())
    }

    /// Creates a new storage error.
    pub fn storage<T: ToString>(msg: T) -> Self {
        Self::Storage(msg.to_string())
    }

    /// Creates a new serialization error.
    pub fn serialization<T: ToString>(msg: T) -> Self {
        Self::Serialization(msg.to_string())
    }

    /// Creates a new password error.
    pub fn password<T: ToString>(msg: T) -> Self {
        Self::Password(msg.to_string())
    }
}

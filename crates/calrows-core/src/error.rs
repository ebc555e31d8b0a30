//! Shared error types for calrows.
//!
//! Each enum keeps the full error context in its `Display` output for logs
//! and offers `user_message()` for the short line printed on failure.

use thiserror::Error;

/// Database/storage errors (SQLite sink).
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Database connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Constraint violated: {0}")]
    ConstraintViolation(String),

    #[error("Data corruption detected: {0}")]
    Corruption(String),
}

impl DatabaseError {
    pub fn user_message(&self) -> &'static str {
        match self {
            DatabaseError::ConnectionFailed(_) => {
                "Unable to open the database. Check the configured path."
            }
            DatabaseError::QueryFailed(_) => "Writing events to the database failed.",
            DatabaseError::ConstraintViolation(_) => {
                "The database rejected an event; nothing was written."
            }
            DatabaseError::Corruption(_) => "The database file may be corrupted.",
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not readable: {0}")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),

    #[error("Missing required setting: {0}")]
    MissingSetting(String),

    #[error("Configuration file not writable: {0}")]
    WriteFailed(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::NotFound(_) => "Configuration file could not be read.",
            ConfigError::Invalid(_) => "Invalid configuration. Check your settings.",
            ConfigError::ParseError(_) => "Configuration file is malformed. Check your settings.",
            ConfigError::MissingSetting(_) => "A required setting is missing. Check your settings.",
            ConfigError::WriteFailed(_) => {
                "Configuration file could not be written. Check the directory permissions."
            }
        }
    }
}

/// Authentication errors (OAuth, tokens, credentials).
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Client secret file unreadable: {0}")]
    ClientSecretMissing(String),

    #[error("Client secret file malformed: {0}")]
    InvalidClientSecret(String),

    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),

    #[error("OAuth flow failed: {0}")]
    OAuthFailed(String),

    #[error("OAuth flow cancelled by user")]
    OAuthCancelled,

    #[error("OAuth state mismatch")]
    StateMismatch,

    #[error("Token cache error: {0}")]
    StorageError(String),

    #[error("Port {0} unavailable for OAuth callback")]
    PortInUse(u16),

    #[error("Network error during authentication: {0}")]
    Network(String),
}

impl AuthError {
    pub fn user_message(&self) -> &'static str {
        match self {
            AuthError::ClientSecretMissing(_) | AuthError::InvalidClientSecret(_) => {
                "OAuth client secret is missing or invalid. Download it from the Google Cloud console."
            }
            AuthError::RefreshFailed(_) => "Your session could not be renewed. Please sign in again.",
            AuthError::OAuthFailed(_) => "Sign-in failed. Please try again.",
            AuthError::OAuthCancelled => "Sign-in was cancelled.",
            AuthError::StateMismatch => "Sign-in response did not match the request. Please try again.",
            AuthError::StorageError(_) => "Failed to read or save the token cache.",
            AuthError::PortInUse(_) => "Sign-in port is busy. Choose another callback port.",
            AuthError::Network(_) => "Unable to reach Google. Check your internet connection.",
        }
    }
}

/// Extension trait for converting rusqlite errors to our error types.
pub trait RusqliteErrorExt {
    fn into_database_error(self) -> DatabaseError;
}

impl RusqliteErrorExt for rusqlite::Error {
    fn into_database_error(self) -> DatabaseError {
        match &self {
            rusqlite::Error::SqliteFailure(err, _)
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                DatabaseError::ConstraintViolation(self.to_string())
            }
            rusqlite::Error::SqliteFailure(err, _)
                if err.code == rusqlite::ErrorCode::CannotOpen =>
            {
                DatabaseError::ConnectionFailed(self.to_string())
            }
            rusqlite::Error::SqliteFailure(_, Some(msg)) if msg.contains("corrupt") => {
                DatabaseError::Corruption(self.to_string())
            }
            _ => DatabaseError::QueryFailed(self.to_string()),
        }
    }
}

//! Unified error types for citadel.
//!
//! Every variant renders with a stable code prefix so callers and logs can
//! match on it without parsing the message.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

/// Unified error types for the citadel cache.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid caller input (e.g., page or id below 1).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// No matching record.
    #[error("NOT_FOUND: {0}")]
    NotFound(String),

    /// Upstream request failed (network, timeout, or undecodable body).
    #[error("UPSTREAM_ERROR: {0}")]
    Upstream(String),

    /// Episode reference without a trailing numeric segment.
    #[error("MALFORMED_EPISODE_REF: {0}")]
    MalformedEpisodeRef(String),

    /// A stored row could not be decoded back into a character.
    #[error("CORRUPT_ROW: {0}")]
    CorruptRow(String),

    /// Database operation failed.
    #[error("STORE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("STORE_ERROR: migration failed: {0}")]
    MigrationFailed(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            other => opaque_database_error(other.to_string()),
        }
    }
}

/// Wrap a store failure with no matching variant, keeping its message.
fn opaque_database_error(message: String) -> Error {
    Error::Database(tokio_rusqlite::Error::Error(rusqlite::Error::SqliteFailure(
        rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_ERROR),
        Some(message),
    )))
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let (code, message) = match &err {
            Error::InvalidInput(msg) => (-32602, msg.clone()),
            Error::NotFound(msg) => (-32001, msg.clone()),
            Error::Upstream(msg) => (-32003, msg.clone()),
            Error::MalformedEpisodeRef(msg) => (-32004, msg.clone()),
            Error::CorruptRow(msg) => (-32002, msg.clone()),
            Error::Database(e) => (-32002, e.to_string()),
            Error::MigrationFailed(msg) => (-32002, msg.clone()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}

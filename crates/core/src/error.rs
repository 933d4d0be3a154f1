//! Unified error types for scrapegate.
//!
//! One enum covers the whole taxonomy: input validation, lookup misses,
//! uniqueness conflicts, upstream fetch failures, and backend errors.
//! Cache failures are deliberately absent: the cache downgrades every
//! backend error to a miss and never surfaces one to a caller.

use tokio_rusqlite::rusqlite;

/// Unified error type for the scrapegate service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// URL could not be parsed into a scheme and hostname.
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// A required request parameter was empty or absent.
    #[error("'{0}' parameter is required")]
    MissingParameter(&'static str),

    /// No rule exists for the given id or domain.
    #[error("{0}")]
    NotFound(String),

    /// A rule already exists for the domain.
    #[error("rule for domain '{0}' already exists")]
    Conflict(String),

    /// Live robots.txt fetch failed or returned an empty body.
    #[error("failed to load robots.txt: {0}")]
    UpstreamUnavailable(String),

    /// Database operation failed.
    #[error("database error: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("migration failed: {0}")]
    MigrationFailed(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
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

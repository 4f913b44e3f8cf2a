//! Unified error types for cuppy.

use tokio_rusqlite::rusqlite;

/// Unified error type shared by the store, the compliance engine, and the
/// fetch pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// URL is missing a scheme or host, or is otherwise unparseable.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Network-level failure while fetching a page.
    #[error("http error: {0}")]
    HttpError(String),

    /// Fetch exceeded the configured timeout.
    #[error("fetch timeout: {0}")]
    FetchTimeout(String),

    /// Response body exceeded the configured byte limit.
    #[error("response too large: {0}")]
    FetchTooLarge(String),

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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidUrl("no scheme".to_string());
        assert!(err.to_string().contains("invalid URL"));
        assert!(err.to_string().contains("no scheme"));
    }

    #[test]
    fn test_rusqlite_error_conversion() {
        let err: Error = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, Error::Database(_)));
    }
}

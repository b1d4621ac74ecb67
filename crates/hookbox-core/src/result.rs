//! Result alias and error-context helpers.

use crate::error::{AppError, ErrorKind};

/// `Result` with [`AppError`] as the error type.
pub type AppResult<T> = Result<T, AppError>;

/// Attach a kind and message to a foreign error, keeping it as the source.
pub trait ResultExt<T> {
    /// Wrap the error as `kind` with `message`.
    fn or_kind(self, kind: ErrorKind, message: impl Into<String>) -> AppResult<T>;

    /// Wrap the error as a storage failure.
    fn or_database(self, message: impl Into<String>) -> AppResult<T>
    where
        Self: Sized,
    {
        self.or_kind(ErrorKind::Database, message)
    }
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn or_kind(self, kind: ErrorKind, message: impl Into<String>) -> AppResult<T> {
        self.map_err(|e| AppError::with_source(kind, message, e))
    }
}

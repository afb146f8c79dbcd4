use error_stack::Report;
use thiserror::Error;

/// Database related errors
#[derive(Debug, Error)]
pub enum Error {
    /// An error caused by an invalid Postgres connection url.
    #[error("invalid connection url")]
    InvalidUrl,
    /// An error caused by an [`sqlx`] error.
    #[error("received a pool error: {0}")]
    Internal(sqlx::Error),
    /// A row with the same unique value already exists.
    #[error("unique constraint violated")]
    UniqueViolation,
    /// A referenced row does not exist or is still referenced.
    #[error("foreign key constraint violated")]
    ForeignKeyViolation,
    /// Embedded migrations could not be applied.
    #[error("failed to run migrations")]
    Migration,
    /// The database pool does not have reliable connection
    /// to transact to the database.
    #[error("unhealthy database pool")]
    UnhealthyPool,
}

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Converts from a generic [sqlx] result into a [database compatible error](Error).
pub trait ErrorExt<T> {
    fn into_db_error(self) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, sqlx::Error> {
    fn into_db_error(self) -> Result<T> {
        self.map_err(|e| {
            let code = match &e {
                sqlx::Error::Database(err) => err.code().map(|v| v.into_owned()),
                _ => None,
            };
            match code.as_deref() {
                Some(UNIQUE_VIOLATION) => Report::new(e).change_context(Error::UniqueViolation),
                Some(FOREIGN_KEY_VIOLATION) => {
                    Report::new(e).change_context(Error::ForeignKeyViolation)
                }
                _ => Report::new(Error::Internal(e)),
            }
        })
    }
}

/// Lazily typed [`std::result::Result`] but the error generic
/// is filled up with [a database error](Error).
pub type Result<T> = error_stack::Result<T, Error>;

/// Helpers for inspecting `error_stack::Report<Error>` without
/// matching on the current context by hand.
pub trait ReportExt {
    fn is_unhealthy(&self) -> bool;
    fn is_unique_violation(&self) -> bool;
}

impl ReportExt for Report<Error> {
    fn is_unhealthy(&self) -> bool {
        self.downcast_ref::<Error>()
            .map(|v| matches!(v, Error::UnhealthyPool))
            .unwrap_or_default()
    }

    fn is_unique_violation(&self) -> bool {
        self.downcast_ref::<Error>()
            .map(|v| matches!(v, Error::UniqueViolation))
            .unwrap_or_default()
    }
}

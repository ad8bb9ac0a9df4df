use thiserror::Error;

use crate::{is_constraint_violation, is_timeout_error, is_transient_error};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The pool had no free connection before the acquire timeout, or the backend is unreachable.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("{0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> Self {
        if is_constraint_violation(&error) {
            StoreError::ConstraintViolation(error.to_string())
        } else if is_timeout_error(&error) || is_transient_error(&error) {
            StoreError::Unavailable(error.to_string())
        } else {
            StoreError::Backend(error.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_timeout_is_unavailable() {
        let error = StoreError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(error, StoreError::Unavailable(_)));
    }

    #[test]
    fn other_errors_keep_their_text() {
        let error = StoreError::from(sqlx::Error::ColumnNotFound("qty".to_string()));
        assert_eq!(
            error,
            StoreError::Backend(sqlx::Error::ColumnNotFound("qty".to_string()).to_string())
        );
    }
}

use sea_orm::DbErr;
use thiserror::Error;

/// Error taxonomy shared by every service operation.
///
/// `Conflict` is the only retryable kind: it signals a lost race against a
/// unique key, and the retry is expected to observe the winning row.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error("conflicting concurrent write")]
    Conflict,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("access denied")]
    Forbidden,

    #[error("authentication required")]
    Unauthenticated,

    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

impl CoreError {
    /// Translate a storage error, folding unique-key violations into
    /// `Conflict` so callers can retry.
    pub fn from_db(err: DbErr) -> Self {
        if is_unique_violation(&err) {
            CoreError::Conflict
        } else {
            CoreError::Database(err)
        }
    }

}

/// sqlite reports unique-index violations only through the error message.
pub fn is_unique_violation(err: &DbErr) -> bool {
    err.to_string().contains("UNIQUE constraint failed")
}

pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_violation_maps_to_conflict() {
        let err = DbErr::Custom("UNIQUE constraint failed: reviews.user_id, reviews.movie_id".into());
        assert!(matches!(CoreError::from_db(err), CoreError::Conflict));
    }

    #[test]
    fn other_db_errors_pass_through() {
        let err = DbErr::Custom("disk I/O error".into());
        assert!(matches!(CoreError::from_db(err), CoreError::Database(_)));
    }
}

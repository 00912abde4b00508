use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Submission failure: {0}")]
    SubmissionFailure(String),

    #[error("Transient database error: {0}")]
    Transient(sqlx::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Database,
    Validation,
    NotFound,
    Conflict,
    SubmissionFailure,
    Transient,
    Configuration,
    Internal,
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Database(_) => ErrorKind::Database,
            AppError::Validation(_) => ErrorKind::Validation,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::Conflict(_) => ErrorKind::Conflict,
            AppError::SubmissionFailure(_) => ErrorKind::SubmissionFailure,
            AppError::Transient(_) => ErrorKind::Transient,
            AppError::Configuration(_) => ErrorKind::Configuration,
            AppError::Internal(_) => ErrorKind::Internal,
        }
    }
}

/// Postgres SQLSTATEs that a caller (or a thin retry layer) may retry.
const SQLSTATE_SERIALIZATION_FAILURE: &str = "40001";
const SQLSTATE_DEADLOCK_DETECTED: &str = "40P01";
const SQLSTATE_UNIQUE_VIOLATION: &str = "23505";

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            match db_err.code().as_deref() {
                Some(SQLSTATE_SERIALIZATION_FAILURE) | Some(SQLSTATE_DEADLOCK_DETECTED) => {
                    return AppError::Transient(err);
                }
                Some(SQLSTATE_UNIQUE_VIOLATION) => {
                    return AppError::Conflict(db_err.message().to_string());
                }
                _ => {}
            }
        }
        AppError::Database(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            AppError::Validation("bad".to_string()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            AppError::SubmissionFailure("502".to_string()).kind(),
            ErrorKind::SubmissionFailure
        );
        assert_eq!(
            AppError::NotFound("node".to_string()).kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_row_not_found_maps_to_database() {
        let err = AppError::from(sqlx::Error::RowNotFound);
        assert_eq!(err.kind(), ErrorKind::Database);
    }
}

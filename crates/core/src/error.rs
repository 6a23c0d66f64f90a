use thiserror::Error;
use validator::ValidationErrors;

/// Errors raised by the domain services and repositories.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{0}")]
    NotFound(String),

    /// A business rule rejected the request (unsupported language, bad path...).
    #[error("{0}")]
    BadRequest(String),

    /// Field-level validation of an input payload failed.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("invalid status transition from '{from}' to '{to}'; allowed: {}", allowed.join(", "))]
    InvalidTransition {
        from: String,
        to: String,
        allowed: Vec<String>,
    },

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("file is {size} bytes; the limit for {media_type} is {limit} bytes")]
    PayloadTooLarge {
        media_type: String,
        size: u64,
        limit: u64,
    },

    #[error("file type '{mime_type}' is not allowed for {media_type}")]
    UnsupportedMediaType {
        media_type: String,
        mime_type: String,
    },

    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("image processing error: {0}")]
    Image(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl CoreError {
    pub fn not_found(what: impl Into<String>) -> Self {
        CoreError::NotFound(what.into())
    }

    /// Map a unique-constraint violation to `Conflict`, passing other
    /// database errors through.
    pub fn from_unique_violation(err: sqlx::Error, message: impl Into<String>) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                CoreError::Conflict(message.into())
            }
            _ => CoreError::Database(err),
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_error_lists_allowed_states() {
        let err = CoreError::InvalidTransition {
            from: "published".into(),
            to: "draft".into(),
            allowed: vec!["archived".into()],
        };
        assert_eq!(
            err.to_string(),
            "invalid status transition from 'published' to 'draft'; allowed: archived"
        );
    }

    #[test]
    fn non_unique_database_errors_pass_through() {
        let err = CoreError::from_unique_violation(sqlx::Error::RowNotFound, "dup");
        assert!(matches!(err, CoreError::Database(sqlx::Error::RowNotFound)));
    }
}

//! Database-specific error types and conversions.

use campus_core::error::CampusError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Password hashing error: {0}")]
    Crypto(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    /// A unique index rejected an insert or update. Username allocation
    /// treats this as the expected, retryable race outcome.
    #[error("Duplicate record: {entity}")]
    Duplicate { entity: String },
}

impl DbError {
    /// Classify a statement failure: unique-index violations become
    /// [`DbError::Duplicate`], everything else stays a generic failure.
    pub(crate) fn from_statement(entity: &str, message: String) -> Self {
        if message.contains("already contains") {
            DbError::Duplicate {
                entity: entity.to_string(),
            }
        } else {
            DbError::Query(message)
        }
    }
}

impl From<DbError> for CampusError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => CampusError::NotFound { entity, id },
            DbError::Duplicate { entity } => CampusError::Conflict { entity },
            DbError::Crypto(msg) => CampusError::Crypto(msg),
            other => CampusError::Database(other.to_string()),
        }
    }
}

//! Error types for the Campus identity engine.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CampusError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    /// A uniqueness constraint was violated at insert time. Callers that
    /// allocate usernames treat this as retryable, not fatal.
    #[error("Entity already exists: {entity}")]
    Conflict { entity: String },

    #[error("Validation error on {field}: {message}")]
    Validation { field: String, message: String },

    /// Generic, non-disclosing login failure. Never distinguishes an
    /// unknown identifier from a wrong credential.
    #[error("invalid credentials")]
    AuthenticationFailed,

    #[error("account disabled")]
    AccountDisabled,

    /// Username allocation gave up after its bounded retries.
    #[error("could not allocate a unique username for base '{base}'")]
    AllocationExhausted { base: String },

    #[error("Tenant context missing or invalid")]
    TenantContext,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Cryptography error: {0}")]
    Crypto(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CampusError {
    /// True for the uniqueness-race outcome that username allocation is
    /// expected to retry.
    pub fn is_conflict(&self) -> bool {
        matches!(self, CampusError::Conflict { .. })
    }
}

pub type CampusResult<T> = Result<T, CampusError>;

//! Authentication error types.

use campus_core::error::CampusError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Deliberately covers both "no such identity" and "wrong
    /// credential" — the resolver never tells callers which.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("account is disabled")]
    AccountDisabled,

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<AuthError> for CampusError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => CampusError::AuthenticationFailed,
            AuthError::AccountDisabled => CampusError::AccountDisabled,
            AuthError::Crypto(msg) => CampusError::Crypto(msg),
        }
    }
}

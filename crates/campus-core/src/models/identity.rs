//! Identity domain model.
//!
//! An Identity is a single global, authenticable account. It lives in the
//! shared partition and is soft-referenced by per-tenant profiles; nothing
//! in storage enforces those references, which is why deletion fans out
//! through the purge reactor and drift is repaired by the auditor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    /// Globally unique across the whole platform. This is the name
    /// credentials are actually stored under; tenant-local aliases map
    /// onto it at resolution time.
    pub username: String,
    pub email: Option<String>,
    /// Argon2id PHC-format hash.
    pub password_hash: String,
    pub is_active: bool,
    /// Set when the account was created with a generated credential;
    /// cleared once the holder rotates it.
    pub needs_password_rotation: bool,
    /// Plaintext initial credential, displayable to the onboarding
    /// operator. Present only while `needs_password_rotation` is set.
    pub initial_password_display: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateIdentity {
    pub username: String,
    pub email: Option<String>,
    /// Raw password (hashed with Argon2id before storage). When
    /// `needs_password_rotation` is set the raw value is also retained as
    /// the displayable initial credential.
    pub password: String,
    pub needs_password_rotation: bool,
}

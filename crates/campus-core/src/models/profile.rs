//! Profile domain model.
//!
//! A profile is the tenant-local person record. Its `identity_ref` is a
//! soft reference into the shared partition: it may be absent (a person
//! known to the school before they have login access) and it may dangle
//! (the identity was deleted and the purge did not reach this tenant).
//! Any code joining profile to identity must tolerate both.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub tenant_id: Uuid,
    /// Soft reference to an [`Identity`](super::identity::Identity).
    /// Never enforced as a foreign key.
    pub identity_ref: Option<Uuid>,
    /// Human-chosen alias, unique only within this tenant partition.
    /// Absent until portal activation.
    pub local_username: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProfile {
    pub identity_ref: Option<Uuid>,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
}

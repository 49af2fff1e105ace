//! Organization domain model.
//!
//! Each organization is a customer school whose person records live in an
//! isolated tenant partition. The organization table doubles as the
//! tenant registry: `schema_name` names the partition, and the reserved
//! name `public` marks the shared partition that holds identities, role
//! grants, and the registry itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Partition name of the shared (non-tenant) partition.
pub const SHARED_SCHEMA: &str = "public";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    /// URL-safe unique partition name (e.g. `north-hill-academy`).
    pub schema_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrganization {
    pub name: String,
    pub schema_name: String,
}

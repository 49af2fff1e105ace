//! Role grant domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Ties an identity to a role within one organization. Unique per
/// (identity, role, organization). Creating a grant is the event that
/// triggers tenant-side provisioning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleGrant {
    pub id: Uuid,
    pub identity_id: Uuid,
    pub organization_id: Uuid,
    /// Role slug (`owner`, `staff`, `instructor`, `student`, ...).
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRoleGrant {
    pub identity_id: Uuid,
    pub organization_id: Uuid,
    pub role: String,
}

//! Events consumed by the reactors.
//!
//! The membership API emits these; delivery is at-least-once and the
//! handlers are idempotent, so a redelivered event is harmless.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An identity was granted a role in an organization. Triggers
/// tenant-side provisioning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MembershipGranted {
    pub identity_id: Uuid,
    pub organization_id: Uuid,
    pub role: String,
}

/// An identity is about to be removed. Triggers the fleet-wide cascade
/// purge; the identity row itself is only deleted after every tenant has
/// been attempted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityDeletionRequested {
    pub identity_id: Uuid,
}

//! Campus Fleet — the reactors that keep the global identity pool and
//! the per-tenant partitions consistent.
//!
//! Provisioning reacts to role grants, the cascade purge reacts to
//! identity deletion, the auditor measures and repairs drift, and the
//! admission workflow creates the unlinked profiles that drift detection
//! must leave alone.

use std::time::Duration;

pub mod admission;
pub mod audit;
pub mod provisioning;
pub mod purge;

pub use admission::{AdmissionService, AdmitStudent};
pub use audit::{ConsistencyAuditor, FleetAuditReport, RepairSummary, TenantAuditReport};
pub use provisioning::{ExemptionPolicy, MembershipService, ProvisioningReactor};
pub use purge::{CascadePurgeReactor, PurgeReport};

/// Shared settings for the fleet fan-out loops.
#[derive(Debug, Clone)]
pub struct FleetConfig {
    /// Time budget per tenant partition in purge and audit loops. A
    /// tenant that exceeds it is logged and skipped, never awaited
    /// indefinitely.
    pub per_tenant_timeout: Duration,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            per_tenant_timeout: Duration::from_secs(30),
        }
    }
}

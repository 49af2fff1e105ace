//! Explicit tenant partition handle.
//!
//! The original platform switched a process-global "current schema" to
//! scope queries to one customer's data. Here the scope is a plain value
//! threaded through every tenant-scoped call, so concurrent operations
//! against different tenants cannot interfere through shared state, and
//! the prior context is trivially restored on every exit path.

use uuid::Uuid;

/// Binds repository operations to one tenant partition.
///
/// Produced by the tenant directory; never constructed from ambient
/// state. All per-tenant queries bind both fields' underlying
/// organization id as the partition key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantScope {
    /// The organization whose partition this scope addresses.
    pub organization_id: Uuid,
    /// URL-safe partition name (e.g. `north-hill-academy`). The shared
    /// partition `public` is never handed out as a scope.
    pub schema_name: String,
    /// Organization display name, carried for provisioning defaults and
    /// audit reports.
    pub name: String,
}

impl TenantScope {
    /// Partition key bound into every tenant-scoped query.
    pub fn partition_key(&self) -> String {
        self.organization_id.to_string()
    }
}

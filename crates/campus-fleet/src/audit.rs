//! Fleet consistency audit and repair.
//!
//! The auditor is the drift detector for the soft link between tenant
//! profiles and the shared identity pool. It distinguishes two
//! populations per tenant: orphans, whose `identity_ref` points at an
//! identity that no longer exists (always a defect, produced by
//! interrupted purges), and unlinked profiles, whose `identity_ref` is
//! absent (a legitimate state for people without portal access).
//! Detection is a full scan against one snapshot of live identity ids.

use std::collections::HashSet;

use campus_core::error::CampusResult;
use campus_core::models::profile::Profile;
use campus_core::repository::{
    IdentityRepository, ProfileRepository, StaffRecordRepository, StudentRecordRepository,
    TenantDirectory,
};
use campus_core::tenant::TenantScope;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::FleetConfig;

/// Audit findings for one tenant partition.
#[derive(Debug, Clone, Serialize)]
pub struct TenantAuditReport {
    pub schema_name: String,
    pub name: String,
    pub orphan_count: usize,
    pub orphan_ids: Vec<Uuid>,
    pub unlinked_count: usize,
    pub unlinked_ids: Vec<Uuid>,
}

/// Findings across the whole fleet.
#[derive(Debug, Clone, Serialize)]
pub struct FleetAuditReport {
    pub tenants: Vec<TenantAuditReport>,
    /// Partition names that failed or timed out during the scan.
    pub skipped: Vec<String>,
}

/// Outcome of a fleet-wide repair pass.
#[derive(Debug, Clone, Serialize)]
pub struct RepairSummary {
    pub profiles_removed: u64,
    /// Partition names whose repair failed; their orphans remain for
    /// the next pass.
    pub failed: Vec<String>,
}

impl FleetAuditReport {
    pub fn total_orphans(&self) -> usize {
        self.tenants.iter().map(|t| t.orphan_count).sum()
    }

    pub fn total_unlinked(&self) -> usize {
        self.tenants.iter().map(|t| t.unlinked_count).sum()
    }
}

pub struct ConsistencyAuditor<'a, D, I, P, S, T> {
    directory: &'a D,
    identity_repo: &'a I,
    profile_repo: &'a P,
    staff_repo: &'a S,
    student_repo: &'a T,
    config: FleetConfig,
}

impl<'a, D, I, P, S, T> ConsistencyAuditor<'a, D, I, P, S, T>
where
    D: TenantDirectory,
    I: IdentityRepository,
    P: ProfileRepository,
    S: StaffRecordRepository,
    T: StudentRecordRepository,
{
    pub fn new(
        directory: &'a D,
        identity_repo: &'a I,
        profile_repo: &'a P,
        staff_repo: &'a S,
        student_repo: &'a T,
        config: FleetConfig,
    ) -> Self {
        Self {
            directory,
            identity_repo,
            profile_repo,
            staff_repo,
            student_repo,
            config,
        }
    }

    /// Read-only fleet scan. Unreachable tenants are skipped, not fatal.
    pub async fn audit_fleet(&self) -> CampusResult<FleetAuditReport> {
        let live = self.live_identity_ids().await?;
        let tenants = self.directory.list_tenants().await?;

        let mut report = FleetAuditReport {
            tenants: Vec::with_capacity(tenants.len()),
            skipped: Vec::new(),
        };

        for scope in &tenants {
            let outcome = tokio::time::timeout(
                self.config.per_tenant_timeout,
                self.audit_tenant(scope, &live),
            )
            .await;

            match outcome {
                Ok(Ok(tenant_report)) => report.tenants.push(tenant_report),
                Ok(Err(e)) => {
                    warn!(
                        tenant = %scope.schema_name,
                        error = %e,
                        "tenant audit failed, continuing"
                    );
                    report.skipped.push(scope.schema_name.clone());
                }
                Err(_) => {
                    warn!(tenant = %scope.schema_name, "tenant audit timed out, continuing");
                    report.skipped.push(scope.schema_name.clone());
                }
            }
        }

        Ok(report)
    }

    /// Repair every tenant the report flagged. One tenant's failure is
    /// logged and recorded, never allowed to stop the rest of the
    /// fleet.
    pub async fn repair_fleet(&self, report: &FleetAuditReport) -> RepairSummary {
        let mut summary = RepairSummary {
            profiles_removed: 0,
            failed: Vec::new(),
        };

        for tenant in report.tenants.iter().filter(|t| t.orphan_count > 0) {
            match self.repair_tenant(&tenant.schema_name).await {
                Ok(removed) => summary.profiles_removed += removed,
                Err(e) => {
                    warn!(
                        tenant = %tenant.schema_name,
                        error = %e,
                        "tenant repair failed, continuing"
                    );
                    summary.failed.push(tenant.schema_name.clone());
                }
            }
        }

        summary
    }

    /// Delete one tenant's orphaned profiles and their dependent domain
    /// records. Unlinked profiles are never touched. Returns the number
    /// of profiles removed.
    pub async fn repair_tenant(&self, schema_name: &str) -> CampusResult<u64> {
        let scope = self.directory.resolve_by_schema(schema_name).await?;
        let live = self.live_identity_ids().await?;

        let profiles = self.profile_repo.list(&scope).await?;
        let orphan_ids: Vec<Uuid> = profiles
            .iter()
            .filter(|p| is_orphan(p, &live))
            .map(|p| p.id)
            .collect();

        if orphan_ids.is_empty() {
            return Ok(0);
        }

        self.staff_repo.delete_by_profiles(&scope, &orphan_ids).await?;
        self.student_repo
            .delete_by_profiles(&scope, &orphan_ids)
            .await?;
        let removed = self.profile_repo.delete_by_ids(&scope, &orphan_ids).await?;

        info!(
            tenant = %scope.schema_name,
            removed,
            "repaired orphaned profiles"
        );
        Ok(removed)
    }

    async fn live_identity_ids(&self) -> CampusResult<HashSet<Uuid>> {
        Ok(self.identity_repo.list_ids().await?.into_iter().collect())
    }

    async fn audit_tenant(
        &self,
        scope: &TenantScope,
        live: &HashSet<Uuid>,
    ) -> CampusResult<TenantAuditReport> {
        let profiles = self.profile_repo.list(scope).await?;

        let mut orphan_ids = Vec::new();
        let mut unlinked_ids = Vec::new();
        for profile in &profiles {
            match profile.identity_ref {
                Some(identity_id) if !live.contains(&identity_id) => orphan_ids.push(profile.id),
                Some(_) => {}
                None => unlinked_ids.push(profile.id),
            }
        }

        Ok(TenantAuditReport {
            schema_name: scope.schema_name.clone(),
            name: scope.name.clone(),
            orphan_count: orphan_ids.len(),
            orphan_ids,
            unlinked_count: unlinked_ids.len(),
            unlinked_ids,
        })
    }
}

fn is_orphan(profile: &Profile, live: &HashSet<Uuid>) -> bool {
    profile
        .identity_ref
        .is_some_and(|identity_id| !live.contains(&identity_id))
}

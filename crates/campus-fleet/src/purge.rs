//! Fleet-wide cascade purge on identity deletion.
//!
//! Nothing in storage ties tenant profiles to the shared identity pool,
//! so deleting an identity means visiting every tenant partition and
//! removing its soft references by hand. The fan-out is best-effort: an
//! unreachable or slow tenant is logged and skipped, never allowed to
//! abort the fleet pass, and the identity row itself goes last so a
//! crash mid-pass leaves orphans (which the auditor repairs) rather than
//! a half-deleted account that can still log in.

use campus_core::error::{CampusError, CampusResult};
use campus_core::events::IdentityDeletionRequested;
use campus_core::repository::{
    IdentityRepository, ProfileRepository, StaffRecordRepository, StudentRecordRepository,
    TenantDirectory,
};
use campus_core::tenant::TenantScope;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::FleetConfig;

/// Outcome of one fleet-wide purge pass.
#[derive(Debug, Clone, Serialize)]
pub struct PurgeReport {
    pub profiles_removed: u64,
    pub tenants_visited: usize,
    /// Partition names that failed or timed out; their orphans are left
    /// for the auditor.
    pub skipped: Vec<String>,
}

pub struct CascadePurgeReactor<'a, D, I, P, S, T> {
    directory: &'a D,
    identity_repo: &'a I,
    profile_repo: &'a P,
    staff_repo: &'a S,
    student_repo: &'a T,
    config: FleetConfig,
}

impl<'a, D, I, P, S, T> CascadePurgeReactor<'a, D, I, P, S, T>
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

    /// Purge every tenant partition, then delete the identity row.
    pub async fn handle(&self, event: &IdentityDeletionRequested) -> CampusResult<PurgeReport> {
        let tenants = self.directory.list_tenants().await?;

        let mut report = PurgeReport {
            profiles_removed: 0,
            tenants_visited: 0,
            skipped: Vec::new(),
        };

        for scope in &tenants {
            report.tenants_visited += 1;

            let outcome = tokio::time::timeout(
                self.config.per_tenant_timeout,
                self.purge_tenant(scope, event.identity_id),
            )
            .await;

            match outcome {
                Ok(Ok(removed)) => {
                    if removed > 0 {
                        info!(
                            tenant = %scope.schema_name,
                            identity_id = %event.identity_id,
                            removed,
                            "purged tenant profiles"
                        );
                    }
                    report.profiles_removed += removed;
                }
                Ok(Err(e)) => {
                    warn!(
                        tenant = %scope.schema_name,
                        identity_id = %event.identity_id,
                        error = %e,
                        "tenant purge failed, continuing"
                    );
                    report.skipped.push(scope.schema_name.clone());
                }
                Err(_) => {
                    warn!(
                        tenant = %scope.schema_name,
                        identity_id = %event.identity_id,
                        "tenant purge timed out, continuing"
                    );
                    report.skipped.push(scope.schema_name.clone());
                }
            }
        }

        // The identity row goes only after every tenant was attempted.
        // A redelivered event finds it already gone; that is fine.
        match self.identity_repo.delete(event.identity_id).await {
            Ok(()) | Err(CampusError::NotFound { .. }) => {}
            Err(e) => return Err(e),
        }

        info!(
            identity_id = %event.identity_id,
            profiles_removed = report.profiles_removed,
            tenants_visited = report.tenants_visited,
            skipped = report.skipped.len(),
            "identity purge complete"
        );
        Ok(report)
    }

    /// Remove the identity's profiles and their dependent domain records
    /// from one partition.
    async fn purge_tenant(&self, scope: &TenantScope, identity_id: Uuid) -> CampusResult<u64> {
        let removed_ids = self
            .profile_repo
            .delete_by_identity_ref(scope, identity_id)
            .await?;
        if removed_ids.is_empty() {
            return Ok(0);
        }

        self.staff_repo.delete_by_profiles(scope, &removed_ids).await?;
        self.student_repo
            .delete_by_profiles(scope, &removed_ids)
            .await?;

        Ok(removed_ids.len() as u64)
    }
}

//! Tenant-side provisioning on role grant.
//!
//! Delivery of [`MembershipGranted`] is at-least-once, so every step is
//! get-or-create: get, create on `NotFound`, re-get when the creation
//! loses a uniqueness race. Re-invoking the handler for the same grant
//! leaves exactly one profile and one staff record behind.

use campus_core::error::{CampusError, CampusResult};
use campus_core::events::MembershipGranted;
use campus_core::models::profile::{CreateProfile, Profile};
use campus_core::models::role_grant::{CreateRoleGrant, RoleGrant};
use campus_core::models::staff_record::{CreateStaffRecord, StaffRecord, employee_code_for};
use campus_core::repository::{
    IdentityRepository, InstitutionRepository, ProfileRepository, RoleGrantRepository,
    StaffRecordRepository, TenantDirectory,
};
use campus_core::tenant::TenantScope;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Designation written for the `owner` role.
const OWNER_DESIGNATION: &str = "Owner / Administrator";

/// Designation written for every other provisioned role.
const DEFAULT_DESIGNATION: &str = "Staff";

/// Roles whose holders get no staff-side provisioning.
///
/// Students and instructors are created by the admission and onboarding
/// workflows; provisioning them here would plant duplicate placeholder
/// profiles next to the real ones.
#[derive(Debug, Clone)]
pub struct ExemptionPolicy {
    exempt_roles: Vec<String>,
}

impl ExemptionPolicy {
    pub fn new(exempt_roles: Vec<String>) -> Self {
        Self { exempt_roles }
    }

    pub fn is_exempt(&self, role: &str) -> bool {
        self.exempt_roles.iter().any(|r| r == role)
    }
}

impl Default for ExemptionPolicy {
    fn default() -> Self {
        Self {
            exempt_roles: vec!["student".into(), "instructor".into()],
        }
    }
}

/// Reacts to [`MembershipGranted`] by materializing the tenant-side
/// records the new member needs.
pub struct ProvisioningReactor<'a, D, I, P, S, N> {
    directory: &'a D,
    identity_repo: &'a I,
    profile_repo: &'a P,
    staff_repo: &'a S,
    institution_repo: &'a N,
    policy: ExemptionPolicy,
}

impl<'a, D, I, P, S, N> ProvisioningReactor<'a, D, I, P, S, N>
where
    D: TenantDirectory,
    I: IdentityRepository,
    P: ProfileRepository,
    S: StaffRecordRepository,
    N: InstitutionRepository,
{
    pub fn new(
        directory: &'a D,
        identity_repo: &'a I,
        profile_repo: &'a P,
        staff_repo: &'a S,
        institution_repo: &'a N,
        policy: ExemptionPolicy,
    ) -> Self {
        Self {
            directory,
            identity_repo,
            profile_repo,
            staff_repo,
            institution_repo,
            policy,
        }
    }

    /// Provision the tenant partition for a freshly granted membership.
    pub async fn handle(&self, event: &MembershipGranted) -> CampusResult<()> {
        self.directory
            .with_tenant(event.organization_id, |scope| self.provision(scope, event))
            .await
    }

    async fn provision(&self, scope: TenantScope, event: &MembershipGranted) -> CampusResult<()> {
        self.ensure_institution(&scope).await?;

        if self.policy.is_exempt(&event.role) {
            debug!(
                tenant = %scope.schema_name,
                role = %event.role,
                "role is provisioning-exempt, nothing to do"
            );
            return Ok(());
        }

        let profile = self.ensure_profile(&scope, event.identity_id).await?;
        self.ensure_staff_record(&scope, &profile, event.identity_id, &event.role)
            .await?;

        info!(
            tenant = %scope.schema_name,
            identity_id = %event.identity_id,
            role = %event.role,
            "tenant provisioning complete"
        );
        Ok(())
    }

    async fn ensure_institution(&self, scope: &TenantScope) -> CampusResult<()> {
        match self.institution_repo.get(scope).await {
            Ok(_) => return Ok(()),
            Err(CampusError::NotFound { .. }) => {}
            Err(e) => return Err(e),
        }

        match self.institution_repo.create(scope, &scope.name).await {
            Ok(_) => Ok(()),
            Err(e) if e.is_conflict() => {
                self.institution_repo.get(scope).await?;
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn ensure_profile(
        &self,
        scope: &TenantScope,
        identity_id: Uuid,
    ) -> CampusResult<Profile> {
        match self.profile_repo.get_by_identity(scope, identity_id).await {
            Ok(profile) => return Ok(profile),
            Err(CampusError::NotFound { .. }) => {}
            Err(e) => return Err(e),
        }

        // Placeholder name derived from the global username; tenant
        // staff correct it later.
        let identity = self.identity_repo.get_by_id(identity_id).await?;
        let input = CreateProfile {
            identity_ref: Some(identity_id),
            first_name: identity.username,
            last_name: String::new(),
            phone: None,
        };

        match self.profile_repo.create(scope, input).await {
            Ok(profile) => Ok(profile),
            Err(e) if e.is_conflict() => {
                self.profile_repo.get_by_identity(scope, identity_id).await
            }
            Err(e) => Err(e),
        }
    }

    async fn ensure_staff_record(
        &self,
        scope: &TenantScope,
        profile: &Profile,
        identity_id: Uuid,
        role: &str,
    ) -> CampusResult<StaffRecord> {
        match self.staff_repo.get_by_profile(scope, profile.id).await {
            Ok(record) => return Ok(record),
            Err(CampusError::NotFound { .. }) => {}
            Err(e) => return Err(e),
        }

        let designation = if role == "owner" {
            OWNER_DESIGNATION
        } else {
            DEFAULT_DESIGNATION
        };
        let input = CreateStaffRecord {
            profile_id: profile.id,
            employee_code: employee_code_for(identity_id),
            designation: designation.to_string(),
        };

        match self.staff_repo.create(scope, input).await {
            Ok(record) => Ok(record),
            Err(e) if e.is_conflict() => self.staff_repo.get_by_profile(scope, profile.id).await,
            Err(e) => Err(e),
        }
    }
}

/// Grant write plus provisioning as one logical operation.
///
/// Provisioning failure rolls back a grant this call created, so a
/// half-provisioned membership never survives. Re-granting an existing
/// membership reuses the grant row and re-runs the (idempotent)
/// provisioning.
pub struct MembershipService<'a, G, D, I, P, S, N> {
    grant_repo: &'a G,
    reactor: ProvisioningReactor<'a, D, I, P, S, N>,
}

impl<'a, G, D, I, P, S, N> MembershipService<'a, G, D, I, P, S, N>
where
    G: RoleGrantRepository,
    D: TenantDirectory,
    I: IdentityRepository,
    P: ProfileRepository,
    S: StaffRecordRepository,
    N: InstitutionRepository,
{
    pub fn new(grant_repo: &'a G, reactor: ProvisioningReactor<'a, D, I, P, S, N>) -> Self {
        Self {
            grant_repo,
            reactor,
        }
    }

    pub async fn grant(
        &self,
        identity_id: Uuid,
        organization_id: Uuid,
        role: &str,
    ) -> CampusResult<RoleGrant> {
        let (grant, created) = match self.grant_repo.get(identity_id, organization_id, role).await
        {
            Ok(grant) => (grant, false),
            Err(CampusError::NotFound { .. }) => {
                let input = CreateRoleGrant {
                    identity_id,
                    organization_id,
                    role: role.to_string(),
                };
                match self.grant_repo.create(input).await {
                    Ok(grant) => (grant, true),
                    Err(e) if e.is_conflict() => (
                        self.grant_repo.get(identity_id, organization_id, role).await?,
                        false,
                    ),
                    Err(e) => return Err(e),
                }
            }
            Err(e) => return Err(e),
        };

        let event = MembershipGranted {
            identity_id,
            organization_id,
            role: role.to_string(),
        };
        if let Err(e) = self.reactor.handle(&event).await {
            if created {
                // Compensating rollback; the rollback itself failing
                // leaves the grant for the next retry to reuse.
                if let Err(rollback_err) = self.grant_repo.delete(grant.id).await {
                    warn!(
                        grant_id = %grant.id,
                        error = %rollback_err,
                        "failed to roll back grant after provisioning error"
                    );
                }
            }
            return Err(e);
        }

        Ok(grant)
    }

    /// Delete the grant. The tenant-side profile stays: revocation is
    /// not account closure.
    pub async fn revoke(
        &self,
        identity_id: Uuid,
        organization_id: Uuid,
        role: &str,
    ) -> CampusResult<()> {
        match self.grant_repo.get(identity_id, organization_id, role).await {
            Ok(grant) => self.grant_repo.delete(grant.id).await,
            Err(CampusError::NotFound { .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

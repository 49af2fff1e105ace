//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Repositories over per-tenant
//! tables take an explicit [`TenantScope`] so every query binds the
//! partition key; repositories over shared-partition tables (identities,
//! role grants, the registry) do not.

use uuid::Uuid;

use crate::error::CampusResult;
use crate::models::{
    identity::{CreateIdentity, Identity},
    institution::InstitutionSettings,
    profile::{CreateProfile, Profile},
    role_grant::{CreateRoleGrant, RoleGrant},
    staff_record::{CreateStaffRecord, StaffRecord},
    student_record::{CreateStudentRecord, StudentRecord},
};
use crate::tenant::TenantScope;

// ---------------------------------------------------------------------------
// Tenant registry / context switching
// ---------------------------------------------------------------------------

/// Maps organization ids to tenant partitions and enumerates the fleet.
pub trait TenantDirectory: Send + Sync {
    /// Resolve an organization to its partition scope. Fails with
    /// `NotFound` for unknown organizations and with `TenantContext`
    /// for the shared partition, which must never be scoped.
    fn resolve(
        &self,
        organization_id: Uuid,
    ) -> impl Future<Output = CampusResult<TenantScope>> + Send;

    /// Resolve by partition name instead of id (operator tooling).
    fn resolve_by_schema(
        &self,
        schema_name: &str,
    ) -> impl Future<Output = CampusResult<TenantScope>> + Send;

    /// Every tenant partition, shared partition excluded.
    fn list_tenants(&self) -> impl Future<Output = CampusResult<Vec<TenantScope>>> + Send;

    /// Run one unit of work bound to an organization's partition.
    ///
    /// The scope is a value handed to the closure, so the binding cannot
    /// leak past the unit of work on any exit path. Units of work against
    /// different tenants must be run to completion one at a time.
    fn with_tenant<T, F, Fut>(
        &self,
        organization_id: Uuid,
        work: F,
    ) -> impl Future<Output = CampusResult<T>> + Send
    where
        Self: Sized,
        T: Send,
        F: FnOnce(TenantScope) -> Fut + Send,
        Fut: Future<Output = CampusResult<T>> + Send,
    {
        async move {
            let scope = self.resolve(organization_id).await?;
            work(scope).await
        }
    }
}

// ---------------------------------------------------------------------------
// Shared-partition repositories
// ---------------------------------------------------------------------------

pub trait IdentityRepository: Send + Sync {
    /// Insert a new identity. Surfaces `Conflict` on a username (or
    /// email) uniqueness violation — callers allocating usernames retry.
    fn create(&self, input: CreateIdentity) -> impl Future<Output = CampusResult<Identity>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = CampusResult<Identity>> + Send;
    fn get_by_username(
        &self,
        username: &str,
    ) -> impl Future<Output = CampusResult<Identity>> + Send;
    fn get_by_email(&self, email: &str) -> impl Future<Output = CampusResult<Identity>> + Send;
    fn username_exists(&self, username: &str) -> impl Future<Output = CampusResult<bool>> + Send;
    /// Snapshot of every live identity id, for audit set comparisons.
    fn list_ids(&self) -> impl Future<Output = CampusResult<Vec<Uuid>>> + Send;
    fn set_active(&self, id: Uuid, active: bool) -> impl Future<Output = CampusResult<()>> + Send;
    /// Re-hash the credential and clear the rotation flag plus the
    /// displayable initial password.
    fn rotate_password(
        &self,
        id: Uuid,
        new_password: &str,
    ) -> impl Future<Output = CampusResult<Identity>> + Send;
    /// Hard-delete the identity row. The purge reactor calls this only
    /// after attempting every tenant partition.
    fn delete(&self, id: Uuid) -> impl Future<Output = CampusResult<()>> + Send;
}

pub trait RoleGrantRepository: Send + Sync {
    /// Insert a grant; `Conflict` if the (identity, role, organization)
    /// triple already exists.
    fn create(
        &self,
        input: CreateRoleGrant,
    ) -> impl Future<Output = CampusResult<RoleGrant>> + Send;
    fn get(
        &self,
        identity_id: Uuid,
        organization_id: Uuid,
        role: &str,
    ) -> impl Future<Output = CampusResult<RoleGrant>> + Send;
    fn list_by_identity(
        &self,
        identity_id: Uuid,
    ) -> impl Future<Output = CampusResult<Vec<RoleGrant>>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = CampusResult<()>> + Send;
}

// ---------------------------------------------------------------------------
// Tenant-scoped repositories
// ---------------------------------------------------------------------------

pub trait ProfileRepository: Send + Sync {
    fn create(
        &self,
        scope: &TenantScope,
        input: CreateProfile,
    ) -> impl Future<Output = CampusResult<Profile>> + Send;
    fn get_by_id(
        &self,
        scope: &TenantScope,
        id: Uuid,
    ) -> impl Future<Output = CampusResult<Profile>> + Send;
    fn get_by_identity(
        &self,
        scope: &TenantScope,
        identity_id: Uuid,
    ) -> impl Future<Output = CampusResult<Profile>> + Send;
    fn get_by_local_username(
        &self,
        scope: &TenantScope,
        local_username: &str,
    ) -> impl Future<Output = CampusResult<Profile>> + Send;
    fn local_username_exists(
        &self,
        scope: &TenantScope,
        local_username: &str,
    ) -> impl Future<Output = CampusResult<bool>> + Send;
    /// Portal activation: set `identity_ref` and `local_username` on an
    /// unlinked profile. `Conflict` if the alias is taken in this tenant.
    fn link_identity(
        &self,
        scope: &TenantScope,
        profile_id: Uuid,
        identity_id: Uuid,
        local_username: &str,
    ) -> impl Future<Output = CampusResult<Profile>> + Send;
    /// Full scan of the partition. The auditor accepts this cost by
    /// design at expected fleet sizes.
    fn list(&self, scope: &TenantScope) -> impl Future<Output = CampusResult<Vec<Profile>>> + Send;
    /// Delete every profile soft-referencing the identity; returns the
    /// ids removed so dependent domain records can be cascaded.
    fn delete_by_identity_ref(
        &self,
        scope: &TenantScope,
        identity_id: Uuid,
    ) -> impl Future<Output = CampusResult<Vec<Uuid>>> + Send;
    fn delete_by_ids(
        &self,
        scope: &TenantScope,
        ids: &[Uuid],
    ) -> impl Future<Output = CampusResult<u64>> + Send;
}

pub trait StaffRecordRepository: Send + Sync {
    fn create(
        &self,
        scope: &TenantScope,
        input: CreateStaffRecord,
    ) -> impl Future<Output = CampusResult<StaffRecord>> + Send;
    fn get_by_profile(
        &self,
        scope: &TenantScope,
        profile_id: Uuid,
    ) -> impl Future<Output = CampusResult<StaffRecord>> + Send;
    fn delete_by_profiles(
        &self,
        scope: &TenantScope,
        profile_ids: &[Uuid],
    ) -> impl Future<Output = CampusResult<u64>> + Send;
}

pub trait StudentRecordRepository: Send + Sync {
    fn create(
        &self,
        scope: &TenantScope,
        input: CreateStudentRecord,
    ) -> impl Future<Output = CampusResult<StudentRecord>> + Send;
    fn get_by_profile(
        &self,
        scope: &TenantScope,
        profile_id: Uuid,
    ) -> impl Future<Output = CampusResult<StudentRecord>> + Send;
    fn delete_by_profiles(
        &self,
        scope: &TenantScope,
        profile_ids: &[Uuid],
    ) -> impl Future<Output = CampusResult<u64>> + Send;
}

pub trait InstitutionRepository: Send + Sync {
    fn get(
        &self,
        scope: &TenantScope,
    ) -> impl Future<Output = CampusResult<InstitutionSettings>> + Send;
    fn create(
        &self,
        scope: &TenantScope,
        display_name: &str,
    ) -> impl Future<Output = CampusResult<InstitutionSettings>> + Send;
}

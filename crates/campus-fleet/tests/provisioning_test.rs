//! Integration tests for role-grant provisioning using in-memory
//! SurrealDB.

use campus_core::error::CampusError;
use campus_core::events::MembershipGranted;
use campus_core::models::identity::CreateIdentity;
use campus_core::models::organization::CreateOrganization;
use campus_core::repository::{
    IdentityRepository, InstitutionRepository, ProfileRepository, RoleGrantRepository,
    StaffRecordRepository, TenantDirectory,
};
use campus_core::tenant::TenantScope;
use campus_db::repository::{
    SurrealIdentityRepository, SurrealInstitutionRepository, SurrealOrganizationRepository,
    SurrealProfileRepository, SurrealRoleGrantRepository, SurrealStaffRecordRepository,
};
use campus_fleet::{ExemptionPolicy, MembershipService, ProvisioningReactor};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

type Db = surrealdb::engine::local::Db;

struct Fixture {
    directory: SurrealOrganizationRepository<Db>,
    identity_repo: SurrealIdentityRepository<Db>,
    profile_repo: SurrealProfileRepository<Db>,
    staff_repo: SurrealStaffRecordRepository<Db>,
    institution_repo: SurrealInstitutionRepository<Db>,
    grant_repo: SurrealRoleGrantRepository<Db>,
    scope: TenantScope,
    identity_id: Uuid,
}

impl Fixture {
    fn reactor(
        &self,
    ) -> ProvisioningReactor<
        '_,
        SurrealOrganizationRepository<Db>,
        SurrealIdentityRepository<Db>,
        SurrealProfileRepository<Db>,
        SurrealStaffRecordRepository<Db>,
        SurrealInstitutionRepository<Db>,
    > {
        ProvisioningReactor::new(
            &self.directory,
            &self.identity_repo,
            &self.profile_repo,
            &self.staff_repo,
            &self.institution_repo,
            ExemptionPolicy::default(),
        )
    }

    fn event(&self, role: &str) -> MembershipGranted {
        MembershipGranted {
            identity_id: self.identity_id,
            organization_id: self.scope.organization_id,
            role: role.into(),
        }
    }
}

/// Helper: in-memory DB, one organization, one identity.
async fn setup() -> Fixture {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    campus_db::run_migrations(&db).await.unwrap();

    let directory = SurrealOrganizationRepository::new(db.clone());
    let org = directory
        .create(CreateOrganization {
            name: "North Hill Academy".into(),
            schema_name: "north-hill".into(),
        })
        .await
        .unwrap();
    let scope = directory.resolve(org.id).await.unwrap();

    let identity_repo = SurrealIdentityRepository::new(db.clone());
    let identity = identity_repo
        .create(CreateIdentity {
            username: "jdoe_a1b2c3".into(),
            email: None,
            password: "sw0rdfish123".into(),
            needs_password_rotation: false,
        })
        .await
        .unwrap();

    Fixture {
        directory,
        identity_repo,
        profile_repo: SurrealProfileRepository::new(db.clone()),
        staff_repo: SurrealStaffRecordRepository::new(db.clone()),
        institution_repo: SurrealInstitutionRepository::new(db.clone()),
        grant_repo: SurrealRoleGrantRepository::new(db),
        scope,
        identity_id: identity.id,
    }
}

#[tokio::test]
async fn owner_grant_provisions_profile_and_staff_record() {
    let fx = setup().await;

    fx.reactor().handle(&fx.event("owner")).await.unwrap();

    let settings = fx.institution_repo.get(&fx.scope).await.unwrap();
    assert_eq!(settings.display_name, "North Hill Academy");

    let profile = fx
        .profile_repo
        .get_by_identity(&fx.scope, fx.identity_id)
        .await
        .unwrap();
    assert_eq!(profile.identity_ref, Some(fx.identity_id));

    let record = fx.staff_repo.get_by_profile(&fx.scope, profile.id).await.unwrap();
    assert_eq!(record.designation, "Owner / Administrator");
    let expected_code = format!(
        "EMP-{}",
        fx.identity_id.simple().to_string()[..8].to_uppercase()
    );
    assert_eq!(record.employee_code, expected_code);
}

#[tokio::test]
async fn staff_grant_gets_the_default_designation() {
    let fx = setup().await;

    fx.reactor().handle(&fx.event("staff")).await.unwrap();

    let profile = fx
        .profile_repo
        .get_by_identity(&fx.scope, fx.identity_id)
        .await
        .unwrap();
    let record = fx.staff_repo.get_by_profile(&fx.scope, profile.id).await.unwrap();
    assert_eq!(record.designation, "Staff");
}

#[tokio::test]
async fn redelivered_events_provision_exactly_once() {
    let fx = setup().await;
    let reactor = fx.reactor();

    reactor.handle(&fx.event("owner")).await.unwrap();
    reactor.handle(&fx.event("owner")).await.unwrap();
    reactor.handle(&fx.event("owner")).await.unwrap();

    let profiles = fx.profile_repo.list(&fx.scope).await.unwrap();
    assert_eq!(profiles.len(), 1);
    fx.staff_repo
        .get_by_profile(&fx.scope, profiles[0].id)
        .await
        .unwrap();
}

#[tokio::test]
async fn exempt_roles_get_no_staff_provisioning() {
    let fx = setup().await;
    let reactor = fx.reactor();

    reactor.handle(&fx.event("student")).await.unwrap();
    reactor.handle(&fx.event("instructor")).await.unwrap();

    assert!(fx.profile_repo.list(&fx.scope).await.unwrap().is_empty());
    // Institution settings still get materialized for the tenant.
    fx.institution_repo.get(&fx.scope).await.unwrap();
}

#[tokio::test]
async fn grant_service_reuses_existing_grants() {
    let fx = setup().await;
    let service = MembershipService::new(&fx.grant_repo, fx.reactor());

    let first = service
        .grant(fx.identity_id, fx.scope.organization_id, "staff")
        .await
        .unwrap();
    let second = service
        .grant(fx.identity_id, fx.scope.organization_id, "staff")
        .await
        .unwrap();
    assert_eq!(first.id, second.id);

    let grants = fx.grant_repo.list_by_identity(fx.identity_id).await.unwrap();
    assert_eq!(grants.len(), 1);
}

#[tokio::test]
async fn failed_provisioning_rolls_back_the_grant() {
    let fx = setup().await;
    let service = MembershipService::new(&fx.grant_repo, fx.reactor());

    // An organization that does not exist makes provisioning fail after
    // the grant write.
    let err = service
        .grant(fx.identity_id, Uuid::new_v4(), "staff")
        .await
        .unwrap_err();
    assert!(matches!(err, CampusError::NotFound { .. }));

    let grants = fx.grant_repo.list_by_identity(fx.identity_id).await.unwrap();
    assert!(grants.is_empty());
}

#[tokio::test]
async fn revoke_deletes_the_grant_but_keeps_the_profile() {
    let fx = setup().await;
    let service = MembershipService::new(&fx.grant_repo, fx.reactor());

    service
        .grant(fx.identity_id, fx.scope.organization_id, "staff")
        .await
        .unwrap();
    service
        .revoke(fx.identity_id, fx.scope.organization_id, "staff")
        .await
        .unwrap();

    assert!(
        fx.grant_repo
            .list_by_identity(fx.identity_id)
            .await
            .unwrap()
            .is_empty()
    );
    // Revocation is not account closure.
    fx.profile_repo
        .get_by_identity(&fx.scope, fx.identity_id)
        .await
        .unwrap();

    // Revoking again is a no-op.
    service
        .revoke(fx.identity_id, fx.scope.organization_id, "staff")
        .await
        .unwrap();
}

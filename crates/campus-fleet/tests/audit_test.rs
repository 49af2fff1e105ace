//! Integration tests for the consistency auditor, its repair path, and
//! the admission workflow that produces legitimate unlinked profiles.

use campus_core::error::{CampusError, CampusResult};
use campus_core::models::identity::CreateIdentity;
use campus_core::models::organization::CreateOrganization;
use campus_core::models::profile::{CreateProfile, Profile};
use campus_core::models::staff_record::CreateStaffRecord;
use campus_core::repository::{
    IdentityRepository, ProfileRepository, StaffRecordRepository, TenantDirectory,
};
use campus_core::tenant::TenantScope;
use campus_db::repository::{
    SurrealIdentityRepository, SurrealOrganizationRepository, SurrealProfileRepository,
    SurrealStaffRecordRepository, SurrealStudentRecordRepository,
};
use campus_fleet::{
    AdmissionService, AdmitStudent, ConsistencyAuditor, FleetConfig, TenantAuditReport,
};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

type Db = surrealdb::engine::local::Db;

struct Fixture {
    directory: SurrealOrganizationRepository<Db>,
    identity_repo: SurrealIdentityRepository<Db>,
    profile_repo: SurrealProfileRepository<Db>,
    staff_repo: SurrealStaffRecordRepository<Db>,
    student_repo: SurrealStudentRecordRepository<Db>,
    scope: TenantScope,
}

impl Fixture {
    fn auditor(
        &self,
    ) -> ConsistencyAuditor<
        '_,
        SurrealOrganizationRepository<Db>,
        SurrealIdentityRepository<Db>,
        SurrealProfileRepository<Db>,
        SurrealStaffRecordRepository<Db>,
        SurrealStudentRecordRepository<Db>,
    > {
        ConsistencyAuditor::new(
            &self.directory,
            &self.identity_repo,
            &self.profile_repo,
            &self.staff_repo,
            &self.student_repo,
            FleetConfig::default(),
        )
    }

    async fn profile(&self, identity_ref: Option<Uuid>) -> Uuid {
        self.profile_repo
            .create(
                &self.scope,
                CreateProfile {
                    identity_ref,
                    first_name: "Jane".into(),
                    last_name: "Doe".into(),
                    phone: None,
                },
            )
            .await
            .unwrap()
            .id
    }
}

/// Helper: in-memory DB, one organization.
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

    Fixture {
        directory,
        identity_repo: SurrealIdentityRepository::new(db.clone()),
        profile_repo: SurrealProfileRepository::new(db.clone()),
        staff_repo: SurrealStaffRecordRepository::new(db.clone()),
        student_repo: SurrealStudentRecordRepository::new(db),
        scope,
    }
}

async fn live_identity(fx: &Fixture, username: &str) -> Uuid {
    fx.identity_repo
        .create(CreateIdentity {
            username: username.into(),
            email: None,
            password: "sw0rdfish123".into(),
            needs_password_rotation: false,
        })
        .await
        .unwrap()
        .id
}

/// Profile repository standing in for a fleet where one tenant's
/// partition is unreachable.
struct FlakyProfiles<'a> {
    inner: &'a SurrealProfileRepository<Db>,
    broken: String,
}

impl FlakyProfiles<'_> {
    fn reach(&self, scope: &TenantScope) -> CampusResult<()> {
        if scope.schema_name == self.broken {
            return Err(CampusError::Database("partition unreachable".into()));
        }
        Ok(())
    }
}

impl ProfileRepository for FlakyProfiles<'_> {
    async fn create(&self, scope: &TenantScope, input: CreateProfile) -> CampusResult<Profile> {
        self.reach(scope)?;
        self.inner.create(scope, input).await
    }

    async fn get_by_id(&self, scope: &TenantScope, id: Uuid) -> CampusResult<Profile> {
        self.reach(scope)?;
        self.inner.get_by_id(scope, id).await
    }

    async fn get_by_identity(&self, scope: &TenantScope, identity_id: Uuid) -> CampusResult<Profile> {
        self.reach(scope)?;
        self.inner.get_by_identity(scope, identity_id).await
    }

    async fn get_by_local_username(
        &self,
        scope: &TenantScope,
        local_username: &str,
    ) -> CampusResult<Profile> {
        self.reach(scope)?;
        self.inner.get_by_local_username(scope, local_username).await
    }

    async fn local_username_exists(
        &self,
        scope: &TenantScope,
        local_username: &str,
    ) -> CampusResult<bool> {
        self.reach(scope)?;
        self.inner.local_username_exists(scope, local_username).await
    }

    async fn link_identity(
        &self,
        scope: &TenantScope,
        profile_id: Uuid,
        identity_id: Uuid,
        local_username: &str,
    ) -> CampusResult<Profile> {
        self.reach(scope)?;
        self.inner
            .link_identity(scope, profile_id, identity_id, local_username)
            .await
    }

    async fn list(&self, scope: &TenantScope) -> CampusResult<Vec<Profile>> {
        self.reach(scope)?;
        self.inner.list(scope).await
    }

    async fn delete_by_identity_ref(
        &self,
        scope: &TenantScope,
        identity_id: Uuid,
    ) -> CampusResult<Vec<Uuid>> {
        self.reach(scope)?;
        self.inner.delete_by_identity_ref(scope, identity_id).await
    }

    async fn delete_by_ids(&self, scope: &TenantScope, ids: &[Uuid]) -> CampusResult<u64> {
        self.reach(scope)?;
        self.inner.delete_by_ids(scope, ids).await
    }
}

#[tokio::test]
async fn audit_classifies_orphaned_linked_and_unlinked_exactly() {
    let fx = setup().await;

    let live_id = live_identity(&fx, "alive_000001").await;
    let linked = fx.profile(Some(live_id)).await;
    let orphan = fx.profile(Some(Uuid::new_v4())).await;
    let unlinked = fx.profile(None).await;

    let report = fx.auditor().audit_fleet().await.unwrap();
    assert!(report.skipped.is_empty());
    assert_eq!(report.tenants.len(), 1);

    let tenant = &report.tenants[0];
    assert_eq!(tenant.schema_name, "north-hill");
    assert_eq!(tenant.name, "North Hill Academy");
    assert_eq!(tenant.orphan_count, 1);
    assert_eq!(tenant.orphan_ids, vec![orphan]);
    assert_eq!(tenant.unlinked_count, 1);
    assert_eq!(tenant.unlinked_ids, vec![unlinked]);
    assert!(!tenant.orphan_ids.contains(&linked));

    assert_eq!(report.total_orphans(), 1);
    assert_eq!(report.total_unlinked(), 1);
}

#[tokio::test]
async fn repair_removes_orphans_and_their_domain_records_only() {
    let fx = setup().await;

    let live_id = live_identity(&fx, "alive_000001").await;
    let linked = fx.profile(Some(live_id)).await;
    let orphan = fx.profile(Some(Uuid::new_v4())).await;
    let unlinked = fx.profile(None).await;

    fx.staff_repo
        .create(
            &fx.scope,
            CreateStaffRecord {
                profile_id: orphan,
                employee_code: "EMP-DEADBEEF".into(),
                designation: "Staff".into(),
            },
        )
        .await
        .unwrap();

    let removed = fx.auditor().repair_tenant("north-hill").await.unwrap();
    assert_eq!(removed, 1);

    let err = fx.profile_repo.get_by_id(&fx.scope, orphan).await.unwrap_err();
    assert!(matches!(err, CampusError::NotFound { .. }));
    let err = fx.staff_repo.get_by_profile(&fx.scope, orphan).await.unwrap_err();
    assert!(matches!(err, CampusError::NotFound { .. }));

    // Linked and unlinked profiles are untouched.
    fx.profile_repo.get_by_id(&fx.scope, linked).await.unwrap();
    fx.profile_repo.get_by_id(&fx.scope, unlinked).await.unwrap();

    let report = fx.auditor().audit_fleet().await.unwrap();
    assert_eq!(report.total_orphans(), 0);
    assert_eq!(report.total_unlinked(), 1);
}

#[tokio::test]
async fn audit_skips_an_unreachable_tenant_and_reports_the_rest() {
    let fx = setup().await;
    let org_b = fx
        .directory
        .create(CreateOrganization {
            name: "South Valley School".into(),
            schema_name: "south-valley".into(),
        })
        .await
        .unwrap();
    let scope_b = fx.directory.resolve(org_b.id).await.unwrap();

    fx.profile(Some(Uuid::new_v4())).await;
    fx.profile_repo
        .create(
            &scope_b,
            CreateProfile {
                identity_ref: Some(Uuid::new_v4()),
                first_name: "Sam".into(),
                last_name: "Ng".into(),
                phone: None,
            },
        )
        .await
        .unwrap();

    let profiles = FlakyProfiles {
        inner: &fx.profile_repo,
        broken: "north-hill".into(),
    };
    let auditor = ConsistencyAuditor::new(
        &fx.directory,
        &fx.identity_repo,
        &profiles,
        &fx.staff_repo,
        &fx.student_repo,
        FleetConfig::default(),
    );

    let report = auditor.audit_fleet().await.unwrap();
    assert_eq!(report.skipped, vec!["north-hill".to_string()]);
    assert_eq!(report.tenants.len(), 1);
    assert_eq!(report.tenants[0].schema_name, "south-valley");
    assert_eq!(report.tenants[0].orphan_count, 1);
}

#[tokio::test]
async fn fleet_repair_continues_past_a_failing_tenant() {
    let fx = setup().await;
    let orphan = fx.profile(Some(Uuid::new_v4())).await;

    let mut report = fx.auditor().audit_fleet().await.unwrap();
    assert_eq!(report.total_orphans(), 1);

    // A tenant that vanished between audit and repair fails first in
    // the pass; everyone behind it must still get repaired.
    report.tenants.insert(
        0,
        TenantAuditReport {
            schema_name: "no-such-school".into(),
            name: "No Such School".into(),
            orphan_count: 1,
            orphan_ids: vec![Uuid::new_v4()],
            unlinked_count: 0,
            unlinked_ids: vec![],
        },
    );

    let summary = fx.auditor().repair_fleet(&report).await;
    assert_eq!(summary.failed, vec!["no-such-school".to_string()]);
    assert_eq!(summary.profiles_removed, 1);

    let err = fx.profile_repo.get_by_id(&fx.scope, orphan).await.unwrap_err();
    assert!(matches!(err, CampusError::NotFound { .. }));
}

#[tokio::test]
async fn repair_of_a_clean_tenant_removes_nothing() {
    let fx = setup().await;
    let live_id = live_identity(&fx, "alive_000001").await;
    fx.profile(Some(live_id)).await;

    let removed = fx.auditor().repair_tenant("north-hill").await.unwrap();
    assert_eq!(removed, 0);
}

#[tokio::test]
async fn repair_of_an_unknown_tenant_fails() {
    let fx = setup().await;
    let err = fx.auditor().repair_tenant("no-such-school").await.unwrap_err();
    assert!(matches!(err, CampusError::NotFound { .. }));
}

#[tokio::test]
async fn admission_creates_an_unlinked_profile_with_student_record() {
    let fx = setup().await;
    let admission = AdmissionService::new(&fx.profile_repo, &fx.student_repo);

    let (profile, record) = admission
        .admit_student(
            &fx.scope,
            AdmitStudent {
                first_name: "Sam".into(),
                last_name: "Santos".into(),
                phone: None,
                current_level: "Grade 7".into(),
                guardian_name: Some("Ana Santos".into()),
                guardian_phone: Some("+15550001111".into()),
            },
        )
        .await
        .unwrap();

    assert!(profile.identity_ref.is_none());
    assert!(profile.local_username.is_none());
    assert_eq!(record.profile_id, profile.id);
    let expected_code = format!(
        "STU-{}",
        profile.id.simple().to_string()[..8].to_uppercase()
    );
    assert_eq!(record.enrollment_code, expected_code);
    assert_eq!(record.current_level, "Grade 7");

    // Admitted students show up as unlinked, never as orphans.
    let report = fx.auditor().audit_fleet().await.unwrap();
    assert_eq!(report.total_orphans(), 0);
    assert_eq!(report.total_unlinked(), 1);
}

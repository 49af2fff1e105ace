//! Integration tests for the profile repository using in-memory
//! SurrealDB. The interesting properties are all about tenant
//! isolation: every operation binds one partition key, and local
//! usernames are only unique inside their own partition.

use campus_core::error::CampusError;
use campus_core::models::organization::CreateOrganization;
use campus_core::models::profile::CreateProfile;
use campus_core::repository::{ProfileRepository, TenantDirectory};
use campus_core::tenant::TenantScope;
use campus_db::repository::{SurrealOrganizationRepository, SurrealProfileRepository};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

/// Helper: spin up in-memory DB, run migrations, create two
/// organizations, and resolve their scopes.
async fn setup() -> (
    Surreal<surrealdb::engine::local::Db>,
    TenantScope,
    TenantScope,
) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    campus_db::run_migrations(&db).await.unwrap();

    let org_repo = SurrealOrganizationRepository::new(db.clone());
    let org_a = org_repo
        .create(CreateOrganization {
            name: "North Hill Academy".into(),
            schema_name: "north-hill".into(),
        })
        .await
        .unwrap();
    let org_b = org_repo
        .create(CreateOrganization {
            name: "South Valley School".into(),
            schema_name: "south-valley".into(),
        })
        .await
        .unwrap();

    let scope_a = org_repo.resolve(org_a.id).await.unwrap();
    let scope_b = org_repo.resolve(org_b.id).await.unwrap();
    (db, scope_a, scope_b)
}

fn person(identity_ref: Option<Uuid>) -> CreateProfile {
    CreateProfile {
        identity_ref,
        first_name: "Jane".into(),
        last_name: "Doe".into(),
        phone: None,
    }
}

#[tokio::test]
async fn profiles_are_invisible_across_tenants() {
    let (db, scope_a, scope_b) = setup().await;
    let repo = SurrealProfileRepository::new(db);

    let identity_id = Uuid::new_v4();
    let profile = repo.create(&scope_a, person(Some(identity_id))).await.unwrap();

    assert_eq!(repo.list(&scope_a).await.unwrap().len(), 1);
    assert!(repo.list(&scope_b).await.unwrap().is_empty());

    let err = repo.get_by_id(&scope_b, profile.id).await.unwrap_err();
    assert!(matches!(err, CampusError::NotFound { .. }));

    let err = repo.get_by_identity(&scope_b, identity_id).await.unwrap_err();
    assert!(matches!(err, CampusError::NotFound { .. }));
}

#[tokio::test]
async fn local_username_is_unique_per_tenant_only() {
    let (db, scope_a, scope_b) = setup().await;
    let repo = SurrealProfileRepository::new(db);

    let p1 = repo.create(&scope_a, person(None)).await.unwrap();
    let p2 = repo.create(&scope_a, person(None)).await.unwrap();
    let p3 = repo.create(&scope_b, person(None)).await.unwrap();

    repo.link_identity(&scope_a, p1.id, Uuid::new_v4(), "jdoe")
        .await
        .unwrap();
    assert!(repo.local_username_exists(&scope_a, "jdoe").await.unwrap());
    assert!(!repo.local_username_exists(&scope_b, "jdoe").await.unwrap());

    // Same alias, same tenant: the unique index rejects it.
    let err = repo
        .link_identity(&scope_a, p2.id, Uuid::new_v4(), "jdoe")
        .await
        .unwrap_err();
    assert!(err.is_conflict());

    // Same alias, different tenant: fine.
    repo.link_identity(&scope_b, p3.id, Uuid::new_v4(), "jdoe")
        .await
        .unwrap();

    let found = repo.get_by_local_username(&scope_a, "jdoe").await.unwrap();
    assert_eq!(found.id, p1.id);
}

#[tokio::test]
async fn concurrent_links_to_the_same_alias_admit_exactly_one() {
    let (db, scope_a, _) = setup().await;
    let repo = SurrealProfileRepository::new(db);

    let p1 = repo.create(&scope_a, person(None)).await.unwrap();
    let p2 = repo.create(&scope_a, person(None)).await.unwrap();

    // Two racing activations pick the same alias. The unique index must
    // let exactly one through, whichever lands first.
    let (r1, r2) = tokio::join!(
        repo.link_identity(&scope_a, p1.id, Uuid::new_v4(), "jdoe"),
        repo.link_identity(&scope_a, p2.id, Uuid::new_v4(), "jdoe"),
    );
    let winners = [r1.is_ok(), r2.is_ok()].iter().filter(|ok| **ok).count();
    assert_eq!(winners, 1);
    for result in [r1, r2] {
        if let Err(e) = result {
            assert!(e.is_conflict());
        }
    }

    let holders: Vec<_> = repo
        .list(&scope_a)
        .await
        .unwrap()
        .into_iter()
        .filter(|p| p.local_username.as_deref() == Some("jdoe"))
        .collect();
    assert_eq!(holders.len(), 1);
}

#[tokio::test]
async fn profiles_without_an_alias_never_collide() {
    let (db, scope_a, _) = setup().await;
    let repo = SurrealProfileRepository::new(db);

    // Many profiles with no local_username coexist in one tenant; the
    // alias index only constrains present values.
    for _ in 0..3 {
        repo.create(&scope_a, person(None)).await.unwrap();
    }
    assert_eq!(repo.list(&scope_a).await.unwrap().len(), 3);
}

#[tokio::test]
async fn link_identity_sets_both_fields() {
    let (db, scope_a, _) = setup().await;
    let repo = SurrealProfileRepository::new(db);

    let created = repo.create(&scope_a, person(None)).await.unwrap();
    assert!(created.identity_ref.is_none());
    assert!(created.local_username.is_none());

    let identity_id = Uuid::new_v4();
    let linked = repo
        .link_identity(&scope_a, created.id, identity_id, "jdoe")
        .await
        .unwrap();
    assert_eq!(linked.identity_ref, Some(identity_id));
    assert_eq!(linked.local_username.as_deref(), Some("jdoe"));
}

#[tokio::test]
async fn delete_by_identity_ref_returns_removed_ids() {
    let (db, scope_a, scope_b) = setup().await;
    let repo = SurrealProfileRepository::new(db);

    let identity_id = Uuid::new_v4();
    let target = repo.create(&scope_a, person(Some(identity_id))).await.unwrap();
    let bystander = repo.create(&scope_a, person(None)).await.unwrap();
    let other_tenant = repo.create(&scope_b, person(Some(identity_id))).await.unwrap();

    let removed = repo
        .delete_by_identity_ref(&scope_a, identity_id)
        .await
        .unwrap();
    assert_eq!(removed, vec![target.id]);

    // The unlinked profile and the other tenant's profile survive.
    repo.get_by_id(&scope_a, bystander.id).await.unwrap();
    repo.get_by_id(&scope_b, other_tenant.id).await.unwrap();

    // Nothing left to remove on a second pass.
    let removed = repo
        .delete_by_identity_ref(&scope_a, identity_id)
        .await
        .unwrap();
    assert!(removed.is_empty());
}

#[tokio::test]
async fn delete_by_ids_is_scoped_and_counted() {
    let (db, scope_a, scope_b) = setup().await;
    let repo = SurrealProfileRepository::new(db);

    let p1 = repo.create(&scope_a, person(None)).await.unwrap();
    let p2 = repo.create(&scope_a, person(None)).await.unwrap();
    let foreign = repo.create(&scope_b, person(None)).await.unwrap();

    assert_eq!(repo.delete_by_ids(&scope_a, &[]).await.unwrap(), 0);

    // Ids from another tenant do not count and are not deleted.
    let removed = repo
        .delete_by_ids(&scope_a, &[p1.id, p2.id, foreign.id])
        .await
        .unwrap();
    assert_eq!(removed, 2);
    repo.get_by_id(&scope_b, foreign.id).await.unwrap();
}

//! Integration tests for the organisation, membership and role
//! repositories using in-memory SurrealDB.

use orgkit_core::error::OrgError;
use orgkit_core::models::membership::{BaseRole, CreateMembership};
use orgkit_core::models::org_unit::{CreateOrgUnit, UnitType};
use orgkit_core::models::organisation::{CreateOrganisation, OrganisationType, UpdateOrganisation};
use orgkit_core::models::role::{CreateRole, RoleScope, UpdateRole};
use orgkit_core::repository::{
    MembershipRepository, OrgUnitRepository, OrganisationRepository, Pagination, RoleRepository,
};
use orgkit_db::repository::{
    SurrealMembershipRepository, SurrealOrgUnitRepository, SurrealOrganisationRepository,
    SurrealRoleRepository,
};
use serde_json::json;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

async fn setup() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    orgkit_db::run_migrations(&db).await.unwrap();
    db
}

async fn create_org(db: &Surreal<Db>, slug: &str) -> Uuid {
    SurrealOrganisationRepository::new(db.clone())
        .create(CreateOrganisation {
            name: slug.to_string(),
            slug: slug.to_string(),
            org_type: OrganisationType::School,
            metadata: None,
        })
        .await
        .unwrap()
        .id
}

// ---------------------------------------------------------------------------
// organisation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn organisation_crud_and_slug_lookup() {
    let db = setup().await;
    let repo = SurrealOrganisationRepository::new(db.clone());

    let org = repo
        .create(CreateOrganisation {
            name: "North Hill School".into(),
            slug: "north-hill".into(),
            org_type: OrganisationType::School,
            metadata: Some(json!({ "features": { "fees": true } })),
        })
        .await
        .unwrap();

    let by_slug = repo.get_by_slug("north-hill").await.unwrap();
    assert_eq!(by_slug.id, org.id);
    assert_eq!(by_slug.org_type, OrganisationType::School);
    assert_eq!(by_slug.metadata, json!({ "features": { "fees": true } }));

    let updated = repo
        .update(
            org.id,
            UpdateOrganisation {
                name: Some("North Hill".into()),
                slug: None,
                metadata: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "North Hill");
    assert_eq!(updated.slug, "north-hill");

    assert!(matches!(
        repo.get_by_slug("missing").await.unwrap_err(),
        OrgError::NotFound { .. }
    ));
}

#[tokio::test]
async fn duplicate_slug_is_rejected() {
    let db = setup().await;
    let repo = SurrealOrganisationRepository::new(db.clone());
    create_org(&db, "taken").await;

    let result = repo
        .create(CreateOrganisation {
            name: "Other".into(),
            slug: "taken".into(),
            org_type: OrganisationType::College,
            metadata: None,
        })
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn organisation_list_paginates() {
    let db = setup().await;
    let repo = SurrealOrganisationRepository::new(db.clone());
    for i in 0..5 {
        create_org(&db, &format!("org-{i}")).await;
    }

    let page = repo
        .list(Pagination {
            offset: 0,
            limit: 2,
        })
        .await
        .unwrap();
    assert_eq!(page.total, 5);
    assert_eq!(page.items.len(), 2);

    let last = repo
        .list(Pagination {
            offset: 4,
            limit: 2,
        })
        .await
        .unwrap();
    assert_eq!(last.items.len(), 1);
}

#[tokio::test]
async fn organisation_delete_cascades_to_scoped_rows() {
    let db = setup().await;
    let org_repo = SurrealOrganisationRepository::new(db.clone());
    let org = create_org(&db, "doomed").await;
    let survivor = create_org(&db, "survivor").await;

    let unit_repo = SurrealOrgUnitRepository::new(db.clone());
    let root = unit_repo
        .create_unit(CreateOrgUnit {
            organisation_id: org,
            parent_id: None,
            unit_type: UnitType::Root,
            name: "root".into(),
            metadata: None,
        })
        .await
        .unwrap();
    let survivor_root = unit_repo
        .create_unit(CreateOrgUnit {
            organisation_id: survivor,
            parent_id: None,
            unit_type: UnitType::Root,
            name: "root".into(),
            metadata: None,
        })
        .await
        .unwrap();

    let membership_repo = SurrealMembershipRepository::new(db.clone());
    let member = membership_repo
        .create(CreateMembership {
            organisation_id: org,
            user_id: Uuid::new_v4(),
            base_role: BaseRole::Admin,
            role_id: None,
            unit_id: None,
        })
        .await
        .unwrap();
    let role = SurrealRoleRepository::new(db.clone())
        .create(CreateRole {
            organisation_id: org,
            name: "custodian".into(),
            scope: RoleScope::Org,
            permissions: vec![],
        })
        .await
        .unwrap();

    org_repo.delete(org).await.unwrap();

    assert!(matches!(
        org_repo.get_by_id(org).await.unwrap_err(),
        OrgError::NotFound { .. }
    ));
    assert!(unit_repo.get(org, root.id).await.is_err());
    assert!(membership_repo.get(org, member.id).await.is_err());
    assert!(
        SurrealRoleRepository::new(db.clone())
            .get_by_id(org, role.id)
            .await
            .is_err()
    );

    // The other tenant is untouched.
    assert!(unit_repo.get(survivor, survivor_root.id).await.is_ok());
}

// ---------------------------------------------------------------------------
// membership
// ---------------------------------------------------------------------------

#[tokio::test]
async fn membership_listing_and_counting() {
    let db = setup().await;
    let org = create_org(&db, "school").await;
    let repo = SurrealMembershipRepository::new(db.clone());

    let user_id = Uuid::new_v4();
    let unit_a = Uuid::new_v4();
    let unit_b = Uuid::new_v4();

    for unit in [Some(unit_a), Some(unit_b), None] {
        repo.create(CreateMembership {
            organisation_id: org,
            user_id,
            base_role: BaseRole::Staff,
            role_id: None,
            unit_id: unit,
        })
        .await
        .unwrap();
    }
    // Another user on unit_a.
    repo.create(CreateMembership {
        organisation_id: org,
        user_id: Uuid::new_v4(),
        base_role: BaseRole::Student,
        role_id: None,
        unit_id: Some(unit_a),
    })
    .await
    .unwrap();

    assert_eq!(repo.list_by_user(org, user_id).await.unwrap().len(), 3);
    assert_eq!(repo.list_by_unit(org, unit_a).await.unwrap().len(), 2);
    assert_eq!(repo.count_by_unit(org, unit_a).await.unwrap(), 2);
    assert_eq!(repo.count_by_unit(org, unit_b).await.unwrap(), 1);
    assert_eq!(repo.count_by_unit(org, Uuid::new_v4()).await.unwrap(), 0);
}

#[tokio::test]
async fn clear_unit_widens_only_matching_rows() {
    let db = setup().await;
    let org = create_org(&db, "school").await;
    let repo = SurrealMembershipRepository::new(db.clone());

    let unit_a = Uuid::new_v4();
    let unit_b = Uuid::new_v4();
    let in_a = repo
        .create(CreateMembership {
            organisation_id: org,
            user_id: Uuid::new_v4(),
            base_role: BaseRole::Student,
            role_id: None,
            unit_id: Some(unit_a),
        })
        .await
        .unwrap();
    let in_b = repo
        .create(CreateMembership {
            organisation_id: org,
            user_id: Uuid::new_v4(),
            base_role: BaseRole::Student,
            role_id: None,
            unit_id: Some(unit_b),
        })
        .await
        .unwrap();

    repo.clear_unit(org, unit_a).await.unwrap();

    assert_eq!(repo.get(org, in_a.id).await.unwrap().unit_id, None);
    assert_eq!(repo.get(org, in_b.id).await.unwrap().unit_id, Some(unit_b));
}

#[tokio::test]
async fn membership_delete_removes_one_row() {
    let db = setup().await;
    let org = create_org(&db, "school").await;
    let repo = SurrealMembershipRepository::new(db.clone());

    let member = repo
        .create(CreateMembership {
            organisation_id: org,
            user_id: Uuid::new_v4(),
            base_role: BaseRole::Parent,
            role_id: None,
            unit_id: None,
        })
        .await
        .unwrap();

    repo.delete(org, member.id).await.unwrap();
    assert!(matches!(
        repo.get(org, member.id).await.unwrap_err(),
        OrgError::NotFound { .. }
    ));
}

// ---------------------------------------------------------------------------
// role
// ---------------------------------------------------------------------------

#[tokio::test]
async fn role_crud_round_trip() {
    let db = setup().await;
    let org = create_org(&db, "school").await;
    let repo = SurrealRoleRepository::new(db.clone());

    let role = repo
        .create(CreateRole {
            organisation_id: org,
            name: "librarian".into(),
            scope: RoleScope::Unit,
            permissions: vec!["people.read".into()],
        })
        .await
        .unwrap();
    assert_eq!(role.scope, RoleScope::Unit);

    let updated = repo
        .update(
            org,
            role.id,
            UpdateRole {
                name: None,
                scope: Some(RoleScope::Org),
                permissions: Some(vec!["people.read".into(), "announce.read".into()]),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.scope, RoleScope::Org);
    assert_eq!(updated.permissions.len(), 2);

    let listed = repo.list(org, Pagination::default()).await.unwrap();
    assert_eq!(listed.total, 1);
    assert_eq!(listed.items[0].name, "librarian");
}

#[tokio::test]
async fn role_delete_detaches_memberships_in_one_step() {
    let db = setup().await;
    let org = create_org(&db, "school").await;
    let role_repo = SurrealRoleRepository::new(db.clone());
    let membership_repo = SurrealMembershipRepository::new(db.clone());

    let role = role_repo
        .create(CreateRole {
            organisation_id: org,
            name: "examiner".into(),
            scope: RoleScope::Org,
            permissions: vec!["academics.read".into()],
        })
        .await
        .unwrap();
    let attached = membership_repo
        .create(CreateMembership {
            organisation_id: org,
            user_id: Uuid::new_v4(),
            base_role: BaseRole::Staff,
            role_id: Some(role.id),
            unit_id: None,
        })
        .await
        .unwrap();
    let detached = membership_repo
        .create(CreateMembership {
            organisation_id: org,
            user_id: Uuid::new_v4(),
            base_role: BaseRole::Staff,
            role_id: None,
            unit_id: None,
        })
        .await
        .unwrap();

    role_repo.delete(org, role.id).await.unwrap();

    assert!(role_repo.get_by_id(org, role.id).await.is_err());
    assert_eq!(
        membership_repo.get(org, attached.id).await.unwrap().role_id,
        None
    );
    // The membership row itself survives.
    assert!(membership_repo.get(org, detached.id).await.is_ok());
}

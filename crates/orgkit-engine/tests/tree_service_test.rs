//! Integration tests for the unit tree service using in-memory SurrealDB.

use orgkit_core::error::OrgError;
use orgkit_core::models::membership::{BaseRole, CreateMembership};
use orgkit_core::models::org_unit::{CreateOrgUnit, OrgUnit, UnitType};
use orgkit_core::models::organisation::{CreateOrganisation, OrganisationType};
use orgkit_core::models::permission::{PermissionSet, codes};
use orgkit_core::repository::{MembershipRepository, OrgUnitRepository, OrganisationRepository};
use orgkit_db::repository::{
    SurrealMembershipRepository, SurrealOrgUnitRepository, SurrealOrganisationRepository,
};
use orgkit_engine::OrgUnitTreeService;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

type MemTree = OrgUnitTreeService<
    SurrealOrganisationRepository<Db>,
    SurrealOrgUnitRepository<Db>,
    SurrealMembershipRepository<Db>,
>;

/// Spin up in-memory DB, run migrations, create one School organisation.
async fn setup() -> (Surreal<Db>, Uuid) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    orgkit_db::run_migrations(&db).await.unwrap();

    let org_repo = SurrealOrganisationRepository::new(db.clone());
    let org = org_repo
        .create(CreateOrganisation {
            name: "North Hill School".into(),
            slug: "north-hill".into(),
            org_type: OrganisationType::School,
            metadata: None,
        })
        .await
        .unwrap();

    (db, org.id)
}

fn tree(db: &Surreal<Db>) -> MemTree {
    OrgUnitTreeService::new(
        SurrealOrganisationRepository::new(db.clone()),
        SurrealOrgUnitRepository::new(db.clone()),
        SurrealMembershipRepository::new(db.clone()),
    )
}

async fn create(
    service: &MemTree,
    org: Uuid,
    parent: Option<Uuid>,
    unit_type: UnitType,
    name: &str,
) -> OrgUnit {
    service
        .create_unit(CreateOrgUnit {
            organisation_id: org,
            parent_id: parent,
            unit_type,
            name: name.into(),
            metadata: None,
        })
        .await
        .unwrap()
}

/// Root -> Organisation -> Department -> Class scaffold.
async fn scaffold(service: &MemTree, org: Uuid) -> (OrgUnit, OrgUnit, OrgUnit, OrgUnit) {
    let root = create(service, org, None, UnitType::Root, "root").await;
    let top = create(service, org, Some(root.id), UnitType::Organisation, "school").await;
    let dept = create(service, org, Some(top.id), UnitType::Department, "science").await;
    let class = create(service, org, Some(dept.id), UnitType::Class, "grade-8").await;
    (root, top, dept, class)
}

// ---------------------------------------------------------------------------
// create_unit
// ---------------------------------------------------------------------------

#[tokio::test]
async fn root_is_created_once_then_conflicts() {
    let (db, org) = setup().await;
    let service = tree(&db);

    create(&service, org, None, UnitType::Root, "root").await;

    let err = service
        .create_unit(CreateOrgUnit {
            organisation_id: org,
            parent_id: None,
            unit_type: UnitType::Root,
            name: "second root".into(),
            metadata: None,
        })
        .await
        .unwrap_err();

    match err {
        OrgError::Conflict { reason, .. } => assert_eq!(reason, "root exists"),
        other => panic!("expected Conflict, got {other:?}"),
    }
}

#[tokio::test]
async fn first_unit_with_no_parent_must_be_root_typed() {
    let (db, org) = setup().await;
    let service = tree(&db);

    let err = service
        .create_unit(CreateOrgUnit {
            organisation_id: org,
            parent_id: None,
            unit_type: UnitType::Class,
            name: "floating class".into(),
            metadata: None,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, OrgError::Validation { .. }));
}

#[tokio::test]
async fn only_organisation_nests_under_root() {
    let (db, org) = setup().await;
    let service = tree(&db);
    let root = create(&service, org, None, UnitType::Root, "root").await;

    let err = service
        .create_unit(CreateOrgUnit {
            organisation_id: org,
            parent_id: Some(root.id),
            unit_type: UnitType::Class,
            name: "grade-8".into(),
            metadata: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, OrgError::Validation { .. }));

    create(&service, org, Some(root.id), UnitType::Organisation, "school").await;
}

#[tokio::test]
async fn disallowed_child_type_is_rejected() {
    let (db, org) = setup().await;
    let service = tree(&db);
    let (_, _, dept, _) = scaffold(&service, org).await;

    // School: Section is not allowed directly under Department.
    let err = service
        .create_unit(CreateOrgUnit {
            organisation_id: org,
            parent_id: Some(dept.id),
            unit_type: UnitType::Section,
            name: "a".into(),
            metadata: None,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, OrgError::Validation { .. }));
}

#[tokio::test]
async fn parent_from_another_organisation_is_validation() {
    let (db, org) = setup().await;
    let service = tree(&db);
    scaffold(&service, org).await;

    let org_repo = SurrealOrganisationRepository::new(db.clone());
    let other = org_repo
        .create(CreateOrganisation {
            name: "Other College".into(),
            slug: "other-college".into(),
            org_type: OrganisationType::College,
            metadata: None,
        })
        .await
        .unwrap();
    let other_root = create(&service, other.id, None, UnitType::Root, "root").await;
    let other_top = create(
        &service,
        other.id,
        Some(other_root.id),
        UnitType::Organisation,
        "college",
    )
    .await;

    let err = service
        .create_unit(CreateOrgUnit {
            organisation_id: org,
            parent_id: Some(other_top.id),
            unit_type: UnitType::Department,
            name: "crossing".into(),
            metadata: None,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, OrgError::Validation { .. }));
}

// ---------------------------------------------------------------------------
// move_unit
// ---------------------------------------------------------------------------

#[tokio::test]
async fn root_never_moves() {
    let (db, org) = setup().await;
    let service = tree(&db);
    let (root, top, _, _) = scaffold(&service, org).await;

    let err = service
        .move_unit(org, root.id, Some(top.id))
        .await
        .unwrap_err();
    assert!(matches!(err, OrgError::Validation { .. }));
}

#[tokio::test]
async fn move_into_own_descendant_is_rejected() {
    let (db, org) = setup().await;
    let service = tree(&db);
    let (_, _, dept, class) = scaffold(&service, org).await;

    // dept -> class is parent -> child; moving dept under class is a cycle.
    let err = service
        .move_unit(org, dept.id, Some(class.id))
        .await
        .unwrap_err();
    assert!(matches!(err, OrgError::Validation { .. }));

    // Deeper: a group under the class, moving dept under it.
    let group = create(&service, org, Some(class.id), UnitType::Group, "g").await;
    let err = service
        .move_unit(org, dept.id, Some(group.id))
        .await
        .unwrap_err();
    assert!(matches!(err, OrgError::Validation { .. }));
}

#[tokio::test]
async fn move_to_null_parent_conflicts_while_root_exists() {
    let (db, org) = setup().await;
    let service = tree(&db);
    let (_, _, dept, _) = scaffold(&service, org).await;

    let err = service.move_unit(org, dept.id, None).await.unwrap_err();
    assert!(matches!(err, OrgError::Conflict { .. }));
}

#[tokio::test]
async fn valid_move_only_rewrites_parent() {
    let (db, org) = setup().await;
    let service = tree(&db);
    let (_, top, dept, class) = scaffold(&service, org).await;

    // A second department; the class moves from science to it.
    let dept2 = create(&service, org, Some(top.id), UnitType::Department, "arts").await;
    let moved = service
        .move_unit(org, class.id, Some(dept2.id))
        .await
        .unwrap();

    assert_eq!(moved.parent_id, Some(dept2.id));
    assert_eq!(moved.unit_type, UnitType::Class);

    // Old parent unchanged.
    let unit_repo = SurrealOrgUnitRepository::new(db.clone());
    let old = unit_repo.get(org, dept.id).await.unwrap();
    assert_eq!(old.parent_id, Some(top.id));
}

#[tokio::test]
async fn move_validates_type_against_new_parent() {
    let (db, org) = setup().await;
    let service = tree(&db);
    let (_, _, _, class) = scaffold(&service, org).await;
    let section = create(&service, org, Some(class.id), UnitType::Section, "a").await;
    let subject = create(&service, org, Some(class.id), UnitType::Subject, "math").await;

    // School: a Section cannot sit under a Subject.
    let err = service
        .move_unit(org, section.id, Some(subject.id))
        .await
        .unwrap_err();
    assert!(matches!(err, OrgError::Validation { .. }));
}

// ---------------------------------------------------------------------------
// delete_unit
// ---------------------------------------------------------------------------

#[tokio::test]
async fn root_is_undeletable() {
    let (db, org) = setup().await;
    let service = tree(&db);
    let (root, _, _, _) = scaffold(&service, org).await;

    let err = service
        .delete_unit(org, root.id, true, &PermissionSet::All)
        .await
        .unwrap_err();
    assert!(matches!(err, OrgError::Validation { .. }));
}

#[tokio::test]
async fn empty_unit_deletes_without_force() {
    let (db, org) = setup().await;
    let service = tree(&db);
    let (_, _, _, class) = scaffold(&service, org).await;

    service
        .delete_unit(org, class.id, false, &PermissionSet::empty())
        .await
        .unwrap();

    let unit_repo = SurrealOrgUnitRepository::new(db.clone());
    assert!(matches!(
        unit_repo.get(org, class.id).await.unwrap_err(),
        OrgError::NotFound { .. }
    ));
}

#[tokio::test]
async fn non_empty_unit_reports_counts_then_force_lifts() {
    let (db, org) = setup().await;
    let service = tree(&db);
    let (root, _, _, class) = scaffold(&service, org).await;

    // 2 children, 3 scoped memberships.
    let child_a = create(&service, org, Some(class.id), UnitType::Section, "a").await;
    let child_b = create(&service, org, Some(class.id), UnitType::Section, "b").await;
    let membership_repo = SurrealMembershipRepository::new(db.clone());
    let mut member_ids = Vec::new();
    for _ in 0..3 {
        let m = membership_repo
            .create(CreateMembership {
                organisation_id: org,
                user_id: Uuid::new_v4(),
                base_role: BaseRole::Student,
                role_id: None,
                unit_id: Some(class.id),
            })
            .await
            .unwrap();
        member_ids.push(m.id);
    }

    let err = service
        .delete_unit(org, class.id, false, &PermissionSet::empty())
        .await
        .unwrap_err();
    match err {
        OrgError::Conflict { reason, details } => {
            assert_eq!(reason, "unit not empty");
            let details = details.expect("conflict should carry counts");
            assert_eq!(details.children_count, 2);
            assert_eq!(details.member_count, 3);
        }
        other => panic!("expected Conflict, got {other:?}"),
    }

    // Force without the elevated permission fails closed.
    let err = service
        .delete_unit(org, class.id, true, &PermissionSet::empty())
        .await
        .unwrap_err();
    assert!(matches!(err, OrgError::Forbidden { .. }));

    // Force with the permission lifts children to the root and widens the
    // memberships to organisation scope.
    service
        .delete_unit(
            org,
            class.id,
            true,
            &PermissionSet::from_codes([codes::UNITS_FORCE_DELETE]),
        )
        .await
        .unwrap();

    let unit_repo = SurrealOrgUnitRepository::new(db.clone());
    for child in [child_a.id, child_b.id] {
        let lifted = unit_repo.get(org, child).await.unwrap();
        assert_eq!(lifted.parent_id, Some(root.id));
    }
    for member_id in member_ids {
        let membership = membership_repo.get(org, member_id).await.unwrap();
        assert_eq!(membership.unit_id, None);
    }
}

// ---------------------------------------------------------------------------
// listings & walks
// ---------------------------------------------------------------------------

#[tokio::test]
async fn list_flat_has_a_single_null_parent() {
    let (db, org) = setup().await;
    let service = tree(&db);
    let (_, _, _, class) = scaffold(&service, org).await;
    create(&service, org, Some(class.id), UnitType::Section, "a").await;
    create(&service, org, Some(class.id), UnitType::Group, "g").await;

    let flat = service.list_flat(org).await.unwrap();
    assert_eq!(flat.len(), 6);
    let roots = flat.iter().filter(|u| u.parent_id.is_none()).count();
    assert_eq!(roots, 1);
}

#[tokio::test]
async fn every_unit_walks_up_to_the_root() {
    let (db, org) = setup().await;
    let service = tree(&db);
    let (root, _, _, class) = scaffold(&service, org).await;
    create(&service, org, Some(class.id), UnitType::Subject, "math").await;

    let flat = service.list_flat(org).await.unwrap();
    let unit_repo = SurrealOrgUnitRepository::new(db.clone());
    let bound = flat.len();
    for unit in &flat {
        let mut current = unit.clone();
        let mut steps = 0;
        while let Some(parent_id) = current.parent_id {
            current = unit_repo.get(org, parent_id).await.unwrap();
            steps += 1;
            assert!(steps <= bound, "walk exceeded unit count");
        }
        assert_eq!(current.id, root.id);
    }
}

#[tokio::test]
async fn list_tree_nests_children_in_one_pass() {
    let (db, org) = setup().await;
    let service = tree(&db);
    let (root, top, dept, class) = scaffold(&service, org).await;
    let section = create(&service, org, Some(class.id), UnitType::Section, "a").await;

    let forest = service.list_tree(org).await.unwrap();
    assert_eq!(forest.len(), 1);
    let root_node = &forest[0];
    assert_eq!(root_node.unit.id, root.id);
    assert_eq!(root_node.children.len(), 1);
    assert_eq!(root_node.children[0].unit.id, top.id);
    let dept_node = &root_node.children[0].children[0];
    assert_eq!(dept_node.unit.id, dept.id);
    let class_node = &dept_node.children[0];
    assert_eq!(class_node.unit.id, class.id);
    assert_eq!(class_node.children[0].unit.id, section.id);
}

#[tokio::test]
async fn list_tree_excludes_units_with_missing_parents() {
    let (db, org) = setup().await;
    let service = tree(&db);
    let (_, _, dept, class) = scaffold(&service, org).await;

    // Corrupt the store directly: remove the department row, stranding the
    // class. The listing degrades instead of failing.
    let unit_repo = SurrealOrgUnitRepository::new(db.clone());
    unit_repo.delete(org, dept.id).await.unwrap();

    let forest = service.list_tree(org).await.unwrap();
    assert_eq!(forest.len(), 1);
    let all_ids: Vec<Uuid> = collect_ids(&forest);
    assert!(!all_ids.contains(&class.id));
}

fn collect_ids(nodes: &[orgkit_engine::UnitNode]) -> Vec<Uuid> {
    let mut ids = Vec::new();
    for node in nodes {
        ids.push(node.unit.id);
        ids.extend(collect_ids(&node.children));
    }
    ids
}

#[tokio::test]
async fn is_descendant_walks_the_parent_chain() {
    let (db, org) = setup().await;
    let service = tree(&db);
    let (root, top, dept, class) = scaffold(&service, org).await;

    assert!(service.is_descendant(org, root.id, class.id).await.unwrap());
    assert!(service.is_descendant(org, dept.id, class.id).await.unwrap());
    assert!(!service.is_descendant(org, class.id, dept.id).await.unwrap());
    assert!(!service.is_descendant(org, top.id, root.id).await.unwrap());
}

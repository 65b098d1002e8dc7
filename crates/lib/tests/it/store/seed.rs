use std::sync::Arc;

use rolegate::PermissionResolver;
use rolegate::rbac::SystemPermission;
use rolegate::store::{GrantReader, seed_defaults};

use crate::helpers::*;

#[tokio::test]
async fn seeding_creates_system_permissions_and_roles() {
    let store = test_store().await;
    let report = seed_defaults(store.as_ref()).await.unwrap();

    assert_eq!(report.permissions_created, SystemPermission::all().count());
    assert_eq!(report.roles_created, 3);
    assert_eq!(
        store.list_permissions().await.unwrap().len(),
        SystemPermission::all().count()
    );
    assert!(
        store
            .role_permissions(&role("admin"))
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn seeding_twice_is_a_noop() {
    let store = test_store().await;
    seed_defaults(store.as_ref()).await.unwrap();
    let roles_before = store.list_roles().await.unwrap();

    let report = seed_defaults(store.as_ref()).await.unwrap();
    assert!(report.is_noop());
    assert_eq!(store.list_roles().await.unwrap(), roles_before);
}

#[tokio::test]
async fn seeded_roles_resolve_as_documented() {
    let store = test_store().await;
    seed_defaults(store.as_ref()).await.unwrap();
    principal_with(store.as_ref(), "staff-user", &["staff"]).await;
    principal_with(store.as_ref(), "manager-user", &["manager"]).await;
    principal_with(store.as_ref(), "admin-user", &["admin"]).await;

    let reader: Arc<dyn GrantReader> = store.clone();
    let resolver = PermissionResolver::new(reader);
    let allowed = |principal: &'static str, permission: &'static str| {
        let resolver = resolver.clone();
        async move {
            resolver
                .resolve(principal, permission)
                .await
                .unwrap()
                .authorized
        }
    };

    assert!(allowed("staff-user", "organization:read").await);
    assert!(!allowed("staff-user", "organization:create").await);
    assert!(!allowed("staff-user", "user:read").await);

    assert!(allowed("manager-user", "contract:update").await);
    assert!(allowed("manager-user", "user:read").await);
    assert!(!allowed("manager-user", "contract:delete").await);
    assert!(!allowed("manager-user", "role:create").await);

    assert!(allowed("admin-user", "role:delete").await);
}

#[tokio::test]
async fn reseeding_keeps_revoked_grants_revoked() {
    let store = test_store().await;
    seed_defaults(store.as_ref()).await.unwrap();
    principal_with(store.as_ref(), "manager-user", &["manager"]).await;
    store
        .revoke_permission(&role("manager"), &perm("organization:create"))
        .await
        .unwrap();

    let reader: Arc<dyn GrantReader> = store.clone();
    let resolver = PermissionResolver::new(reader);
    let before = resolver
        .resolve("manager-user", "organization:create")
        .await
        .unwrap();
    assert!(!before.authorized);

    let report = seed_defaults(store.as_ref()).await.unwrap();
    assert!(report.is_noop());
    let after = resolver
        .resolve("manager-user", "organization:create")
        .await
        .unwrap();
    assert!(!after.authorized);
    assert!(
        !store
            .role_permissions(&role("manager"))
            .await
            .unwrap()
            .contains(&perm("organization:create"))
    );
}

#[tokio::test]
async fn reseeding_recreates_a_deleted_default_role_with_its_grants() {
    let store = test_store().await;
    seed_defaults(store.as_ref()).await.unwrap();
    store.delete_role(&role("staff")).await.unwrap();

    let report = seed_defaults(store.as_ref()).await.unwrap();
    assert_eq!(report.roles_created, 1);
    assert_eq!(report.grants_applied, 4);
    assert!(
        store
            .role_permissions(&role("staff"))
            .await
            .unwrap()
            .contains(&perm("kpi:read"))
    );
}

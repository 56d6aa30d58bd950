//! Tenant-aware CRUD helpers.
//!
//! Run with: `cargo test -p varejo-core --test tenant_aware_test`

mod helpers;

use helpers::fixtures::{self, VARIANT_BARCODE};
use helpers::TestWorld;
use varejo_core::models::Customer;
use varejo_core::scoping::catalog::{CUSTOMER, PAYMENT, PRODUCT, SALE, STORE};
use varejo_core::{AppError, ErrorMetadata, Record, TenantAwareRepository, TenantId};

#[tokio::test]
async fn test_create_stamps_context_tenant_over_payload() {
    let world = TestWorld::new();
    let request = world.user_of(1);
    let helper = TenantAwareRepository::new(&request.resolver, &world.store);

    let created = helper
        .create_for_current_tenant(
            &CUSTOMER,
            Record::new().with("nome", "Ana").with("empresa_id", 2),
        )
        .await
        .unwrap();

    assert_eq!(created.get_i64("empresa_id"), Some(1));
    let stored = world.store.raw(&CUSTOMER, created.id().unwrap()).unwrap();
    let customer: Customer = stored.into_model().unwrap();
    assert_eq!(customer.tenant_id, Some(TenantId(1)));
    assert_eq!(customer.name, "Ana");
}

#[tokio::test]
async fn test_create_without_context_fails() {
    let world = TestWorld::new();
    let request = world.anonymous();
    let helper = TenantAwareRepository::new(&request.resolver, &world.store);

    let err = helper
        .create_for_current_tenant(&STORE, Record::new().with("nome", "Centro"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NoTenantContext));
    assert_eq!(err.error_code(), "NO_TENANT_CONTEXT");
    assert!(world.store.rows(&STORE).is_empty());
}

#[tokio::test]
async fn test_create_transitive_row_under_foreign_parent_fails() {
    let world = TestWorld::new();
    let foreign_sale = fixtures::sale(&world.store, 2);
    let request = world.user_of(1);
    let helper = TenantAwareRepository::new(&request.resolver, &world.store);

    let err = helper
        .create_for_current_tenant(
            &PAYMENT,
            Record::new()
                .with("venda_id", foreign_sale.id().unwrap())
                .with("valor", 50),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::ForeignTenantAccess { .. }));
    assert_eq!(err.http_status_code(), 403);
    assert!(world.store.rows(&PAYMENT).is_empty());
}

#[tokio::test]
async fn test_create_two_hop_row_checks_whole_chain() {
    let world = TestWorld::new();
    let own = fixtures::product(&world.store, 1, "Camiseta");
    let own_variant = fixtures::variant(&world.store, &own, "CAM-P");
    let foreign = fixtures::product(&world.store, 2, "Vestido");
    let foreign_variant = fixtures::variant(&world.store, &foreign, "VES-M");

    let request = world.user_of(1);
    let helper = TenantAwareRepository::new(&request.resolver, &world.store);

    let created = helper
        .create_for_current_tenant(
            &VARIANT_BARCODE,
            Record::new().with("produto_variacao_id", own_variant.id().unwrap()),
        )
        .await
        .unwrap();
    assert!(created.id().is_some());

    let refused = helper
        .create_for_current_tenant(
            &VARIANT_BARCODE,
            Record::new().with("produto_variacao_id", foreign_variant.id().unwrap()),
        )
        .await;
    assert!(matches!(refused, Err(AppError::ForeignTenantAccess { .. })));
    assert_eq!(world.store.rows(&VARIANT_BARCODE).len(), 1);
}

#[tokio::test]
async fn test_update_foreign_row_fails_without_mutation() {
    let world = TestWorld::new();
    let foreign = fixtures::product(&world.store, 2, "Vestido");
    let request = world.user_of(1);
    let helper = TenantAwareRepository::new(&request.resolver, &world.store);

    let err = helper
        .update_for_current_tenant(&PRODUCT, &foreign, Record::new().with("nome", "Roubado"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        AppError::ForeignTenantAccess { ref entity, id } if entity == "produto" && Some(id) == foreign.id()
    ));
    assert_eq!(world.store.raw(&PRODUCT, foreign.id().unwrap()), Some(foreign));
}

#[tokio::test]
async fn test_delete_foreign_row_fails_without_mutation() {
    let world = TestWorld::new();
    let foreign = fixtures::sale(&world.store, 2);
    let request = world.user_of(1);
    let helper = TenantAwareRepository::new(&request.resolver, &world.store);

    let result = helper.delete_for_current_tenant(&SALE, &foreign).await;

    assert!(matches!(result, Err(AppError::ForeignTenantAccess { .. })));
    let row = world.store.raw(&SALE, foreign.id().unwrap()).unwrap();
    assert!(row.is_null("deleted_at"));
}

#[tokio::test]
async fn test_update_and_delete_require_context() {
    let world = TestWorld::new();
    let sale = fixtures::sale(&world.store, 1);
    let request = world.anonymous();
    let helper = TenantAwareRepository::new(&request.resolver, &world.store);

    let update = helper
        .update_for_current_tenant(&SALE, &sale, Record::new().with("status", "paga"))
        .await;
    assert!(matches!(update, Err(AppError::NoTenantContext)));

    let delete = helper.delete_for_current_tenant(&SALE, &sale).await;
    assert!(matches!(delete, Err(AppError::NoTenantContext)));
    assert_eq!(world.store.raw(&SALE, sale.id().unwrap()), Some(sale));
}

#[tokio::test]
async fn test_delete_own_row_is_soft_where_supported() {
    let world = TestWorld::new();
    let sale = fixtures::sale(&world.store, 1);
    let request = world.user_of(1);
    let helper = TenantAwareRepository::new(&request.resolver, &world.store);

    assert!(helper.delete_for_current_tenant(&SALE, &sale).await.unwrap());

    let row = world.store.raw(&SALE, sale.id().unwrap()).unwrap();
    assert!(!row.is_null("deleted_at"));
    assert!(helper
        .find_for_current_tenant(&SALE, sale.id().unwrap())
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_find_returns_none_for_foreign_or_missing_context() {
    let world = TestWorld::new();
    let own = fixtures::store(&world.store, 1, "Centro");
    let foreign = fixtures::store(&world.store, 2, "Shopping");

    let user = world.user_of(1);
    let helper = TenantAwareRepository::new(&user.resolver, &world.store);
    assert_eq!(
        helper.find_for_current_tenant(&STORE, own.id().unwrap()).await.unwrap(),
        Some(own.clone())
    );
    assert!(helper
        .find_for_current_tenant(&STORE, foreign.id().unwrap())
        .await
        .unwrap()
        .is_none());

    let anonymous = world.anonymous();
    let helper = TenantAwareRepository::new(&anonymous.resolver, &world.store);
    assert!(helper
        .find_for_current_tenant(&STORE, own.id().unwrap())
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_query_for_current_tenant_fails_closed() {
    let world = TestWorld::new();
    fixtures::store(&world.store, 1, "Centro");
    fixtures::store(&world.store, 2, "Shopping");

    let anonymous = world.anonymous();
    let helper = TenantAwareRepository::new(&anonymous.resolver, &world.store);
    let query = helper.query_for_current_tenant(&STORE).await.unwrap();
    assert!(helper.fetch(&query).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_run_as_scopes_helper_operations() {
    let world = TestWorld::new();
    fixtures::store(&world.store, 2, "Shopping");
    let request = world.anonymous();
    let helper = TenantAwareRepository::new(&request.resolver, &world.store);

    let (created, visible) = helper
        .run_as(TenantId(2), || async {
            let created = helper
                .create_for_current_tenant(&STORE, Record::new().with("nome", "Outlet"))
                .await?;
            let query = helper.query_for_current_tenant(&STORE).await?;
            let visible = helper.fetch(&query).await?.len();
            Ok::<_, AppError>((created, visible))
        })
        .await
        .unwrap();

    assert_eq!(created.get_i64("empresa_id"), Some(2));
    assert_eq!(visible, 2);
    assert_eq!(request.stored(), None);

    let query = helper.query_for_current_tenant(&STORE).await.unwrap();
    assert!(helper.fetch(&query).await.unwrap().is_empty());
}

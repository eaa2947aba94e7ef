mod common;

use nest_funds::database::models::{NewService, NewTransaction, ServicePatch};
use nest_funds::domain::{services, transactions};
use nest_funds::error::AppError;
use rust_decimal::Decimal;

#[tokio::test]
async fn admin_creates_and_lists_services() {
    let (pool, cfg) = common::setup().await;
    let admin = common::admin(&pool, &cfg).await;

    let id = common::service(&pool, &admin, "Masjid upkeep").await;
    let all = services::all_services(&pool, &admin).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id, id);
    assert_eq!(all[0].current_amount, Decimal::ZERO);
    assert!(all[0].is_active);
}

#[tokio::test]
async fn blank_name_is_rejected() {
    let (pool, cfg) = common::setup().await;
    let admin = common::admin(&pool, &cfg).await;

    let input = NewService {
        name: "   ".into(),
        ..Default::default()
    };
    let err = services::create_service(&pool, &admin, input).await.unwrap_err();
    assert_eq!(err.public_message(), "Service name is required");
}

#[tokio::test]
async fn members_cannot_manage_services() {
    let (pool, cfg) = common::setup().await;
    let member = common::member(&pool, &cfg).await;

    let input = NewService {
        name: "Zakat".into(),
        ..Default::default()
    };
    let err = services::create_service(&pool, &member, input).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
    assert!(matches!(
        services::all_services(&pool, &member).await,
        Err(AppError::Forbidden(_))
    ));
}

#[tokio::test]
async fn deactivated_services_leave_the_active_list() {
    let (pool, cfg) = common::setup().await;
    let admin = common::admin(&pool, &cfg).await;
    let id = common::service(&pool, &admin, "Iftar").await;

    let patch = ServicePatch {
        is_active: Some(false),
        ..Default::default()
    };
    let done = services::update_service(&pool, &admin, id, patch).await.unwrap();
    assert!(!done.data.is_active);
    assert_eq!(done.data.name, "Iftar");

    assert!(services::active_services(&pool).await.unwrap().is_empty());
    assert_eq!(services::all_services(&pool, &admin).await.unwrap().len(), 1);
}

#[tokio::test]
async fn updating_a_missing_service_is_not_found() {
    let (pool, cfg) = common::setup().await;
    let admin = common::admin(&pool, &cfg).await;

    let err = services::update_service(&pool, &admin, 999, ServicePatch::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn service_with_donations_cannot_be_deleted() {
    let (pool, cfg) = common::setup().await;
    let admin = common::admin(&pool, &cfg).await;
    let member = common::member(&pool, &cfg).await;
    let id = common::service(&pool, &admin, "Madrasa").await;

    let donation = NewTransaction {
        amount: Decimal::from(10),
        service_id: id,
        notes: None,
        payment_proof: None,
    };
    transactions::create_transaction(&pool, &member, donation).await.unwrap();

    let err = services::delete_service(&pool, &admin, id).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(
        err.public_message(),
        "Cannot delete service with existing transactions. Deactivate it instead."
    );
}

#[tokio::test]
async fn empty_service_is_deleted() {
    let (pool, cfg) = common::setup().await;
    let admin = common::admin(&pool, &cfg).await;
    let id = common::service(&pool, &admin, "Temporary").await;

    services::delete_service(&pool, &admin, id).await.unwrap();
    assert!(services::all_services(&pool, &admin).await.unwrap().is_empty());
}

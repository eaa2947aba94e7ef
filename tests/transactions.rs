mod common;

use nest_funds::database::models::{
    NewTransaction, Role, ServicePatch, TransactionFilter, TransactionStatus,
};
use nest_funds::domain::{dashboard, services, transactions};
use nest_funds::error::AppError;
use rust_decimal::Decimal;
use sqlx::{Pool, Sqlite};

fn donation(service_id: i64, amount: i64) -> NewTransaction {
    NewTransaction {
        amount: Decimal::from(amount),
        service_id,
        notes: Some("Jummah".into()),
        payment_proof: Some("https://receipts.example.org/1.png".into()),
    }
}

async fn raised(pool: &Pool<Sqlite>, admin: &nest_funds::domain::auth::Actor, id: i64) -> Decimal {
    services::all_services(pool, admin)
        .await
        .unwrap()
        .into_iter()
        .find(|s| s.id == id)
        .unwrap()
        .current_amount
}

#[tokio::test]
async fn donation_starts_pending() {
    let (pool, cfg) = common::setup().await;
    let admin = common::admin(&pool, &cfg).await;
    let member = common::member(&pool, &cfg).await;
    let sid = common::service(&pool, &admin, "Masjid").await;

    let done = transactions::create_transaction(&pool, &member, donation(sid, 25))
        .await
        .unwrap();
    assert_eq!(done.message, "Donation submitted successfully. Waiting for approval.");
    assert_eq!(done.data.status, TransactionStatus::Pending);
    assert_eq!(done.data.user_id, member.user_id);
    assert_eq!(raised(&pool, &admin, sid).await, Decimal::ZERO);
}

#[tokio::test]
async fn approval_and_rejection_move_the_service_total() {
    let (pool, cfg) = common::setup().await;
    let admin = common::admin(&pool, &cfg).await;
    let member = common::member(&pool, &cfg).await;
    let sid = common::service(&pool, &admin, "Masjid").await;

    let a = transactions::create_transaction(&pool, &member, donation(sid, 25)).await.unwrap().data;
    let b = transactions::create_transaction(&pool, &member, donation(sid, 40)).await.unwrap().data;

    let done = transactions::update_transaction_status(&pool, &admin, a.id, TransactionStatus::Approved)
        .await
        .unwrap();
    assert_eq!(done.message, "Transaction approved successfully.");
    assert_eq!(done.data.approved_by, Some(admin.user_id));
    assert!(done.data.approved_at.is_some());
    assert_eq!(raised(&pool, &admin, sid).await, Decimal::from(25));

    // rejecting a pending donation leaves the total alone
    let done = transactions::update_transaction_status(&pool, &admin, b.id, TransactionStatus::Rejected)
        .await
        .unwrap();
    assert_eq!(done.message, "Transaction rejected successfully.");
    assert!(done.data.approved_at.is_none());
    assert_eq!(raised(&pool, &admin, sid).await, Decimal::from(25));

    // rejecting an approved one takes it back out
    transactions::update_transaction_status(&pool, &admin, a.id, TransactionStatus::Rejected)
        .await
        .unwrap();
    assert_eq!(raised(&pool, &admin, sid).await, Decimal::ZERO);

    let stats = transactions::transaction_stats(&pool, &admin).await.unwrap();
    assert_eq!(stats.rejected.count, 2);
    assert_eq!(stats.rejected.amount, Decimal::from(65));
    assert_eq!(stats.approved.count, 0);
}

#[tokio::test]
async fn approving_twice_counts_once() {
    let (pool, cfg) = common::setup().await;
    let admin = common::admin(&pool, &cfg).await;
    let member = common::member(&pool, &cfg).await;
    let sid = common::service(&pool, &admin, "Masjid").await;
    let t = transactions::create_transaction(&pool, &member, donation(sid, 30)).await.unwrap().data;

    for _ in 0..2 {
        transactions::update_transaction_status(&pool, &admin, t.id, TransactionStatus::Approved)
            .await
            .unwrap();
    }
    assert_eq!(raised(&pool, &admin, sid).await, Decimal::from(30));
}

#[tokio::test]
async fn pending_is_not_a_valid_target() {
    let (pool, cfg) = common::setup().await;
    let admin = common::admin(&pool, &cfg).await;
    let member = common::member(&pool, &cfg).await;
    let sid = common::service(&pool, &admin, "Masjid").await;
    let t = transactions::create_transaction(&pool, &member, donation(sid, 30)).await.unwrap().data;

    let err = transactions::update_transaction_status(&pool, &admin, t.id, TransactionStatus::Pending)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn only_members_donate() {
    let (pool, cfg) = common::setup().await;
    let admin = common::admin(&pool, &cfg).await;
    let sid = common::service(&pool, &admin, "Masjid").await;

    let err = transactions::create_transaction(&pool, &admin, donation(sid, 5))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
    assert_eq!(err.public_message(), "Unauthorized. Only members can create transactions.");
}

#[tokio::test]
async fn donation_checks_amount_service_and_proof() {
    let (pool, cfg) = common::setup().await;
    let admin = common::admin(&pool, &cfg).await;
    let member = common::member(&pool, &cfg).await;
    let sid = common::service(&pool, &admin, "Masjid").await;

    let err = transactions::create_transaction(&pool, &member, donation(sid, 0))
        .await
        .unwrap_err();
    assert_eq!(err.public_message(), "Amount must be positive");

    let err = transactions::create_transaction(&pool, &member, donation(404, 5))
        .await
        .unwrap_err();
    assert_eq!(err.public_message(), "Service not found.");

    let mut bad_proof = donation(sid, 5);
    bad_proof.payment_proof = Some("not a link".into());
    let err = transactions::create_transaction(&pool, &member, bad_proof)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let patch = ServicePatch {
        is_active: Some(false),
        ..Default::default()
    };
    services::update_service(&pool, &admin, sid, patch).await.unwrap();
    let err = transactions::create_transaction(&pool, &member, donation(sid, 5))
        .await
        .unwrap_err();
    assert_eq!(err.public_message(), "This service is currently inactive.");
}

#[tokio::test]
async fn members_only_see_their_own_donations() {
    let (pool, cfg) = common::setup().await;
    let admin = common::admin(&pool, &cfg).await;
    let alice = common::user(&pool, &cfg, "alice@example.com", Role::Member).await;
    let bob = common::user(&pool, &cfg, "bob@example.com", Role::Member).await;
    let sid = common::service(&pool, &admin, "Masjid").await;

    transactions::create_transaction(&pool, &alice, donation(sid, 10)).await.unwrap();
    transactions::create_transaction(&pool, &bob, donation(sid, 20)).await.unwrap();

    let snooping = TransactionFilter {
        user_id: Some(bob.user_id),
        ..Default::default()
    };
    let seen = transactions::list_transactions(&pool, &alice, snooping).await.unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].user_id, alice.user_id);

    let all = transactions::list_transactions(&pool, &admin, TransactionFilter::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 2);

    let pending = TransactionFilter {
        status: Some(TransactionStatus::Approved),
        ..Default::default()
    };
    assert!(transactions::list_transactions(&pool, &admin, pending).await.unwrap().is_empty());
}

#[tokio::test]
async fn oversized_amounts_are_refused() {
    let (pool, cfg) = common::setup().await;
    let admin = common::admin(&pool, &cfg).await;
    let member = common::member(&pool, &cfg).await;
    let sid = common::service(&pool, &admin, "Masjid").await;

    for _ in 0..2 {
        let mut huge = donation(sid, 1);
        huge.amount = Decimal::MAX;
        let err = transactions::create_transaction(&pool, &member, huge)
            .await
            .unwrap_err();
        assert_eq!(err.public_message(), "Amount is too large");
    }
    assert!(transactions::list_transactions(&pool, &admin, TransactionFilter::default())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn overflowing_service_total_rolls_back_the_approval() {
    let (pool, cfg) = common::setup().await;
    let admin = common::admin(&pool, &cfg).await;
    let member = common::member(&pool, &cfg).await;
    let sid = common::service(&pool, &admin, "Masjid").await;
    let t = transactions::create_transaction(&pool, &member, donation(sid, 25)).await.unwrap().data;

    sqlx::query("UPDATE services SET current_amount = ? WHERE service_id = ?")
        .bind(Decimal::MAX.to_string())
        .bind(sid)
        .execute(&pool)
        .await
        .unwrap();

    let err = transactions::update_transaction_status(&pool, &admin, t.id, TransactionStatus::Approved)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(err.public_message(), "Amount is too large");

    assert_eq!(raised(&pool, &admin, sid).await, Decimal::MAX);
    let pending = TransactionFilter {
        status: Some(TransactionStatus::Pending),
        ..Default::default()
    };
    let still = transactions::list_transactions(&pool, &admin, pending).await.unwrap();
    assert_eq!(still.len(), 1);
    assert!(still[0].approved_at.is_none());
}

#[tokio::test]
async fn totals_that_overflow_error_instead_of_panicking() {
    let (pool, cfg) = common::setup().await;
    let admin = common::admin(&pool, &cfg).await;
    let member = common::member(&pool, &cfg).await;
    let sid = common::service(&pool, &admin, "Masjid").await;

    for _ in 0..2 {
        transactions::create_transaction(&pool, &member, donation(sid, 10)).await.unwrap();
    }
    // rows written before amounts were capped
    sqlx::query("UPDATE transactions SET amount = ?, status = 'APPROVED'")
        .bind(Decimal::MAX.to_string())
        .execute(&pool)
        .await
        .unwrap();

    let err = transactions::transaction_stats(&pool, &admin).await.unwrap_err();
    assert_eq!(err.status(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);

    let err = dashboard::member_dashboard(&pool, &member).await.unwrap_err();
    assert_eq!(err.public_message(), "Amount is too large");
}

mod common;

use chrono::Utc;
use nest_funds::database::models::Role;
use nest_funds::domain::auth::{self, Credentials};
use nest_funds::domain::death_committee;
use nest_funds::domain::members::{self, NewMember};
use nest_funds::error::AppError;
use rust_decimal::Decimal;

fn new_member(email: &str, fee: Option<i64>) -> NewMember {
    NewMember {
        name: "Ibrahim Khan".into(),
        email: email.into(),
        password: "longenough".into(),
        phone: Some("0300-1234567".into()),
        address: None,
        role: Role::Member,
        subscription_fee: fee.map(Decimal::from),
    }
}

#[tokio::test]
async fn admin_enrolls_a_member_in_the_committee() {
    let (pool, cfg) = common::setup().await;
    let admin = common::admin(&pool, &cfg).await;

    let done = members::create_member(&pool, &cfg, &admin, new_member("Ibrahim@Example.com", Some(300)))
        .await
        .unwrap();
    assert_eq!(done.message, "Member created successfully.");
    assert_eq!(done.data.email, "ibrahim@example.com");
    assert_eq!(done.data.role, Role::Member);

    let committee = death_committee::list_committee_members(&pool, &admin, None).await.unwrap();
    assert_eq!(committee.len(), 1);
    assert_eq!(committee[0].detail.member.user_id, done.data.id);
    assert_eq!(committee[0].detail.member.monthly_fee, Decimal::from(300));
}

#[tokio::test]
async fn zero_fee_skips_enrollment() {
    let (pool, cfg) = common::setup().await;
    let admin = common::admin(&pool, &cfg).await;

    members::create_member(&pool, &cfg, &admin, new_member("a@example.com", Some(0)))
        .await
        .unwrap();
    members::create_member(&pool, &cfg, &admin, new_member("b@example.com", None))
        .await
        .unwrap();

    assert!(death_committee::list_committee_members(&pool, &admin, None)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn enrolment_fee_is_capped() {
    let (pool, cfg) = common::setup().await;
    let admin = common::admin(&pool, &cfg).await;

    let input = NewMember {
        subscription_fee: Some(Decimal::MAX),
        ..new_member("rich@example.com", None)
    };
    let err = members::create_member(&pool, &cfg, &admin, input).await.unwrap_err();
    assert_eq!(err.public_message(), "Amount is too large");
    assert!(members::list_members(&pool, &admin).await.unwrap().members.is_empty());
}

#[tokio::test]
async fn admins_can_create_admins() {
    let (pool, cfg) = common::setup().await;
    let admin = common::admin(&pool, &cfg).await;

    let input = NewMember {
        role: Role::Admin,
        ..new_member("second@example.com", None)
    };
    let done = members::create_member(&pool, &cfg, &admin, input).await.unwrap();
    assert_eq!(done.message, "Admin created successfully.");

    let dir = members::list_members(&pool, &admin).await.unwrap();
    assert_eq!(dir.total_admins, 2);
    assert_eq!(dir.total_members, 0);
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() {
    let (pool, cfg) = common::setup().await;
    let admin = common::admin(&pool, &cfg).await;

    members::create_member(&pool, &cfg, &admin, new_member("dup@example.com", None))
        .await
        .unwrap();
    let err = members::create_member(&pool, &cfg, &admin, new_member("DUP@example.com", None))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(err.public_message(), "User with this email already exists.");
}

#[tokio::test]
async fn member_input_is_validated() {
    let (pool, cfg) = common::setup().await;
    let admin = common::admin(&pool, &cfg).await;

    let short = NewMember {
        password: "abc".into(),
        ..new_member("short@example.com", None)
    };
    assert!(matches!(
        members::create_member(&pool, &cfg, &admin, short).await,
        Err(AppError::Validation(_))
    ));

    let bad_email = new_member("not-an-email", None);
    assert!(matches!(
        members::create_member(&pool, &cfg, &admin, bad_email).await,
        Err(AppError::Validation(_))
    ));
}

#[tokio::test]
async fn members_cannot_create_accounts() {
    let (pool, cfg) = common::setup().await;
    let member = common::member(&pool, &cfg).await;

    let err = members::create_member(&pool, &cfg, &member, new_member("x@example.com", None))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
    assert!(matches!(
        members::list_members(&pool, &member).await,
        Err(AppError::Forbidden(_))
    ));
}

#[tokio::test]
async fn login_issues_a_session_token() {
    let (pool, cfg) = common::setup().await;
    let member = common::member(&pool, &cfg).await;

    let grant = auth::login(
        &pool,
        &cfg,
        &Credentials {
            email: "member@example.com".into(),
            password: common::PASSWORD.into(),
        },
    )
    .await
    .unwrap();
    assert_eq!(grant.user, member);
    assert!(grant.expires_at > Utc::now().naive_utc());

    let actor = auth::authenticate(&pool, &grant.token).await.unwrap();
    assert_eq!(actor.user_id, member.user_id);

    auth::logout(&pool, &grant.token).await.unwrap();
    assert!(matches!(
        auth::authenticate(&pool, &grant.token).await,
        Err(AppError::Unauthorized(_))
    ));
}

#[tokio::test]
async fn login_ignores_email_case() {
    let (pool, cfg) = common::setup().await;
    common::member(&pool, &cfg).await;

    let creds = Credentials {
        email: " Member@Example.COM ".into(),
        password: common::PASSWORD.into(),
    };
    auth::login(&pool, &cfg, &creds).await.unwrap();
}

#[tokio::test]
async fn expired_sessions_are_refused() {
    let (pool, mut cfg) = common::setup().await;
    common::member(&pool, &cfg).await;
    cfg.session_ttl_hours = 0;

    let grant = auth::login(
        &pool,
        &cfg,
        &Credentials {
            email: "member@example.com".into(),
            password: common::PASSWORD.into(),
        },
    )
    .await
    .unwrap();
    assert!(matches!(
        auth::authenticate(&pool, &grant.token).await,
        Err(AppError::Unauthorized(_))
    ));
}

#[tokio::test]
async fn unrepresentable_session_ttl_is_a_config_error() {
    let (pool, mut cfg) = common::setup().await;
    common::member(&pool, &cfg).await;
    cfg.session_ttl_hours = i64::MAX;

    let err = auth::login(
        &pool,
        &cfg,
        &Credentials {
            email: "member@example.com".into(),
            password: common::PASSWORD.into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Config(_)));
    assert_eq!(err.status(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn wrong_password_is_rejected() {
    let (pool, cfg) = common::setup().await;
    common::member(&pool, &cfg).await;

    let err = auth::login(
        &pool,
        &cfg,
        &Credentials {
            email: "member@example.com".into(),
            password: "wrong-password".into(),
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.public_message(), "Invalid email or password.");
}

#[tokio::test]
async fn reset_password_replaces_the_hash() {
    let (pool, cfg) = common::setup().await;
    common::member(&pool, &cfg).await;

    members::reset_password(&pool, &cfg, "member@example.com", "brand-new-pass")
        .await
        .unwrap();
    let creds = Credentials {
        email: "member@example.com".into(),
        password: "brand-new-pass".into(),
    };
    auth::verify_credentials(&pool, &creds).await.unwrap();

    let err = members::reset_password(&pool, &cfg, "ghost@example.com", "brand-new-pass")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

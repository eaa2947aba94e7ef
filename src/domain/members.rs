use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite};

use crate::config::AppConfig;
use crate::database::db::queries;
use crate::database::models::{Role, User, UserSummary};
use crate::domain::auth::{hash_password, Actor};
use crate::domain::{validate, Done};
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewMember {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    #[serde(default)]
    pub role: Role,
    /// When positive, the new user also joins the death committee at this fee.
    pub subscription_fee: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemberDirectory {
    pub members: Vec<UserSummary>,
    pub admins: Vec<UserSummary>,
    pub total_members: usize,
    pub total_admins: usize,
    pub total_donations: i64,
}

/// Admin form: create an account, optionally enrolled in the death committee.
pub async fn create_member(
    pool: &Pool<Sqlite>,
    cfg: &AppConfig,
    actor: &Actor,
    input: NewMember,
) -> AppResult<Done<User>> {
    actor.require_admin("Unauthorized. Only admins can create members.")?;

    let name = validate::required(&input.name, "Name is required")?;
    let email = validate::email(&input.email)?;
    let password = validate::password(&input.password)?;
    let fee = input
        .subscription_fee
        .filter(|f| *f > Decimal::ZERO)
        .map(|f| validate::positive(f, "Subscription fee must be positive"))
        .transpose()?;

    if queries::get_user_by_email(pool, &email).await?.is_some() {
        return Err(AppError::conflict("User with this email already exists."));
    }

    let hash = hash_password(password, cfg.bcrypt_cost)?;
    let phone = validate::optional(input.phone);
    let address = validate::optional(input.address);
    let now = Utc::now().naive_utc();

    let mut tx = pool.begin().await?;
    let user_id = queries::create_user(
        &mut *tx,
        &name,
        &email,
        &hash,
        input.role,
        phone.as_deref(),
        address.as_deref(),
        now,
    )
    .await?;

    if let Some(fee) = fee {
        queries::create_committee_member(&mut *tx, user_id, fee, now).await?;
        tracing::info!(user_id, %fee, "enrolled in death committee");
    }

    let user = queries::get_user_by_id(&mut *tx, user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found."))?;
    tx.commit().await?;

    tracing::info!(user_id, role = %user.role, by = actor.user_id, "user created");
    let message = match user.role {
        Role::Admin => "Admin created successfully.",
        Role::Member => "Member created successfully.",
    };
    Ok(Done::new(user, message))
}

pub async fn list_members(pool: &Pool<Sqlite>, actor: &Actor) -> AppResult<MemberDirectory> {
    actor.require_admin("Unauthorized.")?;

    let members = queries::list_users_by_role(pool, Role::Member).await?;
    let admins = queries::list_users_by_role(pool, Role::Admin).await?;
    let total_donations = members.iter().map(|m| m.transaction_count).sum();

    Ok(MemberDirectory {
        total_members: members.len(),
        total_admins: admins.len(),
        total_donations,
        members,
        admins,
    })
}

/// Account creation from the shell; no signed-in actor is involved.
pub async fn create_user(
    pool: &Pool<Sqlite>,
    cfg: &AppConfig,
    email: &str,
    password: &str,
    name: &str,
    role: Role,
) -> AppResult<User> {
    let name = validate::required(name, "Name is required")?;
    let email = validate::email(email)?;
    let password = validate::password(password)?;

    if queries::get_user_by_email(pool, &email).await?.is_some() {
        return Err(AppError::conflict(format!("User with email {email} already exists")));
    }

    let hash = hash_password(password, cfg.bcrypt_cost)?;
    let now = Utc::now().naive_utc();
    let user_id = queries::create_user(pool, &name, &email, &hash, role, None, None, now).await?;

    queries::get_user_by_id(pool, user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found."))
}

pub async fn reset_password(
    pool: &Pool<Sqlite>,
    cfg: &AppConfig,
    email: &str,
    password: &str,
) -> AppResult<()> {
    let email = email.trim().to_lowercase();
    let password = validate::password(password)?;
    let hash = hash_password(password, cfg.bcrypt_cost)?;
    if !queries::update_password(pool, &email, &hash).await? {
        return Err(AppError::not_found(format!("No user with email {email}")));
    }
    tracing::info!(%email, "password reset");
    Ok(())
}

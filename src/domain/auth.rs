//! Sign-in, bearer sessions and role guards.

use chrono::{Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite};

use crate::config::AppConfig;
use crate::database::db::queries;
use crate::database::models::{Role, User};
use crate::error::{AppError, AppResult};

/// The signed-in user an operation runs on behalf of.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Actor {
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<&User> for Actor {
    fn from(u: &User) -> Self {
        Self {
            user_id: u.id,
            name: u.name.clone(),
            email: u.email.clone(),
            role: u.role,
        }
    }
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_admin(&self, msg: &str) -> AppResult<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::forbidden(msg))
        }
    }

    /// Member areas admit admins as well.
    pub fn require_member(&self, msg: &str) -> AppResult<()> {
        if matches!(self.role, Role::Member | Role::Admin) {
            Ok(())
        } else {
            Err(AppError::forbidden(msg))
        }
    }

    /// Donating is reserved to MEMBER accounts; admins approve, they don't give.
    pub fn require_member_only(&self, msg: &str) -> AppResult<()> {
        if self.role == Role::Member {
            Ok(())
        } else {
            Err(AppError::forbidden(msg))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    fn normalized_email(&self) -> String {
        self.email.trim().to_lowercase()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginGrant {
    pub token: String,
    pub expires_at: NaiveDateTime,
    pub user: Actor,
}

pub fn hash_password(password: &str, cost: u32) -> AppResult<String> {
    Ok(bcrypt::hash(password, cost)?)
}

fn verify_password(password: &str, hash: &str) -> bool {
    match bcrypt::verify(password, hash) {
        Ok(ok) => ok,
        Err(e) => {
            tracing::warn!(error = %e, "stored password hash is unreadable");
            false
        }
    }
}

pub async fn login(pool: &Pool<Sqlite>, cfg: &AppConfig, creds: &Credentials) -> AppResult<LoginGrant> {
    let invalid = || AppError::unauthorized("Invalid email or password.");

    let user = queries::get_user_by_email(pool, &creds.normalized_email())
        .await?
        .ok_or_else(invalid)?;
    if !verify_password(&creds.password, &user.password_hash) {
        tracing::info!(user_id = user.id, "failed sign-in");
        return Err(invalid());
    }

    let now = Utc::now().naive_utc();
    let expires_at = Duration::try_hours(cfg.session_ttl_hours)
        .and_then(|ttl| now.checked_add_signed(ttl))
        .ok_or_else(|| AppError::Config("SESSION_TTL_HOURS is out of range".into()))?;
    let token = uuid::Uuid::new_v4().simple().to_string();
    queries::create_session(pool, &token, user.id, expires_at, now).await?;

    let purged = queries::delete_expired_sessions(pool, now).await?;
    if purged > 0 {
        tracing::debug!(purged, "expired sessions removed");
    }

    tracing::info!(user_id = user.id, role = %user.role, "signed in");
    Ok(LoginGrant {
        token,
        expires_at,
        user: Actor::from(&user),
    })
}

/// Sign in without a session row, for the console which holds the user in memory.
pub async fn verify_credentials(pool: &Pool<Sqlite>, creds: &Credentials) -> AppResult<Actor> {
    let user = queries::get_user_by_email(pool, &creds.normalized_email()).await?;
    match user {
        Some(u) if verify_password(&creds.password, &u.password_hash) => Ok(Actor::from(&u)),
        _ => Err(AppError::unauthorized("Invalid email or password.")),
    }
}

pub async fn authenticate(pool: &Pool<Sqlite>, token: &str) -> AppResult<Actor> {
    let unauthorized = || AppError::unauthorized("Unauthorized.");

    let session = queries::get_session(pool, token)
        .await?
        .ok_or_else(unauthorized)?;
    if session.expires_at <= Utc::now().naive_utc() {
        queries::delete_session(pool, token).await?;
        return Err(unauthorized());
    }

    let user = queries::get_user_by_id(pool, session.user_id)
        .await?
        .ok_or_else(unauthorized)?;
    Ok(Actor::from(&user))
}

pub async fn logout(pool: &Pool<Sqlite>, token: &str) -> AppResult<()> {
    queries::delete_session(pool, token).await?;
    Ok(())
}

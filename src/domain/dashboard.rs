use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{Pool, Sqlite};

use crate::database::db::queries;
use crate::database::models::{Service, Transaction, TransactionFilter, TransactionStats, TransactionStatus};
use crate::domain::auth::Actor;
use crate::domain::validate;
use crate::error::{AppError, AppResult};

pub const RECENT_DONATIONS: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct AdminDashboard {
    pub stats: TransactionStats,
    pub services: Vec<Service>,
    pub active_services: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemberDashboard {
    pub total_donated: Decimal,
    pub pending_count: usize,
    pub active_services: usize,
    pub recent: Vec<Transaction>,
}

pub async fn admin_dashboard(pool: &Pool<Sqlite>, actor: &Actor) -> AppResult<AdminDashboard> {
    actor.require_admin("Unauthorized.")?;

    let stats = queries::transaction_stats(pool).await?;
    let services = queries::list_services(pool, false).await?;
    let active_services = services.iter().filter(|s| s.is_active).count();

    Ok(AdminDashboard {
        stats,
        services,
        active_services,
    })
}

pub async fn member_dashboard(pool: &Pool<Sqlite>, actor: &Actor) -> AppResult<MemberDashboard> {
    actor.require_member("Unauthorized.")?;

    let filter = TransactionFilter {
        user_id: Some(actor.user_id),
        ..Default::default()
    };
    let mut mine = queries::list_transactions(pool, &filter).await?;
    let active_services = queries::list_services(pool, true).await?.len();

    let total_donated = mine
        .iter()
        .filter(|t| t.status == TransactionStatus::Approved)
        .try_fold(Decimal::ZERO, |acc, t| acc.checked_add(t.amount))
        .ok_or_else(|| AppError::validation(validate::TOO_LARGE))?;
    let pending_count = mine
        .iter()
        .filter(|t| t.status == TransactionStatus::Pending)
        .count();
    mine.truncate(RECENT_DONATIONS);

    Ok(MemberDashboard {
        total_donated,
        pending_count,
        active_services,
        recent: mine,
    })
}

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{Pool, Sqlite};

use crate::database::db::queries;
use crate::database::models::{
    NewTransaction, Transaction, TransactionFilter, TransactionStats, TransactionStatus,
};
use crate::domain::auth::Actor;
use crate::domain::{validate, Done};
use crate::error::{AppError, AppResult};

fn transaction_not_found() -> AppError {
    AppError::not_found("Transaction not found.")
}

/// How a status change moves the service's running total.
///
/// The total always equals the sum of APPROVED donations: it grows when a
/// donation becomes approved and shrinks when an approved one is rejected.
pub fn service_delta(
    from: TransactionStatus,
    to: TransactionStatus,
    amount: Decimal,
) -> Option<Decimal> {
    use TransactionStatus::*;
    match (from, to) {
        (Pending | Rejected, Approved) => Some(amount),
        (Approved, Rejected) => Some(-amount),
        _ => None,
    }
}

/// A member submits a donation; it waits for an admin.
pub async fn create_transaction(
    pool: &Pool<Sqlite>,
    actor: &Actor,
    input: NewTransaction,
) -> AppResult<Done<Transaction>> {
    actor.require_member_only("Unauthorized. Only members can create transactions.")?;

    let input = NewTransaction {
        amount: validate::positive(input.amount, "Amount must be positive")?,
        service_id: input.service_id,
        notes: validate::optional(input.notes),
        payment_proof: validate::proof_url(input.payment_proof)?,
    };

    let service = queries::get_service(pool, input.service_id)
        .await?
        .ok_or_else(|| AppError::not_found("Service not found."))?;
    if !service.is_active {
        return Err(AppError::validation("This service is currently inactive."));
    }

    let id = queries::create_transaction(pool, actor.user_id, &input, Utc::now().naive_utc()).await?;
    let created = queries::get_transaction(pool, id)
        .await?
        .ok_or_else(transaction_not_found)?;

    tracing::info!(transaction_id = id, user_id = actor.user_id, service_id = service.id, amount = %created.amount, "donation submitted");
    Ok(Done::new(
        created,
        "Donation submitted successfully. Waiting for approval.",
    ))
}

/// Approve or reject a donation and keep the service total in step, atomically.
pub async fn update_transaction_status(
    pool: &Pool<Sqlite>,
    actor: &Actor,
    transaction_id: i64,
    status: TransactionStatus,
) -> AppResult<Done<Transaction>> {
    actor.require_admin("Unauthorized. Only admins can approve transactions.")?;
    if status == TransactionStatus::Pending {
        return Err(AppError::validation("Status must be APPROVED or REJECTED"));
    }

    let now = Utc::now().naive_utc();
    let mut tx = pool.begin().await?;

    let current = queries::get_transaction(&mut *tx, transaction_id)
        .await?
        .ok_or_else(transaction_not_found)?;

    let approved_at = (status == TransactionStatus::Approved).then_some(now);
    queries::set_transaction_status(&mut tx, transaction_id, status, actor.user_id, approved_at).await?;

    if let Some(delta) = service_delta(current.status, status, current.amount) {
        let total = queries::get_service_amount(&mut tx, current.service_id)
            .await?
            .checked_add(delta)
            .ok_or_else(|| AppError::validation(validate::TOO_LARGE))?;
        queries::set_service_amount(&mut tx, current.service_id, total).await?;
        tracing::debug!(service_id = current.service_id, %delta, %total, "service total adjusted");
    }

    let updated = queries::get_transaction(&mut *tx, transaction_id)
        .await?
        .ok_or_else(transaction_not_found)?;
    tx.commit().await?;

    tracing::info!(
        transaction_id,
        from = current.status.as_str(),
        to = status.as_str(),
        by = actor.user_id,
        "transaction status changed"
    );
    let message = format!(
        "Transaction {} successfully.",
        status.as_str().to_ascii_lowercase()
    );
    Ok(Done::new(updated, message))
}

/// Members only ever see their own donations, whatever the filter says.
pub async fn list_transactions(
    pool: &Pool<Sqlite>,
    actor: &Actor,
    mut filter: TransactionFilter,
) -> AppResult<Vec<Transaction>> {
    if !actor.is_admin() {
        filter.user_id = Some(actor.user_id);
    }
    Ok(queries::list_transactions(pool, &filter).await?)
}

pub async fn transaction_stats(pool: &Pool<Sqlite>, actor: &Actor) -> AppResult<TransactionStats> {
    actor.require_admin("Unauthorized.")?;
    Ok(queries::transaction_stats(pool).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use TransactionStatus::*;

    #[test]
    fn approval_adds_and_rejecting_approved_subtracts() {
        let amt = Decimal::from(25);
        assert_eq!(service_delta(Pending, Approved, amt), Some(amt));
        assert_eq!(service_delta(Approved, Rejected, amt), Some(-amt));
    }

    #[test]
    fn other_transitions_leave_total_alone() {
        let amt = Decimal::from(25);
        assert_eq!(service_delta(Pending, Rejected, amt), None);
        assert_eq!(service_delta(Approved, Approved, amt), None);
        assert_eq!(service_delta(Rejected, Rejected, amt), None);
    }

    #[test]
    fn rejected_donation_can_be_approved_later() {
        assert_eq!(service_delta(Rejected, Approved, Decimal::ONE), Some(Decimal::ONE));
    }
}

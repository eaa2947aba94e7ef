use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite, SqliteConnection};

use crate::config::AppConfig;
use crate::database::db::queries::{self, MemberContact};
use crate::database::models::{
    CommitteeMember, CommitteeMemberDetail, DeceasedStatus, DeceasedTarget, Dependent,
    FinancialHealth, FuneralPayout, MonthKey, NewDependent, NewPayout, OutstandingBalance,
    PaymentStatus, PayoutRecord, Subscription,
};
use crate::domain::auth::Actor;
use crate::domain::{balance, validate, Done};
use crate::error::{AppError, AppResult};

fn member_not_found() -> AppError {
    AppError::not_found("Member not found.")
}

/// What a member sees on their death committee page.
#[derive(Debug, Clone, Serialize)]
pub struct MyCommittee {
    pub member: CommitteeMemberDetail,
    pub balance: OutstandingBalance,
    pub current_month: MonthKey,
    pub current_subscription: Option<Subscription>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommitteeSummary {
    #[serde(flatten)]
    pub detail: CommitteeMemberDetail,
    pub payout_count: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentUpload {
    /// Defaults to the caller's own record.
    pub member_id: Option<i64>,
    pub month: u32,
    pub year: i32,
    pub payment_proof: Option<String>,
}

async fn load_detail(pool: &Pool<Sqlite>, contact: MemberContact) -> AppResult<CommitteeMemberDetail> {
    let id = contact.member.id;
    Ok(CommitteeMemberDetail {
        member: contact.member,
        user_name: contact.name,
        user_email: contact.email,
        user_phone: contact.phone,
        subscriptions: queries::list_subscriptions(pool, id).await?,
        dependents: queries::list_dependents(pool, id).await?,
        payouts: queries::list_payouts_for_member(pool, id).await?,
    })
}

/// The user's committee record, enrolling them at the default fee on first use.
pub async fn get_or_create_member(
    pool: &Pool<Sqlite>,
    cfg: &AppConfig,
    user_id: i64,
) -> AppResult<CommitteeMemberDetail> {
    let member_id = match queries::get_committee_member_by_user(pool, user_id).await? {
        Some(m) => m.id,
        None => {
            let now = Utc::now().naive_utc();
            let id = queries::create_committee_member(pool, user_id, cfg.default_subscription_fee, now)
                .await?;
            tracing::info!(user_id, member_id = id, fee = %cfg.default_subscription_fee, "committee record created");
            id
        }
    };

    let contact = queries::get_member_contact(pool, member_id)
        .await?
        .ok_or_else(member_not_found)?;
    load_detail(pool, contact).await
}

fn balance_of(member: &CommitteeMember, subs: &[Subscription], today: NaiveDate) -> OutstandingBalance {
    balance::outstanding_balance(member.created_at.date(), today, member.monthly_fee, subs)
}

pub async fn my_committee(
    pool: &Pool<Sqlite>,
    cfg: &AppConfig,
    actor: &Actor,
    today: NaiveDate,
) -> AppResult<MyCommittee> {
    actor.require_member("Unauthorized.")?;

    let detail = get_or_create_member(pool, cfg, actor.user_id).await?;
    let balance = balance_of(&detail.member, &detail.subscriptions, today);
    let current_month = MonthKey::of(today);
    let current_subscription = detail
        .subscription_for(current_month.month, current_month.year)
        .cloned();

    Ok(MyCommittee {
        member: detail,
        balance,
        current_month,
        current_subscription,
    })
}

pub async fn update_subscription_fee(
    pool: &Pool<Sqlite>,
    actor: &Actor,
    member_id: i64,
    fee: Decimal,
) -> AppResult<Done<CommitteeMember>> {
    actor.require_admin("Unauthorized. Only admins can update subscription fees.")?;
    let fee = validate::positive(fee, "Subscription fee must be positive")?;

    if !queries::update_monthly_fee(pool, member_id, fee).await? {
        return Err(member_not_found());
    }
    let member = queries::get_committee_member(pool, member_id)
        .await?
        .ok_or_else(member_not_found)?;

    tracing::info!(member_id, %fee, "monthly fee updated");
    Ok(Done::new(member, "Subscription fee updated successfully."))
}

pub async fn outstanding_balance(
    pool: &Pool<Sqlite>,
    member_id: i64,
    today: NaiveDate,
) -> AppResult<OutstandingBalance> {
    let member = queries::get_committee_member(pool, member_id)
        .await?
        .ok_or_else(member_not_found)?;
    let subs = queries::list_subscriptions(pool, member_id).await?;
    Ok(balance_of(&member, &subs, today))
}

/// Attach a receipt to a month; an admin confirms it later.
pub async fn upload_subscription_payment(
    pool: &Pool<Sqlite>,
    cfg: &AppConfig,
    actor: &Actor,
    upload: PaymentUpload,
) -> AppResult<Done<Subscription>> {
    actor.require_member("Unauthorized.")?;

    let month = validate::month(upload.month)?;
    let proof = validate::proof_url(upload.payment_proof)?
        .ok_or_else(|| AppError::validation("Payment proof URL is required"))?;

    let member = match upload.member_id {
        Some(id) => queries::get_committee_member(pool, id)
            .await?
            .ok_or_else(member_not_found)?,
        None => get_or_create_member(pool, cfg, actor.user_id).await?.member,
    };
    if !actor.is_admin() && member.user_id != actor.user_id {
        return Err(AppError::forbidden(
            "You can only upload payments for your own membership.",
        ));
    }

    let now = Utc::now().naive_utc();
    let id = match queries::get_subscription(pool, member.id, month, upload.year).await? {
        Some(existing) if existing.is_paid => {
            return Err(AppError::conflict("This month has already been paid."));
        }
        Some(existing) => {
            queries::update_subscription_proof(pool, existing.id, &proof).await?;
            existing.id
        }
        None => {
            queries::create_subscription(pool, member.id, month, upload.year, member.monthly_fee, Some(&proof), now)
                .await?
        }
    };

    let sub = queries::get_subscription_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Subscription not found."))?;
    tracing::info!(member_id = member.id, month, year = upload.year, "payment proof uploaded");
    Ok(Done::new(sub, "Payment proof uploaded. Waiting for approval."))
}

/// Recompute and store the member's PAID/OVERDUE status.
async fn refresh_member_status(
    conn: &mut SqliteConnection,
    member_id: i64,
    today: NaiveDate,
) -> AppResult<PaymentStatus> {
    let member = queries::get_committee_member(&mut *conn, member_id)
        .await?
        .ok_or_else(member_not_found)?;
    let subs = queries::list_subscriptions(&mut *conn, member_id).await?;
    let status = balance_of(&member, &subs, today).derived_status();
    queries::set_member_status(&mut *conn, member_id, status).await?;
    Ok(status)
}

/// Mark a month paid and refresh the member's status in one transaction.
pub async fn approve_subscription_payment(
    pool: &Pool<Sqlite>,
    actor: &Actor,
    subscription_id: i64,
    today: NaiveDate,
) -> AppResult<Done<Subscription>> {
    actor.require_admin("Unauthorized. Only admins can approve payments.")?;

    let mut tx = pool.begin().await?;
    let sub = queries::get_subscription_by_id(&mut *tx, subscription_id)
        .await?
        .ok_or_else(|| AppError::not_found("Subscription not found."))?;
    if sub.is_paid {
        return Err(AppError::conflict("This payment is already approved."));
    }

    queries::mark_subscription_paid(&mut *tx, subscription_id, Utc::now().naive_utc()).await?;
    let status = refresh_member_status(&mut tx, sub.member_id, today).await?;

    let sub = queries::get_subscription_by_id(&mut *tx, subscription_id)
        .await?
        .ok_or_else(|| AppError::not_found("Subscription not found."))?;
    tx.commit().await?;

    tracing::info!(subscription_id, member_id = sub.member_id, status = status.as_str(), "payment approved");
    Ok(Done::new(sub, "Payment approved successfully."))
}

pub async fn add_dependent(
    pool: &Pool<Sqlite>,
    cfg: &AppConfig,
    actor: &Actor,
    input: NewDependent,
) -> AppResult<Done<Dependent>> {
    actor.require_member("Unauthorized.")?;

    let name = validate::required(&input.name, "Name is required")?;
    let relation = validate::required(&input.relation, "Relation is required")?;
    if input.age <= 0 {
        return Err(AppError::validation("Age must be positive"));
    }
    let input = NewDependent {
        name,
        relation,
        age: input.age,
        nic: validate::optional(input.nic),
    };

    let member = get_or_create_member(pool, cfg, actor.user_id).await?.member;
    let id = queries::create_dependent(pool, member.id, &input, Utc::now().naive_utc()).await?;
    let dependent = queries::get_dependent(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Dependent not found."))?;

    tracing::info!(member_id = member.id, dependent_id = id, "dependent added");
    Ok(Done::new(dependent, "Dependent added successfully."))
}

/// Flag a member or dependent as deceased and record the funeral payout.
pub async fn mark_deceased(
    pool: &Pool<Sqlite>,
    actor: &Actor,
    target: DeceasedTarget,
    payout: NewPayout,
) -> AppResult<Done<FuneralPayout>> {
    actor.require_admin("Unauthorized. Only admins can record funeral payouts.")?;

    let payout = NewPayout {
        amount: validate::positive(payout.amount, "Amount must be positive")?,
        receiver_name: validate::required(&payout.receiver_name, "Receiver name is required")?,
        receiver_relation: validate::required(
            &payout.receiver_relation,
            "Receiver relation is required",
        )?,
        notes: validate::optional(payout.notes),
    };

    let now = Utc::now().naive_utc();
    let mut tx = pool.begin().await?;

    let (member_id, dependent_id) = match target {
        DeceasedTarget::Dependent(id) => {
            let dep = queries::get_dependent(&mut *tx, id)
                .await?
                .ok_or_else(|| AppError::not_found("Dependent not found."))?;
            if dep.deceased_status == DeceasedStatus::Deceased {
                return Err(AppError::conflict("Dependent is already marked as deceased."));
            }
            queries::mark_dependent_deceased(&mut tx, id, now).await?;
            (dep.member_id, Some(id))
        }
        DeceasedTarget::Member(user_id) => {
            let member = queries::get_committee_member_by_user(&mut *tx, user_id)
                .await?
                .ok_or_else(member_not_found)?;
            if member.deceased_status == DeceasedStatus::Deceased {
                return Err(AppError::conflict("Member is already marked as deceased."));
            }
            queries::mark_member_deceased(&mut tx, member.id, now).await?;
            (member.id, None)
        }
    };

    let id = queries::create_payout(&mut tx, member_id, dependent_id, &payout, now).await?;
    tx.commit().await?;

    tracing::info!(payout_id = id, member_id, ?dependent_id, amount = %payout.amount, "funeral payout recorded");
    Ok(Done::new(
        FuneralPayout {
            id,
            member_id,
            dependent_id,
            amount: payout.amount,
            receiver_name: payout.receiver_name,
            receiver_relation: payout.receiver_relation,
            notes: payout.notes,
            payout_date: now,
        },
        "Funeral payout recorded successfully.",
    ))
}

pub async fn list_committee_members(
    pool: &Pool<Sqlite>,
    actor: &Actor,
    status: Option<PaymentStatus>,
) -> AppResult<Vec<CommitteeSummary>> {
    actor.require_admin("Unauthorized.")?;

    let mut out = Vec::new();
    for contact in queries::list_committee_members(pool, status).await? {
        let detail = load_detail(pool, contact).await?;
        out.push(CommitteeSummary {
            payout_count: detail.payout_count(),
            detail,
        });
    }
    Ok(out)
}

pub async fn financial_health(pool: &Pool<Sqlite>, actor: &Actor) -> AppResult<FinancialHealth> {
    actor.require_admin("Unauthorized.")?;
    Ok(queries::financial_health(pool).await?)
}

pub async fn payout_history(pool: &Pool<Sqlite>, actor: &Actor) -> AppResult<Vec<PayoutRecord>> {
    actor.require_admin("Unauthorized.")?;
    Ok(queries::list_payout_records(pool).await?)
}

use std::str::FromStr;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::{Executor, Pool, Row, Sqlite};

use crate::database::models::{
    CommitteeMember, DeceasedStatus, Dependent, FinancialHealth, FuneralPayout, NewDependent,
    NewPayout, NewService, NewTransaction, PaymentStatus, PayoutRecord, Role, Service,
    ServicePatch, ServiceType, Session, StatusTotal, Subscription, Transaction,
    TransactionFilter, TransactionStats, TransactionStatus, User, UserSummary,
};

/*
All SQL lives here, one section per table.
Money is stored as TEXT and parsed back into Decimal exactly;
sums are computed in Rust so no amount ever passes through a float.
 */

fn decimal(row: &SqliteRow, col: &str) -> Result<Decimal, sqlx::Error> {
    let text: String = row.try_get(col)?;
    Decimal::from_str(&text)
        .map_err(|e| sqlx::Error::Decode(format!("Invalid Decimal format for {col}: {e}").into()))
}

// Amounts are TEXT columns, so totals are summed here
fn add_amount(acc: Decimal, amount: Decimal) -> Result<Decimal, sqlx::Error> {
    acc.checked_add(amount)
        .ok_or_else(|| sqlx::Error::Decode("amount total out of range".into()))
}

fn opt_decimal(row: &SqliteRow, col: &str) -> Result<Option<Decimal>, sqlx::Error> {
    let text: Option<String> = row.try_get(col)?;
    text.map(|t| {
        Decimal::from_str(&t).map_err(|e| {
            sqlx::Error::Decode(format!("Invalid Decimal format for {col}: {e}").into())
        })
    })
    .transpose()
}

fn parsed<T>(row: &SqliteRow, col: &str) -> Result<T, sqlx::Error>
where
    T: FromStr<Err = String>,
{
    let text: String = row.try_get(col)?;
    text.parse().map_err(|e: String| sqlx::Error::Decode(e.into()))
}

/*==========User Queries=========== */

fn map_user(row: &SqliteRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: row.try_get("user_id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        role: parsed::<Role>(row, "role")?,
        phone: row.try_get("phone")?,
        address: row.try_get("address")?,
        created_at: row.try_get("user_created_at")?,
    })
}

// Create user, returns the new user_id
#[allow(clippy::too_many_arguments)]
pub async fn create_user<'e, E>(
    db: E,
    name: &str,
    email: &str,
    password_hash: &str,
    role: Role,
    phone: Option<&str>,
    address: Option<&str>,
    now: NaiveDateTime,
) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_scalar(
        r#"
        INSERT INTO users (name, email, password_hash, role, phone, address, user_created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        RETURNING user_id
        "#,
    )
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .bind(role.as_str())
    .bind(phone)
    .bind(address)
    .bind(now)
    .fetch_one(db)
    .await
}

pub async fn get_user_by_email(pool: &Pool<Sqlite>, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query("SELECT * FROM users WHERE email = ? COLLATE NOCASE")
        .bind(email)
        .fetch_optional(pool)
        .await?
        .map(|row| map_user(&row))
        .transpose()
}

pub async fn get_user_by_id<'e, E>(db: E, user_id: i64) -> Result<Option<User>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query("SELECT * FROM users WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(db)
        .await?
        .map(|row| map_user(&row))
        .transpose()
}

pub async fn update_password(
    pool: &Pool<Sqlite>,
    email: &str,
    password_hash: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE users SET password_hash = ? WHERE email = ? COLLATE NOCASE")
        .bind(password_hash)
        .bind(email)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

// Users of one role with their donation count, newest first
pub async fn list_users_by_role(pool: &Pool<Sqlite>, role: Role) -> Result<Vec<UserSummary>, sqlx::Error> {
    sqlx::query(
        r#"
        SELECT
            u.user_id, u.name, u.email, u.role, u.phone, u.address, u.user_created_at,
            (SELECT COUNT(*) FROM transactions t WHERE t.user_id = u.user_id) AS transaction_count
        FROM users u
        WHERE u.role = ?
        ORDER BY u.user_created_at DESC, u.user_id DESC
        "#,
    )
    .bind(role.as_str())
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(|row| {
        Ok(UserSummary {
            id: row.try_get("user_id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            role: parsed::<Role>(&row, "role")?,
            phone: row.try_get("phone")?,
            address: row.try_get("address")?,
            created_at: row.try_get("user_created_at")?,
            transaction_count: row.try_get("transaction_count")?,
        })
    })
    .collect()
}

/*==========Session Queries=========== */

pub async fn create_session(
    pool: &Pool<Sqlite>,
    token: &str,
    user_id: i64,
    expires_at: NaiveDateTime,
    now: NaiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO sessions (token, user_id, expires_at, session_created_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(token)
    .bind(user_id)
    .bind(expires_at)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get_session(pool: &Pool<Sqlite>, token: &str) -> Result<Option<Session>, sqlx::Error> {
    sqlx::query("SELECT * FROM sessions WHERE token = ?")
        .bind(token)
        .fetch_optional(pool)
        .await?
        .map(|row| {
            Ok(Session {
                token: row.try_get("token")?,
                user_id: row.try_get("user_id")?,
                expires_at: row.try_get("expires_at")?,
                created_at: row.try_get("session_created_at")?,
            })
        })
        .transpose()
}

pub async fn delete_session(pool: &Pool<Sqlite>, token: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM sessions WHERE token = ?")
        .bind(token)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete_expired_sessions(pool: &Pool<Sqlite>, now: NaiveDateTime) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
        .bind(now)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/*==========Service Queries=========== */

const SERVICE_COLUMNS: &str = r#"
    s.service_id, s.service_name, s.description, s.service_type, s.target_amount,
    s.current_amount, s.is_active, s.service_created_at,
    (SELECT COUNT(*) FROM transactions t WHERE t.service_id = s.service_id) AS transaction_count
"#;

fn map_service(row: &SqliteRow) -> Result<Service, sqlx::Error> {
    Ok(Service {
        id: row.try_get("service_id")?,
        name: row.try_get("service_name")?,
        description: row.try_get("description")?,
        service_type: parsed::<ServiceType>(row, "service_type")?,
        target_amount: opt_decimal(row, "target_amount")?,
        current_amount: decimal(row, "current_amount")?,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("service_created_at")?,
        transaction_count: row.try_get("transaction_count")?,
    })
}

pub async fn create_service(
    pool: &Pool<Sqlite>,
    s: &NewService,
    now: NaiveDateTime,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        INSERT INTO services (service_name, description, service_type, target_amount, current_amount, is_active, service_created_at)
        VALUES (?, ?, ?, ?, '0', 1, ?)
        RETURNING service_id
        "#,
    )
    .bind(&s.name)
    .bind(s.description.as_deref())
    .bind(s.service_type.as_str())
    .bind(s.target_amount.map(|t| t.to_string()))
    .bind(now)
    .fetch_one(pool)
    .await
}

pub async fn get_service<'e, E>(db: E, service_id: i64) -> Result<Option<Service>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT {SERVICE_COLUMNS} FROM services s WHERE s.service_id = ?");
    sqlx::query(&sql)
        .bind(service_id)
        .fetch_optional(db)
        .await?
        .map(|row| map_service(&row))
        .transpose()
}

// List services, newest first
pub async fn list_services(pool: &Pool<Sqlite>, active_only: bool) -> Result<Vec<Service>, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT {SERVICE_COLUMNS}
        FROM services s
        WHERE (? = 0 OR s.is_active = 1)
        ORDER BY s.service_created_at DESC, s.service_id DESC
        "#
    );
    sqlx::query(&sql)
        .bind(active_only)
        .fetch_all(pool)
        .await?
        .iter()
        .map(map_service)
        .collect()
}

// Partial update: NULL parameters keep the stored value
pub async fn update_service(
    pool: &Pool<Sqlite>,
    service_id: i64,
    patch: &ServicePatch,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE services
        SET service_name  = COALESCE(?, service_name),
            description   = COALESCE(?, description),
            service_type  = COALESCE(?, service_type),
            target_amount = COALESCE(?, target_amount),
            is_active     = COALESCE(?, is_active)
        WHERE service_id = ?
        "#,
    )
    .bind(patch.name.as_deref())
    .bind(patch.description.as_deref())
    .bind(patch.service_type.map(|t| t.as_str()))
    .bind(patch.target_amount.map(|t| t.to_string()))
    .bind(patch.is_active)
    .bind(service_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn delete_service(pool: &Pool<Sqlite>, service_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM services WHERE service_id = ?")
        .bind(service_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn count_service_transactions(pool: &Pool<Sqlite>, service_id: i64) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM transactions WHERE service_id = ?")
        .bind(service_id)
        .fetch_one(pool)
        .await
}

pub async fn get_service_amount(conn: &mut SqliteConnection, service_id: i64) -> Result<Decimal, sqlx::Error> {
    let row = sqlx::query("SELECT current_amount FROM services WHERE service_id = ?")
        .bind(service_id)
        .fetch_one(&mut *conn)
        .await?;
    decimal(&row, "current_amount")
}

pub async fn set_service_amount(
    conn: &mut SqliteConnection,
    service_id: i64,
    amount: Decimal,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE services SET current_amount = ? WHERE service_id = ?")
        .bind(amount.to_string())
        .bind(service_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/*==========Transaction Queries=========== */

const TRANSACTION_SELECT: &str = r#"
    SELECT
        t.transaction_id, t.amount, t.service_id, s.service_name, s.service_type,
        t.user_id, u.name AS user_name, u.email AS user_email,
        t.notes, t.payment_proof, t.status, t.approved_by, t.approved_at, t.trans_create_at
    FROM transactions t
    JOIN services s ON s.service_id = t.service_id
    JOIN users u ON u.user_id = t.user_id
"#;

fn map_transaction(row: &SqliteRow) -> Result<Transaction, sqlx::Error> {
    Ok(Transaction {
        id: row.try_get("transaction_id")?,
        amount: decimal(row, "amount")?,
        service_id: row.try_get("service_id")?,
        service_name: row.try_get("service_name")?,
        service_type: parsed::<ServiceType>(row, "service_type")?,
        user_id: row.try_get("user_id")?,
        user_name: row.try_get("user_name")?,
        user_email: row.try_get("user_email")?,
        notes: row.try_get("notes")?,
        payment_proof: row.try_get("payment_proof")?,
        status: parsed::<TransactionStatus>(row, "status")?,
        approved_by: row.try_get("approved_by")?,
        approved_at: row.try_get("approved_at")?,
        created_at: row.try_get("trans_create_at")?,
    })
}

// Insert a PENDING donation
pub async fn create_transaction(
    pool: &Pool<Sqlite>,
    user_id: i64,
    t: &NewTransaction,
    now: NaiveDateTime,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        INSERT INTO transactions (amount, service_id, user_id, notes, payment_proof, status, trans_create_at)
        VALUES (?, ?, ?, ?, ?, 'PENDING', ?)
        RETURNING transaction_id
        "#,
    )
    .bind(t.amount.to_string())
    .bind(t.service_id)
    .bind(user_id)
    .bind(t.notes.as_deref())
    .bind(t.payment_proof.as_deref())
    .bind(now)
    .fetch_one(pool)
    .await
}

pub async fn get_transaction<'e, E>(db: E, transaction_id: i64) -> Result<Option<Transaction>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("{TRANSACTION_SELECT} WHERE t.transaction_id = ?");
    sqlx::query(&sql)
        .bind(transaction_id)
        .fetch_optional(db)
        .await?
        .map(|row| map_transaction(&row))
        .transpose()
}

// Filtered listing, newest first
pub async fn list_transactions(
    pool: &Pool<Sqlite>,
    filter: &TransactionFilter,
) -> Result<Vec<Transaction>, sqlx::Error> {
    let sql = format!(
        r#"
        {TRANSACTION_SELECT}
        WHERE (? IS NULL OR t.status = ?)
          AND (? IS NULL OR t.service_id = ?)
          AND (? IS NULL OR t.user_id = ?)
        ORDER BY t.trans_create_at DESC, t.transaction_id DESC
        "#
    );
    let status = filter.status.map(|s| s.as_str());
    sqlx::query(&sql)
        .bind(status)
        .bind(status)
        .bind(filter.service_id)
        .bind(filter.service_id)
        .bind(filter.user_id)
        .bind(filter.user_id)
        .fetch_all(pool)
        .await?
        .iter()
        .map(map_transaction)
        .collect()
}

pub async fn set_transaction_status(
    conn: &mut SqliteConnection,
    transaction_id: i64,
    status: TransactionStatus,
    approved_by: i64,
    approved_at: Option<NaiveDateTime>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE transactions
        SET status = ?, approved_by = ?, approved_at = ?
        WHERE transaction_id = ?
        "#,
    )
    .bind(status.as_str())
    .bind(approved_by)
    .bind(approved_at)
    .bind(transaction_id)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

// Count and sum per status
pub async fn transaction_stats(pool: &Pool<Sqlite>) -> Result<TransactionStats, sqlx::Error> {
    let rows = sqlx::query("SELECT status, amount FROM transactions")
        .fetch_all(pool)
        .await?;

    let mut stats = TransactionStats::default();
    for row in rows {
        let amount = decimal(&row, "amount")?;
        let bucket: &mut StatusTotal = match parsed::<TransactionStatus>(&row, "status")? {
            TransactionStatus::Pending => &mut stats.pending,
            TransactionStatus::Approved => &mut stats.approved,
            TransactionStatus::Rejected => &mut stats.rejected,
        };
        bucket.amount = add_amount(bucket.amount, amount)?;
        bucket.count += 1;
    }
    Ok(stats)
}

/*==========Committee Member Queries=========== */

fn map_member(row: &SqliteRow) -> Result<CommitteeMember, sqlx::Error> {
    Ok(CommitteeMember {
        id: row.try_get("member_id")?,
        user_id: row.try_get("user_id")?,
        monthly_fee: decimal(row, "monthly_fee")?,
        status: parsed::<PaymentStatus>(row, "status")?,
        deceased_status: parsed::<DeceasedStatus>(row, "deceased_status")?,
        deceased_date: row.try_get("deceased_date")?,
        created_at: row.try_get("member_created_at")?,
    })
}

pub async fn create_committee_member<'e, E>(
    db: E,
    user_id: i64,
    monthly_fee: Decimal,
    now: NaiveDateTime,
) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_scalar(
        r#"
        INSERT INTO committee_members (user_id, monthly_fee, status, deceased_status, member_created_at)
        VALUES (?, ?, 'UNPAID', 'ALIVE', ?)
        RETURNING member_id
        "#,
    )
    .bind(user_id)
    .bind(monthly_fee.to_string())
    .bind(now)
    .fetch_one(db)
    .await
}

pub async fn get_committee_member<'e, E>(db: E, member_id: i64) -> Result<Option<CommitteeMember>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query("SELECT * FROM committee_members WHERE member_id = ?")
        .bind(member_id)
        .fetch_optional(db)
        .await?
        .map(|row| map_member(&row))
        .transpose()
}

pub async fn get_committee_member_by_user<'e, E>(
    db: E,
    user_id: i64,
) -> Result<Option<CommitteeMember>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query("SELECT * FROM committee_members WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(db)
        .await?
        .map(|row| map_member(&row))
        .transpose()
}

/// Committee record with the owning user's name, email and phone.
pub struct MemberContact {
    pub member: CommitteeMember,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

pub async fn list_committee_members(
    pool: &Pool<Sqlite>,
    status: Option<PaymentStatus>,
) -> Result<Vec<MemberContact>, sqlx::Error> {
    let status = status.map(|s| s.as_str());
    sqlx::query(
        r#"
        SELECT m.*, u.name, u.email, u.phone
        FROM committee_members m
        JOIN users u ON u.user_id = m.user_id
        WHERE (? IS NULL OR m.status = ?)
        ORDER BY m.member_created_at DESC, m.member_id DESC
        "#,
    )
    .bind(status)
    .bind(status)
    .fetch_all(pool)
    .await?
    .iter()
    .map(|row| {
        Ok(MemberContact {
            member: map_member(row)?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            phone: row.try_get("phone")?,
        })
    })
    .collect()
}

pub async fn get_member_contact(pool: &Pool<Sqlite>, member_id: i64) -> Result<Option<MemberContact>, sqlx::Error> {
    sqlx::query(
        r#"
        SELECT m.*, u.name, u.email, u.phone
        FROM committee_members m
        JOIN users u ON u.user_id = m.user_id
        WHERE m.member_id = ?
        "#,
    )
    .bind(member_id)
    .fetch_optional(pool)
    .await?
    .map(|row| {
        Ok(MemberContact {
            member: map_member(&row)?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            phone: row.try_get("phone")?,
        })
    })
    .transpose()
}

pub async fn update_monthly_fee(pool: &Pool<Sqlite>, member_id: i64, fee: Decimal) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE committee_members SET monthly_fee = ? WHERE member_id = ?")
        .bind(fee.to_string())
        .bind(member_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn set_member_status<'e, E>(
    db: E,
    member_id: i64,
    status: PaymentStatus,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query("UPDATE committee_members SET status = ? WHERE member_id = ?")
        .bind(status.as_str())
        .bind(member_id)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn mark_member_deceased(
    conn: &mut SqliteConnection,
    member_id: i64,
    date: NaiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE committee_members SET deceased_status = 'DECEASED', deceased_date = ? WHERE member_id = ?",
    )
    .bind(date)
    .bind(member_id)
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

/*==========Subscription Queries=========== */

fn map_subscription(row: &SqliteRow) -> Result<Subscription, sqlx::Error> {
    let month: i64 = row.try_get("month")?;
    let year: i64 = row.try_get("year")?;
    Ok(Subscription {
        id: row.try_get("subscription_id")?,
        member_id: row.try_get("member_id")?,
        month: month as u32,
        year: year as i32,
        amount: decimal(row, "amount")?,
        is_paid: row.try_get("is_paid")?,
        payment_proof: row.try_get("payment_proof")?,
        paid_at: row.try_get("paid_at")?,
        created_at: row.try_get("sub_created_at")?,
    })
}

// Newest month first
pub async fn list_subscriptions<'e, E>(db: E, member_id: i64) -> Result<Vec<Subscription>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        SELECT * FROM subscriptions
        WHERE member_id = ?
        ORDER BY year DESC, month DESC
        "#,
    )
    .bind(member_id)
    .fetch_all(db)
    .await?
    .iter()
    .map(map_subscription)
    .collect()
}

pub async fn get_subscription(
    pool: &Pool<Sqlite>,
    member_id: i64,
    month: u32,
    year: i32,
) -> Result<Option<Subscription>, sqlx::Error> {
    sqlx::query("SELECT * FROM subscriptions WHERE member_id = ? AND month = ? AND year = ?")
        .bind(member_id)
        .bind(month as i64)
        .bind(year as i64)
        .fetch_optional(pool)
        .await?
        .map(|row| map_subscription(&row))
        .transpose()
}

pub async fn get_subscription_by_id<'e, E>(
    db: E,
    subscription_id: i64,
) -> Result<Option<Subscription>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query("SELECT * FROM subscriptions WHERE subscription_id = ?")
        .bind(subscription_id)
        .fetch_optional(db)
        .await?
        .map(|row| map_subscription(&row))
        .transpose()
}

pub async fn create_subscription(
    pool: &Pool<Sqlite>,
    member_id: i64,
    month: u32,
    year: i32,
    amount: Decimal,
    payment_proof: Option<&str>,
    now: NaiveDateTime,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        INSERT INTO subscriptions (member_id, month, year, amount, is_paid, payment_proof, sub_created_at)
        VALUES (?, ?, ?, ?, 0, ?, ?)
        RETURNING subscription_id
        "#,
    )
    .bind(member_id)
    .bind(month as i64)
    .bind(year as i64)
    .bind(amount.to_string())
    .bind(payment_proof)
    .bind(now)
    .fetch_one(pool)
    .await
}

pub async fn update_subscription_proof(
    pool: &Pool<Sqlite>,
    subscription_id: i64,
    payment_proof: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE subscriptions SET payment_proof = ? WHERE subscription_id = ?")
        .bind(payment_proof)
        .bind(subscription_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn mark_subscription_paid<'e, E>(
    db: E,
    subscription_id: i64,
    paid_at: NaiveDateTime,
) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("UPDATE subscriptions SET is_paid = 1, paid_at = ? WHERE subscription_id = ?")
        .bind(paid_at)
        .bind(subscription_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

/*==========Dependent Queries=========== */

fn map_dependent(row: &SqliteRow) -> Result<Dependent, sqlx::Error> {
    Ok(Dependent {
        id: row.try_get("dependent_id")?,
        member_id: row.try_get("member_id")?,
        name: row.try_get("name")?,
        relation: row.try_get("relation")?,
        age: row.try_get("age")?,
        nic: row.try_get("nic")?,
        deceased_status: parsed::<DeceasedStatus>(row, "deceased_status")?,
        deceased_date: row.try_get("deceased_date")?,
        created_at: row.try_get("dep_created_at")?,
    })
}

pub async fn create_dependent(
    pool: &Pool<Sqlite>,
    member_id: i64,
    d: &NewDependent,
    now: NaiveDateTime,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        INSERT INTO dependents (member_id, name, relation, age, nic, deceased_status, dep_created_at)
        VALUES (?, ?, ?, ?, ?, 'ALIVE', ?)
        RETURNING dependent_id
        "#,
    )
    .bind(member_id)
    .bind(&d.name)
    .bind(&d.relation)
    .bind(d.age)
    .bind(d.nic.as_deref())
    .bind(now)
    .fetch_one(pool)
    .await
}

pub async fn get_dependent<'e, E>(db: E, dependent_id: i64) -> Result<Option<Dependent>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query("SELECT * FROM dependents WHERE dependent_id = ?")
        .bind(dependent_id)
        .fetch_optional(db)
        .await?
        .map(|row| map_dependent(&row))
        .transpose()
}

pub async fn list_dependents(pool: &Pool<Sqlite>, member_id: i64) -> Result<Vec<Dependent>, sqlx::Error> {
    sqlx::query("SELECT * FROM dependents WHERE member_id = ? ORDER BY dependent_id ASC")
        .bind(member_id)
        .fetch_all(pool)
        .await?
        .iter()
        .map(map_dependent)
        .collect()
}

pub async fn mark_dependent_deceased(
    conn: &mut SqliteConnection,
    dependent_id: i64,
    date: NaiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE dependents SET deceased_status = 'DECEASED', deceased_date = ? WHERE dependent_id = ?",
    )
    .bind(date)
    .bind(dependent_id)
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

/*==========Payout Queries=========== */

fn map_payout(row: &SqliteRow) -> Result<FuneralPayout, sqlx::Error> {
    Ok(FuneralPayout {
        id: row.try_get("payout_id")?,
        member_id: row.try_get("member_id")?,
        dependent_id: row.try_get("dependent_id")?,
        amount: decimal(row, "amount")?,
        receiver_name: row.try_get("receiver_name")?,
        receiver_relation: row.try_get("receiver_relation")?,
        notes: row.try_get("notes")?,
        payout_date: row.try_get("payout_date")?,
    })
}

pub async fn create_payout(
    conn: &mut SqliteConnection,
    member_id: i64,
    dependent_id: Option<i64>,
    p: &NewPayout,
    now: NaiveDateTime,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        INSERT INTO funeral_payouts (member_id, dependent_id, amount, receiver_name, receiver_relation, notes, payout_date)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        RETURNING payout_id
        "#,
    )
    .bind(member_id)
    .bind(dependent_id)
    .bind(p.amount.to_string())
    .bind(&p.receiver_name)
    .bind(&p.receiver_relation)
    .bind(p.notes.as_deref())
    .bind(now)
    .fetch_one(&mut *conn)
    .await
}

pub async fn list_payouts_for_member(pool: &Pool<Sqlite>, member_id: i64) -> Result<Vec<FuneralPayout>, sqlx::Error> {
    sqlx::query(
        "SELECT * FROM funeral_payouts WHERE member_id = ? ORDER BY payout_date DESC, payout_id DESC",
    )
    .bind(member_id)
    .fetch_all(pool)
    .await?
    .iter()
    .map(map_payout)
    .collect()
}

// Full payout history for the admin view
pub async fn list_payout_records(pool: &Pool<Sqlite>) -> Result<Vec<PayoutRecord>, sqlx::Error> {
    sqlx::query(
        r#"
        SELECT p.*, u.name AS member_name, u.email AS member_email,
               d.name AS dependent_name, d.relation AS dependent_relation
        FROM funeral_payouts p
        JOIN committee_members m ON m.member_id = p.member_id
        JOIN users u ON u.user_id = m.user_id
        LEFT JOIN dependents d ON d.dependent_id = p.dependent_id
        ORDER BY p.payout_date DESC, p.payout_id DESC
        "#,
    )
    .fetch_all(pool)
    .await?
    .iter()
    .map(|row| {
        Ok(PayoutRecord {
            payout: map_payout(row)?,
            member_name: row.try_get("member_name")?,
            member_email: row.try_get("member_email")?,
            dependent_name: row.try_get("dependent_name")?,
            dependent_relation: row.try_get("dependent_relation")?,
        })
    })
    .collect()
}

/*==========Report Queries=========== */

// Paid subscriptions in, funeral payouts out
pub async fn financial_health(pool: &Pool<Sqlite>) -> Result<FinancialHealth, sqlx::Error> {
    let paid = sqlx::query("SELECT amount FROM subscriptions WHERE is_paid = 1")
        .fetch_all(pool)
        .await?;
    let payouts = sqlx::query("SELECT amount FROM funeral_payouts")
        .fetch_all(pool)
        .await?;

    let total_collected = paid
        .iter()
        .try_fold(Decimal::ZERO, |acc, r| add_amount(acc, decimal(r, "amount")?))?;
    let total_paid_out = payouts
        .iter()
        .try_fold(Decimal::ZERO, |acc, r| add_amount(acc, decimal(r, "amount")?))?;

    Ok(FinancialHealth {
        total_collected,
        total_paid_out,
        net_balance: total_collected - total_paid_out,
        subscription_count: paid.len() as i64,
        payout_count: payouts.len() as i64,
    })
}

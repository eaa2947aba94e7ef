use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::backend::{ApiJson, ApiPath, ApiQuery, AppState, CurrentUser};
use crate::database::models::{
    CommitteeMember, DeceasedTarget, Dependent, FinancialHealth, FuneralPayout, NewDependent,
    NewPayout, NewService, NewTransaction, OutstandingBalance, PaymentStatus, PayoutRecord,
    Service, ServicePatch, Subscription, Transaction, TransactionFilter, TransactionStats,
    TransactionStatus, User,
};
use crate::domain::auth::{self, Credentials};
use crate::domain::death_committee::PaymentUpload;
use crate::domain::members::NewMember;
use crate::domain::{dashboard, death_committee, members, services, transactions, Done};
use crate::error::AppResult;

/// Success envelope: `{"success": true, "data": ..., "message"?: ...}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

type ApiResult<T> = AppResult<Json<ApiResponse<T>>>;
type Created<T> = AppResult<(StatusCode, Json<ApiResponse<T>>)>;

fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse {
        success: true,
        data,
        message: None,
    }))
}

fn done<T>(d: Done<T>) -> ApiResult<T> {
    Ok(Json(ApiResponse {
        success: true,
        data: d.data,
        message: Some(d.message),
    }))
}

fn created<T>(d: Done<T>) -> Created<T> {
    let Json(body) = done(d)?;
    Ok((StatusCode::CREATED, Json(body)))
}

/*==========Auth=========== */

pub async fn login(
    State(state): State<AppState>,
    ApiJson(creds): ApiJson<Credentials>,
) -> ApiResult<auth::LoginGrant> {
    ok(auth::login(&state.db, &state.config, &creds).await?)
}

pub async fn logout(State(state): State<AppState>, user: CurrentUser) -> ApiResult<()> {
    auth::logout(&state.db, &user.token).await?;
    tracing::info!(user_id = user.actor.user_id, "signed out");
    done(Done::new((), "Logged out successfully."))
}

pub async fn me(user: CurrentUser) -> ApiResult<auth::Actor> {
    ok(user.actor)
}

/*==========Services=========== */

pub async fn active_services(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> ApiResult<Vec<Service>> {
    ok(services::active_services(&state.db).await?)
}

pub async fn all_services(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Vec<Service>> {
    ok(services::all_services(&state.db, &user.actor).await?)
}

pub async fn create_service(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(input): ApiJson<NewService>,
) -> Created<Service> {
    created(services::create_service(&state.db, &user.actor, input).await?)
}

pub async fn update_service(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(patch): ApiJson<ServicePatch>,
) -> ApiResult<Service> {
    done(services::update_service(&state.db, &user.actor, id, patch).await?)
}

pub async fn delete_service(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<()> {
    done(services::delete_service(&state.db, &user.actor, id).await?)
}

/*==========Transactions=========== */

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: TransactionStatus,
}

pub async fn create_transaction(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(input): ApiJson<NewTransaction>,
) -> Created<Transaction> {
    created(transactions::create_transaction(&state.db, &user.actor, input).await?)
}

pub async fn list_transactions(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiQuery(filter): ApiQuery<TransactionFilter>,
) -> ApiResult<Vec<Transaction>> {
    ok(transactions::list_transactions(&state.db, &user.actor, filter).await?)
}

pub async fn update_transaction_status(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<StatusUpdate>,
) -> ApiResult<Transaction> {
    done(transactions::update_transaction_status(&state.db, &user.actor, id, body.status).await?)
}

pub async fn transaction_stats(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<TransactionStats> {
    ok(transactions::transaction_stats(&state.db, &user.actor).await?)
}

/*==========Members=========== */

pub async fn list_members(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<members::MemberDirectory> {
    ok(members::list_members(&state.db, &user.actor).await?)
}

pub async fn create_member(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(input): ApiJson<NewMember>,
) -> Created<User> {
    created(members::create_member(&state.db, &state.config, &user.actor, input).await?)
}

/*==========Death Committee=========== */

#[derive(Debug, Deserialize)]
pub struct CommitteeQuery {
    pub status: Option<PaymentStatus>,
}

#[derive(Debug, Deserialize)]
pub struct FeeUpdate {
    pub monthly_fee: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct DeceasedRequest {
    pub target: DeceasedTarget,
    pub payout: NewPayout,
}

pub async fn my_committee(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<death_committee::MyCommittee> {
    let today = Utc::now().date_naive();
    ok(death_committee::my_committee(&state.db, &state.config, &user.actor, today).await?)
}

pub async fn upload_payment(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(upload): ApiJson<PaymentUpload>,
) -> ApiResult<Subscription> {
    done(
        death_committee::upload_subscription_payment(&state.db, &state.config, &user.actor, upload)
            .await?,
    )
}

pub async fn add_dependent(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(input): ApiJson<NewDependent>,
) -> Created<Dependent> {
    created(death_committee::add_dependent(&state.db, &state.config, &user.actor, input).await?)
}

pub async fn list_committee_members(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiQuery(q): ApiQuery<CommitteeQuery>,
) -> ApiResult<Vec<death_committee::CommitteeSummary>> {
    ok(death_committee::list_committee_members(&state.db, &user.actor, q.status).await?)
}

pub async fn outstanding_balance(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<OutstandingBalance> {
    user.actor.require_admin("Unauthorized.")?;
    let today = Utc::now().date_naive();
    ok(death_committee::outstanding_balance(&state.db, id, today).await?)
}

pub async fn update_subscription_fee(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<FeeUpdate>,
) -> ApiResult<CommitteeMember> {
    done(death_committee::update_subscription_fee(&state.db, &user.actor, id, body.monthly_fee).await?)
}

pub async fn approve_payment(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Subscription> {
    let today = Utc::now().date_naive();
    done(death_committee::approve_subscription_payment(&state.db, &user.actor, id, today).await?)
}

pub async fn mark_deceased(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(body): ApiJson<DeceasedRequest>,
) -> Created<FuneralPayout> {
    created(death_committee::mark_deceased(&state.db, &user.actor, body.target, body.payout).await?)
}

pub async fn financial_health(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<FinancialHealth> {
    ok(death_committee::financial_health(&state.db, &user.actor).await?)
}

pub async fn payout_history(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Vec<PayoutRecord>> {
    ok(death_committee::payout_history(&state.db, &user.actor).await?)
}

/*==========Dashboards=========== */

pub async fn admin_dashboard(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<dashboard::AdminDashboard> {
    ok(dashboard::admin_dashboard(&state.db, &user.actor).await?)
}

pub async fn member_dashboard(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<dashboard::MemberDashboard> {
    ok(dashboard::member_dashboard(&state.db, &user.actor).await?)
}

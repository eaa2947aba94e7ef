//! Console access to the domain layer. The client remembers who signed in
//! and passes that user to every call, like a bearer token over HTTP.

use rust_decimal::Decimal;
use sqlx::{Pool, Sqlite};

use crate::config::AppConfig;
use crate::database::models::{
    CommitteeMember, DeceasedTarget, Dependent, FinancialHealth, FuneralPayout, NewDependent,
    NewPayout, NewService, NewTransaction, PaymentStatus, Service, ServicePatch, Subscription,
    Transaction, TransactionFilter, TransactionStatus, User,
};
use crate::domain::auth::{self, Actor, Credentials};
use crate::domain::dashboard::{self, AdminDashboard, MemberDashboard};
use crate::domain::death_committee::{self, CommitteeSummary, MyCommittee, PaymentUpload};
use crate::domain::members::{self, MemberDirectory, NewMember};
use crate::domain::{services, transactions, Done};
use crate::error::{AppError, AppResult};

use super::util::today;

#[derive(Clone)]
pub struct Client {
    pool: Pool<Sqlite>,
    config: AppConfig,
    actor: Option<Actor>,
}

impl Client {
    pub fn new(pool: Pool<Sqlite>, config: AppConfig) -> Self {
        Self {
            pool,
            config,
            actor: None,
        }
    }

    pub fn actor(&self) -> AppResult<&Actor> {
        self.actor
            .as_ref()
            .ok_or_else(|| AppError::unauthorized("Please sign in."))
    }

    pub fn is_admin(&self) -> bool {
        self.actor.as_ref().is_some_and(Actor::is_admin)
    }

    pub async fn sign_in(&mut self, email: &str, password: &str) -> AppResult<&Actor> {
        let creds = Credentials {
            email: email.to_string(),
            password: password.to_string(),
        };
        let actor = auth::verify_credentials(&self.pool, &creds).await?;
        tracing::info!(user_id = actor.user_id, role = %actor.role, "console sign-in");
        Ok(&*self.actor.insert(actor))
    }

    pub fn sign_out(&mut self) {
        if let Some(a) = self.actor.take() {
            tracing::info!(user_id = a.user_id, "console sign-out");
        }
    }

    // ============= Dashboards =============

    pub async fn admin_dashboard(&self) -> AppResult<AdminDashboard> {
        dashboard::admin_dashboard(&self.pool, self.actor()?).await
    }

    pub async fn member_dashboard(&self) -> AppResult<MemberDashboard> {
        dashboard::member_dashboard(&self.pool, self.actor()?).await
    }

    // ============= Services =============

    pub async fn services(&self) -> AppResult<Vec<Service>> {
        let actor = self.actor()?;
        if actor.is_admin() {
            services::all_services(&self.pool, actor).await
        } else {
            services::active_services(&self.pool).await
        }
    }

    pub async fn create_service(&self, input: NewService) -> AppResult<Done<Service>> {
        services::create_service(&self.pool, self.actor()?, input).await
    }

    pub async fn update_service(&self, id: i64, patch: ServicePatch) -> AppResult<Done<Service>> {
        services::update_service(&self.pool, self.actor()?, id, patch).await
    }

    pub async fn delete_service(&self, id: i64) -> AppResult<Done<()>> {
        services::delete_service(&self.pool, self.actor()?, id).await
    }

    // ============= Donations =============

    pub async fn transactions(&self, status: Option<TransactionStatus>) -> AppResult<Vec<Transaction>> {
        let filter = TransactionFilter {
            status,
            ..Default::default()
        };
        transactions::list_transactions(&self.pool, self.actor()?, filter).await
    }

    pub async fn donate(&self, input: NewTransaction) -> AppResult<Done<Transaction>> {
        transactions::create_transaction(&self.pool, self.actor()?, input).await
    }

    pub async fn set_transaction_status(
        &self,
        id: i64,
        status: TransactionStatus,
    ) -> AppResult<Done<Transaction>> {
        transactions::update_transaction_status(&self.pool, self.actor()?, id, status).await
    }

    // ============= Members =============

    pub async fn members(&self) -> AppResult<MemberDirectory> {
        members::list_members(&self.pool, self.actor()?).await
    }

    pub async fn create_member(&self, input: NewMember) -> AppResult<Done<User>> {
        members::create_member(&self.pool, &self.config, self.actor()?, input).await
    }

    // ============= Death Committee =============

    pub async fn committee(&self, status: Option<PaymentStatus>) -> AppResult<Vec<CommitteeSummary>> {
        death_committee::list_committee_members(&self.pool, self.actor()?, status).await
    }

    pub async fn financial_health(&self) -> AppResult<FinancialHealth> {
        death_committee::financial_health(&self.pool, self.actor()?).await
    }

    pub async fn my_committee(&self) -> AppResult<MyCommittee> {
        death_committee::my_committee(&self.pool, &self.config, self.actor()?, today()).await
    }

    pub async fn upload_payment(&self, upload: PaymentUpload) -> AppResult<Done<Subscription>> {
        death_committee::upload_subscription_payment(&self.pool, &self.config, self.actor()?, upload)
            .await
    }

    pub async fn approve_payment(&self, subscription_id: i64) -> AppResult<Done<Subscription>> {
        death_committee::approve_subscription_payment(&self.pool, self.actor()?, subscription_id, today())
            .await
    }

    pub async fn update_fee(&self, member_id: i64, fee: Decimal) -> AppResult<Done<CommitteeMember>> {
        death_committee::update_subscription_fee(&self.pool, self.actor()?, member_id, fee).await
    }

    pub async fn add_dependent(&self, input: NewDependent) -> AppResult<Done<Dependent>> {
        death_committee::add_dependent(&self.pool, &self.config, self.actor()?, input).await
    }

    pub async fn record_payout(
        &self,
        target: DeceasedTarget,
        payout: NewPayout,
    ) -> AppResult<Done<FuneralPayout>> {
        death_committee::mark_deceased(&self.pool, self.actor()?, target, payout).await
    }
}

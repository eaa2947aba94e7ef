use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::backend::{handlers, AppState};

pub fn api_routes() -> Router<AppState> {
    Router::new()
        // auth
        .route("/api/auth/login", post(handlers::login))
        .route("/api/auth/logout", post(handlers::logout))
        .route("/api/auth/me", get(handlers::me))
        // services
        .route("/api/services", get(handlers::active_services))
        .route(
            "/api/admin/services",
            get(handlers::all_services).post(handlers::create_service),
        )
        .route(
            "/api/admin/services/:id",
            patch(handlers::update_service).delete(handlers::delete_service),
        )
        // donations
        .route(
            "/api/transactions",
            get(handlers::list_transactions).post(handlers::create_transaction),
        )
        .route(
            "/api/admin/transactions/:id/status",
            post(handlers::update_transaction_status),
        )
        .route("/api/admin/transactions/stats", get(handlers::transaction_stats))
        // members
        .route(
            "/api/admin/members",
            get(handlers::list_members).post(handlers::create_member),
        )
        // death committee
        .route("/api/death-committee/me", get(handlers::my_committee))
        .route("/api/death-committee/payments", post(handlers::upload_payment))
        .route("/api/death-committee/dependents", post(handlers::add_dependent))
        .route("/api/admin/death-committee", get(handlers::list_committee_members))
        .route(
            "/api/admin/death-committee/:id/balance",
            get(handlers::outstanding_balance),
        )
        .route(
            "/api/admin/death-committee/:id/fee",
            patch(handlers::update_subscription_fee),
        )
        .route(
            "/api/admin/death-committee/subscriptions/:id/approve",
            post(handlers::approve_payment),
        )
        .route("/api/admin/death-committee/deceased", post(handlers::mark_deceased))
        .route(
            "/api/admin/death-committee/financial-health",
            get(handlers::financial_health),
        )
        .route("/api/admin/death-committee/payouts", get(handlers::payout_history))
        // dashboards
        .route("/api/dashboard/admin", get(handlers::admin_dashboard))
        .route("/api/dashboard/member", get(handlers::member_dashboard))
}

mod extract;
mod handlers;
mod routes;

use axum::extract::DefaultBodyLimit;
use axum::{routing::get, Router};
use sqlx::{Pool, Sqlite};
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::error::AppError;

pub use extract::{ApiJson, ApiPath, ApiQuery, CurrentUser};

#[derive(Clone)]
pub struct AppState {
    pub db: Pool<Sqlite>,
    pub config: AppConfig,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "Backend is running" }))
        .merge(routes::api_routes())
        .fallback(|| async { AppError::not_found("Not found.") })
        .layer(DefaultBodyLimit::max(state.config.max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_server(pool: Pool<Sqlite>, config: AppConfig) -> anyhow::Result<()> {
    let addr = config.bind_addr;
    let app = router(AppState { db: pool, config });

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "could not listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}

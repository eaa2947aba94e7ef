use sqlx::{Pool, Sqlite};

use crate::error::AppResult;

pub async fn run_migrations(pool: &Pool<Sqlite>) -> AppResult<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::debug!("migrations applied");
    Ok(())
}

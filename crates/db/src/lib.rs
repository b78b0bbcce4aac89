pub mod activity;
pub mod change_request;
pub mod notification;
pub mod sync_state;
pub mod timesheet;
pub mod user;
pub mod work_rule;

use sqlx::postgres::PgPoolOptions;
pub use sqlx::PgPool;
use stechuhr_common::error::{AppError, AppResult};

/// Create a Postgres connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> AppResult<PgPool> {
    tracing::info!("connecting to database");
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_pool_fails_with_invalid_url() {
        let result = create_pool("postgres://invalid:5432/nonexistent").await;
        assert!(result.is_err());
    }
}

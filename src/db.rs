use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

/// Create the main connection pool for the dashboard database.
pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    tracing::info!("Connecting to dashboard database...");

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .min_connections(5)
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(600)) // 10 minutes
        .max_lifetime(Duration::from_secs(1800)) // 30 minutes
        .connect(database_url)
        .await?;

    tracing::info!("Database pool created successfully");

    Ok(pool)
}

/// Health probe used by the monitoring endpoint.
pub async fn check_health(pool: &PgPool) -> bool {
    sqlx::query("SELECT 1").fetch_one(pool).await.is_ok()
}

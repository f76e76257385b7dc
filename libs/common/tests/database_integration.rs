//! Integration tests for the database infrastructure
//!
//! These tests verify that the PostgreSQL database is properly configured
//! and accessible from the application. They need `DATABASE_URL` pointing
//! at a running instance and are therefore ignored by default.

use common::database::{DatabaseConfig, health_check, init_pool, run_migrations};
use sqlx::Row;

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_database_integration() -> Result<(), Box<dyn std::error::Error>> {
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    assert!(health_check(&pool).await?, "Database health check failed");

    let row = sqlx::query("SELECT 1 as result").fetch_one(&pool).await?;
    let result: i32 = row.get("result");
    assert_eq!(result, 1, "PostgreSQL simple query test failed");

    // Migrations are embedded in the crate; applying them twice is a no-op
    run_migrations(&pool).await?;
    run_migrations(&pool).await?;

    let row = sqlx::query(
        "SELECT COUNT(*) as result FROM information_schema.tables \
         WHERE table_name IN ('admins', 'roles', 'permissions', 'sessions')",
    )
    .fetch_one(&pool)
    .await?;

    let tables: i64 = row.get("result");
    assert_eq!(tables, 4, "Expected core tables to exist after migration");

    Ok(())
}

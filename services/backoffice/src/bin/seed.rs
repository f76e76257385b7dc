use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use backoffice::seed;
use common::database;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Seeding the back-office database");

    let db_config = database::DatabaseConfig::from_env()?;
    let pool = database::init_pool(&db_config).await?;
    database::run_migrations(&pool).await?;

    seed::run(&pool).await?;

    info!("Seeding complete");
    Ok(())
}

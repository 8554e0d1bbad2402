use anyhow::Result;
use common::database;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use shop::{AppState, config::ShopConfig, create_router, hashing::hasher_for};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging, RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting shop service");

    let shop_config = ShopConfig::from_env()?;

    // Initialize database connection pool
    let db_config = database::DatabaseConfig::from_env()?;
    let pool = database::init_pool(&db_config).await?;

    // Check database connectivity
    if database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    if shop_config.run_migrations {
        database::run_migrations(&pool).await?;
    }

    let hasher = hasher_for(shop_config.password_scheme);
    info!("Password scheme: {:?}", shop_config.password_scheme);

    let app = create_router(AppState::postgres(pool, hasher));

    let listener = TcpListener::bind(&shop_config.bind_address).await?;
    info!("Shop service listening on {}", shop_config.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}

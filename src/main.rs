use std::sync::Arc;

use color_eyre::eyre::Result;
use courtbook_api::config::ApiConfig;
use courtbook_api::notify::LogNotifier;
use courtbook_db::{create_pool, schema::initialize_database};
use courtbook_sweeper::{PgExpiryStore, SweeperConfig};
use dotenv::dotenv;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Load environment variables
    dotenv().ok();

    // Load configuration
    let config = ApiConfig::from_env()?;

    // Create database connection pool
    let db_pool = create_pool(&config.database_url).await?;

    // Initialize database schema
    initialize_database(&db_pool).await?;

    // Start the expiration sweeper next to the server
    let sweeper_config = SweeperConfig {
        interval: config.sweep_interval(),
    };
    let store = Arc::new(PgExpiryStore::new(db_pool.clone()));
    let notifier = Arc::new(LogNotifier);
    tokio::spawn(courtbook_sweeper::start(store, notifier, sweeper_config));

    // Start API server
    courtbook_api::start_server(config, db_pool).await?;

    Ok(())
}

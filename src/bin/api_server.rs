// HTTP API server binary for the grocery catalog

use anyhow::Result;
use grocery_catalog::api::ApiServer;
use grocery_catalog::database_ops::db::Db;
use grocery_catalog::database_ops::search::SearchIndex;
use grocery_catalog::util::env as env_util;
use grocery_catalog::util::log::init_tracing;

#[actix_web::main]
async fn main() -> Result<()> {
    init_tracing("info,sqlx=warn")?;

    tracing::info!("initializing catalog API server");

    // Load dotenv/env once (safe to call multiple times)
    env_util::init_env();

    // Load configuration from environment
    let server = ApiServer::from_env()?;

    // Initialize database connection
    let database_url = env_util::db_url()?;
    let max_connections: u32 = env_util::env_parse("DB_MAX_CONNS", 10u32);
    let db = Db::connect(&database_url, max_connections).await?;

    tracing::info!("database connected");

    let search = SearchIndex::from_env()?;

    // Start HTTP server
    server.run(db, search).await?;

    Ok(())
}

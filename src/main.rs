use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::time::Duration;
use tracing::{info, warn};

use grocery_catalog::database_ops::db::Db;
use grocery_catalog::database_ops::outbox;
use grocery_catalog::database_ops::search::SearchIndex;
use grocery_catalog::scrapers::billa::{self, BillaScraper};
use grocery_catalog::scrapers::foodora::catalog::{store_by_name, STORES};
use grocery_catalog::scrapers::foodora::client::FoodoraClient;
use grocery_catalog::scrapers::foodora::details;
use grocery_catalog::scrapers::foodora::scraper::FoodoraScraper;
use grocery_catalog::scrapers::foodora::DEFAULT_USER_CODE;
use grocery_catalog::util::env as env_util;
use grocery_catalog::util::log::init_tracing;

const BILLA_CATEGORIES_FILE: &str = "config/billa_categories.json";

#[derive(Parser)]
#[command(name = "scraper", about = "Grocery catalog scraper and maintenance CLI")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scrape the Billa webshop (all configured categories, or one)
    ScrapeBilla {
        /// Category slug to scrape instead of the whole catalog
        #[arg(long)]
        category: Option<String>,
    },
    /// Scrape one delivery-platform store
    ScrapeFoodora {
        /// Store name, code or vendor code (e.g. FOODORA_DMART, foodora-dmart, o7b0)
        #[arg(long)]
        store: String,
    },
    /// Scrape everything: Billa plus all delivery stores
    ScrapeAll,
    /// Fetch one product's raw detail payload from the delivery API
    InspectProduct {
        product_id: String,
        /// Store name, code or vendor code
        #[arg(long, default_value = "FOODORA_DMART")]
        store: String,
    },
    /// Create and configure the search index
    InitSearch,
    /// Push queued products into the search index
    SyncSearch {
        /// Keep polling instead of exiting when the queue drains
        #[arg(long = "loop")]
        run_forever: bool,
        /// Poll interval in seconds when looping
        #[arg(long, default_value_t = 30)]
        interval_secs: u64,
    },
    /// Print row counts for the main tables
    DbCounts,
    /// Delete the whole product catalog
    DeleteProducts {
        /// Required confirmation flag
        #[arg(long)]
        yes: bool,
    },
}

async fn connect_db() -> Result<Db> {
    let database_url = env_util::db_url()?;
    let max_conns: u32 = env_util::env_parse("DB_MAX_CONNS", 10u32);
    Db::connect(&database_url, max_conns)
        .await
        .context("database connect failed")
}

#[tokio::main]
async fn main() -> Result<()> {
    env_util::init_env();
    init_tracing("info,sqlx=warn")?;

    let cli = Cli::parse();
    match cli.command {
        Command::ScrapeBilla { category } => {
            let db = connect_db().await?;
            let scraper = BillaScraper::new()?;
            let categories = billa::load_categories(BILLA_CATEGORIES_FILE)?;
            match category {
                Some(slug) => {
                    let cat = categories
                        .iter()
                        .find(|c| c.slug == slug)
                        .ok_or_else(|| anyhow!("unknown category slug: {slug}"))?;
                    scraper.scrape_category(&db, cat).await?;
                }
                None => {
                    scraper.scrape_all(&db, &categories).await?;
                }
            }
        }
        Command::ScrapeFoodora { store } => {
            let config = store_by_name(&store)
                .ok_or_else(|| anyhow!("unknown store: {store} (known: {:?})",
                    STORES.iter().map(|s| s.store).collect::<Vec<_>>()))?;
            let db = connect_db().await?;
            let scraper = FoodoraScraper::new()?;
            scraper.scrape_store(&db, config).await?;
        }
        Command::ScrapeAll => {
            let db = connect_db().await?;
            let billa_scraper = BillaScraper::new()?;
            let categories = billa::load_categories(BILLA_CATEGORIES_FILE)?;
            if let Err(e) = billa_scraper.scrape_all(&db, &categories).await {
                warn!(error = %e, "billa scrape failed; continuing with delivery stores");
            }
            let foodora = FoodoraScraper::new()?;
            foodora.scrape_all_stores(&db).await?;
        }
        Command::InspectProduct { product_id, store } => {
            let config = store_by_name(&store)
                .ok_or_else(|| anyhow!("unknown store: {store}"))?;
            let client = FoodoraClient::new()?;
            let details = client
                .fetch_product_details(&product_id, config.vendor_code, DEFAULT_USER_CODE)
                .await?;
            let summary = details::simplify(&details.data.product_details.product);
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::InitSearch => {
            let index = SearchIndex::from_env()?;
            index.initialize().await?;
            info!("search index ready");
        }
        Command::SyncSearch {
            run_forever,
            interval_secs,
        } => {
            let db = connect_db().await?;
            let index = SearchIndex::from_env()?;
            outbox::run_sync(&db, &index, Duration::from_secs(interval_secs), run_forever)
                .await?;
        }
        Command::DbCounts => {
            let db = connect_db().await?;
            let products = db.product_count().await?;
            let categories = db.category_count().await?;
            let queued = db.outbox_depth().await?;
            println!("products:   {products}");
            println!("categories: {categories}");
            println!("queued:     {queued}");
            for sc in db.product_counts_by_store().await? {
                println!("  {:<24} {}", sc.store, sc.count);
            }
        }
        Command::DeleteProducts { yes } => {
            if !yes {
                return Err(anyhow!("refusing to delete without --yes"));
            }
            let db = connect_db().await?;
            let deleted = db.delete_all_products().await?;
            // Queued sync rows cascade away with the products, so the index
            // copy has to be dropped explicitly.
            let index = SearchIndex::from_env()?;
            index.delete_all_documents().await?;
            info!(deleted, "product catalog and search mirror wiped");
        }
    }
    Ok(())
}

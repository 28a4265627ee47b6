//! Walks a store's category tree through the catalog API and lands products
//! in Postgres. One request covers a whole parent category; the response
//! comes back pre-grouped by subcategory.

use anyhow::Result;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

use crate::database_ops::categories::{CategoryDefinition, NewCategory};
use crate::database_ops::db::Db;
use crate::scrapers::slugify;

use super::catalog::{load_category_tree, StoreConfig, STORES};
use super::client::FoodoraClient;
use super::mapper::map_product;
use super::types::CategoryProductGroup;
use super::DEFAULT_USER_CODE;

const CATEGORY_DELAY: Duration = Duration::from_millis(500);
const STORE_DELAY: Duration = Duration::from_secs(5);

/// Category key: `{store code}-{external category id}`.
fn category_key(store_code: &str, category_id: &str) -> String {
    format!("{store_code}-{category_id}")
}

/// Category slug: `{store code}-{slugified name}`.
fn category_slug(store_code: &str, name: &str) -> String {
    format!("{store_code}-{}", slugify(name))
}

pub struct FoodoraScraper {
    client: FoodoraClient,
}

impl FoodoraScraper {
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: FoodoraClient::new()?,
        })
    }

    /// Scrapes one parent category: upserts it, then saves each returned
    /// subcategory group with its products. A failed product save is logged
    /// and skipped.
    #[instrument(skip(self, db, config), fields(store = config.store, category = %def.name))]
    pub async fn scrape_category(
        &self,
        db: &Db,
        config: &StoreConfig,
        def: &CategoryDefinition,
    ) -> Result<u64> {
        info!(id = %def.id, vendor = config.vendor_code, "scraping category");

        let parent = db
            .upsert_category(&NewCategory {
                key: category_key(config.store_code, &def.id),
                name: def.name.clone(),
                slug: category_slug(config.store_code, &def.name),
                order_hint: def.number_of_products.map(|n| n.to_string()),
                parent_id: None,
            })
            .await?;

        let response = match self
            .client
            .fetch_category_products(&def.id, config.vendor_code, DEFAULT_USER_CODE)
            .await
        {
            Ok(r) => r,
            Err(e) => {
                error!(error = %e, "category fetch failed");
                return Ok(0);
            }
        };

        let Some(groups) = response.data.category_product_list.category_products else {
            warn!("no products returned for category");
            return Ok(0);
        };

        let mut saved = 0u64;
        for group in &groups {
            saved += self.save_group(db, config, parent.id, group).await?;
        }
        info!(saved, "category done");
        Ok(saved)
    }

    async fn save_group(
        &self,
        db: &Db,
        config: &StoreConfig,
        parent_id: i32,
        group: &CategoryProductGroup,
    ) -> Result<u64> {
        let slug = category_slug(config.store_code, &group.name);
        let cat = db
            .upsert_category(&NewCategory {
                key: category_key(config.store_code, &group.id),
                name: group.name.clone(),
                slug: slug.clone(),
                order_hint: None,
                parent_id: Some(parent_id),
            })
            .await?;

        let mut saved = 0u64;
        for item in &group.items {
            let row = map_product(item, &group.name, &slug, config.store);
            match db.upsert_product(&row).await {
                Ok(product_row_id) => {
                    db.link_product_category(product_row_id, cat.id).await?;
                    saved += 1;
                }
                Err(e) => {
                    warn!(product_id = %item.product_id, name = %item.name, error = %e, "product save failed");
                }
            }
        }
        info!(subcategory = %group.name, saved, of = group.items.len(), "subcategory saved");
        Ok(saved)
    }

    /// Runs every root category of one store's tree.
    #[instrument(skip(self, db, config), fields(store = config.store))]
    pub async fn scrape_store(&self, db: &Db, config: &StoreConfig) -> Result<u64> {
        let categories = load_category_tree(config.categories_file)?;
        info!(
            name = config.display_name,
            roots = categories.len(),
            "starting store scrape"
        );
        // Seed the configured tree up front so nested categories exist with
        // their parent links even before any product references them.
        let store_code = config.store_code;
        db.save_category_tree(
            &categories,
            &|d| category_key(store_code, &d.id),
            &|d| category_slug(store_code, &d.name),
        )
        .await?;
        let mut total = 0u64;
        for (i, def) in categories.iter().enumerate() {
            total += self.scrape_category(db, config, def).await?;
            if i + 1 < categories.len() {
                tokio::time::sleep(CATEGORY_DELAY).await;
            }
        }
        let db_count = db.product_count().await?;
        let cat_count = db.category_count().await?;
        info!(total, db_count, cat_count, "store scrape complete");
        Ok(total)
    }

    /// All configured stores in sequence, with a cool-down between them.
    pub async fn scrape_all_stores(&self, db: &Db) -> Result<u64> {
        let mut total = 0u64;
        for (i, config) in STORES.iter().enumerate() {
            info!(
                store = config.store,
                name = config.display_name,
                "[{}/{}] store",
                i + 1,
                STORES.len()
            );
            match self.scrape_store(db, config).await {
                Ok(n) => total += n,
                Err(e) => error!(store = config.store, error = %e, "store scrape failed"),
            }
            if i + 1 < STORES.len() {
                tokio::time::sleep(STORE_DELAY).await;
            }
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_joins_store_code_and_external_id() {
        assert_eq!(
            category_key("foodora-dmart", "0a6f9f28"),
            "foodora-dmart-0a6f9f28"
        );
    }

    #[test]
    fn slug_prefixes_store_code() {
        assert_eq!(
            category_slug("foodora-billa-prosek", "Ovoce a zelenina"),
            "foodora-billa-prosek-ovoce-a-zelenina"
        );
    }
}

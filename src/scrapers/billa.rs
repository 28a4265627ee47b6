//! Billa webshop scraper. Pages through the public product-discovery REST API
//! category by category and lands everything in Postgres.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

use crate::database_ops::categories::NewCategory;
use crate::database_ops::db::Db;
use crate::database_ops::products::NewProduct;

const BILLA_API_BASE_URL: &str = "https://shop.billa.cz/api/product-discovery/categories";
const STORE_ID: &str = "82-189";
const PAGE_SIZE: u32 = 30;
const PAGE_DELAY: Duration = Duration::from_millis(500);

pub const STORE_BILLA: &str = "BILLA";

/// A category to scrape, as listed in the bundled config file.
#[derive(Debug, Clone, Deserialize)]
pub struct BillaCategory {
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillaApiResponse {
    #[serde(default)]
    pub count: i64,
    #[serde(default)]
    pub offset: i64,
    #[serde(default)]
    pub total: i64,
    #[serde(default)]
    pub results: Vec<ProductResult>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductResult {
    pub product_id: String,
    pub sku: String,
    pub slug: String,
    pub name: String,
    pub description_short: Option<String>,
    pub description_long: Option<String>,
    pub regulated_product_name: Option<String>,
    pub category: String,
    pub brand: Option<Brand>,
    pub price: Option<Price>,
    pub in_promotion: bool,
    pub amount: Option<String>,
    pub weight: Option<f64>,
    pub package_label: Option<String>,
    pub package_label_key: Option<String>,
    pub volume_label_key: Option<String>,
    pub volume_label_short: Option<String>,
    pub images: Vec<String>,
    pub product_marketing: Option<String>,
    pub brand_marketing: Option<String>,
    pub published: bool,
    pub medical: bool,
    pub weight_article: bool,
    /// Paths from root to leaf, one per listing the product appears under.
    pub parent_categories: Vec<Vec<CategoryInfo>>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Brand {
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Price {
    pub base_unit_long: Option<String>,
    pub base_unit_short: Option<String>,
    pub regular: Option<RegularPrice>,
    /// Pre-discount price shown struck through, already in minor units.
    pub crossed: Option<i32>,
    pub lowest_price: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct RegularPrice {
    /// Minor units (hellers).
    pub value: Option<i32>,
    pub per_standardized_quantity: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct CategoryInfo {
    pub key: String,
    pub name: String,
    pub slug: String,
    pub order_hint: Option<String>,
}

/// What to do after inspecting one fetched page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    /// Page was empty; nothing to save and no further pages.
    Empty,
    /// Save the page; the category is exhausted afterwards.
    Last,
    /// Save the page and fetch the next one.
    Continue,
}

/// Pagination decision per the API's count/offset/total contract.
pub fn page_outcome(results_len: usize, offset: i64, total: i64) -> PageOutcome {
    if results_len == 0 {
        PageOutcome::Empty
    } else if offset >= total {
        PageOutcome::Last
    } else {
        PageOutcome::Continue
    }
}

pub struct BillaScraper {
    http: reqwest::Client,
    base: String,
}

impl BillaScraper {
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            base: BILLA_API_BASE_URL.to_string(),
        })
    }

    #[instrument(skip(self))]
    pub async fn fetch_page(&self, category_slug: &str, page: u32) -> Result<BillaApiResponse> {
        let url = format!(
            "{}/{}/products?sortBy=relevance&storeId={}&enableStatistics=true&enablePersonalization=true&page={}&pageSize={}",
            self.base, category_slug, STORE_ID, page, PAGE_SIZE
        );
        let resp = self.http.get(&url).send().await?;
        if !resp.status().is_success() {
            return Err(anyhow!("billa fetch failed: {} {}", resp.status(), url));
        }
        let body: BillaApiResponse = resp.json().await?;
        Ok(body)
    }

    /// Pages through one category, saving every product and its category
    /// memberships. A failed page ends the category without retry.
    #[instrument(skip(self, db), fields(slug = %category.slug))]
    pub async fn scrape_category(&self, db: &Db, category: &BillaCategory) -> Result<u64> {
        info!(name = %category.name, "scraping category");
        let mut page = 0u32;
        let mut total_scraped = 0u64;
        loop {
            let response = match self.fetch_page(&category.slug, page).await {
                Ok(r) => r,
                Err(e) => {
                    error!(page, error = %e, "page fetch failed; stopping category");
                    break;
                }
            };
            let outcome = page_outcome(response.results.len(), response.offset, response.total);
            if outcome == PageOutcome::Empty {
                break;
            }
            info!(
                page,
                count = response.count,
                total = response.total,
                "page fetched"
            );
            for product in &response.results {
                if let Err(e) = self.save_product(db, product, &category.slug).await {
                    warn!(product_id = %product.product_id, error = %e, "product save failed");
                }
            }
            total_scraped += response.results.len() as u64;
            if outcome == PageOutcome::Last {
                break;
            }
            page += 1;
            tokio::time::sleep(PAGE_DELAY).await;
        }
        info!(total_scraped, name = %category.name, "category done");
        Ok(total_scraped)
    }

    async fn save_product(&self, db: &Db, product: &ProductResult, category_slug: &str) -> Result<()> {
        // Persist every category path the listing reports, root before leaf so
        // children can point at their parent's row.
        let mut saved: HashMap<&str, i32> = HashMap::new();
        let mut category_ids: Vec<i32> = Vec::new();
        for (info, parent_key) in path_links(&product.parent_categories) {
            let parent_id = parent_key.and_then(|k| saved.get(k).copied());
            let cat = db
                .upsert_category(&NewCategory {
                    key: info.key.clone(),
                    name: info.name.clone(),
                    slug: info.slug.clone(),
                    order_hint: info.order_hint.clone(),
                    parent_id,
                })
                .await?;
            saved.insert(info.key.as_str(), cat.id);
            if !category_ids.contains(&cat.id) {
                category_ids.push(cat.id);
            }
        }

        let row = map_product(product, category_slug);
        let product_row_id = db.upsert_product(&row).await?;
        db.link_product_categories(product_row_id, &category_ids).await?;
        Ok(())
    }

    /// Runs the whole catalog, one configured category at a time.
    pub async fn scrape_all(&self, db: &Db, categories: &[BillaCategory]) -> Result<u64> {
        info!(categories = categories.len(), "starting billa scrape");
        let mut total = 0u64;
        for category in categories {
            total += self.scrape_category(db, category).await?;
        }
        let db_count = db.product_count().await?;
        let cat_count = db.category_count().await?;
        info!(total, db_count, cat_count, "billa scrape complete");
        Ok(total)
    }
}

/// Flattens parent-category paths into save order: each path root-first, every
/// entry paired with the key of its parent within that path. Saving in this
/// order guarantees a parent's row exists before any child references it.
fn path_links(paths: &[Vec<CategoryInfo>]) -> Vec<(&CategoryInfo, Option<&str>)> {
    let mut out = Vec::new();
    for path in paths {
        let mut parent: Option<&str> = None;
        for info in path {
            out.push((info, parent));
            parent = Some(info.key.as_str());
        }
    }
    out
}

/// Flattens an API listing into the catalog row shape. Billa prices arrive
/// already in minor units.
pub fn map_product(product: &ProductResult, category_slug: &str) -> NewProduct {
    let regular = product.price.as_ref().and_then(|p| p.regular.as_ref());
    let per_quantity = regular.and_then(|r| r.per_standardized_quantity);
    NewProduct {
        store: STORE_BILLA.to_string(),
        product_id: product.product_id.clone(),
        sku: product.sku.clone(),
        slug: product.slug.clone(),
        name: product.name.clone(),
        description_short: product.description_short.clone(),
        description_long: product.description_long.clone(),
        regulated_product_name: product.regulated_product_name.clone(),
        category: product.category.clone(),
        category_slug: category_slug.to_string(),
        brand: product.brand.as_ref().map(|b| b.name.clone()),
        brand_slug: product.brand.as_ref().map(|b| b.slug.clone()),
        price: regular.and_then(|r| r.value),
        price_per_unit: per_quantity.map(|v| v.round() as i32),
        unit_price: per_quantity,
        regular_price: regular.and_then(|r| r.value),
        discount_price: product.price.as_ref().and_then(|p| p.crossed),
        lowest_price: product.price.as_ref().and_then(|p| p.lowest_price),
        in_promotion: product.in_promotion,
        amount: product.amount.clone(),
        weight: product.weight,
        package_label: product.package_label.clone(),
        package_label_key: product.package_label_key.clone(),
        volume_label_key: product.volume_label_key.clone(),
        volume_label_short: product.volume_label_short.clone(),
        base_unit_long: product.price.as_ref().and_then(|p| p.base_unit_long.clone()),
        base_unit_short: product.price.as_ref().and_then(|p| p.base_unit_short.clone()),
        images: Some(serde_json::json!(product.images)),
        product_marketing: product.product_marketing.clone(),
        brand_marketing: product.brand_marketing.clone(),
        published: product.published,
        medical: product.medical,
        weight_article: product.weight_article,
    }
}

/// Loads the category list bundled with the repo.
pub fn load_categories(path: &str) -> Result<Vec<BillaCategory>> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
    let cats: Vec<BillaCategory> = serde_json::from_str(&raw).with_context(|| format!("parsing {path}"))?;
    Ok(cats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_page_stops_without_saving() {
        assert_eq!(page_outcome(0, 0, 100), PageOutcome::Empty);
    }

    #[test]
    fn offset_past_total_is_last_page() {
        assert_eq!(page_outcome(30, 120, 100), PageOutcome::Last);
        assert_eq!(page_outcome(10, 100, 100), PageOutcome::Last);
    }

    #[test]
    fn mid_category_continues() {
        assert_eq!(page_outcome(30, 30, 100), PageOutcome::Continue);
    }

    #[test]
    fn map_product_takes_minor_units_verbatim() {
        let product = ProductResult {
            product_id: "p-77".into(),
            sku: "77".into(),
            slug: "jablko".into(),
            name: "Jablko".into(),
            category: "Ovoce".into(),
            in_promotion: true,
            published: true,
            price: Some(Price {
                regular: Some(RegularPrice {
                    value: Some(2490),
                    per_standardized_quantity: Some(49.8),
                }),
                crossed: Some(2990),
                lowest_price: Some(2290),
                ..Default::default()
            }),
            ..Default::default()
        };
        let row = map_product(&product, "ovoce-a-zelenina-1165");
        assert_eq!(row.store, "BILLA");
        assert_eq!(row.price, Some(2490));
        assert_eq!(row.regular_price, Some(2490));
        assert_eq!(row.discount_price, Some(2990));
        assert_eq!(row.lowest_price, Some(2290));
        assert_eq!(row.price_per_unit, Some(50));
        assert_eq!(row.unit_price, Some(49.8));
        assert_eq!(row.category_slug, "ovoce-a-zelenina-1165");
        assert!(row.in_promotion);
    }

    #[test]
    fn parent_paths_save_root_first_with_parent_keys() {
        fn info(key: &str) -> CategoryInfo {
            CategoryInfo {
                key: key.to_string(),
                ..Default::default()
            }
        }
        let paths = vec![
            vec![info("ovoce-zelenina"), info("ovoce"), info("banany")],
            vec![info("akce"), info("ovoce-v-akci")],
        ];
        let links: Vec<(&str, Option<&str>)> = path_links(&paths)
            .into_iter()
            .map(|(i, parent)| (i.key.as_str(), parent))
            .collect();
        assert_eq!(
            links,
            vec![
                ("ovoce-zelenina", None),
                ("ovoce", Some("ovoce-zelenina")),
                ("banany", Some("ovoce")),
                ("akce", None),
                ("ovoce-v-akci", Some("akce")),
            ]
        );
    }

    #[test]
    fn response_parses_with_missing_optionals() {
        let raw = r#"{
            "count": 1, "offset": 0, "total": 1,
            "results": [{
                "productId": "x-1", "sku": "1", "slug": "x", "name": "X",
                "category": "C", "inPromotion": false, "published": true,
                "medical": false, "weightArticle": false,
                "images": [], "parentCategories": [[{"key": "k", "name": "N", "slug": "s", "orderHint": "0.5"}]]
            }]
        }"#;
        let parsed: BillaApiResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.results.len(), 1);
        assert_eq!(parsed.results[0].parent_categories[0][0].key, "k");
        assert!(parsed.results[0].price.is_none());
    }
}

//! Meilisearch mirror of the product catalog. Thin HTTP client; the index is
//! configured once at init time and fed from the outbox queue.

use anyhow::{anyhow, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info, instrument};

use crate::database_ops::products::ProductRow;
use crate::util::env::search_env;

const SEARCHABLE_ATTRIBUTES: &[&str] = &[
    "name",
    "brand",
    "descriptionShort",
    "descriptionLong",
    "category",
];
const FILTERABLE_ATTRIBUTES: &[&str] = &[
    "store",
    "categorySlug",
    "categoryKeys",
    "brand",
    "inPromotion",
    "published",
    "price",
];
const SORTABLE_ATTRIBUTES: &[&str] = &["price", "name", "scrapedAt"];
const RANKING_RULES: &[&str] = &["words", "typo", "proximity", "attribute", "sort", "exactness"];

#[derive(Clone)]
pub struct SearchIndex {
    http: reqwest::Client,
    base: String,
    api_key: Option<String>,
    pub index: String,
}

#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub filter: Option<String>,
    pub sort: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Clone)]
pub struct SearchPage {
    /// Row ids of matching products, in ranking order.
    pub ids: Vec<i32>,
    pub estimated_total_hits: i64,
}

#[derive(Deserialize)]
struct RawSearchResponse {
    hits: Vec<RawHit>,
    #[serde(rename = "estimatedTotalHits", default)]
    estimated_total_hits: i64,
}

#[derive(Deserialize)]
struct RawHit {
    id: i32,
}

impl SearchIndex {
    pub fn new(base: &str, api_key: Option<String>, index: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self {
            http,
            base: base.trim_end_matches('/').to_string(),
            api_key,
            index: index.to_string(),
        })
    }

    pub fn from_env() -> Result<Self> {
        let env = search_env();
        Self::new(&env.url, env.api_key, &env.index)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut rb = self.http.request(method, format!("{}{}", self.base, path));
        if let Some(key) = &self.api_key {
            rb = rb.bearer_auth(key);
        }
        rb
    }

    /// Create the index (idempotent; an already-exists response is fine) and
    /// push the attribute/ranking settings.
    #[instrument(skip(self))]
    pub async fn initialize(&self) -> Result<()> {
        let resp = self
            .request(reqwest::Method::POST, "/indexes")
            .json(&json!({ "uid": self.index, "primaryKey": "id" }))
            .send()
            .await?;
        // 202 accepted, or an index_already_exists error body; both are fine.
        if !resp.status().is_success() && resp.status().as_u16() != 409 {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            if !body.contains("index_already_exists") {
                return Err(anyhow!("index creation failed: {status} {body}"));
            }
        }

        let settings = json!({
            "searchableAttributes": SEARCHABLE_ATTRIBUTES,
            "filterableAttributes": FILTERABLE_ATTRIBUTES,
            "sortableAttributes": SORTABLE_ATTRIBUTES,
            "rankingRules": RANKING_RULES,
        });
        let resp = self
            .request(
                reqwest::Method::PATCH,
                &format!("/indexes/{}/settings", self.index),
            )
            .json(&settings)
            .send()
            .await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("settings update failed: {status} {body}"));
        }
        info!(index = %self.index, "search index configured");
        Ok(())
    }

    #[instrument(skip(self, docs), fields(count = docs.len()))]
    pub async fn add_documents(&self, docs: &[Value]) -> Result<()> {
        if docs.is_empty() {
            return Ok(());
        }
        let resp = self
            .request(
                reqwest::Method::POST,
                &format!("/indexes/{}/documents?primaryKey=id", self.index),
            )
            .json(docs)
            .send()
            .await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("document push failed: {status} {body}"));
        }
        Ok(())
    }

    pub async fn delete_all_documents(&self) -> Result<()> {
        let resp = self
            .request(
                reqwest::Method::DELETE,
                &format!("/indexes/{}/documents", self.index),
            )
            .send()
            .await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("document wipe failed: {status} {body}"));
        }
        Ok(())
    }

    #[instrument(skip(self, query), fields(q = ?query.q, filter = ?query.filter))]
    pub async fn search(&self, query: &SearchQuery) -> Result<SearchPage> {
        let mut body = json!({
            "q": query.q.clone().unwrap_or_default(),
            "limit": query.limit,
            "offset": query.offset,
            "attributesToRetrieve": ["id"],
        });
        if let Some(filter) = &query.filter {
            body["filter"] = json!(filter);
        }
        if let Some(sort) = &query.sort {
            body["sort"] = json!([sort]);
        }
        let resp = self
            .request(
                reqwest::Method::POST,
                &format!("/indexes/{}/search", self.index),
            )
            .json(&body)
            .send()
            .await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(anyhow!("search failed: {status} {text}"));
        }
        let raw: RawSearchResponse = resp.json().await?;
        debug!(hits = raw.hits.len(), total = raw.estimated_total_hits, "search page");
        Ok(SearchPage {
            ids: raw.hits.into_iter().map(|h| h.id).collect(),
            estimated_total_hits: raw.estimated_total_hits,
        })
    }
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Builds a Meilisearch filter expression from the catalog-facing filters.
/// Returns None when nothing is filtered.
pub fn build_filter(
    store: Option<&str>,
    category_keys: Option<&[String]>,
    in_promotion: Option<bool>,
    published_only: bool,
) -> Option<String> {
    let mut parts: Vec<String> = Vec::new();
    if let Some(store) = store {
        parts.push(format!("store = {}", quote(store)));
    }
    if let Some(keys) = category_keys {
        let quoted: Vec<String> = keys.iter().map(|k| quote(k)).collect();
        parts.push(format!("categoryKeys IN [{}]", quoted.join(", ")));
    }
    if let Some(promo) = in_promotion {
        parts.push(format!("inPromotion = {promo}"));
    }
    if published_only {
        parts.push("published = true".to_string());
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" AND "))
    }
}

/// Flattens a product row (plus its category memberships) into the document
/// shape the index stores.
pub fn search_document(p: &ProductRow, category_keys: &[String]) -> Value {
    json!({
        "id": p.id,
        "store": p.store,
        "productId": p.product_id,
        "sku": p.sku,
        "slug": p.slug,
        "name": p.name,
        "brand": p.brand,
        "brandSlug": p.brand_slug,
        "descriptionShort": p.description_short,
        "descriptionLong": p.description_long,
        "category": p.category,
        "categorySlug": p.category_slug,
        "categoryKeys": category_keys,
        "price": p.price,
        "regularPrice": p.regular_price,
        "discountPrice": p.discount_price,
        "pricePerUnit": p.price_per_unit,
        "inPromotion": p.in_promotion,
        "published": p.published,
        "amount": p.amount,
        "images": p.images,
        "scrapedAt": p.scraped_at.timestamp(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_is_none() {
        assert_eq!(build_filter(None, None, None, false), None);
    }

    #[test]
    fn full_filter_joins_with_and() {
        let keys = vec!["mjul-a".to_string(), "mjul-b".to_string()];
        let f = build_filter(Some("FOODORA_BILLA_PROSEK"), Some(&keys), Some(true), true).unwrap();
        assert_eq!(
            f,
            "store = \"FOODORA_BILLA_PROSEK\" AND categoryKeys IN [\"mjul-a\", \"mjul-b\"] \
             AND inPromotion = true AND published = true"
        );
    }

    #[test]
    fn filter_escapes_quotes() {
        let f = build_filter(Some("BI\"LLA"), None, None, false).unwrap();
        assert_eq!(f, "store = \"BI\\\"LLA\"");
    }

    #[test]
    fn document_uses_camel_case_fields() {
        let p = sample_row();
        let doc = search_document(&p, &["billa-x".to_string()]);
        assert_eq!(doc["productId"], "p-1");
        assert_eq!(doc["categoryKeys"][0], "billa-x");
        assert_eq!(doc["inPromotion"], false);
        assert_eq!(doc["price"], 1250);
    }

    fn sample_row() -> ProductRow {
        ProductRow {
            id: 1,
            store: "BILLA".into(),
            product_id: "p-1".into(),
            sku: "sku-1".into(),
            slug: "mleko-1l".into(),
            name: "Mléko 1l".into(),
            description_short: None,
            description_long: None,
            regulated_product_name: None,
            category: "Mléčné výrobky".into(),
            category_slug: "mlecne-vyrobky".into(),
            brand: Some("Billa".into()),
            brand_slug: Some("billa".into()),
            price: Some(1250),
            price_per_unit: None,
            unit_price: None,
            regular_price: Some(1250),
            discount_price: None,
            lowest_price: None,
            in_promotion: false,
            amount: Some("1 l".into()),
            weight: None,
            package_label: None,
            package_label_key: None,
            volume_label_key: None,
            volume_label_short: None,
            base_unit_long: None,
            base_unit_short: None,
            images: None,
            product_marketing: None,
            brand_marketing: None,
            published: true,
            medical: false,
            weight_article: false,
            scraped_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }
}

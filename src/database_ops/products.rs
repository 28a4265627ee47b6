//! Product persistence. One row per (store, external product id); re-scrapes
//! land on the same row via the `product_id` natural key.

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use tracing::instrument;

use super::db::Db;

#[derive(Debug, Clone, FromRow)]
pub struct ProductRow {
    pub id: i32,
    pub store: String,
    pub product_id: String,
    pub sku: String,
    pub slug: String,
    pub name: String,
    pub description_short: Option<String>,
    pub description_long: Option<String>,
    pub regulated_product_name: Option<String>,
    pub category: String,
    pub category_slug: String,
    pub brand: Option<String>,
    pub brand_slug: Option<String>,
    pub price: Option<i32>,
    pub price_per_unit: Option<i32>,
    pub unit_price: Option<f64>,
    pub regular_price: Option<i32>,
    pub discount_price: Option<i32>,
    pub lowest_price: Option<i32>,
    pub in_promotion: bool,
    pub amount: Option<String>,
    pub weight: Option<f64>,
    pub package_label: Option<String>,
    pub package_label_key: Option<String>,
    pub volume_label_key: Option<String>,
    pub volume_label_short: Option<String>,
    pub base_unit_long: Option<String>,
    pub base_unit_short: Option<String>,
    pub images: Option<serde_json::Value>,
    pub product_marketing: Option<String>,
    pub brand_marketing: Option<String>,
    pub published: bool,
    pub medical: bool,
    pub weight_article: bool,
    pub scraped_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewProduct {
    pub store: String,
    pub product_id: String,
    pub sku: String,
    pub slug: String,
    pub name: String,
    pub description_short: Option<String>,
    pub description_long: Option<String>,
    pub regulated_product_name: Option<String>,
    pub category: String,
    pub category_slug: String,
    pub brand: Option<String>,
    pub brand_slug: Option<String>,
    pub price: Option<i32>,
    pub price_per_unit: Option<i32>,
    pub unit_price: Option<f64>,
    pub regular_price: Option<i32>,
    pub discount_price: Option<i32>,
    pub lowest_price: Option<i32>,
    pub in_promotion: bool,
    pub amount: Option<String>,
    pub weight: Option<f64>,
    pub package_label: Option<String>,
    pub package_label_key: Option<String>,
    pub volume_label_key: Option<String>,
    pub volume_label_short: Option<String>,
    pub base_unit_long: Option<String>,
    pub base_unit_short: Option<String>,
    pub images: Option<serde_json::Value>,
    pub product_marketing: Option<String>,
    pub brand_marketing: Option<String>,
    pub published: bool,
    pub medical: bool,
    pub weight_article: bool,
}

#[derive(Debug, Clone, FromRow)]
pub struct StoreCount {
    pub store: String,
    pub count: i64,
}

impl Db {
    /// Insert or refresh a product by its external id. Returns the row id.
    /// The saved product is also queued for search-index sync; the queue row
    /// survives until a push succeeds.
    #[instrument(skip(self, p), fields(product_id = %p.product_id, store = %p.store))]
    pub async fn upsert_product(&self, p: &NewProduct) -> Result<i32> {
        let id: i32 = sqlx::query_scalar(
            "INSERT INTO products (
                store, product_id, sku, slug, name,
                description_short, description_long, regulated_product_name,
                category, category_slug, brand, brand_slug,
                price, price_per_unit, unit_price,
                regular_price, discount_price, lowest_price,
                in_promotion, amount, weight,
                package_label, package_label_key, volume_label_key, volume_label_short,
                base_unit_long, base_unit_short,
                images, product_marketing, brand_marketing,
                published, medical, weight_article,
                scraped_at, updated_at
             ) VALUES (
                $1, $2, $3, $4, $5,
                $6, $7, $8,
                $9, $10, $11, $12,
                $13, $14, $15,
                $16, $17, $18,
                $19, $20, $21,
                $22, $23, $24, $25,
                $26, $27,
                $28, $29, $30,
                $31, $32, $33,
                now(), now()
             )
             ON CONFLICT (product_id) DO UPDATE SET
                store = EXCLUDED.store,
                sku = EXCLUDED.sku,
                slug = EXCLUDED.slug,
                name = EXCLUDED.name,
                description_short = EXCLUDED.description_short,
                description_long = EXCLUDED.description_long,
                regulated_product_name = EXCLUDED.regulated_product_name,
                category = EXCLUDED.category,
                category_slug = EXCLUDED.category_slug,
                brand = EXCLUDED.brand,
                brand_slug = EXCLUDED.brand_slug,
                price = EXCLUDED.price,
                price_per_unit = EXCLUDED.price_per_unit,
                unit_price = EXCLUDED.unit_price,
                regular_price = EXCLUDED.regular_price,
                discount_price = EXCLUDED.discount_price,
                lowest_price = EXCLUDED.lowest_price,
                in_promotion = EXCLUDED.in_promotion,
                amount = EXCLUDED.amount,
                weight = EXCLUDED.weight,
                package_label = EXCLUDED.package_label,
                package_label_key = EXCLUDED.package_label_key,
                volume_label_key = EXCLUDED.volume_label_key,
                volume_label_short = EXCLUDED.volume_label_short,
                base_unit_long = EXCLUDED.base_unit_long,
                base_unit_short = EXCLUDED.base_unit_short,
                images = EXCLUDED.images,
                product_marketing = EXCLUDED.product_marketing,
                brand_marketing = EXCLUDED.brand_marketing,
                published = EXCLUDED.published,
                medical = EXCLUDED.medical,
                weight_article = EXCLUDED.weight_article,
                scraped_at = now(),
                updated_at = now()
             RETURNING id",
        )
        .bind(&p.store)
        .bind(&p.product_id)
        .bind(&p.sku)
        .bind(&p.slug)
        .bind(&p.name)
        .bind(&p.description_short)
        .bind(&p.description_long)
        .bind(&p.regulated_product_name)
        .bind(&p.category)
        .bind(&p.category_slug)
        .bind(&p.brand)
        .bind(&p.brand_slug)
        .bind(p.price)
        .bind(p.price_per_unit)
        .bind(p.unit_price)
        .bind(p.regular_price)
        .bind(p.discount_price)
        .bind(p.lowest_price)
        .bind(p.in_promotion)
        .bind(&p.amount)
        .bind(p.weight)
        .bind(&p.package_label)
        .bind(&p.package_label_key)
        .bind(&p.volume_label_key)
        .bind(&p.volume_label_short)
        .bind(&p.base_unit_long)
        .bind(&p.base_unit_short)
        .bind(&p.images)
        .bind(&p.product_marketing)
        .bind(&p.brand_marketing)
        .bind(p.published)
        .bind(p.medical)
        .bind(p.weight_article)
        .fetch_one(&self.pool)
        .await?;

        self.enqueue_search_sync(id).await?;
        Ok(id)
    }

    pub async fn product_count(&self) -> Result<i64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }

    pub async fn product_counts_by_store(&self) -> Result<Vec<StoreCount>> {
        let rows = sqlx::query_as::<_, StoreCount>(
            "SELECT store, COUNT(*) AS count FROM products GROUP BY store ORDER BY store",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn product_by_row_id(&self, id: i32) -> Result<Option<ProductRow>> {
        let row = sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn product_by_external_id(&self, product_id: &str) -> Result<Option<ProductRow>> {
        let row = sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE product_id = $1")
            .bind(product_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn product_by_slug(&self, slug: &str) -> Result<Option<ProductRow>> {
        let row = sqlx::query_as::<_, ProductRow>(
            "SELECT * FROM products WHERE slug = $1 ORDER BY id LIMIT 1",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn products_by_row_ids(&self, ids: &[i32]) -> Result<Vec<ProductRow>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Page of products belonging to any of the given categories, via the
    /// junction table, newest scrape first. Returns (rows, total).
    pub async fn products_in_categories(
        &self,
        category_ids: &[i32],
        store: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<ProductRow>, i64)> {
        if category_ids.is_empty() {
            return Ok((Vec::new(), 0));
        }
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(DISTINCT pc.product_id)
             FROM product_categories pc
             JOIN products p ON p.id = pc.product_id
             WHERE pc.category_id = ANY($1)
               AND ($2::text IS NULL OR p.store = $2)",
        )
        .bind(category_ids)
        .bind(store)
        .fetch_one(&self.pool)
        .await?;
        let rows = sqlx::query_as::<_, ProductRow>(
            "SELECT p.* FROM products p
             WHERE ($2::text IS NULL OR p.store = $2)
               AND p.id IN (
                SELECT DISTINCT pc.product_id
                FROM product_categories pc
                WHERE pc.category_id = ANY($1)
             )
             ORDER BY p.scraped_at DESC, p.id
             LIMIT $3 OFFSET $4",
        )
        .bind(category_ids)
        .bind(store)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok((rows, total))
    }

    /// Wipes the product catalog. Junction and queue rows go with it via
    /// ON DELETE CASCADE.
    pub async fn delete_all_products(&self) -> Result<u64> {
        let res = sqlx::query("DELETE FROM products").execute(&self.pool).await?;
        Ok(res.rows_affected())
    }
}

//! Product/category membership. A product can sit in several categories
//! (its primary one plus any ancestors or cross-listings the scrape reports).

use anyhow::Result;

use super::categories::Category;
use super::db::Db;

impl Db {
    /// Idempotent link; re-linking an existing pair is a no-op.
    pub async fn link_product_category(&self, product_id: i32, category_id: i32) -> Result<()> {
        sqlx::query(
            "INSERT INTO product_categories (product_id, category_id)
             VALUES ($1, $2)
             ON CONFLICT (product_id, category_id) DO NOTHING",
        )
        .bind(product_id)
        .bind(category_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn link_product_categories(
        &self,
        product_id: i32,
        category_ids: &[i32],
    ) -> Result<()> {
        for &cid in category_ids {
            self.link_product_category(product_id, cid).await?;
        }
        Ok(())
    }

    pub async fn unlink_product_category(&self, product_id: i32, category_id: i32) -> Result<()> {
        sqlx::query(
            "DELETE FROM product_categories WHERE product_id = $1 AND category_id = $2",
        )
        .bind(product_id)
        .bind(category_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Category keys a product belongs to, for search documents and API
    /// responses.
    pub async fn category_keys_for_product(&self, product_id: i32) -> Result<Vec<String>> {
        let keys: Vec<String> = sqlx::query_scalar(
            "SELECT c.key
             FROM product_categories pc
             JOIN categories c ON c.id = pc.category_id
             WHERE pc.product_id = $1
             ORDER BY c.key",
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(keys)
    }

    /// Full category rows per product, for API responses.
    pub async fn categories_for_products(
        &self,
        product_ids: &[i32],
    ) -> Result<std::collections::HashMap<i32, Vec<Category>>> {
        let mut out: std::collections::HashMap<i32, Vec<Category>> =
            std::collections::HashMap::new();
        if product_ids.is_empty() {
            return Ok(out);
        }
        let rows: Vec<(i32, Category)> = sqlx::query_as::<_, (i32, i32, String, String, String, Option<String>, Option<i32>, chrono::DateTime<chrono::Utc>, chrono::DateTime<chrono::Utc>)>(
            "SELECT pc.product_id, c.id, c.key, c.name, c.slug, c.order_hint, c.parent_id, c.created_at, c.updated_at
             FROM product_categories pc
             JOIN categories c ON c.id = pc.category_id
             WHERE pc.product_id = ANY($1)
             ORDER BY pc.product_id, c.key",
        )
        .bind(product_ids)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|(pid, id, key, name, slug, order_hint, parent_id, created_at, updated_at)| {
            (
                pid,
                Category {
                    id,
                    key,
                    name,
                    slug,
                    order_hint,
                    parent_id,
                    created_at,
                    updated_at,
                },
            )
        })
        .collect();
        for (pid, cat) in rows {
            out.entry(pid).or_default().push(cat);
        }
        Ok(out)
    }

    /// Batched variant: map of product id to its category keys.
    pub async fn category_keys_for_products(
        &self,
        product_ids: &[i32],
    ) -> Result<std::collections::HashMap<i32, Vec<String>>> {
        let mut out: std::collections::HashMap<i32, Vec<String>> = std::collections::HashMap::new();
        if product_ids.is_empty() {
            return Ok(out);
        }
        let rows: Vec<(i32, String)> = sqlx::query_as(
            "SELECT pc.product_id, c.key
             FROM product_categories pc
             JOIN categories c ON c.id = pc.category_id
             WHERE pc.product_id = ANY($1)
             ORDER BY pc.product_id, c.key",
        )
        .bind(product_ids)
        .fetch_all(&self.pool)
        .await?;
        for (pid, key) in rows {
            out.entry(pid).or_default().push(key);
        }
        Ok(out)
    }
}

//! Category forest persistence. Categories are addressed by a store-scoped
//! natural key (`{STORE}-{external id}` for delivery stores, the site slug for
//! Billa) and form a tree via `parent_id`.

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use tracing::{info, instrument};

use super::db::Db;

#[derive(Debug, Clone, FromRow)]
pub struct Category {
    pub id: i32,
    pub key: String,
    pub name: String,
    pub slug: String,
    pub order_hint: Option<String>,
    pub parent_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCategory {
    pub key: String,
    pub name: String,
    pub slug: String,
    pub order_hint: Option<String>,
    pub parent_id: Option<i32>,
}

/// Minimal projection used by the in-memory descendant expansion.
#[derive(Debug, Clone, FromRow)]
pub struct CategoryNode {
    pub id: i32,
    pub key: String,
    pub slug: String,
    pub parent_id: Option<i32>,
}

/// A category definition as it appears in the bundled catalog JSON files.
/// `children` nests arbitrarily deep.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub number_of_products: Option<i64>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub children: Vec<CategoryDefinition>,
}

/// Expands `start` (a category key, or a slug as fallback) to the keys of the
/// whole subtree rooted at it, start's own key first, depth-first, without
/// duplicates. Unknown start yields an empty vec.
pub fn descendant_keys(rows: &[CategoryNode], start: &str) -> Vec<String> {
    let root = rows
        .iter()
        .find(|r| r.key == start)
        .or_else(|| rows.iter().find(|r| r.slug == start));
    let Some(root) = root else {
        return Vec::new();
    };

    let mut out: Vec<String> = vec![root.key.clone()];
    let mut seen: std::collections::HashSet<i32> = std::collections::HashSet::new();
    seen.insert(root.id);
    let mut frontier: Vec<i32> = vec![root.id];
    while let Some(parent) = frontier.pop() {
        for r in rows.iter().filter(|r| r.parent_id == Some(parent)) {
            if seen.insert(r.id) {
                out.push(r.key.clone());
                frontier.push(r.id);
            }
        }
    }
    out
}

impl Db {
    /// Insert or refresh a category addressed by its natural key.
    /// `parent_id` is always taken from the incoming row so re-scrapes can
    /// re-parent a moved category.
    #[instrument(skip(self, cat), fields(key = %cat.key))]
    pub async fn upsert_category(&self, cat: &NewCategory) -> Result<Category> {
        let row = sqlx::query_as::<_, Category>(
            "INSERT INTO categories (key, name, slug, order_hint, parent_id)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (key) DO UPDATE
                SET name = EXCLUDED.name,
                    slug = EXCLUDED.slug,
                    order_hint = EXCLUDED.order_hint,
                    parent_id = EXCLUDED.parent_id,
                    updated_at = now()
             RETURNING id, key, name, slug, order_hint, parent_id, created_at, updated_at",
        )
        .bind(&cat.key)
        .bind(&cat.name)
        .bind(&cat.slug)
        .bind(&cat.order_hint)
        .bind(cat.parent_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn category_by_key(&self, key: &str) -> Result<Option<Category>> {
        let row = sqlx::query_as::<_, Category>(
            "SELECT id, key, name, slug, order_hint, parent_id, created_at, updated_at
             FROM categories WHERE key = $1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn category_by_slug(&self, slug: &str) -> Result<Option<Category>> {
        let row = sqlx::query_as::<_, Category>(
            "SELECT id, key, name, slug, order_hint, parent_id, created_at, updated_at
             FROM categories WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn all_categories(&self) -> Result<Vec<Category>> {
        let rows = sqlx::query_as::<_, Category>(
            "SELECT id, key, name, slug, order_hint, parent_id, created_at, updated_at
             FROM categories ORDER BY key",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn root_categories(&self) -> Result<Vec<Category>> {
        let rows = sqlx::query_as::<_, Category>(
            "SELECT id, key, name, slug, order_hint, parent_id, created_at, updated_at
             FROM categories WHERE parent_id IS NULL ORDER BY key",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn child_categories(&self, parent_id: i32) -> Result<Vec<Category>> {
        let rows = sqlx::query_as::<_, Category>(
            "SELECT id, key, name, slug, order_hint, parent_id, created_at, updated_at
             FROM categories WHERE parent_id = $1 ORDER BY key",
        )
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Product count per category, optionally restricted to one store.
    pub async fn category_product_counts(
        &self,
        store: Option<&str>,
    ) -> Result<std::collections::HashMap<i32, i64>> {
        let rows: Vec<(i32, i64)> = sqlx::query_as(
            "SELECT pc.category_id, COUNT(*)
             FROM product_categories pc
             JOIN products p ON p.id = pc.product_id
             WHERE ($1::text IS NULL OR p.store = $1)
             GROUP BY pc.category_id",
        )
        .bind(store)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().collect())
    }

    pub async fn category_count(&self) -> Result<i64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }

    async fn category_nodes(&self) -> Result<Vec<CategoryNode>> {
        let rows = sqlx::query_as::<_, CategoryNode>(
            "SELECT id, key, slug, parent_id FROM categories",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// All keys in the subtree rooted at `start` (a key or slug); empty when
    /// `start` resolves to nothing.
    pub async fn all_descendant_category_keys(&self, start: &str) -> Result<Vec<String>> {
        let nodes = self.category_nodes().await?;
        Ok(descendant_keys(&nodes, start))
    }

    /// Same expansion but returning internal ids, for junction-table joins.
    pub async fn all_descendant_category_ids(&self, start: &str) -> Result<Vec<i32>> {
        let nodes = self.category_nodes().await?;
        let keys = descendant_keys(&nodes, start);
        let ids = keys
            .iter()
            .filter_map(|k| nodes.iter().find(|n| &n.key == k).map(|n| n.id))
            .collect();
        Ok(ids)
    }

    /// Persist a whole category tree. Parents are saved before children so
    /// each child can reference its parent's freshly assigned id. `key_for`
    /// derives the natural key from a definition; `slug_for` the slug.
    #[instrument(skip_all, fields(roots = defs.len()))]
    pub async fn save_category_tree(
        &self,
        defs: &[CategoryDefinition],
        key_for: &dyn Fn(&CategoryDefinition) -> String,
        slug_for: &dyn Fn(&CategoryDefinition) -> String,
    ) -> Result<usize> {
        let mut saved = 0usize;
        // Pre-order worklist: push children in reverse so they pop in order.
        let mut stack: Vec<(&CategoryDefinition, Option<i32>)> =
            defs.iter().rev().map(|d| (d, None)).collect();
        while let Some((def, parent_id)) = stack.pop() {
            let cat = self
                .upsert_category(&NewCategory {
                    key: key_for(def),
                    name: def.name.clone(),
                    slug: slug_for(def),
                    order_hint: def.number_of_products.map(|n| n.to_string()),
                    parent_id,
                })
                .await?;
            saved += 1;
            for child in def.children.iter().rev() {
                stack.push((child, Some(cat.id)));
            }
        }
        info!(saved, "category tree saved");
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: i32, key: &str, slug: &str, parent: Option<i32>) -> CategoryNode {
        CategoryNode {
            id,
            key: key.to_string(),
            slug: slug.to_string(),
            parent_id: parent,
        }
    }

    fn forest() -> Vec<CategoryNode> {
        vec![
            node(1, "mjul-root", "ovoce-a-zelenina", None),
            node(2, "mjul-fruit", "ovoce", Some(1)),
            node(3, "mjul-veg", "zelenina", Some(1)),
            node(4, "mjul-herbs", "bylinky", Some(3)),
            node(5, "obc6-other", "pecivo", None),
        ]
    }

    #[test]
    fn expands_subtree_start_first() {
        let keys = descendant_keys(&forest(), "mjul-root");
        assert_eq!(keys[0], "mjul-root");
        assert_eq!(keys.len(), 4);
        assert!(keys.contains(&"mjul-herbs".to_string()));
        assert!(!keys.contains(&"obc6-other".to_string()));
    }

    #[test]
    fn falls_back_to_slug_lookup() {
        let keys = descendant_keys(&forest(), "zelenina");
        assert_eq!(keys, vec!["mjul-veg".to_string(), "mjul-herbs".to_string()]);
    }

    #[test]
    fn unknown_start_is_empty() {
        assert!(descendant_keys(&forest(), "nope").is_empty());
    }

    #[test]
    fn leaf_expands_to_itself() {
        let keys = descendant_keys(&forest(), "mjul-fruit");
        assert_eq!(keys, vec!["mjul-fruit".to_string()]);
    }

    #[test]
    fn definition_json_parses_nested_children() {
        let raw = r#"[{"id":"a1","name":"Ovoce a zelenina","numberOfProducts":10,"type":"DEFAULT",
                       "children":[{"id":"b2","name":"Ovoce","numberOfProducts":4,"type":"DEFAULT"}]}]"#;
        let defs: Vec<CategoryDefinition> = serde_json::from_str(raw).unwrap();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].children.len(), 1);
        assert_eq!(defs[0].children[0].name, "Ovoce");
        assert_eq!(defs[0].number_of_products, Some(10));
    }
}

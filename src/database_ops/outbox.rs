//! Search sync queue. Every product save enqueues its row id here; a sync
//! pass drains the queue into the search index and deletes rows only after a
//! successful push, so delivery is at-least-once.

use anyhow::Result;
use tracing::{info, instrument, warn};

use super::db::Db;
use super::search::{search_document, SearchIndex};

const SYNC_BATCH: i64 = 500;

impl Db {
    pub async fn enqueue_search_sync(&self, product_id: i32) -> Result<()> {
        sqlx::query(
            "INSERT INTO search_outbox (product_id)
             VALUES ($1)
             ON CONFLICT (product_id) DO UPDATE SET enqueued_at = now()",
        )
        .bind(product_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn outbox_depth(&self) -> Result<i64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM search_outbox")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }

    async fn outbox_batch(&self, limit: i64) -> Result<Vec<i32>> {
        let ids: Vec<i32> = sqlx::query_scalar(
            "SELECT product_id FROM search_outbox ORDER BY enqueued_at LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    async fn outbox_delete(&self, ids: &[i32]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        sqlx::query("DELETE FROM search_outbox WHERE product_id = ANY($1)")
            .bind(ids)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// Drains one batch of queued products into the index. Returns how many
/// products were pushed; 0 means the queue is empty.
#[instrument(skip(db, index))]
pub async fn sync_once(db: &Db, index: &SearchIndex) -> Result<usize> {
    let ids = db.outbox_batch(SYNC_BATCH).await?;
    if ids.is_empty() {
        return Ok(0);
    }
    let rows = db.products_by_row_ids(&ids).await?;
    let keys_by_product = db.category_keys_for_products(&ids).await?;
    let docs: Vec<serde_json::Value> = rows
        .iter()
        .map(|p| {
            let keys = keys_by_product
                .get(&p.id)
                .map(|k| k.as_slice())
                .unwrap_or_default();
            search_document(p, keys)
        })
        .collect();
    index.add_documents(&docs).await?;
    // A queued id whose product row vanished (deleted catalog) has nothing to
    // push; it is still drained below.
    db.outbox_delete(&ids).await?;
    info!(pushed = docs.len(), drained = ids.len(), "search sync batch");
    Ok(docs.len())
}

/// Drains the queue until empty, then either returns or keeps polling.
pub async fn run_sync(db: &Db, index: &SearchIndex, poll: std::time::Duration, forever: bool) -> Result<()> {
    loop {
        loop {
            match sync_once(db, index).await {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "search sync batch failed; queue retained");
                    break;
                }
            }
        }
        if !forever {
            return Ok(());
        }
        tokio::time::sleep(poll).await;
    }
}

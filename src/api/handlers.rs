// HTTP request handlers for API endpoints

use crate::api::models::*;
use crate::database_ops::db::Db;
use crate::database_ops::products::ProductRow;
use crate::database_ops::search::{build_filter, SearchIndex, SearchQuery};
use actix_web::{web, HttpResponse, Result};
use std::collections::HashMap;
use std::time::SystemTime;

const DEFAULT_PAGE_SIZE: i64 = 30;
const MAX_PAGE_SIZE: i64 = 100;
const DEFAULT_PROMOTIONS_LIMIT: i64 = 20;

/// Health check endpoint
pub async fn health_check(db: web::Data<Db>) -> Result<HttpResponse> {
    let db_status = match sqlx::query_scalar::<_, bool>("SELECT true")
        .fetch_one(&db.pool)
        .await
    {
        Ok(_) => "connected",
        Err(_) => "disconnected",
    };

    let uptime = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    let response = ApiResponse::success(HealthResponse {
        status: "healthy".to_string(),
        database: db_status.to_string(),
        uptime_seconds: uptime,
    });

    Ok(HttpResponse::Ok().json(response))
}

fn page_params(page: Option<i64>, limit: Option<i64>) -> (i64, i64) {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    (page, limit)
}

/// Maps a root category slug to the store it was scraped from. Delivery-store
/// categories carry their store code as a slug prefix; everything else is the
/// webshop.
pub fn store_for_category_slug(slug: &str) -> &'static str {
    if slug.starts_with("foodora-billa-prosek-") {
        "FOODORA_BILLA_PROSEK"
    } else if slug.starts_with("foodora-albert-florenc-") {
        "FOODORA_ALBERT_FLORENC"
    } else if slug.starts_with("foodora-dmart-") {
        "FOODORA_DMART"
    } else {
        "BILLA"
    }
}

/// Reorders DB rows back into the ranking order the search index returned.
pub fn order_rows_by_ids(mut rows: Vec<ProductRow>, ids: &[i32]) -> Vec<ProductRow> {
    let rank: HashMap<i32, usize> = ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();
    rows.sort_by_key(|r| rank.get(&r.id).copied().unwrap_or(usize::MAX));
    rows
}

async fn rows_to_dtos(db: &Db, rows: &[ProductRow]) -> anyhow::Result<Vec<ProductDto>> {
    let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
    let mut cats = db.categories_for_products(&ids).await?;
    Ok(rows
        .iter()
        .map(|r| {
            let dto_cats = cats
                .remove(&r.id)
                .unwrap_or_default()
                .iter()
                .map(CategoryDto::from)
                .collect();
            ProductDto::from_row(r, dto_cats)
        })
        .collect())
}

fn internal_error(e: anyhow::Error) -> HttpResponse {
    tracing::error!(error = %e, "request failed");
    HttpResponse::InternalServerError().json(ApiResponse::<()>::error("internal error"))
}

/// Product listing: full-text search plus filters, served from the search
/// index and enriched from Postgres.
pub async fn get_products(
    query: web::Query<ProductListQuery>,
    db: web::Data<Db>,
    search: web::Data<SearchIndex>,
) -> Result<HttpResponse> {
    let (page, limit) = page_params(query.page, query.limit);

    // Category filter expands to the whole subtree. An unresolvable category
    // matches nothing rather than everything.
    let category_keys = match &query.category {
        Some(category) => match db.all_descendant_category_keys(category).await {
            Ok(keys) if keys.is_empty() => {
                let empty: Paginated<ProductDto> = Paginated {
                    data: vec![],
                    pagination: Pagination::new(page, limit, 0),
                };
                return Ok(HttpResponse::Ok().json(ApiResponse::success(empty)));
            }
            Ok(keys) => Some(keys),
            Err(e) => return Ok(internal_error(e)),
        },
        None => None,
    };

    let filter = build_filter(
        query.store.as_deref(),
        category_keys.as_deref(),
        query.in_promotion,
        false,
    );
    let search_query = SearchQuery {
        q: query.search.clone(),
        filter,
        sort: None,
        limit,
        offset: (page - 1) * limit,
    };
    let page_result = match search.search(&search_query).await {
        Ok(r) => r,
        Err(e) => return Ok(internal_error(e)),
    };

    let rows = match db.products_by_row_ids(&page_result.ids).await {
        Ok(r) => order_rows_by_ids(r, &page_result.ids),
        Err(e) => return Ok(internal_error(e)),
    };
    let data = match rows_to_dtos(&db, &rows).await {
        Ok(d) => d,
        Err(e) => return Ok(internal_error(e)),
    };

    let body = Paginated {
        data,
        pagination: Pagination::new(page, limit, page_result.estimated_total_hits),
    };
    Ok(HttpResponse::Ok().json(ApiResponse::success(body)))
}

/// Products currently on promotion.
pub async fn get_promotions(
    query: web::Query<PromotionsQuery>,
    db: web::Data<Db>,
    search: web::Data<SearchIndex>,
) -> Result<HttpResponse> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PROMOTIONS_LIMIT)
        .clamp(1, MAX_PAGE_SIZE);
    let filter = build_filter(query.store.as_deref(), None, Some(true), false);
    let search_query = SearchQuery {
        q: None,
        filter,
        sort: None,
        limit,
        offset: 0,
    };
    let page_result = match search.search(&search_query).await {
        Ok(r) => r,
        Err(e) => return Ok(internal_error(e)),
    };
    let rows = match db.products_by_row_ids(&page_result.ids).await {
        Ok(r) => order_rows_by_ids(r, &page_result.ids),
        Err(e) => return Ok(internal_error(e)),
    };
    let data = match rows_to_dtos(&db, &rows).await {
        Ok(d) => d,
        Err(e) => return Ok(internal_error(e)),
    };
    Ok(HttpResponse::Ok().json(ApiResponse::success(data)))
}

pub async fn get_product_by_id(
    path: web::Path<i32>,
    db: web::Data<Db>,
) -> Result<HttpResponse> {
    let id = path.into_inner();
    match db.product_by_row_id(id).await {
        Ok(Some(row)) => match rows_to_dtos(&db, std::slice::from_ref(&row)).await {
            Ok(mut dtos) => Ok(HttpResponse::Ok().json(ApiResponse::success(dtos.remove(0)))),
            Err(e) => Ok(internal_error(e)),
        },
        Ok(None) => {
            Ok(HttpResponse::NotFound().json(ApiResponse::<()>::error("product not found")))
        }
        Err(e) => Ok(internal_error(e)),
    }
}

pub async fn get_product_by_slug(
    path: web::Path<String>,
    db: web::Data<Db>,
) -> Result<HttpResponse> {
    let slug = path.into_inner();
    match db.product_by_slug(&slug).await {
        Ok(Some(row)) => match rows_to_dtos(&db, std::slice::from_ref(&row)).await {
            Ok(mut dtos) => Ok(HttpResponse::Ok().json(ApiResponse::success(dtos.remove(0)))),
            Err(e) => Ok(internal_error(e)),
        },
        Ok(None) => {
            Ok(HttpResponse::NotFound().json(ApiResponse::<()>::error("product not found")))
        }
        Err(e) => Ok(internal_error(e)),
    }
}

/// Root categories grouped by store, with product counts and one level of
/// subcategories.
pub async fn get_categories(
    query: web::Query<CategoriesQuery>,
    db: web::Data<Db>,
) -> Result<HttpResponse> {
    let all = match db.all_categories().await {
        Ok(c) => c,
        Err(e) => return Ok(internal_error(e)),
    };
    let counts = match db.category_product_counts(query.store.as_deref()).await {
        Ok(c) => c,
        Err(e) => return Ok(internal_error(e)),
    };

    let mut children: HashMap<i32, Vec<&crate::database_ops::categories::Category>> =
        HashMap::new();
    for cat in &all {
        if let Some(parent) = cat.parent_id {
            children.entry(parent).or_default().push(cat);
        }
    }

    let mut grouped: HashMap<String, Vec<CategoryWithCount>> = HashMap::new();
    for cat in all.iter().filter(|c| c.parent_id.is_none()) {
        let store = store_for_category_slug(&cat.slug);
        if let Some(wanted) = query.store.as_deref() {
            if store != wanted {
                continue;
            }
        }
        let subcategories: Vec<CategoryWithCount> = children
            .get(&cat.id)
            .map(|kids| {
                kids.iter()
                    .map(|child| CategoryWithCount {
                        category: CategoryDto::from(*child),
                        product_count: counts.get(&child.id).copied().unwrap_or(0),
                        store: store.to_string(),
                        subcategories: None,
                    })
                    .collect()
            })
            .unwrap_or_default();
        grouped.entry(store.to_string()).or_default().push(CategoryWithCount {
            category: CategoryDto::from(cat),
            product_count: counts.get(&cat.id).copied().unwrap_or(0),
            store: store.to_string(),
            subcategories: (!subcategories.is_empty()).then_some(subcategories),
        });
    }

    Ok(HttpResponse::Ok().json(ApiResponse::success(grouped)))
}

pub async fn get_category_by_slug(
    path: web::Path<String>,
    db: web::Data<Db>,
) -> Result<HttpResponse> {
    let slug = path.into_inner();
    match db.category_by_slug(&slug).await {
        Ok(Some(cat)) => {
            Ok(HttpResponse::Ok().json(ApiResponse::success(CategoryDto::from(&cat))))
        }
        Ok(None) => {
            Ok(HttpResponse::NotFound().json(ApiResponse::<()>::error("category not found")))
        }
        Err(e) => Ok(internal_error(e)),
    }
}

/// Products in a category subtree, paginated straight from Postgres. An
/// unknown slug yields an empty page.
pub async fn get_category_products(
    path: web::Path<String>,
    query: web::Query<CategoryProductsQuery>,
    db: web::Data<Db>,
) -> Result<HttpResponse> {
    let slug = path.into_inner();
    let (page, limit) = page_params(query.page, query.limit);

    let category_ids = match db.all_descendant_category_ids(&slug).await {
        Ok(ids) => ids,
        Err(e) => return Ok(internal_error(e)),
    };
    let (rows, total) = match db
        .products_in_categories(&category_ids, query.store.as_deref(), limit, (page - 1) * limit)
        .await
    {
        Ok(r) => r,
        Err(e) => return Ok(internal_error(e)),
    };
    let data = match rows_to_dtos(&db, &rows).await {
        Ok(d) => d,
        Err(e) => return Ok(internal_error(e)),
    };
    let body = Paginated {
        data,
        pagination: Pagination::new(page, limit, total),
    };
    Ok(HttpResponse::Ok().json(ApiResponse::success(body)))
}

/// Stores with product counts.
pub async fn get_stores(db: web::Data<Db>) -> Result<HttpResponse> {
    match db.product_counts_by_store().await {
        Ok(counts) => {
            let data: Vec<StoreCountDto> = counts
                .into_iter()
                .map(|c| StoreCountDto {
                    store: c.store,
                    count: c.count,
                })
                .collect();
            Ok(HttpResponse::Ok().json(ApiResponse::success(data)))
        }
        Err(e) => Ok(internal_error(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn row(id: i32) -> ProductRow {
        ProductRow {
            id,
            store: "BILLA".into(),
            product_id: format!("p-{id}"),
            sku: format!("{id}"),
            slug: format!("product-{id}"),
            name: format!("Product {id}"),
            description_short: None,
            description_long: None,
            regulated_product_name: None,
            category: "C".into(),
            category_slug: "c".into(),
            brand: None,
            brand_slug: None,
            price: None,
            price_per_unit: None,
            unit_price: None,
            regular_price: None,
            discount_price: None,
            lowest_price: None,
            in_promotion: false,
            amount: None,
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
            scraped_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn rows_follow_search_ranking() {
        let rows = vec![row(1), row(2), row(3)];
        let ordered = order_rows_by_ids(rows, &[3, 1, 2]);
        let ids: Vec<i32> = ordered.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn unranked_rows_sink_to_the_end() {
        let rows = vec![row(9), row(3)];
        let ordered = order_rows_by_ids(rows, &[3]);
        let ids: Vec<i32> = ordered.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 9]);
    }

    #[test]
    fn slug_prefix_decides_store() {
        assert_eq!(
            store_for_category_slug("foodora-billa-prosek-ovoce"),
            "FOODORA_BILLA_PROSEK"
        );
        assert_eq!(
            store_for_category_slug("foodora-albert-florenc-napoje"),
            "FOODORA_ALBERT_FLORENC"
        );
        assert_eq!(store_for_category_slug("foodora-dmart-pecivo"), "FOODORA_DMART");
        assert_eq!(store_for_category_slug("napoje-1474"), "BILLA");
    }

    #[test]
    fn page_params_clamp_and_default() {
        assert_eq!(page_params(None, None), (1, 30));
        assert_eq!(page_params(Some(0), Some(500)), (1, 100));
        assert_eq!(page_params(Some(3), Some(10)), (3, 10));
    }
}

// API request/response models (DTOs)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::database_ops::categories::Category;
use crate::database_ops::products::ProductRow;

/// Standard API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            meta: Some(Meta::now()),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            meta: Some(Meta::now()),
        }
    }
}

/// Metadata included in all API responses
#[derive(Debug, Serialize, Deserialize)]
pub struct Meta {
    pub timestamp: DateTime<Utc>,
    pub request_id: String,
    pub version: String,
}

impl Meta {
    pub fn now() -> Self {
        Self {
            timestamp: Utc::now(),
            request_id: uuid::Uuid::new_v4().to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
    pub uptime_seconds: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        let total_pages = if limit > 0 {
            (total + limit - 1) / limit
        } else {
            0
        };
        Self {
            page,
            limit,
            total,
            total_pages,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDto {
    pub id: i32,
    pub key: String,
    pub name: String,
    pub slug: String,
    pub order_hint: Option<String>,
    pub parent_id: Option<i32>,
}

impl From<&Category> for CategoryDto {
    fn from(c: &Category) -> Self {
        Self {
            id: c.id,
            key: c.key.clone(),
            name: c.name.clone(),
            slug: c.slug.clone(),
            order_hint: c.order_hint.clone(),
            parent_id: c.parent_id,
        }
    }
}

/// Category with product count for the grouped listing, one level of
/// subcategories deep.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryWithCount {
    #[serde(flatten)]
    pub category: CategoryDto,
    pub product_count: i64,
    pub store: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subcategories: Option<Vec<CategoryWithCount>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDto {
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
    pub base_unit_long: Option<String>,
    pub base_unit_short: Option<String>,
    pub images: Option<serde_json::Value>,
    pub published: bool,
    pub scraped_at: DateTime<Utc>,
    pub categories: Vec<CategoryDto>,
}

impl ProductDto {
    pub fn from_row(p: &ProductRow, categories: Vec<CategoryDto>) -> Self {
        Self {
            id: p.id,
            store: p.store.clone(),
            product_id: p.product_id.clone(),
            sku: p.sku.clone(),
            slug: p.slug.clone(),
            name: p.name.clone(),
            description_short: p.description_short.clone(),
            description_long: p.description_long.clone(),
            regulated_product_name: p.regulated_product_name.clone(),
            category: p.category.clone(),
            category_slug: p.category_slug.clone(),
            brand: p.brand.clone(),
            brand_slug: p.brand_slug.clone(),
            price: p.price,
            price_per_unit: p.price_per_unit,
            unit_price: p.unit_price,
            regular_price: p.regular_price,
            discount_price: p.discount_price,
            lowest_price: p.lowest_price,
            in_promotion: p.in_promotion,
            amount: p.amount.clone(),
            weight: p.weight,
            base_unit_long: p.base_unit_long.clone(),
            base_unit_short: p.base_unit_short.clone(),
            images: p.images.clone(),
            published: p.published,
            scraped_at: p.scraped_at,
            categories,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListQuery {
    pub category: Option<String>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub in_promotion: Option<bool>,
    pub store: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PromotionsQuery {
    pub limit: Option<i64>,
    pub store: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CategoriesQuery {
    pub store: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CategoryProductsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub store: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StoreCountDto {
    pub store: String,
    pub count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_rounds_pages_up() {
        let p = Pagination::new(1, 30, 61);
        assert_eq!(p.total_pages, 3);
        let p = Pagination::new(1, 30, 60);
        assert_eq!(p.total_pages, 2);
        let p = Pagination::new(1, 30, 0);
        assert_eq!(p.total_pages, 0);
    }
}

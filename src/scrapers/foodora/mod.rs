//! Foodora quick-commerce scraper: GraphQL catalog API, one vendor per
//! physical store.

pub mod catalog;
pub mod client;
pub mod details;
pub mod mapper;
pub mod queries;
pub mod scraper;
pub mod session;
pub mod types;

pub const FOODORA_API_URL: &str = "https://cz.fd-api.com/api/v5/graphql";
pub const DEFAULT_VENDOR_CODE: &str = "o7b0";
pub const DEFAULT_USER_CODE: &str = "cz6a15cx";
pub const GLOBAL_ENTITY_ID: &str = "DJ_CZ";
pub const LOCALE: &str = "cs_CZ";

pub const CROSS_SELL_COMPLIANCE_LEVEL: i32 = 7;

/// Product attributes requested alongside every product payload.
pub const PRODUCT_ATTRIBUTES: &[&str] = &[
    "baseContentValue",
    "baseUnit",
    "freshnessGuaranteeInDays",
    "maximumSalesQuantity",
    "minPriceLastMonth",
    "pricePerBaseUnit",
    "sku",
    "nutri_grade",
    "sugar_level",
];

pub fn feature_flags() -> serde_json::Value {
    serde_json::json!([{ "key": "pd-qc-weight-stepper", "value": "Variation1" }])
}

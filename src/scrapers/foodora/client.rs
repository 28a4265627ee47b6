//! HTTP client for the GraphQL catalog endpoint. Headers mimic the storefront
//! web client; session ids are regenerated per request.

use anyhow::{anyhow, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, instrument};

use super::details::ProductDetailsResponse;
use super::queries::{CATEGORY_PRODUCTS_QUERY, PRODUCT_DETAILS_QUERY};
use super::session::{dps_session_id, perseus_client_id, perseus_session_id};
use super::types::CategoryProductListResponse;
use super::{
    feature_flags, CROSS_SELL_COMPLIANCE_LEVEL, FOODORA_API_URL, GLOBAL_ENTITY_ID, LOCALE,
    PRODUCT_ATTRIBUTES,
};

const USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:146.0) Gecko/20100101 Firefox/146.0";

pub struct FoodoraClient {
    http: reqwest::Client,
    api_url: String,
}

impl FoodoraClient {
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            api_url: FOODORA_API_URL.to_string(),
        })
    }

    // The category listing endpoint rejects nothing but still wants the full
    // browser header set; the dps token is only needed for product details.
    fn headers(with_dps: bool) -> Result<HeaderMap> {
        let client_id = perseus_client_id();
        let session_id = perseus_session_id();
        let mut h = HeaderMap::new();
        h.insert("User-Agent", HeaderValue::from_static(USER_AGENT));
        h.insert("Accept", HeaderValue::from_static("application/json"));
        h.insert("Accept-Language", HeaderValue::from_static("en-US,en;q=0.5"));
        h.insert("Referer", HeaderValue::from_static("https://www.foodora.cz/"));
        h.insert(
            "Content-Type",
            HeaderValue::from_static("application/json;charset=utf-8"),
        );
        h.insert("perseus-client-id", HeaderValue::from_str(&client_id)?);
        h.insert("perseus-session-id", HeaderValue::from_str(&session_id)?);
        h.insert("X-PD-Language-ID", HeaderValue::from_static("3"));
        h.insert("X-Requested-With", HeaderValue::from_static("XMLHttpRequest"));
        h.insert("apollographql-client-name", HeaderValue::from_static("web"));
        h.insert(
            "apollographql-client-version",
            HeaderValue::from_static("GROCERIES-MENU-MICROFRONTEND.26.03.0016"),
        );
        h.insert("platform", HeaderValue::from_static("web"));
        h.insert("Origin", HeaderValue::from_static("https://www.foodora.cz"));
        if with_dps {
            h.insert("dps-session-id", HeaderValue::from_str(&dps_session_id(&client_id))?);
        }
        Ok(h)
    }

    async fn post_graphql(&self, query: &str, variables: Value, with_dps: bool) -> Result<Value> {
        let resp = self
            .http
            .post(&self.api_url)
            .headers(Self::headers(with_dps)?)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(anyhow!("graphql request failed: {}", resp.status()));
        }
        let body: Value = resp.json().await?;
        if let Some(errors) = body.get("errors") {
            if errors.as_array().map(|a| !a.is_empty()).unwrap_or(false) {
                return Err(anyhow!("graphql errors: {errors}"));
            }
        }
        Ok(body)
    }

    /// All products under one category, grouped by subcategory.
    #[instrument(skip(self))]
    pub async fn fetch_category_products(
        &self,
        category_id: &str,
        vendor_code: &str,
        user_code: &str,
    ) -> Result<CategoryProductListResponse> {
        let variables = json!({
            "attributes": PRODUCT_ATTRIBUTES,
            "categoryId": category_id,
            "featureFlags": feature_flags(),
            "filterOnSale": false,
            "globalEntityId": GLOBAL_ENTITY_ID,
            "isDarkstore": false,
            "locale": LOCALE,
            "sort": "Recommended",
            "userCode": user_code,
            "vendorID": vendor_code,
        });
        let body = self
            .post_graphql(CATEGORY_PRODUCTS_QUERY, variables, false)
            .await?;
        debug!(category_id, "category products fetched");
        let parsed: CategoryProductListResponse = serde_json::from_value(body)?;
        Ok(parsed)
    }

    /// Full detail payload for one product, including campaigns and food
    /// labelling.
    #[instrument(skip(self))]
    pub async fn fetch_product_details(
        &self,
        product_id: &str,
        vendor_code: &str,
        user_code: &str,
    ) -> Result<ProductDetailsResponse> {
        let variables = json!({
            "attributes": PRODUCT_ATTRIBUTES,
            "featureFlags": feature_flags(),
            "globalEntityId": GLOBAL_ENTITY_ID,
            "locale": LOCALE,
            "userCode": user_code,
            "vendorCode": vendor_code,
            "productIdentifier": { "type": "ID", "value": product_id },
            "crossSellProductsComplianceLevel": CROSS_SELL_COMPLIANCE_LEVEL,
            "crossSellProductsIsDarkstore": false,
            "includeCrossSell": true,
        });
        let body = self
            .post_graphql(PRODUCT_DETAILS_QUERY, variables, true)
            .await?;
        let parsed: ProductDetailsResponse = serde_json::from_value(body)?;
        Ok(parsed)
    }
}

//! Response shapes for the category product listing. Only the fields the
//! catalog mapping consumes are modeled; the rest of the payload is ignored.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryProductListResponse {
    pub data: CategoryProductListData,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryProductListData {
    pub category_product_list: CategoryProductList,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryProductList {
    /// Null for an empty or unknown category.
    pub category_products: Option<Vec<CategoryProductGroup>>,
}

/// One subcategory's worth of products under the requested parent category.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryProductGroup {
    pub id: String,
    pub name: String,
    pub items: Vec<CategoryProductItem>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct CategoryProductItem {
    #[serde(rename = "productID")]
    pub product_id: String,
    pub name: String,
    pub description: Option<String>,
    pub is_available: bool,
    /// Major units (CZK) as a float.
    pub price: f64,
    pub original_price: f64,
    pub urls: Option<Vec<String>>,
    pub attributes: Option<Vec<ProductAttribute>>,
    pub weightable_attributes: Option<WeightableAttributes>,
    pub stock_amount: Option<i64>,
    pub badges: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductAttribute {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct WeightableAttributes {
    pub weighted_price: Option<f64>,
    pub weighted_original_price: Option<f64>,
    pub weight_value: Option<WeightValue>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeightValue {
    pub unit: Option<String>,
    pub value: f64,
}

impl CategoryProductItem {
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .as_deref()?
            .iter()
            .find(|a| a.key == key)
            .map(|a| a.value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_group_response() {
        let raw = r#"{
            "data": { "categoryProductList": { "categoryProducts": [
                { "id": "sub-1", "name": "Ovoce", "items": [
                    { "productID": "42", "name": "Banán", "isAvailable": true,
                      "price": 12.5, "originalPrice": 15.0,
                      "attributes": [{"key": "sku", "value": "B-42"}],
                      "urls": ["https://img/1.jpg"] }
                ]}
            ]}}
        }"#;
        let parsed: CategoryProductListResponse = serde_json::from_str(raw).unwrap();
        let groups = parsed.data.category_product_list.category_products.unwrap();
        assert_eq!(groups[0].items[0].attribute("sku"), Some("B-42"));
        assert_eq!(groups[0].items[0].price, 12.5);
    }

    #[test]
    fn null_category_products_parses() {
        let raw = r#"{ "data": { "categoryProductList": { "categoryProducts": null } } }"#;
        let parsed: CategoryProductListResponse = serde_json::from_str(raw).unwrap();
        assert!(parsed.data.category_product_list.category_products.is_none());
    }
}

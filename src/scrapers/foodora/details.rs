//! Product-detail payloads and the condensed summary the inspect command
//! prints. The detail query returns far more than the category listing does
//! (campaigns, food labelling, cross-sell swimlanes); only the parts worth
//! surfacing are modeled.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::types::{ProductAttribute, WeightableAttributes};

#[derive(Debug, Clone, Deserialize)]
pub struct ProductDetailsResponse {
    pub data: ProductDetailsData,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetailsData {
    pub product_details: ProductDetails,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductDetails {
    pub product: ProductDetail,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductDetail {
    #[serde(rename = "productID")]
    pub product_id: String,
    pub name: String,
    pub description: Option<String>,
    pub is_available: bool,
    pub price: f64,
    pub original_price: f64,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub stock_amount: i64,
    pub urls: Option<Vec<String>>,
    pub attributes: Option<Vec<ProductAttribute>>,
    pub active_campaigns: Option<Vec<ActiveCampaign>>,
    pub weightable_attributes: Option<WeightableAttributes>,
    pub food_labelling: Option<FoodLabelling>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ActiveCampaign {
    pub name: String,
    pub description: Option<String>,
    pub discount_type: String,
    pub discount_value: f64,
    pub end_time: Option<String>,
}

/// A titled list of label values, e.g. `("Alergeny", ["lepek", "mléko"])`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodLabellingInfo {
    pub label_title: String,
    pub label_values: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct FoodLabelling {
    pub allergens: Option<Vec<FoodLabellingInfo>>,
    pub nutrition_facts: Option<Vec<FoodLabellingInfo>>,
}

/// What the inspect command prints: the detail payload boiled down to the
/// fields a human actually checks.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimplifiedProduct {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    /// Major units (CZK), as returned upstream.
    pub price: f64,
    pub original_price: f64,
    pub discount: Option<f64>,
    pub discount_percentage: Option<i64>,
    pub is_available: bool,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub image_url: Option<String>,
    pub sku: Option<String>,
    pub brand: Option<String>,
    pub price_per_unit: Option<String>,
    pub stock: String,
    pub campaigns: Vec<ActiveCampaign>,
    pub allergens: Vec<String>,
    pub nutrition_facts: BTreeMap<String, String>,
    pub weight: Option<WeightSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeightSummary {
    pub value: f64,
    pub unit: Option<String>,
}

fn attribute<'a>(attributes: &'a Option<Vec<ProductAttribute>>, key: &str) -> Option<&'a str> {
    attributes
        .as_deref()?
        .iter()
        .find(|a| a.key == key)
        .map(|a| a.value.as_str())
}

fn stock_label(is_available: bool, stock_amount: i64) -> String {
    if !is_available {
        "Out of Stock".to_string()
    } else if stock_amount > 0 {
        format!("{stock_amount} units")
    } else {
        "In Stock".to_string()
    }
}

pub fn simplify(product: &ProductDetail) -> SimplifiedProduct {
    let sku = attribute(&product.attributes, "sku").map(str::to_string);
    let brand = attribute(&product.attributes, "brand").map(str::to_string);
    let per_unit = attribute(&product.attributes, "pricePerBaseUnit");
    let base_unit = attribute(&product.attributes, "baseUnit");
    let price_per_unit = match (per_unit, base_unit) {
        (Some(v), Some(u)) => Some(format!("{v} Kč/{u}")),
        _ => None,
    };

    let discount = (product.original_price > product.price)
        .then(|| product.original_price - product.price);
    let discount_percentage =
        discount.map(|d| ((d / product.original_price) * 100.0).round() as i64);

    let allergens = product
        .food_labelling
        .as_ref()
        .and_then(|fl| fl.allergens.as_ref())
        .map(|infos| infos.iter().flat_map(|i| i.label_values.clone()).collect())
        .unwrap_or_default();
    let nutrition_facts = product
        .food_labelling
        .as_ref()
        .and_then(|fl| fl.nutrition_facts.as_ref())
        .map(|infos| {
            infos
                .iter()
                .map(|i| (i.label_title.clone(), i.label_values.join(", ")))
                .collect()
        })
        .unwrap_or_default();

    let weight = product
        .weightable_attributes
        .as_ref()
        .and_then(|w| w.weight_value.as_ref())
        .map(|wv| WeightSummary {
            value: wv.value,
            unit: wv.unit.clone(),
        });

    SimplifiedProduct {
        id: product.product_id.clone(),
        name: product.name.clone(),
        description: product.description.clone(),
        price: product.price,
        original_price: product.original_price,
        discount,
        discount_percentage,
        is_available: product.is_available,
        kind: product.kind.clone(),
        image_url: product.urls.as_ref().and_then(|u| u.first().cloned()),
        sku,
        brand,
        price_per_unit,
        stock: stock_label(product.is_available, product.stock_amount),
        campaigns: product.active_campaigns.clone().unwrap_or_default(),
        allergens,
        nutrition_facts,
        weight,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detail() -> ProductDetail {
        ProductDetail {
            product_id: "42".to_string(),
            name: "Banán Chiquita".to_string(),
            is_available: true,
            price: 25.0,
            original_price: 50.0,
            stock_amount: 0,
            attributes: Some(vec![
                ProductAttribute {
                    key: "sku".to_string(),
                    value: "B-42".to_string(),
                },
                ProductAttribute {
                    key: "pricePerBaseUnit".to_string(),
                    value: "49.90".to_string(),
                },
                ProductAttribute {
                    key: "baseUnit".to_string(),
                    value: "kg".to_string(),
                },
            ]),
            ..Default::default()
        }
    }

    #[test]
    fn discount_and_percentage_from_price_gap() {
        let s = simplify(&detail());
        assert_eq!(s.discount, Some(25.0));
        assert_eq!(s.discount_percentage, Some(50));
        assert_eq!(s.price_per_unit.as_deref(), Some("49.90 Kč/kg"));
    }

    #[test]
    fn no_discount_when_not_reduced() {
        let mut d = detail();
        d.original_price = 25.0;
        let s = simplify(&d);
        assert_eq!(s.discount, None);
        assert_eq!(s.discount_percentage, None);
    }

    #[test]
    fn stock_labels() {
        assert_eq!(stock_label(false, 10), "Out of Stock");
        assert_eq!(stock_label(true, 3), "3 units");
        assert_eq!(stock_label(true, 0), "In Stock");
    }

    #[test]
    fn labelling_flattens_to_lists_and_map() {
        let mut d = detail();
        d.food_labelling = Some(FoodLabelling {
            allergens: Some(vec![FoodLabellingInfo {
                label_title: "Alergeny".to_string(),
                label_values: vec!["lepek".to_string(), "mléko".to_string()],
            }]),
            nutrition_facts: Some(vec![FoodLabellingInfo {
                label_title: "Energie".to_string(),
                label_values: vec!["370 kJ".to_string(), "88 kcal".to_string()],
            }]),
        });
        let s = simplify(&d);
        assert_eq!(s.allergens, vec!["lepek", "mléko"]);
        assert_eq!(s.nutrition_facts["Energie"], "370 kJ, 88 kcal");
    }

    #[test]
    fn detail_response_parses() {
        let raw = r#"{ "data": { "productDetails": { "product": {
            "productID": "42", "name": "Banán", "isAvailable": true,
            "price": 12.5, "originalPrice": 12.5, "stockAmount": 4,
            "type": "Product",
            "activeCampaigns": [{ "name": "2+1", "discountType": "percentage",
                                  "discountValue": 33.0, "endTime": "2026-01-01" }]
        }}}}"#;
        let parsed: ProductDetailsResponse = serde_json::from_str(raw).unwrap();
        let p = &parsed.data.product_details.product;
        assert_eq!(p.stock_amount, 4);
        assert_eq!(p.active_campaigns.as_ref().unwrap()[0].name, "2+1");
    }
}

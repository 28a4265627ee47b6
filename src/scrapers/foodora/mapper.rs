//! Maps category listing items to catalog rows. Prices arrive as CZK floats
//! and are stored in minor units.

use crate::database_ops::products::NewProduct;
use crate::scrapers::slugify;

use super::types::CategoryProductItem;

fn to_minor(major: f64) -> i32 {
    (major * 100.0).round() as i32
}

pub fn map_product(
    item: &CategoryProductItem,
    category_name: &str,
    category_slug: &str,
    store: &str,
) -> NewProduct {
    let sku = item
        .attribute("sku")
        .map(str::to_string)
        .unwrap_or_else(|| item.product_id.clone());
    let base_unit = item.attribute("baseUnit").map(str::to_string);
    let per_base_unit = item
        .attribute("pricePerBaseUnit")
        .and_then(|v| v.parse::<f64>().ok());
    let discounted = item.price < item.original_price;

    NewProduct {
        store: store.to_string(),
        product_id: item.product_id.clone(),
        sku,
        slug: slugify(&item.name),
        name: item.name.clone(),
        description_short: item.description.clone(),
        description_long: item.description.clone(),
        regulated_product_name: None,
        category: category_name.to_string(),
        category_slug: category_slug.to_string(),
        brand: None,
        brand_slug: None,
        price: Some(to_minor(item.price)),
        price_per_unit: per_base_unit.map(to_minor),
        unit_price: per_base_unit,
        regular_price: Some(to_minor(item.original_price)),
        discount_price: discounted.then(|| to_minor(item.price)),
        lowest_price: None,
        in_promotion: discounted,
        amount: None,
        weight: item
            .weightable_attributes
            .as_ref()
            .and_then(|w| w.weight_value.as_ref())
            .map(|w| w.value),
        package_label: None,
        package_label_key: None,
        volume_label_key: None,
        volume_label_short: None,
        base_unit_long: base_unit.clone(),
        base_unit_short: base_unit,
        images: item.urls.as_ref().map(|u| serde_json::json!(u)),
        product_marketing: None,
        brand_marketing: None,
        published: item.is_available,
        medical: false,
        weight_article: item.weightable_attributes.is_some(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrapers::foodora::types::{ProductAttribute, WeightableAttributes, WeightValue};

    fn item() -> CategoryProductItem {
        CategoryProductItem {
            product_id: "42".into(),
            name: "Banán chiquita".into(),
            description: Some("Žluté ovoce".into()),
            is_available: true,
            price: 12.5,
            original_price: 15.0,
            urls: Some(vec!["https://img/1.jpg".into()]),
            attributes: Some(vec![
                ProductAttribute {
                    key: "sku".into(),
                    value: "B-42".into(),
                },
                ProductAttribute {
                    key: "pricePerBaseUnit".into(),
                    value: "49.9".into(),
                },
                ProductAttribute {
                    key: "baseUnit".into(),
                    value: "kg".into(),
                },
            ]),
            weightable_attributes: Some(WeightableAttributes {
                weighted_price: None,
                weighted_original_price: None,
                weight_value: Some(WeightValue {
                    unit: Some("g".into()),
                    value: 250.0,
                }),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn converts_major_float_to_minor_units() {
        let row = map_product(&item(), "Ovoce", "foodora-dmart-ovoce", "FOODORA_DMART");
        assert_eq!(row.price, Some(1250));
        assert_eq!(row.regular_price, Some(1500));
        assert_eq!(row.discount_price, Some(1250));
        assert!(row.in_promotion);
        assert_eq!(row.price_per_unit, Some(4990));
        assert_eq!(row.unit_price, Some(49.9));
    }

    #[test]
    fn non_discounted_product_has_no_discount_price() {
        let mut it = item();
        it.price = 15.0;
        let row = map_product(&it, "Ovoce", "foodora-dmart-ovoce", "FOODORA_DMART");
        assert_eq!(row.discount_price, None);
        assert!(!row.in_promotion);
    }

    #[test]
    fn sku_falls_back_to_product_id() {
        let mut it = item();
        it.attributes = None;
        let row = map_product(&it, "Ovoce", "foodora-dmart-ovoce", "FOODORA_DMART");
        assert_eq!(row.sku, "42");
        assert_eq!(row.price_per_unit, None);
    }

    #[test]
    fn weightable_product_flags_and_slug() {
        let row = map_product(&item(), "Ovoce", "foodora-dmart-ovoce", "FOODORA_DMART");
        assert!(row.weight_article);
        assert_eq!(row.weight, Some(250.0));
        assert_eq!(row.slug, "bann-chiquita");
        assert_eq!(row.base_unit_short.as_deref(), Some("kg"));
    }

    #[test]
    fn rounding_is_to_nearest_minor_unit() {
        assert_eq!(to_minor(12.51), 1251);
        assert_eq!(to_minor(0.014), 1);
        assert_eq!(to_minor(9.999), 1000);
    }
}

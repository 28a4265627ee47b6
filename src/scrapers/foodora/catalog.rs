//! Store registry and category catalog loading. Each entry is one physical
//! store reachable through the delivery platform, with the vendor code the
//! API addresses it by and the category tree to walk.

use anyhow::{Context, Result};

use crate::database_ops::categories::CategoryDefinition;

pub const STORE_FOODORA_BILLA_PROSEK: &str = "FOODORA_BILLA_PROSEK";
pub const STORE_FOODORA_ALBERT_FLORENC: &str = "FOODORA_ALBERT_FLORENC";
pub const STORE_FOODORA_DMART: &str = "FOODORA_DMART";

#[derive(Debug, Clone, Copy)]
pub struct StoreConfig {
    /// Store discriminator stored on every product row.
    pub store: &'static str,
    /// Vendor code the API addresses the store by.
    pub vendor_code: &'static str,
    /// Lowercase prefix for category keys and slugs.
    pub store_code: &'static str,
    pub display_name: &'static str,
    pub categories_file: &'static str,
}

pub const STORES: &[StoreConfig] = &[
    StoreConfig {
        store: STORE_FOODORA_BILLA_PROSEK,
        vendor_code: "mjul",
        store_code: "foodora-billa-prosek",
        display_name: "BILLA Praha Prosek",
        categories_file: "config/foodora_categories_full.json",
    },
    StoreConfig {
        store: STORE_FOODORA_ALBERT_FLORENC,
        vendor_code: "obc6",
        store_code: "foodora-albert-florenc",
        display_name: "Albert Praha Florenc",
        categories_file: "config/foodora_categories_albert.json",
    },
    StoreConfig {
        store: STORE_FOODORA_DMART,
        vendor_code: "o7b0",
        store_code: "foodora-dmart",
        display_name: "foodora Market",
        categories_file: "config/foodora_categories_full.json",
    },
];

/// Looks a store up by its discriminator, store code, or vendor code.
pub fn store_by_name(name: &str) -> Option<&'static StoreConfig> {
    STORES.iter().find(|s| {
        s.store.eq_ignore_ascii_case(name)
            || s.store_code.eq_ignore_ascii_case(name)
            || s.vendor_code.eq_ignore_ascii_case(name)
    })
}

pub fn load_category_tree(path: &str) -> Result<Vec<CategoryDefinition>> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
    let defs: Vec<CategoryDefinition> =
        serde_json::from_str(&raw).with_context(|| format!("parsing {path}"))?;
    Ok(defs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_accepts_all_aliases() {
        assert_eq!(
            store_by_name("FOODORA_DMART").unwrap().vendor_code,
            "o7b0"
        );
        assert_eq!(
            store_by_name("foodora-billa-prosek").unwrap().store,
            STORE_FOODORA_BILLA_PROSEK
        );
        assert_eq!(
            store_by_name("obc6").unwrap().store,
            STORE_FOODORA_ALBERT_FLORENC
        );
        assert!(store_by_name("tesco").is_none());
    }
}

pub mod categories;
pub mod db;
pub mod outbox;
pub mod product_categories;
pub mod products;
pub mod search;

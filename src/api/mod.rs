// HTTP API for the grocery catalog: product search, category browsing,
// promotions.

pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;

pub use server::ApiServer;

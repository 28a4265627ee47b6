// API route configuration

use crate::api::handlers;
use actix_web::web;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg
        // Health check
        .route("/health", web::get().to(handlers::health_check))
        .route("/", web::get().to(handlers::health_check))
        // Catalog routes
        .service(
            web::scope("/api")
                // Products (promotions before the id matcher)
                .route("/products", web::get().to(handlers::get_products))
                .route(
                    "/products/promotions",
                    web::get().to(handlers::get_promotions),
                )
                .route(
                    "/products/slug/{slug}",
                    web::get().to(handlers::get_product_by_slug),
                )
                .route("/products/{id}", web::get().to(handlers::get_product_by_id))
                // Categories
                .route("/categories", web::get().to(handlers::get_categories))
                .route(
                    "/categories/{slug}/products",
                    web::get().to(handlers::get_category_products),
                )
                .route(
                    "/categories/{slug}",
                    web::get().to(handlers::get_category_by_slug),
                )
                // Stores
                .route("/stores", web::get().to(handlers::get_stores)),
        );
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, App};

    // Routes resolve without app state; handlers fail later at extraction,
    // so "not 404" is the signal that a path is mounted.
    #[actix_web::test]
    async fn catalog_routes_are_mounted_under_api() {
        let app = test::init_service(App::new().configure(configure_routes)).await;
        for path in [
            "/health",
            "/api/products",
            "/api/products/promotions",
            "/api/products/slug/mleko-1l",
            "/api/products/7",
            "/api/categories",
            "/api/categories/ovoce/products",
            "/api/categories/ovoce",
            "/api/stores",
        ] {
            let req = test::TestRequest::get().uri(path).to_request();
            let resp = test::call_service(&app, req).await;
            assert_ne!(resp.status(), StatusCode::NOT_FOUND, "missing route {path}");
        }
    }

    #[actix_web::test]
    async fn unknown_paths_are_404() {
        let app = test::init_service(App::new().configure(configure_routes)).await;
        for path in ["/api/v1/products", "/api/nope"] {
            let req = test::TestRequest::get().uri(path).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::NOT_FOUND, "unexpected route {path}");
        }
    }
}

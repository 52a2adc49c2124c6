//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Catalog listing (same as /products)
//! GET  /health                 - Health check
//!
//! # Products
//! GET  /products               - Catalog listing
//! GET  /products/{id}          - Product detail
//!
//! # Cart
//! GET  /cart                   - Cart contents joined with the catalog
//! POST /cart/add               - Add a product ({success, cart})
//! POST /cart/update            - Overwrite a line quantity ({success})
//! POST /cart/remove            - Remove a line ({success})
//! POST /cart/checkout          - Commit the cart as an order
//!
//! # Orders (require auth)
//! GET  /orders                 - Order history
//! GET  /orders/{id}/receipt    - PDF receipt download
//!
//! # Auth
//! POST /auth/register          - Create an account
//! POST /auth/login             - Login, sets the session user
//! POST /auth/logout            - Logout, flushes the session
//! ```

pub mod auth;
pub mod cart;
pub mod orders;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/checkout", post(cart::checkout))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}/receipt", get(orders::receipt))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Home page doubles as the catalog listing
        .route("/", get(products::index))
        // Product routes
        .nest("/products", product_routes())
        // Cart routes
        .nest("/cart", cart_routes())
        // Order routes
        .nest("/orders", order_routes())
        // Auth routes
        .nest("/auth", auth_routes())
}

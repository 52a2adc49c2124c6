//! HTTP-level tests for the storefront surface.
//!
//! Drives the real router (session layer included) with in-memory sessions
//! against a live database, carrying the session cookie between requests the
//! way a browser would. Skipped unless `STOREFRONT_TEST_DATABASE_URL` is set.

#![allow(clippy::unwrap_used)]
#![allow(clippy::print_stderr)]

use std::str::FromStr;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode, header};
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde_json::{Value, json};
use sqlx::PgPool;
use tower::util::ServiceExt;
use tower_sessions::{MemoryStore, SessionManagerLayer};

use mercado_storefront::config::StorefrontConfig;
use mercado_storefront::routes;
use mercado_storefront::state::AppState;

/// Build the app with in-memory sessions, or `None` to skip the test.
async fn try_app() -> Option<(Router, PgPool)> {
    let Ok(url) = std::env::var("STOREFRONT_TEST_DATABASE_URL") else {
        eprintln!("STOREFRONT_TEST_DATABASE_URL not set; skipping live-database test");
        return None;
    };

    let pool = PgPool::connect(&url)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    sqlx::query("TRUNCATE order_lines, orders, products, users RESTART IDENTITY CASCADE")
        .execute(&pool)
        .await
        .expect("Failed to truncate tables");

    let config = StorefrontConfig {
        database_url: SecretString::from(url),
        host: "127.0.0.1".parse().unwrap(),
        port: 3000,
        base_url: "http://localhost:3000".to_string(),
        session_secret: SecretString::from("kJ8#mP2$vN5!qR9@wT4%xB7&zD1*hF6b"),
        store_name: "Mercado".to_string(),
        sentry_dsn: None,
    };
    let state = AppState::new(config, pool.clone());

    let session_layer = SessionManagerLayer::new(MemoryStore::default());
    let app = routes::routes().layer(session_layer).with_state(state);

    Some((app, pool))
}

async fn seed_product(pool: &PgPool, name: &str, price: &str, stock: i32) -> i32 {
    sqlx::query_scalar::<_, i32>(
        "INSERT INTO products (name, description, price, stock) VALUES ($1, '', $2, $3) RETURNING id",
    )
    .bind(name)
    .bind(Decimal::from_str(price).unwrap())
    .bind(stock)
    .fetch_one(pool)
    .await
    .expect("Failed to insert product")
}

/// Issue one request, optionally with a session cookie and JSON body.
async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }

    let request = match body {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    app.clone().oneshot(request).await.unwrap()
}

/// Pull the `name=value` pair out of a Set-Cookie header, if any.
fn session_cookie(response: &Response<Body>) -> Option<String> {
    let raw = response.headers().get(header::SET_COOKIE)?.to_str().ok()?;
    Some(raw.split(';').next()?.to_string())
}

async fn json_body(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[serial_test::serial]
async fn test_cart_lifecycle_through_checkout() {
    let Some((app, pool)) = try_app().await else { return };

    let kit = seed_product(&pool, "Gundam kit", "10.00", 5).await;
    let poster = seed_product(&pool, "Poster", "5.00", 3).await;

    // Register, then login to get an authenticated session cookie.
    let response = send(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({ "name": "Ada", "email": "ada@example.com", "password": "correct horse" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "ada@example.com", "password": "correct horse" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = session_cookie(&response).expect("login should set a session cookie");

    // Build the cart: 2 kits and, briefly, a poster.
    let response = send(
        &app,
        "POST",
        "/cart/add",
        Some(&cookie),
        Some(json!({ "product_id": kit, "quantity": 2 })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], json!(true));

    let response = send(
        &app,
        "POST",
        "/cart/add",
        Some(&cookie),
        Some(json!({ "product_id": poster })),
    )
    .await;
    assert_eq!(json_body(response).await["success"], json!(true));

    // Dropping a line to zero removes it.
    let response = send(
        &app,
        "POST",
        "/cart/update",
        Some(&cookie),
        Some(json!({ "product_id": poster, "quantity": 0 })),
    )
    .await;
    assert_eq!(json_body(response).await["success"], json!(true));

    // Updating something never added reports failure.
    let response = send(
        &app,
        "POST",
        "/cart/update",
        Some(&cookie),
        Some(json!({ "product_id": 9999, "quantity": 3 })),
    )
    .await;
    assert_eq!(json_body(response).await["success"], json!(false));

    // The cart view joins the catalog and totals the lines.
    let response = send(&app, "GET", "/cart", Some(&cookie), None).await;
    let body = json_body(response).await;
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["total"], json!("$20.00"));

    // Checkout commits and clears the cart.
    let response = send(&app, "POST", "/cart/checkout", Some(&cookie), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], json!(true));
    let order_id = body["order_id"].as_i64().expect("order id");

    let response = send(&app, "GET", "/cart", Some(&cookie), None).await;
    let body = json_body(response).await;
    assert!(body["items"].as_array().unwrap().is_empty());
    assert_eq!(body["total"], json!("$0.00"));

    // Stock went down by exactly the purchased quantity.
    let stock = sqlx::query_scalar::<_, i32>("SELECT stock FROM products WHERE id = $1")
        .bind(kit)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(stock, 3);

    // History lists the order; the receipt downloads as PDF.
    let response = send(&app, "GET", "/orders", Some(&cookie), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let response = send(
        &app,
        "GET",
        &format!("/orders/{order_id}/receipt"),
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/pdf"
    );
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert!(bytes.starts_with(b"%PDF"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[serial_test::serial]
async fn test_checkout_without_login_reports_reason() {
    let Some((app, _pool)) = try_app().await else { return };

    let response = send(&app, "POST", "/cart/checkout", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["success"], json!(false));
    assert!(
        body["error"].as_str().unwrap().contains("signed in"),
        "unexpected error: {body}"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[serial_test::serial]
async fn test_receipt_requires_authentication() {
    let Some((app, _pool)) = try_app().await else { return };

    let response = send(&app, "GET", "/orders/1/receipt", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[serial_test::serial]
async fn test_duplicate_registration_conflicts() {
    let Some((app, _pool)) = try_app().await else { return };

    let form = json!({ "name": "Ada", "email": "ada@example.com", "password": "correct horse" });
    let response = send(&app, "POST", "/auth/register", None, Some(form.clone())).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, "POST", "/auth/register", None, Some(form)).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

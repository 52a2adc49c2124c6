//! Cart route handlers.
//!
//! The cart is a value object held in the session: every handler loads it,
//! mutates it through `mercado_core::Cart`, and saves it back. Stock is not
//! checked here - only checkout validates against inventory.

use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use mercado_core::{Cart, ProductId};

use crate::db::products::ProductRepository;
use crate::error::{AppError, Result};
use crate::middleware::OptionalAuth;
use crate::models::session_keys;
use crate::services::checkout::{CheckoutError, CheckoutService, line_subtotal};
use crate::state::AppState;

/// Cart line display data joined with the catalog.
#[derive(Debug, Serialize)]
pub struct CartItemView {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: u32,
    pub price: String,
    pub subtotal: String,
}

/// Cart display data.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub total: String,
    pub item_count: u64,
}

/// Format a decimal amount as a price string.
fn format_price(amount: Decimal) -> String {
    format!("${amount:.2}")
}

// =============================================================================
// Session Helpers
// =============================================================================

/// Get the cart from the session, defaulting to an empty one.
async fn load_cart(session: &Session) -> Cart {
    session
        .get::<Cart>(session_keys::CART)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

/// Save the cart back into the session.
async fn save_cart(session: &Session, cart: &Cart) -> Result<()> {
    session
        .insert(session_keys::CART, cart)
        .await
        .map_err(|e| AppError::Internal(format!("failed to persist cart: {e}")))
}

// =============================================================================
// Request / Response Types
// =============================================================================

/// Add to cart request body.
#[derive(Debug, Deserialize)]
pub struct AddRequest {
    pub product_id: i32,
    pub quantity: Option<u32>,
}

/// Update cart request body.
#[derive(Debug, Deserialize)]
pub struct UpdateRequest {
    pub product_id: i32,
    pub quantity: i64,
}

/// Remove from cart request body.
#[derive(Debug, Deserialize)]
pub struct RemoveRequest {
    pub product_id: i32,
}

/// Response for cart mutations that echo the cart back.
#[derive(Debug, Serialize)]
pub struct CartMutationResponse {
    pub success: bool,
    pub cart: Cart,
}

/// Response carrying only the success flag.
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Successful checkout response.
#[derive(Debug, Serialize)]
pub struct CheckoutOk {
    pub success: bool,
    pub order_id: mercado_core::OrderId,
}

/// Failed checkout response with the user-facing reason.
#[derive(Debug, Serialize)]
pub struct CheckoutFailed {
    pub success: bool,
    pub error: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display cart contents joined with the catalog.
///
/// Lines whose product has vanished from the catalog are not shown; checkout
/// is where a stale reference becomes a hard error.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<Json<CartView>> {
    let cart = load_cart(&session).await;

    if cart.is_empty() {
        return Ok(Json(CartView {
            items: Vec::new(),
            total: format_price(Decimal::ZERO),
            item_count: 0,
        }));
    }

    let products = ProductRepository::new(state.pool())
        .get_by_ids(&cart.product_ids())
        .await?;

    let mut items = Vec::with_capacity(cart.lines().len());
    let mut total = Decimal::ZERO;
    for line in cart.lines() {
        let Some(product) = products.iter().find(|p| p.id == line.product_id) else {
            continue;
        };
        let subtotal = line_subtotal(product.price, line.quantity);
        total += subtotal;
        items.push(CartItemView {
            product_id: product.id,
            name: product.name.clone(),
            quantity: line.quantity,
            price: format_price(product.price),
            subtotal: format_price(subtotal),
        });
    }

    Ok(Json(CartView {
        items,
        total: format_price(total),
        item_count: cart.total_quantity(),
    }))
}

/// Add a product to the cart.
#[instrument(skip(session))]
pub async fn add(
    session: Session,
    Json(form): Json<AddRequest>,
) -> Result<Json<CartMutationResponse>> {
    let mut cart = load_cart(&session).await;
    cart.add(ProductId::new(form.product_id), form.quantity.unwrap_or(1));
    save_cart(&session, &cart).await?;

    Ok(Json(CartMutationResponse {
        success: true,
        cart,
    }))
}

/// Overwrite a line's quantity; zero or below removes the line.
///
/// Reports `success: false` when the product is not in the cart.
#[instrument(skip(session))]
pub async fn update(
    session: Session,
    Json(form): Json<UpdateRequest>,
) -> Result<Json<SuccessResponse>> {
    let mut cart = load_cart(&session).await;
    let found = cart.set_quantity(ProductId::new(form.product_id), form.quantity);
    save_cart(&session, &cart).await?;

    Ok(Json(SuccessResponse { success: found }))
}

/// Remove a line from the cart. Idempotent.
#[instrument(skip(session))]
pub async fn remove(
    session: Session,
    Json(form): Json<RemoveRequest>,
) -> Result<Json<SuccessResponse>> {
    let mut cart = load_cart(&session).await;
    cart.remove(ProductId::new(form.product_id));
    save_cart(&session, &cart).await?;

    Ok(Json(SuccessResponse { success: true }))
}

/// Commit the cart as an order.
///
/// Validation failures (not signed in, empty cart, vanished product, not
/// enough stock) come back as `{success: false, error}` with the specific
/// reason; storage failures surface as a generic 500. The session cart is
/// cleared only after the transaction commits.
#[instrument(skip(state, session, user))]
pub async fn checkout(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<Response> {
    let mut cart = load_cart(&session).await;

    match CheckoutService::new(state.pool())
        .checkout(user.as_ref(), &cart)
        .await
    {
        Ok(order_id) => {
            cart.clear();
            if let Err(e) = save_cart(&session, &cart).await {
                // The order is committed; losing the cart reset is the
                // lesser failure, so log and report success anyway.
                tracing::error!("failed to clear cart after checkout: {e}");
            }

            Ok(Json(CheckoutOk {
                success: true,
                order_id,
            })
            .into_response())
        }
        Err(CheckoutError::Storage(e)) => Err(AppError::Database(e)),
        Err(reason) => Ok(Json(CheckoutFailed {
            success: false,
            error: reason.to_string(),
        })
        .into_response()),
    }
}

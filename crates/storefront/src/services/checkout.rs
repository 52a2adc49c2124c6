//! Checkout: turn the session cart into a committed order.
//!
//! Everything happens in one database transaction: load the referenced
//! products with row locks, validate stock, insert the order and its lines
//! with price snapshots, decrement stock, commit. Any failure before the
//! commit point drops the transaction guard and rolls everything back, so
//! either the whole order exists or none of it does.
//!
//! Checkout is deliberately NOT idempotent: submitting the same cart twice
//! creates two orders. Double-submit protection is a client concern.

use std::collections::HashMap;

use rust_decimal::Decimal;
use sqlx::PgPool;
use thiserror::Error;

use mercado_core::{Cart, OrderId, ProductId};

use crate::db::RepositoryError;
use crate::models::{CurrentUser, Product};

/// Why a checkout was refused or failed.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// No authenticated user in the session.
    #[error("you must be signed in to check out")]
    NotAuthenticated,

    /// The cart holds no lines.
    #[error("your cart is empty")]
    EmptyCart,

    /// A cart line references a product that no longer exists.
    #[error("product {0} is no longer available")]
    ProductMissing(ProductId),

    /// Requested quantity exceeds current stock.
    #[error("insufficient stock for {product}")]
    InsufficientStock {
        /// Display name of the product that ran short.
        product: String,
    },

    /// Underlying storage failure; surfaced generically to clients.
    #[error("storage error: {0}")]
    Storage(#[from] RepositoryError),
}

impl From<sqlx::Error> for CheckoutError {
    fn from(e: sqlx::Error) -> Self {
        Self::Storage(RepositoryError::from(e))
    }
}

/// Checkout orchestrator.
pub struct CheckoutService<'a> {
    pool: &'a PgPool,
}

impl<'a> CheckoutService<'a> {
    /// Create a new checkout service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Commit the cart as an order for the given user.
    ///
    /// Preconditions (checked before any storage access): a user must be
    /// present and the cart must be non-empty.
    ///
    /// On success the new order's ID is returned; the caller is responsible
    /// for clearing the session cart (and must only do so on success).
    ///
    /// # Errors
    ///
    /// Returns the [`CheckoutError`] taxonomy; every error leaves products,
    /// orders and order lines exactly as they were.
    pub async fn checkout(
        &self,
        user: Option<&CurrentUser>,
        cart: &Cart,
    ) -> Result<OrderId, CheckoutError> {
        let user = user.ok_or(CheckoutError::NotAuthenticated)?;

        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let mut tx = self.pool.begin().await?;

        // Lock every referenced product row for the duration of the
        // transaction. Concurrent checkouts over overlapping products queue
        // on these locks, so both cannot observe pre-decrement stock.
        // ORDER BY id keeps the lock order consistent across transactions.
        let ids: Vec<i32> = cart.product_ids().iter().map(ProductId::as_i32).collect();
        let products = sqlx::query_as::<_, Product>(
            r"
            SELECT id, name, description, price, stock
            FROM products
            WHERE id = ANY($1)
            ORDER BY id
            FOR UPDATE
            ",
        )
        .bind(&ids)
        .fetch_all(&mut *tx)
        .await?;

        let by_id: HashMap<ProductId, &Product> =
            products.iter().map(|p| (p.id, p)).collect();

        // Validate every line and compute the total before any write.
        let mut total = Decimal::ZERO;
        for line in cart.lines() {
            let product = by_id
                .get(&line.product_id)
                .ok_or(CheckoutError::ProductMissing(line.product_id))?;

            if i64::from(product.stock) < i64::from(line.quantity) {
                return Err(CheckoutError::InsufficientStock {
                    product: product.name.clone(),
                });
            }

            total += line_subtotal(product.price, line.quantity);
        }

        let order_id = sqlx::query_scalar::<_, i32>(
            "INSERT INTO orders (user_id, total) VALUES ($1, $2) RETURNING id",
        )
        .bind(user.id)
        .bind(total)
        .fetch_one(&mut *tx)
        .await?;

        for line in cart.lines() {
            // Stock validation above bounds the quantity by an i32 column.
            let quantity = i32::try_from(line.quantity).unwrap_or(i32::MAX);
            let product = by_id
                .get(&line.product_id)
                .ok_or(CheckoutError::ProductMissing(line.product_id))?;

            sqlx::query(
                r"
                INSERT INTO order_lines (order_id, product_id, quantity, price)
                VALUES ($1, $2, $3, $4)
                ",
            )
            .bind(order_id)
            .bind(line.product_id)
            .bind(quantity)
            .bind(product.price)
            .execute(&mut *tx)
            .await?;

            sqlx::query("UPDATE products SET stock = stock - $1 WHERE id = $2")
                .bind(quantity)
                .bind(line.product_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        tracing::info!(order_id, user_id = %user.id, %total, "checkout committed");

        Ok(OrderId::new(order_id))
    }
}

/// Line subtotal: unit price times quantity, rounded to cents at the line
/// level. The order total is the sum of already-rounded subtotals, and the
/// receipt prints the stored total rather than recomputing it.
#[must_use]
pub fn line_subtotal(price: Decimal, quantity: u32) -> Decimal {
    (price * Decimal::from(quantity)).round_dp(2)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::str::FromStr;

    use mercado_core::{Email, UserId};

    /// A pool that never connects; used to prove the preconditions fail
    /// before any storage access happens.
    fn disconnected_pool() -> PgPool {
        PgPool::connect_lazy("postgres://localhost:1/never_connects").unwrap()
    }

    fn shopper() -> CurrentUser {
        CurrentUser {
            id: UserId::new(1),
            name: "Ada".to_string(),
            email: Email::parse("ada@example.com").unwrap(),
        }
    }

    #[tokio::test]
    async fn test_unauthenticated_checkout_touches_no_storage() {
        let pool = disconnected_pool();
        let service = CheckoutService::new(&pool);

        let mut cart = Cart::new();
        cart.add(ProductId::new(1), 2);

        let result = service.checkout(None, &cart).await;
        assert!(matches!(result, Err(CheckoutError::NotAuthenticated)));
    }

    #[tokio::test]
    async fn test_empty_cart_checkout_touches_no_storage() {
        let pool = disconnected_pool();
        let service = CheckoutService::new(&pool);

        let result = service.checkout(Some(&shopper()), &Cart::new()).await;
        assert!(matches!(result, Err(CheckoutError::EmptyCart)));
    }

    #[test]
    fn test_line_subtotal_exact() {
        let price = Decimal::from_str("10.00").unwrap();
        assert_eq!(line_subtotal(price, 2), Decimal::from_str("20.00").unwrap());
    }

    #[test]
    fn test_line_subtotal_rounds_per_line() {
        let price = Decimal::from_str("0.333").unwrap();
        // 3 x 0.333 = 0.999 -> 1.00 at the line level
        assert_eq!(line_subtotal(price, 3), Decimal::from_str("1.00").unwrap());
    }

    #[test]
    fn test_error_messages_are_user_facing() {
        let err = CheckoutError::InsufficientStock {
            product: "Gundam kit".to_string(),
        };
        assert_eq!(err.to_string(), "insufficient stock for Gundam kit");
        assert_eq!(
            CheckoutError::EmptyCart.to_string(),
            "your cart is empty"
        );
    }
}

//! Order repository for history and receipt reads.
//!
//! Order rows are written only by the checkout transaction
//! (`services::checkout`); this repository covers the read side.

use sqlx::PgPool;

use mercado_core::{OrderId, UserId};

use super::RepositoryError;
use crate::models::{Order, OrderLine, OrderSummary};

/// Repository for order queries.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// A user's order history, newest first, each with a one-line summary of
    /// its products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn history(&self, user_id: UserId) -> Result<Vec<OrderSummary>, RepositoryError> {
        let orders = sqlx::query_as::<_, OrderSummary>(
            r"
            SELECT o.id, o.total, o.created_at,
                   COALESCE(
                       (SELECT string_agg(pr.name || ' (x' || ol.quantity || ')', ', '
                                          ORDER BY ol.product_id)
                        FROM order_lines ol
                        JOIN products pr ON ol.product_id = pr.id
                        WHERE ol.order_id = o.id),
                       '') AS products
            FROM orders o
            WHERE o.user_id = $1
            ORDER BY o.created_at DESC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(orders)
    }

    /// Fetch an order, scoped to its owner.
    ///
    /// The ownership check lives in the query itself, so a missing order and
    /// someone else's order are indistinguishable to the caller.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_owned(
        &self,
        order_id: OrderId,
        user_id: UserId,
    ) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(
            "SELECT id, user_id, total, created_at FROM orders WHERE id = $1 AND user_id = $2",
        )
        .bind(order_id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(order)
    }

    /// The lines of an order joined with product name and description.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lines(&self, order_id: OrderId) -> Result<Vec<OrderLine>, RepositoryError> {
        let lines = sqlx::query_as::<_, OrderLine>(
            r"
            SELECT ol.product_id, pr.name, pr.description, ol.quantity, ol.price
            FROM order_lines ol
            JOIN products pr ON ol.product_id = pr.id
            WHERE ol.order_id = $1
            ORDER BY ol.product_id
            ",
        )
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;

        Ok(lines)
    }
}

//! Product domain types.

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

use mercado_core::ProductId;

/// A catalog product.
///
/// Stock is mutated only by the checkout transaction; catalog rows are
/// otherwise managed externally (see `mercado-cli seed`).
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Longer description.
    pub description: String,
    /// Unit price, never negative.
    pub price: Decimal,
    /// Units available, never negative.
    pub stock: i32,
}

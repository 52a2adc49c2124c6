//! Order domain types.
//!
//! Orders and their lines are created exactly once per successful checkout
//! and are immutable afterwards. Line prices are snapshots of the unit price
//! at purchase time - later catalog price changes do not affect them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

use mercado_core::{OrderId, ProductId, UserId};

use crate::models::session::CurrentUser;

/// A committed order.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Order {
    /// Storage-assigned order ID.
    pub id: OrderId,
    /// Owning user.
    pub user_id: UserId,
    /// Total at checkout time; equals the sum of line subtotals.
    pub total: Decimal,
    /// When the order was placed.
    pub created_at: DateTime<Utc>,
}

/// One line of an order, joined with the product's display fields.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct OrderLine {
    /// Product purchased.
    pub product_id: ProductId,
    /// Product name at read time.
    pub name: String,
    /// Product description at read time.
    pub description: String,
    /// Units purchased.
    pub quantity: i32,
    /// Unit price snapshotted at checkout time.
    pub price: Decimal,
}

impl OrderLine {
    /// Line subtotal: snapshotted price times quantity, rounded to cents.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        (self.price * Decimal::from(self.quantity)).round_dp(2)
    }
}

/// An order as shown in the history listing.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct OrderSummary {
    /// Order ID.
    pub id: OrderId,
    /// Order total.
    pub total: Decimal,
    /// When the order was placed.
    pub created_at: DateTime<Utc>,
    /// Human-readable line summary, e.g. "Gundam kit (x2), Poster (x1)".
    pub products: String,
}

/// Everything the receipt renderer needs for one order.
#[derive(Debug, Clone)]
pub struct Receipt {
    /// The order row.
    pub order: Order,
    /// Buyer shown in the header.
    pub buyer: CurrentUser,
    /// Lines joined with product display fields.
    pub lines: Vec<OrderLine>,
}

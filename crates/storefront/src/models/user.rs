//! User domain types.

use chrono::{DateTime, Utc};

use mercado_core::{Email, UserId};

/// A registered shopper (domain type).
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Display name, shown on receipts.
    pub name: String,
    /// User's email address.
    pub email: Email,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

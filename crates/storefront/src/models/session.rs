//! Session-related types.
//!
//! Types stored in the session: the authenticated identity and the cart.

use serde::{Deserialize, Serialize};

use mercado_core::{Email, UserId};

use crate::models::user::User;

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in user; the
/// name and email also feed the receipt header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// User's display name.
    pub name: String,
    /// User's email address.
    pub email: Email,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

/// Session keys for per-request state.
pub mod session_keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for storing the shopping cart.
    pub const CART: &str = "cart";
}

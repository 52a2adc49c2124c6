//! Authentication route handlers.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use mercado_core::UserId;

use crate::error::{AppError, Result};
use crate::middleware::{clear_current_user, set_current_user};
use crate::models::{CurrentUser, User};
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Registration request body.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Public view of a user, safe to return to clients.
#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.as_str().to_owned(),
        }
    }
}

/// Auth response body.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub user: UserView,
}

/// Create a new account.
///
/// Registration does not log the user in; the client follows up with a
/// login request.
#[instrument(skip(state, form), fields(email = %form.email))]
pub async fn register(
    State(state): State<AppState>,
    Json(form): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>> {
    let user = AuthService::new(state.pool())
        .register(&form.name, &form.email, &form.password)
        .await?;

    tracing::info!(user_id = %user.id, "user registered");

    Ok(Json(AuthResponse {
        success: true,
        user: UserView::from(&user),
    }))
}

/// Login and store the identity in the session.
#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let user = AuthService::new(state.pool())
        .login(&form.email, &form.password)
        .await?;

    set_current_user(&session, &CurrentUser::from(&user))
        .await
        .map_err(|e| AppError::Internal(format!("failed to store session: {e}")))?;

    Ok(Json(AuthResponse {
        success: true,
        user: UserView::from(&user),
    }))
}

/// Logout: clear the identity and drop the whole session (cart included).
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Json<serde_json::Value>> {
    if let Err(e) = clear_current_user(&session).await {
        tracing::error!("Failed to clear session user: {e}");
    }

    // Also destroy the entire session
    if let Err(e) = session.flush().await {
        tracing::error!("Failed to flush session: {e}");
    }

    Ok(Json(serde_json::json!({ "success": true })))
}

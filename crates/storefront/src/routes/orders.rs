//! Order history and receipt route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use tracing::instrument;

use mercado_core::OrderId;

use crate::db::orders::OrderRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{OrderSummary, Receipt};
use crate::services::receipt::render;
use crate::state::AppState;

/// The authenticated user's order history, newest first.
#[instrument(skip(state, user))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<OrderSummary>>> {
    let orders = OrderRepository::new(state.pool()).history(user.id).await?;
    Ok(Json(orders))
}

/// Download an order's receipt as PDF.
///
/// The order lookup is owner-scoped, so requesting someone else's order is
/// indistinguishable from requesting a missing one.
#[instrument(skip(state, user))]
pub async fn receipt(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<i32>,
) -> Result<Response> {
    let order_id = OrderId::new(id);
    let repo = OrderRepository::new(state.pool());

    let order = repo
        .get_owned(order_id, user.id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))?;

    let lines = repo.lines(order_id).await?;

    let receipt = Receipt {
        order,
        buyer: user,
        lines,
    };

    let bytes = render(&receipt, &state.config().store_name)?;

    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"receipt-{id}.pdf\""),
        ),
    ];

    Ok((headers, bytes).into_response())
}

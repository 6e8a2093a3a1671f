use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use sqlx::PgPool;
use tracing::info;

use crate::api::{response::ApiError, AppState};
use crate::middleware::AuthUser;
use crate::models::order::OrderError;
use crate::repositories::OrderRepository;

pub async fn scan_ticket(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(qr_code): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    match mark_scanned(&state.pool, &qr_code).await {
        Ok(seat_id) => {
            info!("Ticket scanned for seat {}", seat_id);
            Ok((
                StatusCode::OK,
                Json(json!({
                    "success": true,
                    "message": format!("Valid ticket for seat {}", seat_id),
                })),
            ))
        }
        Err(OrderError::TicketAlreadyUsed) => Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({"success": false, "message": "Ticket already used"})),
        )),
        Err(OrderError::TicketUnknown) => Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({"success": false, "message": "Ticket not found"})),
        )),
        Err(OrderError::Storage(err)) => Err(ApiError::storage(&err, "Failed to scan ticket")),
        Err(other) => Err(ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            other.to_string(),
        )),
    }
}

/// Consumes a ticket. The conditional update flips `scanned` exactly once
/// no matter how many scanners race on the same code; losers fall through
/// to the lookup that names the failure.
pub async fn mark_scanned(pool: &PgPool, qr_code: &str) -> Result<String, OrderError> {
    let repo = OrderRepository::new(pool);

    if let Some(seat_id) = repo.mark_ticket_scanned(qr_code).await? {
        return Ok(seat_id);
    }

    match repo.find_ticket(qr_code).await? {
        Some(_) => Err(OrderError::TicketAlreadyUsed),
        None => Err(OrderError::TicketUnknown),
    }
}

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use rust_decimal::Decimal;
use serde_json::json;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::api::{response::ApiError, AppState};
use crate::models::order::{CreateOrderRequest, Order, OrderError};
use crate::models::user::is_valid_email;
use crate::repositories::{EventRepository, OrderPlacement, OrderRepository};

pub async fn create_order(
    State(state): State<AppState>,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    match place_order(&state.pool, payload).await {
        Ok(order) => {
            info!(
                "Order {} placed for {} seat(s) on event {}",
                order.id,
                order.seat_ids.len(),
                order.event_id
            );
            Ok((StatusCode::OK, Json(json!(order))))
        }
        Err(OrderError::EventNotFound) => Ok((
            StatusCode::NOT_FOUND,
            Json(json!({"message": "Event not found"})),
        )),
        Err(OrderError::Validation(message)) => {
            Ok((StatusCode::BAD_REQUEST, Json(json!({"message": message}))))
        }
        Err(OrderError::SeatsUnavailable(seats)) => {
            warn!("Purchase lost the race for seats: {}", seats.join(", "));
            Ok((
                StatusCode::CONFLICT,
                Json(json!({
                    "message": format!("Seats no longer available: {}", seats.join(", ")),
                    "seats": seats,
                })),
            ))
        }
        Err(OrderError::Storage(err)) => Err(ApiError::storage(&err, "Failed to place order")),
        Err(other) => Err(ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            other.to_string(),
        )),
    }
}

/// Validates and prices the requested seats, then runs the claim
/// transaction. Everything before [`OrderRepository::place`] works on a
/// snapshot of the event; the claims table alone decides seat ownership.
pub async fn place_order(pool: &PgPool, payload: CreateOrderRequest) -> Result<Order, OrderError> {
    let event_id = payload
        .event_id
        .as_deref()
        .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
        .ok_or(OrderError::EventNotFound)?;

    let events = EventRepository::new(pool);
    let event = events
        .find_by_id(event_id)
        .await?
        .ok_or(OrderError::EventNotFound)?;

    let customer_name = required(payload.customer_name, "Customer name")?;
    let customer_email = required(payload.customer_email, "Customer email")?;
    if !is_valid_email(&customer_email) {
        return Err(OrderError::Validation(
            "A valid customer email is required".to_string(),
        ));
    }
    let customer_phone = payload
        .customer_phone
        .map(|phone| phone.trim().to_string())
        .filter(|phone| !phone.is_empty());

    let seat_ids = payload.seat_ids.unwrap_or_default();
    if seat_ids.is_empty() {
        return Err(OrderError::Validation(
            "At least one seat is required".to_string(),
        ));
    }

    let mut deduped = seat_ids.clone();
    deduped.sort();
    deduped.dedup();
    if deduped.len() != seat_ids.len() {
        return Err(OrderError::Validation(
            "Duplicate seats in order".to_string(),
        ));
    }

    if let Some(max) = event.max_tickets_per_order {
        if seat_ids.len() > max as usize {
            return Err(OrderError::Validation(format!(
                "At most {} tickets per order",
                max
            )));
        }
    }

    let mut total_amount = Decimal::ZERO;
    for seat_id in &seat_ids {
        match event.resolve_seat(seat_id) {
            Some(tier) => total_amount += tier.price,
            None => {
                return Err(OrderError::Validation(format!(
                    "Seat '{}' does not exist for this event",
                    seat_id
                )))
            }
        }
    }

    if let Some(claimed) = payload.total_amount {
        if claimed != total_amount {
            warn!(
                "Client total {} disagrees with computed total {}, charging the computed amount",
                claimed, total_amount
            );
        }
    }

    let order = Order::new(
        event.id,
        seat_ids,
        customer_name,
        customer_email,
        customer_phone,
        total_amount,
    );

    let orders = OrderRepository::new(pool);
    match orders.place(&order).await? {
        OrderPlacement::Completed => Ok(order),
        OrderPlacement::SeatsTaken(seats) => Err(OrderError::SeatsUnavailable(seats)),
    }
}

fn required(value: Option<String>, field: &str) -> Result<String, OrderError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(OrderError::Validation(format!("{} is required", field))),
    }
}

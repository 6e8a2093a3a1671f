use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::api::{response::ApiError, AppState};
use crate::middleware::AuthUser;
use crate::models::event::{CreateEventRequest, Event, EventStatsResponse, UpdateEventRequest};
use crate::models::order::OrderSummary;
use crate::repositories::{EventRepository, OrderRepository};

const RECENT_ORDERS_LIMIT: i64 = 5;

// No tracking pipeline exists behind the dashboard; it shows fixed
// placeholder engagement numbers.
const PLACEHOLDER_VIEWS: i32 = 1420;
const PLACEHOLDER_CONVERSION_RATE: f64 = 12.5;

#[axum::debug_handler]
pub async fn create_event(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateEventRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut event = match Event::new(payload, user.email) {
        Ok(event) => event,
        Err(err) => return Ok((StatusCode::BAD_REQUEST, Json(json!({"message": err})))),
    };

    let repo = EventRepository::new(&state.pool);
    if let Err(err) = repo.create(&mut event).await {
        return Err(ApiError::storage(&err, "Failed to create event"));
    }

    info!("Created event {} ({})", event.id, event.title);

    Ok((StatusCode::CREATED, Json(json!(event))))
}

pub async fn list_my_events(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let repo = EventRepository::new(&state.pool);

    match repo.list_by_organizer(&user.email).await {
        Ok(events) => Ok(Json(json!(events))),
        Err(err) => Err(ApiError::storage(&err, "Failed to list events")),
    }
}

pub async fn update_event(
    State(state): State<AppState>,
    user: AuthUser,
    Path(event_id): Path<Uuid>,
    Json(payload): Json<UpdateEventRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = EventRepository::new(&state.pool);

    let mut event = match repo.find_by_id(event_id).await {
        Ok(Some(event)) => event,
        Ok(None) => return Err(StatusCode::NOT_FOUND.into()),
        Err(err) => return Err(ApiError::storage(&err, "Failed to fetch event")),
    };

    if event.organizer_id != user.email {
        return Err(ApiError::new(
            StatusCode::FORBIDDEN,
            "You don't have permission to edit this event",
        ));
    }

    if let Err(err) = event.apply_update(payload) {
        return Ok((StatusCode::BAD_REQUEST, Json(json!({"message": err}))));
    }

    if let Err(err) = repo.update(&event).await {
        return Err(ApiError::storage(&err, "Failed to update event"));
    }

    info!("Updated event {}", event.id);

    Ok((StatusCode::OK, Json(json!(event))))
}

pub async fn delete_event(
    State(state): State<AppState>,
    user: AuthUser,
    Path(event_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = EventRepository::new(&state.pool);

    // Looked up without the deleted filter so that repeating a delete
    // still answers 200.
    let event = match repo.find_by_id_any(event_id).await {
        Ok(Some(event)) => event,
        Ok(None) => return Err(StatusCode::NOT_FOUND.into()),
        Err(err) => return Err(ApiError::storage(&err, "Failed to fetch event")),
    };

    if event.organizer_id != user.email {
        return Err(ApiError::new(
            StatusCode::FORBIDDEN,
            "You don't have permission to delete this event",
        ));
    }

    if let Err(err) = repo.mark_deleted(event.id).await {
        return Err(ApiError::storage(&err, "Failed to delete event"));
    }

    info!("Soft-deleted event {}", event.id);

    Ok(Json(json!({"message": "Event deleted successfully"})))
}

pub async fn get_event_by_short_link(
    State(state): State<AppState>,
    Path(short_link): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = EventRepository::new(&state.pool);

    match repo.find_by_short_link(&short_link).await {
        Ok(Some(event)) => Ok(Json(json!(event))),
        Ok(None) => Err(StatusCode::NOT_FOUND.into()),
        Err(err) => Err(ApiError::storage(&err, "Failed to fetch event")),
    }
}

pub async fn event_statistics(
    State(state): State<AppState>,
    user: AuthUser,
    Path(event_id): Path<Uuid>,
) -> Result<Json<EventStatsResponse>, ApiError> {
    let events = EventRepository::new(&state.pool);

    let event = match events.find_by_id(event_id).await {
        Ok(Some(event)) => event,
        Ok(None) => return Err(StatusCode::NOT_FOUND.into()),
        Err(err) => return Err(ApiError::storage(&err, "Failed to fetch event")),
    };

    if event.organizer_id != user.email {
        return Err(ApiError::new(StatusCode::FORBIDDEN, "Access denied"));
    }

    let orders = OrderRepository::new(&state.pool);

    let revenue = match orders.revenue_for_event(event.id).await {
        Ok(revenue) => revenue,
        Err(err) => return Err(ApiError::storage(&err, "Failed to load statistics")),
    };
    let recent = match orders
        .list_recent_success_by_event(event.id, RECENT_ORDERS_LIMIT)
        .await
    {
        Ok(recent) => recent,
        Err(err) => return Err(ApiError::storage(&err, "Failed to load statistics")),
    };

    Ok(Json(EventStatsResponse {
        revenue,
        sold: event.sold,
        total: event.total_capacity,
        views: PLACEHOLDER_VIEWS,
        conversion_rate: PLACEHOLDER_CONVERSION_RATE,
        recent_orders: recent.iter().map(OrderSummary::from_order).collect(),
    }))
}

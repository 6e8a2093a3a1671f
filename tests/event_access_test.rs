use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use bilet::api::events::{delete_event, event_statistics, update_event};
use bilet::api::AppState;
use bilet::middleware::AuthUser;
use bilet::models::event::{CreateEventRequest, Event, TicketTierInput, UpdateEventRequest};
use bilet::models::user::ROLE_ORGANIZER;
use bilet::repositories::EventRepository;
use bilet::services::{ImageStore, JwtConfig};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

fn app_state(pool: &PgPool) -> AppState {
    AppState {
        pool: pool.clone(),
        jwt: JwtConfig {
            secret: "integration-test-secret".to_string(),
            ttl_seconds: 3600,
        },
        images: ImageStore::new("uploads"),
    }
}

fn organizer(email: &str) -> AuthUser {
    AuthUser {
        email: email.to_string(),
        role: ROLE_ORGANIZER.to_string(),
    }
}

fn event_request() -> CreateEventRequest {
    CreateEventRequest {
        title: Some("Jazz Night".to_string()),
        description: Some("An evening of live jazz".to_string()),
        category: Some("music".to_string()),
        age_restriction: Some("none".to_string()),
        event_date: Some("2026-10-01".to_string()),
        start_time: Some("19:00:00".to_string()),
        end_time: Some("23:00:00".to_string()),
        is_physical: Some(true),
        venue_name: Some("Green Hall".to_string()),
        address: Some("12 Nizami St".to_string()),
        is_private: Some(false),
        cover_image_url: None,
        tiers: Some(vec![TicketTierInput {
            id: None,
            tier_id: Some("std".to_string()),
            name: Some("Standard".to_string()),
            price: Some(Decimal::from(10)),
            quantity: Some(30),
            color: None,
            bg_scale: None,
            bg_offset_x: None,
            bg_offset_y: None,
            width: None,
            height: None,
            src: None,
        }]),
        is_reserved_seating: Some(false),
        seats: None,
        seat_map_config: serde_json::Value::Null,
        ticket_design: serde_json::Value::Null,
        buyer_questions: None,
    }
}

fn title_patch(title: &str) -> UpdateEventRequest {
    UpdateEventRequest {
        title: Some(title.to_string()),
        description: None,
        category: None,
        event_date: None,
        start_time: None,
        end_time: None,
        is_physical: None,
        venue_name: None,
        address: None,
        is_private: None,
        age_restriction: None,
        max_tickets_per_order: None,
        cover_image_url: None,
        tiers: None,
        seats: None,
    }
}

async fn create_event(pool: &PgPool, owner: &str) -> Event {
    let mut event = Event::new(event_request(), owner.to_string()).unwrap();
    EventRepository::new(pool).create(&mut event).await.unwrap();
    event
}

#[sqlx::test(migrations = "src/db/migrations")]
async fn test_update_by_non_owner_is_forbidden(pool: PgPool) {
    let event = create_event(&pool, "a@example.com").await;
    let state = app_state(&pool);

    let err = update_event(
        State(state),
        organizer("b@example.com"),
        Path(event.id),
        Json(title_patch("Hijacked")),
    )
    .await
    .err()
    .unwrap();
    assert_eq!(err.status, StatusCode::FORBIDDEN);

    let unchanged = EventRepository::new(&pool)
        .find_by_id(event.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(unchanged.title, "Jazz Night");
}

#[sqlx::test(migrations = "src/db/migrations")]
async fn test_update_by_owner_succeeds(pool: PgPool) {
    let event = create_event(&pool, "a@example.com").await;
    let state = app_state(&pool);

    let response = update_event(
        State(state),
        organizer("a@example.com"),
        Path(event.id),
        Json(title_patch("Blues Night")),
    )
    .await
    .unwrap()
    .into_response();
    assert_eq!(response.status(), StatusCode::OK);

    let updated = EventRepository::new(&pool)
        .find_by_id(event.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.title, "Blues Night");
}

#[sqlx::test(migrations = "src/db/migrations")]
async fn test_delete_by_non_owner_is_forbidden(pool: PgPool) {
    let event = create_event(&pool, "a@example.com").await;
    let state = app_state(&pool);

    let err = delete_event(State(state), organizer("b@example.com"), Path(event.id))
        .await
        .err()
        .unwrap();
    assert_eq!(err.status, StatusCode::FORBIDDEN);

    let still_there = EventRepository::new(&pool).find_by_id(event.id).await.unwrap();
    assert!(still_there.is_some());
}

#[sqlx::test(migrations = "src/db/migrations")]
async fn test_delete_by_owner_is_idempotent(pool: PgPool) {
    let event = create_event(&pool, "a@example.com").await;
    let state = app_state(&pool);

    let first = delete_event(
        State(state.clone()),
        organizer("a@example.com"),
        Path(event.id),
    )
    .await
    .unwrap()
    .into_response();
    assert_eq!(first.status(), StatusCode::OK);

    let again = delete_event(State(state), organizer("a@example.com"), Path(event.id))
        .await
        .unwrap()
        .into_response();
    assert_eq!(again.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "src/db/migrations")]
async fn test_statistics_require_ownership(pool: PgPool) {
    let event = create_event(&pool, "a@example.com").await;
    let state = app_state(&pool);

    let err = event_statistics(
        State(state.clone()),
        organizer("b@example.com"),
        Path(event.id),
    )
    .await
    .err()
    .unwrap();
    assert_eq!(err.status, StatusCode::FORBIDDEN);

    let missing = event_statistics(State(state), organizer("a@example.com"), Path(Uuid::new_v4()))
        .await
        .err()
        .unwrap();
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "src/db/migrations")]
async fn test_statistics_for_fresh_event(pool: PgPool) {
    let event = create_event(&pool, "a@example.com").await;
    let state = app_state(&pool);

    let Json(stats) = event_statistics(State(state), organizer("a@example.com"), Path(event.id))
        .await
        .unwrap();

    assert_eq!(stats.revenue, Decimal::ZERO);
    assert_eq!(stats.sold, 0);
    assert_eq!(stats.total, 30);
    assert_eq!(stats.views, 1420);
    assert!(stats.recent_orders.is_empty());
}

use bilet::api::orders::{mark_scanned, place_order};
use bilet::models::event::{CreateEventRequest, Event, TicketTierInput};
use bilet::models::order::{CreateOrderRequest, Order, OrderError};
use bilet::repositories::{EventRepository, OrderRepository};
use rust_decimal::Decimal;
use sqlx::PgPool;

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

/// Creates an event and buys the given seats, returning the order with its
/// freshly issued tickets.
async fn purchased_order(pool: &PgPool, seats: &[&str]) -> (Event, Order) {
    let mut event = Event::new(event_request(), "owner@example.com".to_string()).unwrap();
    EventRepository::new(pool).create(&mut event).await.unwrap();

    let request = CreateOrderRequest {
        event_id: Some(event.id.to_string()),
        seat_ids: Some(seats.iter().map(|s| s.to_string()).collect()),
        customer_name: Some("Leyla Aliyeva".to_string()),
        customer_email: Some("leyla@example.com".to_string()),
        customer_phone: None,
        total_amount: None,
    };
    let order = place_order(pool, request).await.unwrap();

    (event, order)
}

#[sqlx::test(migrations = "src/db/migrations")]
async fn test_scan_consumes_ticket(pool: PgPool) {
    let (_, order) = purchased_order(&pool, &["GA_std_2"]).await;
    let qr_code = order.tickets[0].qr_code.clone();

    let seat_id = mark_scanned(&pool, &qr_code).await.unwrap();
    assert_eq!(seat_id, "GA_std_2");

    let err = mark_scanned(&pool, &qr_code).await.unwrap_err();
    assert!(matches!(err, OrderError::TicketAlreadyUsed));

    let ticket = OrderRepository::new(&pool)
        .find_ticket(&qr_code)
        .await
        .unwrap()
        .unwrap();
    assert!(ticket.scanned);
    assert!(ticket.scanned_at.is_some());
}

#[sqlx::test(migrations = "src/db/migrations")]
async fn test_unknown_token_is_rejected(pool: PgPool) {
    let err = mark_scanned(&pool, "no-such-token").await.unwrap_err();
    assert!(matches!(err, OrderError::TicketUnknown));
}

#[sqlx::test(migrations = "src/db/migrations")]
async fn test_concurrent_scans_accept_once(pool: PgPool) {
    let (_, order) = purchased_order(&pool, &["GA_std_1"]).await;
    let qr_code = order.tickets[0].qr_code.clone();

    let (first, second) = tokio::join!(mark_scanned(&pool, &qr_code), mark_scanned(&pool, &qr_code));

    assert!(
        first.is_ok() != second.is_ok(),
        "exactly one scan must be accepted: {:?} / {:?}",
        first,
        second
    );

    let loser = if first.is_ok() { second } else { first };
    assert!(matches!(loser.unwrap_err(), OrderError::TicketAlreadyUsed));
}

#[sqlx::test(migrations = "src/db/migrations")]
async fn test_scan_survives_event_removal(pool: PgPool) {
    let (event, order) = purchased_order(&pool, &["GA_std_1"]).await;
    let qr_code = order.tickets[0].qr_code.clone();

    EventRepository::new(&pool)
        .mark_deleted(event.id)
        .await
        .unwrap();

    // Already-issued tickets stay valid at the door after the event page
    // is taken down.
    let seat_id = mark_scanned(&pool, &qr_code).await.unwrap();
    assert_eq!(seat_id, "GA_std_1");
}

#[sqlx::test(migrations = "src/db/migrations")]
async fn test_tickets_scan_independently(pool: PgPool) {
    let (_, order) = purchased_order(&pool, &["GA_std_1", "GA_std_2"]).await;

    let first = order.tickets[0].qr_code.clone();
    let second = order.tickets[1].qr_code.clone();

    mark_scanned(&pool, &first).await.unwrap();

    let untouched = OrderRepository::new(&pool)
        .find_ticket(&second)
        .await
        .unwrap()
        .unwrap();
    assert!(!untouched.scanned);

    let seat_id = mark_scanned(&pool, &second).await.unwrap();
    assert_eq!(seat_id, "GA_std_2");
}

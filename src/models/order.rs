use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use rand::RngCore;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "order_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    Success,
    Pending,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub event_id: Uuid,

    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,

    pub seat_ids: Vec<String>,
    pub total_amount: Decimal,
    pub status: OrderStatus,

    pub created_at: DateTime<Utc>,

    /// Loaded separately from the tickets table.
    #[sqlx(skip)]
    #[serde(default)]
    pub tickets: Vec<OrderTicket>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderTicket {
    pub qr_code: String,
    pub order_id: Uuid,
    pub event_id: Uuid,
    pub seat_id: String,
    pub scanned: bool,
    pub scanned_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub event_id: Option<String>,
    pub seat_ids: Option<Vec<String>>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,

    /// Client-side total, accepted for cross-checking only. The charged
    /// amount is always recomputed from tier prices.
    pub total_amount: Option<Decimal>,
}

/// A row of the statistics dashboard's recent-orders list.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub id: String,
    pub customer: String,
    pub email: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub amount: Decimal,
    pub date: String,
    pub status: String,
}

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Event not found")]
    EventNotFound,
    #[error("{0}")]
    Validation(String),
    #[error("Some seats are no longer available")]
    SeatsUnavailable(Vec<String>),
    #[error("Ticket not found")]
    TicketUnknown,
    #[error("Ticket already used")]
    TicketAlreadyUsed,
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl Order {
    /// Assembles a paid order together with one QR ticket per seat. The
    /// caller has already priced the seats and verified they exist.
    pub fn new(
        event_id: Uuid,
        seat_ids: Vec<String>,
        customer_name: String,
        customer_email: String,
        customer_phone: Option<String>,
        total_amount: Decimal,
    ) -> Self {
        let id = Uuid::new_v4();
        let tickets = seat_ids
            .iter()
            .map(|seat_id| OrderTicket::new(id, event_id, seat_id.clone()))
            .collect();

        Self {
            id,
            event_id,
            customer_name,
            customer_email,
            customer_phone,
            seat_ids,
            total_amount,
            status: OrderStatus::Success,
            created_at: Utc::now(),
            tickets,
        }
    }
}

impl OrderTicket {
    pub fn new(order_id: Uuid, event_id: Uuid, seat_id: String) -> Self {
        Self {
            qr_code: generate_qr_token(),
            order_id,
            event_id,
            seat_id,
            scanned: false,
            scanned_at: None,
        }
    }
}

impl OrderSummary {
    pub fn from_order(order: &Order) -> Self {
        let simple = order.id.simple().to_string();
        Self {
            id: simple[simple.len() - 6..].to_uppercase(),
            customer: order.customer_name.clone(),
            email: order.customer_email.clone(),
            kind: format!("{} bilet", order.seat_ids.len()),
            amount: order.total_amount,
            date: order.created_at.format("%d.%m.%Y, %H:%M").to_string(),
            status: "success".to_string(),
        }
    }
}

/// An unguessable ticket token: 16 random bytes, URL-safe base64 so it can
/// live in a QR code and a path segment without escaping.
pub fn generate_qr_token() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_order() -> Order {
        Order::new(
            Uuid::new_v4(),
            vec!["GA_std_1".to_string(), "GA_std_2".to_string()],
            "Leyla Aliyeva".to_string(),
            "leyla@example.com".to_string(),
            Some("+994501234567".to_string()),
            Decimal::from(20),
        )
    }

    #[test]
    fn test_order_builds_one_ticket_per_seat() {
        let order = sample_order();

        assert_eq!(order.tickets.len(), 2);
        assert_eq!(order.status, OrderStatus::Success);
        for (ticket, seat_id) in order.tickets.iter().zip(&order.seat_ids) {
            assert_eq!(ticket.order_id, order.id);
            assert_eq!(ticket.event_id, order.event_id);
            assert_eq!(&ticket.seat_id, seat_id);
            assert!(!ticket.scanned);
            assert!(ticket.scanned_at.is_none());
        }
        assert_ne!(order.tickets[0].qr_code, order.tickets[1].qr_code);
    }

    #[test]
    fn test_qr_tokens_are_url_safe_and_distinct() {
        let tokens: Vec<String> = (0..100).map(|_| generate_qr_token()).collect();

        for token in &tokens {
            assert_eq!(token.len(), 22);
            assert!(token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        }

        let mut unique = tokens.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), tokens.len());
    }

    #[test]
    fn test_order_summary_formatting() {
        let order = sample_order();
        let summary = OrderSummary::from_order(&order);

        assert_eq!(summary.id.len(), 6);
        assert_eq!(summary.id, summary.id.to_uppercase());
        assert_eq!(summary.customer, "Leyla Aliyeva");
        assert_eq!(summary.kind, "2 bilet");
        assert_eq!(summary.amount, Decimal::from(20));
        assert_eq!(summary.status, "success");
        // 25.12.2026, 19:45 style timestamps.
        assert_eq!(summary.date.len(), 17);
        assert_eq!(&summary.date[2..3], ".");
        assert_eq!(&summary.date[10..12], ", ");
    }

    #[test]
    fn test_status_serializes_uppercase() {
        let json = serde_json::to_string(&OrderStatus::Success).unwrap();
        assert_eq!(json, "\"SUCCESS\"");
    }
}

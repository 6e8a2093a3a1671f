use anyhow::Result;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::order::{Order, OrderStatus, OrderTicket};

pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

/// Outcome of the purchase transaction.
pub enum OrderPlacement {
    Completed,
    SeatsTaken(Vec<String>),
}

impl<'a> OrderRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Claims every requested seat and records the order in one
    /// transaction. The primary key on the claims table arbitrates racing
    /// purchases: whichever transaction inserts a claim first owns the
    /// seat, the loser rolls back with the contested seats listed.
    pub async fn place(&self, order: &Order) -> Result<OrderPlacement> {
        let mut tx = self.pool.begin().await?;

        // Claims go in in seat order, so two orders over overlapping seat
        // sets always collide instead of deadlocking.
        let claimed: Vec<String> = sqlx::query_scalar(
            "INSERT INTO bilet_seat_claims (event_id, seat_id, order_id)
             SELECT $1, t.seat_id, $2 FROM UNNEST($3::text[]) AS t(seat_id) ORDER BY t.seat_id
             ON CONFLICT DO NOTHING
             RETURNING seat_id",
        )
        .bind(order.event_id)
        .bind(order.id)
        .bind(&order.seat_ids)
        .fetch_all(&mut *tx)
        .await?;

        if claimed.len() < order.seat_ids.len() {
            tx.rollback().await?;
            let taken = order
                .seat_ids
                .iter()
                .filter(|seat| !claimed.contains(seat))
                .cloned()
                .collect();
            return Ok(OrderPlacement::SeatsTaken(taken));
        }

        sqlx::query(
            "INSERT INTO bilet_orders (id, event_id, customer_name, customer_email, customer_phone,
                 seat_ids, total_amount, status, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(order.id)
        .bind(order.event_id)
        .bind(&order.customer_name)
        .bind(&order.customer_email)
        .bind(&order.customer_phone)
        .bind(&order.seat_ids)
        .bind(order.total_amount)
        .bind(order.status)
        .bind(order.created_at)
        .execute(&mut *tx)
        .await?;

        for ticket in &order.tickets {
            sqlx::query(
                "INSERT INTO bilet_order_tickets (qr_code, order_id, event_id, seat_id, scanned, scanned_at)
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(&ticket.qr_code)
            .bind(ticket.order_id)
            .bind(ticket.event_id)
            .bind(&ticket.seat_id)
            .bind(ticket.scanned)
            .bind(ticket.scanned_at)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            "UPDATE bilet_events SET sold_seats = sold_seats || $1, sold = sold + $2, updated_at = NOW()
             WHERE id = $3",
        )
        .bind(&order.seat_ids)
        .bind(order.seat_ids.len() as i32)
        .bind(order.event_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(OrderPlacement::Completed)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>> {
        let order = sqlx::query_as::<_, Order>("SELECT * FROM bilet_orders WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        let mut order = match order {
            Some(order) => order,
            None => return Ok(None),
        };

        order.tickets = sqlx::query_as::<_, OrderTicket>(
            "SELECT * FROM bilet_order_tickets WHERE order_id = $1 ORDER BY seat_id",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        Ok(Some(order))
    }

    pub async fn list_recent_success_by_event(
        &self,
        event_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(
            "SELECT * FROM bilet_orders WHERE event_id = $1 AND status = $2 ORDER BY created_at DESC LIMIT $3",
        )
        .bind(event_id)
        .bind(OrderStatus::Success)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(orders)
    }

    pub async fn revenue_for_event(&self, event_id: Uuid) -> Result<Decimal> {
        let revenue: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(total_amount), 0) FROM bilet_orders WHERE event_id = $1 AND status = $2",
        )
        .bind(event_id)
        .bind(OrderStatus::Success)
        .fetch_one(self.pool)
        .await?;

        Ok(revenue)
    }

    /// Flips an unscanned ticket to scanned. `None` means the token either
    /// does not exist or was scanned before; `find_ticket` tells the two
    /// apart.
    pub async fn mark_ticket_scanned(&self, qr_code: &str) -> Result<Option<String>> {
        let seat_id: Option<String> = sqlx::query_scalar(
            "UPDATE bilet_order_tickets SET scanned = TRUE, scanned_at = NOW()
             WHERE qr_code = $1 AND scanned = FALSE
             RETURNING seat_id",
        )
        .bind(qr_code)
        .fetch_optional(self.pool)
        .await?;

        Ok(seat_id)
    }

    pub async fn find_ticket(&self, qr_code: &str) -> Result<Option<OrderTicket>> {
        let ticket = sqlx::query_as::<_, OrderTicket>(
            "SELECT * FROM bilet_order_tickets WHERE qr_code = $1",
        )
        .bind(qr_code)
        .fetch_optional(self.pool)
        .await?;

        Ok(ticket)
    }
}

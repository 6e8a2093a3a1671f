use anyhow::Result;
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use crate::models::event::{generate_short_link, Event};

use super::{is_unique_violation, retry_once};

const SHORT_LINK_ATTEMPTS: u32 = 3;

pub struct EventRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> EventRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a new event, regenerating the short link on the rare
    /// collision with an existing one.
    pub async fn create(&self, event: &mut Event) -> Result<()> {
        let mut attempts = 0;
        loop {
            match self.insert(event).await {
                Err(err)
                    if attempts < SHORT_LINK_ATTEMPTS
                        && is_unique_violation(&err, "bilet_events_short_link_key") =>
                {
                    attempts += 1;
                    warn!(
                        "Short link {} already taken, regenerating",
                        event.short_link
                    );
                    event.short_link = generate_short_link();
                }
                other => return other,
            }
        }
    }

    async fn insert(&self, event: &Event) -> Result<()> {
        sqlx::query(
            "INSERT INTO bilet_events (id, organizer_id, title, description, category, age_restriction,
                 event_date, start_time, end_time, is_physical, venue_name, address, is_private,
                 cover_image_url, tiers, is_reserved_seating, seats, seat_map_config, ticket_design,
                 buyer_questions, max_tickets_per_order, total_capacity, platform_fee, short_link,
                 status, sold_seats, sold, deleted, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17,
                 $18, $19, $20, $21, $22, $23, $24, $25, $26, $27, $28, $29, $30)",
        )
        .bind(event.id)
        .bind(&event.organizer_id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(&event.category)
        .bind(&event.age_restriction)
        .bind(event.event_date)
        .bind(event.start_time)
        .bind(event.end_time)
        .bind(event.is_physical)
        .bind(&event.venue_name)
        .bind(&event.address)
        .bind(event.is_private)
        .bind(&event.cover_image_url)
        .bind(serde_json::to_value(&event.tiers)?)
        .bind(event.is_reserved_seating)
        .bind(serde_json::to_value(&event.seats)?)
        .bind(&event.seat_map_config)
        .bind(&event.ticket_design)
        .bind(serde_json::to_value(&event.buyer_questions)?)
        .bind(event.max_tickets_per_order)
        .bind(event.total_capacity)
        .bind(event.platform_fee)
        .bind(&event.short_link)
        .bind(&event.status)
        .bind(&event.sold_seats)
        .bind(event.sold)
        .bind(event.deleted)
        .bind(event.created_at)
        .bind(event.updated_at)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Event>> {
        retry_once(|| async {
            let event = sqlx::query_as::<_, Event>(
                "SELECT * FROM bilet_events WHERE id = $1 AND deleted = FALSE",
            )
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

            Ok(event)
        })
        .await
    }

    /// Like `find_by_id` but ignores the deleted flag. Deletion reads
    /// through this so repeating it stays a 200.
    pub async fn find_by_id_any(&self, id: Uuid) -> Result<Option<Event>> {
        retry_once(|| async {
            let event = sqlx::query_as::<_, Event>("SELECT * FROM bilet_events WHERE id = $1")
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

            Ok(event)
        })
        .await
    }

    pub async fn find_by_short_link(&self, short_link: &str) -> Result<Option<Event>> {
        retry_once(|| async {
            let event = sqlx::query_as::<_, Event>(
                "SELECT * FROM bilet_events WHERE short_link = $1 AND deleted = FALSE",
            )
            .bind(short_link)
            .fetch_optional(self.pool)
            .await?;

            Ok(event)
        })
        .await
    }

    pub async fn list_by_organizer(&self, organizer_id: &str) -> Result<Vec<Event>> {
        let events = sqlx::query_as::<_, Event>(
            "SELECT * FROM bilet_events WHERE organizer_id = $1 AND deleted = FALSE ORDER BY created_at DESC",
        )
        .bind(organizer_id)
        .fetch_all(self.pool)
        .await?;

        Ok(events)
    }

    /// Persists the editable columns. The sold counters belong to the order
    /// transaction and are never written from here.
    pub async fn update(&self, event: &Event) -> Result<()> {
        sqlx::query(
            "UPDATE bilet_events SET title = $1, description = $2, category = $3,
                 age_restriction = $4, event_date = $5, start_time = $6, end_time = $7,
                 is_physical = $8, venue_name = $9, address = $10, is_private = $11,
                 cover_image_url = $12, tiers = $13, seats = $14, max_tickets_per_order = $15,
                 total_capacity = $16, platform_fee = $17, updated_at = $18
             WHERE id = $19",
        )
        .bind(&event.title)
        .bind(&event.description)
        .bind(&event.category)
        .bind(&event.age_restriction)
        .bind(event.event_date)
        .bind(event.start_time)
        .bind(event.end_time)
        .bind(event.is_physical)
        .bind(&event.venue_name)
        .bind(&event.address)
        .bind(event.is_private)
        .bind(&event.cover_image_url)
        .bind(serde_json::to_value(&event.tiers)?)
        .bind(serde_json::to_value(&event.seats)?)
        .bind(event.max_tickets_per_order)
        .bind(event.total_capacity)
        .bind(event.platform_fee)
        .bind(event.updated_at)
        .bind(event.id)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    pub async fn mark_deleted(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE bilet_events SET deleted = TRUE, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(())
    }
}

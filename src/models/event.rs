use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::order::OrderSummary;

pub const STATUS_PUBLISHED: &str = "PUBLISHED";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,

    /// Owning organizer, identified by email (the token subject).
    pub organizer_id: String,

    pub title: String,
    pub description: String,
    pub category: String,
    pub age_restriction: String,

    pub event_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,

    pub is_physical: bool,
    pub venue_name: Option<String>,
    pub address: Option<String>,

    pub is_private: bool,
    pub cover_image_url: Option<String>,

    #[sqlx(json)]
    pub tiers: Vec<TicketTier>,

    pub is_reserved_seating: bool,

    #[sqlx(json)]
    pub seats: Option<Vec<Seat>>,

    /// Client-authored blobs, stored and returned verbatim.
    pub seat_map_config: serde_json::Value,
    pub ticket_design: serde_json::Value,

    #[sqlx(json)]
    pub buyer_questions: Option<Vec<BuyerQuestion>>,

    pub max_tickets_per_order: Option<i32>,

    pub total_capacity: i32,
    pub platform_fee: Decimal,
    pub short_link: String,
    pub status: String,

    pub sold_seats: Vec<String>,
    pub sold: i32,

    pub deleted: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketTier {
    pub tier_id: String,
    pub name: String,
    pub price: Decimal,
    pub quantity: i32,
    pub color: Option<String>,

    pub bg_scale: Option<i32>,
    pub bg_offset_x: Option<i32>,
    pub bg_offset_y: Option<i32>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub src: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seat {
    pub row: i32,
    pub col: i32,
    pub tier_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyerQuestion {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub age_restriction: Option<String>,
    pub event_date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub is_physical: Option<bool>,
    pub venue_name: Option<String>,
    pub address: Option<String>,
    pub is_private: Option<bool>,
    pub cover_image_url: Option<String>,
    pub tiers: Option<Vec<TicketTierInput>>,
    pub is_reserved_seating: Option<bool>,
    pub seats: Option<Vec<SeatInput>>,
    #[serde(default)]
    pub seat_map_config: serde_json::Value,
    #[serde(default)]
    pub ticket_design: serde_json::Value,
    pub buyer_questions: Option<Vec<BuyerQuestion>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketTierInput {
    pub id: Option<String>,
    pub tier_id: Option<String>,
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub quantity: Option<i32>,
    pub color: Option<String>,
    pub bg_scale: Option<i32>,
    pub bg_offset_x: Option<i32>,
    pub bg_offset_y: Option<i32>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub src: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatInput {
    pub row: Option<i32>,
    pub col: Option<i32>,
    pub tier_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub event_date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub is_physical: Option<bool>,
    pub venue_name: Option<String>,
    pub address: Option<String>,
    pub is_private: Option<bool>,
    pub age_restriction: Option<String>,
    pub max_tickets_per_order: Option<i32>,
    pub cover_image_url: Option<String>,
    pub tiers: Option<Vec<TicketTierInput>>,
    pub seats: Option<Vec<SeatInput>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventStatsResponse {
    pub revenue: Decimal,
    pub sold: i32,
    pub total: i32,
    pub views: i32,
    pub conversion_rate: f64,
    pub recent_orders: Vec<OrderSummary>,
}

/// A requested seat identifier, parsed from its wire form: `{row}_{col}`
/// for reserved-seating events, `GA_{tierId}_{index}` for general
/// admission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeatId {
    Reserved { row: i32, col: i32 },
    General { tier_id: String, index: i32 },
}

impl SeatId {
    pub fn parse(raw: &str) -> Option<SeatId> {
        if let Some(rest) = raw.strip_prefix("GA_") {
            // The tier id may itself contain underscores, so the index is
            // split off from the right.
            let (tier_id, index) = rest.rsplit_once('_')?;
            if tier_id.is_empty() {
                return None;
            }
            let index = index.parse::<i32>().ok()?;
            if index < 1 {
                return None;
            }
            Some(SeatId::General {
                tier_id: tier_id.to_string(),
                index,
            })
        } else {
            let (row, col) = raw.split_once('_')?;
            Some(SeatId::Reserved {
                row: row.parse().ok()?,
                col: col.parse().ok()?,
            })
        }
    }
}

impl Event {
    pub fn new(create: CreateEventRequest, organizer_id: String) -> Result<Self, String> {
        let title = required_text(create.title, "Title")?;
        let description = required_text(create.description, "Description")?;
        let category = required_text(create.category, "Category")?;
        let age_restriction = required_text(create.age_restriction, "Age restriction")?;

        let event_date = parse_event_date(create.event_date.as_deref())?;
        let start_time = parse_event_time(create.start_time.as_deref(), "Start time")?;
        let end_time = parse_event_time(create.end_time.as_deref(), "End time")?;

        let is_physical = create
            .is_physical
            .ok_or_else(|| "Location type is required".to_string())?;
        let is_private = create
            .is_private
            .ok_or_else(|| "Privacy setting is required".to_string())?;
        let is_reserved_seating = create
            .is_reserved_seating
            .ok_or_else(|| "Seating type is required".to_string())?;

        let tiers = build_tiers(create.tiers)?;

        let seats = if is_reserved_seating {
            let seats = build_seats(create.seats.unwrap_or_default())?;
            if seats.is_empty() {
                return Err("Reserved seating requires a seat layout".to_string());
            }
            check_seat_tiers(&seats, &tiers)?;
            Some(seats)
        } else {
            None
        };

        let total_capacity = tiers.iter().map(|t| t.quantity).sum();
        let now = Utc::now();

        Ok(Self {
            id: Uuid::new_v4(),
            organizer_id,
            title,
            description,
            category,
            age_restriction,
            event_date,
            start_time,
            end_time,
            is_physical,
            venue_name: non_blank(create.venue_name),
            address: non_blank(create.address),
            is_private,
            cover_image_url: non_blank(create.cover_image_url),
            tiers,
            is_reserved_seating,
            seats,
            seat_map_config: create.seat_map_config,
            ticket_design: create.ticket_design,
            buyer_questions: create.buyer_questions,
            max_tickets_per_order: None,
            total_capacity,
            platform_fee: platform_fee_for(total_capacity),
            short_link: generate_short_link(),
            status: STATUS_PUBLISHED.to_string(),
            sold_seats: Vec::new(),
            sold: 0,
            deleted: false,
            created_at: now,
            updated_at: now,
        })
    }

    /// Applies a partial update. Absent fields and blank strings leave the
    /// current value in place; tier or seat changes are rejected once
    /// tickets have been sold, since they would invalidate issued tickets.
    pub fn apply_update(&mut self, patch: UpdateEventRequest) -> Result<(), String> {
        if let Some(title) = non_blank(patch.title) {
            self.title = title;
        }
        if let Some(description) = non_blank(patch.description) {
            self.description = description;
        }
        if let Some(category) = non_blank(patch.category) {
            self.category = category;
        }
        if let Some(date) = non_blank(patch.event_date) {
            self.event_date = parse_event_date(Some(&date))?;
        }
        if let Some(time) = non_blank(patch.start_time) {
            self.start_time = parse_event_time(Some(&time), "Start time")?;
        }
        if let Some(time) = non_blank(patch.end_time) {
            self.end_time = parse_event_time(Some(&time), "End time")?;
        }
        if let Some(is_physical) = patch.is_physical {
            self.is_physical = is_physical;
        }
        if let Some(venue_name) = non_blank(patch.venue_name) {
            self.venue_name = Some(venue_name);
        }
        if let Some(address) = non_blank(patch.address) {
            self.address = Some(address);
        }
        if let Some(is_private) = patch.is_private {
            self.is_private = is_private;
        }
        if let Some(age_restriction) = non_blank(patch.age_restriction) {
            self.age_restriction = age_restriction;
        }
        if let Some(max) = patch.max_tickets_per_order {
            if max < 1 {
                return Err("Max tickets per order must be at least 1".to_string());
            }
            self.max_tickets_per_order = Some(max);
        }
        if let Some(cover_image_url) = non_blank(patch.cover_image_url) {
            self.cover_image_url = Some(cover_image_url);
        }

        if patch.tiers.is_some() || patch.seats.is_some() {
            if self.sold > 0 {
                return Err(
                    "Tiers and seats cannot change after tickets have been sold".to_string()
                );
            }
            if let Some(tiers) = patch.tiers {
                self.tiers = build_tiers(Some(tiers))?;
                self.total_capacity = self.tiers.iter().map(|t| t.quantity).sum();
                self.platform_fee = platform_fee_for(self.total_capacity);
            }
            if let Some(seats) = patch.seats {
                if !self.is_reserved_seating {
                    return Err("Seat layouts only apply to reserved seating events".to_string());
                }
                self.seats = Some(build_seats(seats)?);
            }
            if self.is_reserved_seating {
                let seats = self.seats.as_deref().unwrap_or_default();
                if seats.is_empty() {
                    return Err("Reserved seating requires a seat layout".to_string());
                }
                check_seat_tiers(seats, &self.tiers)?;
            }
        }

        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn tier(&self, tier_id: &str) -> Option<&TicketTier> {
        self.tiers.iter().find(|t| t.tier_id == tier_id)
    }

    pub fn has_seat(&self, row: i32, col: i32) -> bool {
        self.seats
            .as_deref()
            .unwrap_or_default()
            .iter()
            .any(|s| s.row == row && s.col == col)
    }

    /// Resolves a requested seat identifier to the tier that prices it, or
    /// `None` when the identifier does not address a purchasable unit of
    /// this event.
    pub fn resolve_seat(&self, raw: &str) -> Option<&TicketTier> {
        match SeatId::parse(raw)? {
            SeatId::Reserved { row, col } => {
                if !self.is_reserved_seating {
                    return None;
                }
                let seat = self
                    .seats
                    .as_deref()
                    .unwrap_or_default()
                    .iter()
                    .find(|s| s.row == row && s.col == col)?;
                self.tier(&seat.tier_id)
            }
            SeatId::General { tier_id, index } => {
                if self.is_reserved_seating {
                    return None;
                }
                let tier = self.tier(&tier_id)?;
                if index > tier.quantity {
                    return None;
                }
                Some(tier)
            }
        }
    }
}

pub fn platform_fee_for(capacity: i32) -> Decimal {
    if capacity <= 10 {
        Decimal::ZERO
    } else if capacity <= 50 {
        Decimal::from(5)
    } else if capacity <= 100 {
        Decimal::from(10)
    } else {
        Decimal::from(15)
    }
}

/// Eight lowercase hex characters, the public alias of an event.
pub fn generate_short_link() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

fn required_text(value: Option<String>, field: &str) -> Result<String, String> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(format!("{} is required", field)),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_event_date(value: Option<&str>) -> Result<NaiveDate, String> {
    let raw = value.map(str::trim).unwrap_or_default();
    if raw.is_empty() {
        return Err("Event date is required".to_string());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| format!("Event date '{}' is not a valid date", raw))
}

fn parse_event_time(value: Option<&str>, field: &str) -> Result<NaiveTime, String> {
    let raw = value.map(str::trim).unwrap_or_default();
    if raw.is_empty() {
        return Err(format!("{} is required", field));
    }
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .map_err(|_| format!("{} '{}' is not a valid time", field, raw))
}

fn build_tiers(tiers: Option<Vec<TicketTierInput>>) -> Result<Vec<TicketTier>, String> {
    let inputs = tiers.unwrap_or_default();
    if inputs.is_empty() {
        return Err("At least one ticket tier is required".to_string());
    }

    let mut out: Vec<TicketTier> = Vec::with_capacity(inputs.len());
    for input in inputs {
        // The wizard sends the stable id as tierId on newer payloads and
        // as id on older ones.
        let tier_id = match input.tier_id.or(input.id).map(|v| v.trim().to_string()) {
            Some(v) if !v.is_empty() => v,
            _ => return Err("Every ticket tier needs a tierId".to_string()),
        };
        if out.iter().any(|t| t.tier_id == tier_id) {
            return Err(format!("Duplicate ticket tier id '{}'", tier_id));
        }

        let name = match input.name.map(|v| v.trim().to_string()) {
            Some(v) if !v.is_empty() => v,
            _ => return Err("Every ticket tier needs a name".to_string()),
        };
        let price = input
            .price
            .ok_or_else(|| format!("Tier '{}' needs a price", name))?;
        if price < Decimal::ZERO {
            return Err(format!("Tier '{}' cannot have a negative price", name));
        }
        let quantity = input
            .quantity
            .ok_or_else(|| format!("Tier '{}' needs a quantity", name))?;
        if quantity < 1 {
            return Err(format!("Tier '{}' needs a quantity of at least 1", name));
        }

        out.push(TicketTier {
            tier_id,
            name,
            price,
            quantity,
            color: input.color,
            bg_scale: input.bg_scale,
            bg_offset_x: input.bg_offset_x,
            bg_offset_y: input.bg_offset_y,
            width: input.width,
            height: input.height,
            src: input.src,
        });
    }

    Ok(out)
}

fn build_seats(inputs: Vec<SeatInput>) -> Result<Vec<Seat>, String> {
    let mut out = Vec::with_capacity(inputs.len());
    for input in inputs {
        let row = input
            .row
            .ok_or_else(|| "Every seat needs a row".to_string())?;
        let col = input
            .col
            .ok_or_else(|| "Every seat needs a col".to_string())?;
        let tier_id = match input.tier_id.map(|v| v.trim().to_string()) {
            Some(v) if !v.is_empty() => v,
            _ => return Err("Every seat needs a tierId".to_string()),
        };
        out.push(Seat { row, col, tier_id });
    }
    Ok(out)
}

fn check_seat_tiers(seats: &[Seat], tiers: &[TicketTier]) -> Result<(), String> {
    for seat in seats {
        if !tiers.iter().any(|t| t.tier_id == seat.tier_id) {
            return Err(format!(
                "Seat {}_{} references unknown tier '{}'",
                seat.row, seat.col, seat.tier_id
            ));
        }
    }
    Ok(())
}

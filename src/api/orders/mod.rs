mod create;
mod scan;

pub use create::{create_order, place_order};
pub use scan::{mark_scanned, scan_ticket};

pub mod event;
pub mod order;
pub mod user;

pub use event::Event;
pub use order::{Order, OrderError, OrderTicket};
pub use user::User;

//! Database models and queries

pub mod categories;
pub mod events;
pub mod init;
pub mod models;

pub use categories::{default_categories, list_categories, seed_categories};
pub use events::{decode_event_row, EventStore, EVENT_COLUMNS};
pub use init::*;
pub use models::*;

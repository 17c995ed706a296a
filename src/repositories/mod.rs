//! Repositories module - One repository per entity over the shared pool
//!
//! Queries are checked at runtime (`sqlx::query` / `sqlx::query_as`) and rows
//! decode through `#[derive(sqlx::FromRow)]` on the entities. Lists of ids
//! are bound with `QueryBuilder`.
//!
//! Timestamps are stored as RFC 3339 text in UTC, which keeps range filters
//! such as `sent_at >= ?` consistent with chronological order.

pub mod message;
pub mod notification_check;
pub mod participant;
pub mod participation;
pub mod thread;
pub mod traits;

// Re-exports
pub use traits::{Create, Read, Update};

pub use message::MessageRepository;
pub use notification_check::NotificationCheckRepository;
pub use participant::ParticipantRepository;
pub use participation::ParticipationRepository;
pub use thread::ThreadRepository;

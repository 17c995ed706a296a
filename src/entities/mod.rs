//! Entities module - Domain entities
//!
//! Every entity maps one table of the messaging schema (see `migrations/`).

pub mod message;
pub mod notification_check;
pub mod participant;
pub mod participation;
pub mod thread;

// Re-exports
pub use message::Message;
pub use notification_check::NotificationCheck;
pub use participant::Participant;
pub use participation::Participation;
pub use thread::Thread;

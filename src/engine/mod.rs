//! Engine module - Thread, participation and message rules
//!
//! Every operation is request-scoped and talks to the store through the
//! repositories; failures surface as `MessagingError`.

pub mod checkpoints;
pub mod ledger;
pub mod messages;
pub mod registry;
pub mod resolution;

// Re-exports
pub use checkpoints::{CheckOutcome, NotificationTracker};
pub use ledger::ParticipationLedger;
pub use messages::{AnnotatedMessage, MessageStore, is_notification, readers_of};
pub use registry::ParticipantRegistry;
pub use resolution::ThreadResolver;

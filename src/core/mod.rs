//! Core Module - Infrastructure shared by the engine and the HTTP adapter
//!
//! - Identity resolution and thread membership guard
//! - Configuration and database bootstrap
//! - Error kinds
//! - Events and pluggable policies
//! - Application state

pub mod auth;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod policy;
pub mod state;

// Re-exports
pub use auth::{Claims, authentication_middleware, decode_jwt, encode_jwt, thread_membership_middleware};
pub use cache::ParticipantCache;
pub use config::Config;
pub use error::{AppError, MessagingError};
pub use events::{BroadcastEventSink, EventSink, ThreadEvent};
pub use policy::{Policies, ThreadRoster};
pub use state::AppState;

//! Services module - HTTP handlers over the messaging engine
//!
//! Each sub-module serves the endpoints of one resource. Handlers stay thin:
//! they extract, call the engine and serialize.

pub mod messages;
pub mod notifications;
pub mod participants;
pub mod threads;

// Re-exports
pub use messages::{list_latest_messages, list_thread_messages, post_message};
pub use notifications::check_notifications;
pub use participants::get_current_participant;
pub use threads::{
    add_participants, create_thread, get_thread, mark_as_read, removable_participants,
    remove_participant, update_thread,
};

use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse};
use std::sync::Arc;

/// Root endpoint - health check
pub async fn root(State(_state): State<Arc<AppState>>) -> impl IntoResponse {
    (StatusCode::OK, "Server is running!")
}

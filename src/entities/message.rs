//! Message entity - Immutable message posted in a thread

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Message {
    pub message_id: i64,
    pub thread_id: i64,
    pub sender_id: i64,
    pub body: String,
    // assigned by the store, grows together with message_id
    pub sent_at: DateTime<Utc>,
}

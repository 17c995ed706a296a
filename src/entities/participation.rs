//! Participation entity - Time-bounded membership of a participant in a thread

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Participation {
    pub participation_id: i64,
    pub participant_id: i64,
    pub thread_id: i64,
    // immutable once written
    pub date_joined: DateTime<Utc>,
    // once set the participant is inactive in the thread; re-joining opens a new row
    pub date_left: Option<DateTime<Utc>>,
    // "read up to" instant for this participant in this thread
    pub date_last_check: Option<DateTime<Utc>>,
}

impl Participation {
    pub fn is_active(&self) -> bool {
        self.date_left.is_none()
    }

    /// True when the participant checked the thread strictly after `instant`.
    pub fn has_read_since(&self, instant: &DateTime<Utc>) -> bool {
        self.date_last_check
            .as_ref()
            .is_some_and(|checked| checked > instant)
    }
}

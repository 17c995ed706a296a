//! NotificationCheck entity - Per participant "notifications seen up to" instant

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct NotificationCheck {
    pub participant_id: i64,
    pub date_check: DateTime<Utc>,
}

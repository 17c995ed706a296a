//! Notification DTOs

use crate::entities::NotificationCheck;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct NotificationCheckDTO {
    pub participant: i64,
    pub date_check: DateTime<Utc>,
}

impl From<NotificationCheck> for NotificationCheckDTO {
    fn from(value: NotificationCheck) -> Self {
        Self {
            participant: value.participant_id,
            date_check: value.date_check,
        }
    }
}

//! Participation DTOs - Data Transfer Objects for participations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// DTO to open a participation (date_left and date_last_check start empty)
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateParticipationDTO {
    pub participant_id: i64,
    pub thread_id: i64,
    pub date_joined: DateTime<Utc>,
}

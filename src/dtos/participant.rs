//! Participant DTOs

use crate::entities::Participant;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ParticipantDTO {
    pub id: i64,
}

impl From<Participant> for ParticipantDTO {
    fn from(value: Participant) -> Self {
        Self {
            id: value.participant_id,
        }
    }
}

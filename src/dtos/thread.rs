//! Thread DTOs - Data Transfer Objects for threads

use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

/// Serialized thread, as returned by every thread endpoint
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ThreadDTO {
    pub id: i64,
    pub name: Option<String>,
    // rendered by the ParticipantsView policy, ids by default
    pub participants: Value,
    pub removable_participants_ids: Vec<i64>,
}

/// DTO to create a thread row (participants are added separately)
#[derive(Serialize, Deserialize, Debug, Clone, Default, Validate)]
pub struct CreateThreadDTO {
    #[validate(length(max = 255, message = "Thread name must be at most 255 characters"))]
    pub name: Option<String>,
}

/// DTO to update a thread (only the name is mutable)
#[derive(Serialize, Deserialize, Debug, Clone, Default, Validate)]
pub struct UpdateThreadDTO {
    #[validate(length(max = 255, message = "Thread name must be at most 255 characters"))]
    pub name: Option<String>,
}

/// Body of `POST /threads`
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct CreateThreadRequestDTO {
    #[validate(length(max = 255, message = "Thread name must be at most 255 characters"))]
    pub name: Option<String>,
    // the current participant is added automatically
    #[serde(default)]
    pub participants: Vec<i64>,
}

/// Body of `PATCH /threads/{thread_id}`
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct UpdateThreadRequestDTO {
    #[validate(length(max = 255, message = "Thread name must be at most 255 characters"))]
    pub name: Option<String>,
    // rejected when non-empty, membership goes through the dedicated endpoints
    #[serde(default)]
    pub participants: Vec<i64>,
}

/// Body of `POST /threads/{thread_id}/add_participants`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AddParticipantsDTO {
    pub participants: Vec<i64>,
}

/// Body of `POST /threads/{thread_id}/remove_participant`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RemoveParticipantDTO {
    pub participant: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RemovableParticipantsDTO {
    pub participants: Vec<i64>,
}

//! Participant services

use crate::dtos::ParticipantDTO;
use crate::entities::Participant;
use axum::{Extension, extract::Json};
use tracing::instrument;

/// Id of the participant behind the bearer token.
#[instrument(skip(current), fields(participant_id = %current.participant_id))]
pub async fn get_current_participant(Extension(current): Extension<Participant>) -> Json<ParticipantDTO> {
    Json(ParticipantDTO::from(current))
}

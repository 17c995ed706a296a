//! Thread services - Thread resolution and membership endpoints

use crate::core::{AppError, AppState};
use crate::dtos::{
    AddParticipantsDTO, CreateThreadRequestDTO, RemovableParticipantsDTO, RemoveParticipantDTO,
    ThreadDTO, UpdateThreadRequestDTO,
};
use crate::entities::{Participant, Thread};
use axum::{
    Extension,
    extract::{Json, Path, State},
    http::StatusCode,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

/// Serializes a thread for `current`: participants go through the
/// `ParticipantsView` policy, removable ids through the remove policy.
pub(crate) async fn thread_dto(
    state: &AppState,
    thread: Thread,
    current: &Participant,
) -> Result<ThreadDTO, AppError> {
    let roster = state.ledger.roster(thread.thread_id).await?;
    let participants = state
        .policies
        .participants_view
        .render(&thread, &roster.historical);
    let removable_participants_ids = state.threads.removable_from(&roster, current);

    Ok(ThreadDTO {
        id: thread.thread_id,
        name: thread.name,
        participants,
        removable_participants_ids,
    })
}

#[instrument(skip(state, current, body), fields(participant_id = %current.participant_id))]
pub async fn create_thread(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<Participant>,
    Json(body): Json<CreateThreadRequestDTO>,
) -> Result<(StatusCode, Json<ThreadDTO>), AppError> {
    debug!("Resolving thread for {} participants", body.participants.len());
    body.validate()?;

    let thread = state
        .threads
        .get_or_create_thread(&current, body.name, &body.participants)
        .await?;

    info!("Thread {} resolved", thread.thread_id);
    Ok((StatusCode::CREATED, Json(thread_dto(&state, thread, &current).await?)))
}

#[instrument(skip(state, current), fields(participant_id = %current.participant_id))]
pub async fn get_thread(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<Participant>,
    Path(thread_id): Path<i64>,
) -> Result<Json<ThreadDTO>, AppError> {
    let thread = state.threads.thread(thread_id).await?;
    Ok(Json(thread_dto(&state, thread, &current).await?))
}

#[instrument(skip(state, current, body), fields(participant_id = %current.participant_id))]
pub async fn update_thread(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<Participant>,
    Path(thread_id): Path<i64>,
    Json(body): Json<UpdateThreadRequestDTO>,
) -> Result<Json<ThreadDTO>, AppError> {
    body.validate()?;

    if !body.participants.is_empty() {
        warn!("Participants update attempted through PATCH");
        return Err(AppError::bad_request(
            "Participant updates are not allowed by this method",
        ));
    }

    let thread = state.threads.rename(thread_id, body.name).await?;

    info!("Thread {} updated", thread_id);
    Ok(Json(thread_dto(&state, thread, &current).await?))
}

#[instrument(skip(state, current, body), fields(participant_id = %current.participant_id))]
pub async fn add_participants(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<Participant>,
    Path(thread_id): Path<i64>,
    Json(body): Json<AddParticipantsDTO>,
) -> Result<Json<ThreadDTO>, AppError> {
    let added = state
        .threads
        .add_participants(thread_id, &current, &body.participants)
        .await?;
    debug!("Added participants: {:?}", added);

    let thread = state.threads.thread(thread_id).await?;
    Ok(Json(thread_dto(&state, thread, &current).await?))
}

#[instrument(skip(state, current, body), fields(participant_id = %current.participant_id))]
pub async fn remove_participant(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<Participant>,
    Path(thread_id): Path<i64>,
    Json(body): Json<RemoveParticipantDTO>,
) -> Result<Json<ThreadDTO>, AppError> {
    state
        .threads
        .remove_participant(thread_id, &current, body.participant)
        .await?;

    let thread = state.threads.thread(thread_id).await?;
    Ok(Json(thread_dto(&state, thread, &current).await?))
}

#[instrument(skip(state, current), fields(participant_id = %current.participant_id))]
pub async fn removable_participants(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<Participant>,
    Path(thread_id): Path<i64>,
) -> Result<Json<RemovableParticipantsDTO>, AppError> {
    let participants = state
        .threads
        .removable_participants(thread_id, &current)
        .await?;

    Ok(Json(RemovableParticipantsDTO { participants }))
}

#[instrument(skip(state, current), fields(participant_id = %current.participant_id))]
pub async fn mark_as_read(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<Participant>,
    Path(thread_id): Path<i64>,
) -> Result<Json<ThreadDTO>, AppError> {
    state
        .ledger
        .mark_read(thread_id, current.participant_id, Utc::now())
        .await?;

    let thread = state.threads.thread(thread_id).await?;
    Ok(Json(thread_dto(&state, thread, &current).await?))
}

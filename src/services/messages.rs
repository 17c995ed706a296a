//! Message services - Posting and listing messages

use crate::core::{AppError, AppState};
use crate::dtos::{
    ComplexMessageDTO, LatestMessagesQuery, MessageDTO, MessagesPageDTO, PageQuery, PostMessageDTO,
};
use crate::entities::Participant;
use axum::{
    Extension,
    extract::{Json, Path, Query, State},
    http::StatusCode,
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

/// Latest message of every active thread of the current participant.
#[instrument(skip(state, current, params), fields(participant_id = %current.participant_id))]
pub async fn list_latest_messages(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<Participant>,
    Query(params): Query<LatestMessagesQuery>,
) -> Result<Json<Vec<ComplexMessageDTO>>, AppError> {
    let check_notifications = params.check_notifications.unwrap_or(true);

    let messages = state
        .messages
        .latest_message_per_thread(current.participant_id, true, check_notifications)
        .await?;

    debug!("Returning {} threads", messages.len());
    Ok(Json(messages.into_iter().map(ComplexMessageDTO::from).collect()))
}

#[instrument(skip(state, current, body), fields(participant_id = %current.participant_id))]
pub async fn post_message(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<Participant>,
    Path(thread_id): Path<i64>,
    Json(body): Json<PostMessageDTO>,
) -> Result<(StatusCode, Json<MessageDTO>), AppError> {
    body.validate()?;

    let message = state
        .messages
        .post_message(&current, thread_id, &body.body)
        .await?;

    info!("Message {} posted in thread {}", message.message_id, thread_id);
    Ok((StatusCode::CREATED, Json(MessageDTO::from(message))))
}

/// Messages of a thread, newest first, one page at a time (pages start at 1).
#[instrument(skip(state, current, params), fields(participant_id = %current.participant_id))]
pub async fn list_thread_messages(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<Participant>,
    Path(thread_id): Path<i64>,
    Query(params): Query<PageQuery>,
) -> Result<Json<MessagesPageDTO>, AppError> {
    let messages = state
        .messages
        .all_messages_in_thread(current.participant_id, thread_id)
        .await?;

    let page = params.page.unwrap_or(1);
    let page_size = state.config.messages_page_size.max(1);
    let count = messages.len();
    let last_page = count.div_ceil(page_size).max(1);

    if page == 0 || page > last_page {
        warn!("Invalid page {} requested, last page is {}", page, last_page);
        return Err(AppError::not_found("Invalid page"));
    }

    let results: Vec<ComplexMessageDTO> = messages
        .into_iter()
        .skip((page - 1) * page_size)
        .take(page_size)
        .map(ComplexMessageDTO::from)
        .collect();

    Ok(Json(MessagesPageDTO {
        count,
        next: (page < last_page).then_some(page + 1),
        previous: (page > 1).then_some(page - 1),
        results,
    }))
}

//! Notification services

use crate::core::{AppError, AppState};
use crate::dtos::NotificationCheckDTO;
use crate::engine::CheckOutcome;
use crate::entities::Participant;
use axum::{
    Extension,
    extract::{Json, State},
    http::StatusCode,
};
use std::sync::Arc;
use tracing::instrument;

/// Marks notifications as seen: 201 on the first check, 200 afterwards.
#[instrument(skip(state, current), fields(participant_id = %current.participant_id))]
pub async fn check_notifications(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<Participant>,
) -> Result<(StatusCode, Json<NotificationCheckDTO>), AppError> {
    let (check, outcome) = state.notifications.check(&current).await?;

    let status = match outcome {
        CheckOutcome::Created => StatusCode::CREATED,
        CheckOutcome::Updated => StatusCode::OK,
    };
    Ok((status, Json(NotificationCheckDTO::from(check))))
}

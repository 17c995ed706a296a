//! Notification Checkpoint Tracker - "Notifications seen up to" per participant

use crate::core::MessagingError;
use crate::entities::{NotificationCheck, Participant};
use crate::repositories::{NotificationCheckRepository, Read};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{info, instrument};

/// Whether `check` wrote a new checkpoint or moved the existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    Created,
    Updated,
}

#[derive(Clone)]
pub struct NotificationTracker {
    checks: NotificationCheckRepository,
}

impl NotificationTracker {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            checks: NotificationCheckRepository::new(pool),
        }
    }

    /// Moves the participant's checkpoint to now, creating it on the first call.
    #[instrument(skip(self, participant), fields(participant_id = %participant.participant_id))]
    pub async fn check(
        &self,
        participant: &Participant,
    ) -> Result<(NotificationCheck, CheckOutcome), MessagingError> {
        let (check, created) = self
            .checks
            .upsert(&participant.participant_id, &Utc::now())
            .await?;

        let outcome = if created {
            CheckOutcome::Created
        } else {
            CheckOutcome::Updated
        };
        info!("Notification checkpoint {:?}", outcome);
        Ok((check, outcome))
    }

    #[instrument(skip(self))]
    pub async fn last_check(&self, participant_id: i64) -> Result<Option<NotificationCheck>, MessagingError> {
        Ok(self.checks.read(&participant_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::db::connect_in_memory;
    use crate::engine::ParticipantRegistry;

    #[tokio::test]
    async fn test_first_check_creates_then_updates() {
        let pool = connect_in_memory().await.unwrap();
        let participant = ParticipantRegistry::new(pool.clone()).get_or_create(1).await.unwrap();
        let tracker = NotificationTracker::new(pool);

        assert_eq!(tracker.last_check(1).await.unwrap(), None);

        let (first, outcome) = tracker.check(&participant).await.unwrap();
        assert_eq!(outcome, CheckOutcome::Created);

        let (second, outcome) = tracker.check(&participant).await.unwrap();
        assert_eq!(outcome, CheckOutcome::Updated);
        assert!(second.date_check >= first.date_check);

        assert_eq!(tracker.last_check(1).await.unwrap(), Some(second));
    }
}

//! NotificationCheckRepository - One checkpoint row per participant

use super::Read;
use crate::entities::NotificationCheck;
use chrono::{DateTime, Utc};
use sqlx::{Error, SqlitePool};
use tracing::{debug, instrument};

#[derive(Clone)]
pub struct NotificationCheckRepository {
    connection_pool: SqlitePool,
}

impl NotificationCheckRepository {
    pub fn new(connection_pool: SqlitePool) -> Self {
        Self { connection_pool }
    }

    /// Inserts or moves the checkpoint of the participant (`ON CONFLICT DO UPDATE`).
    ///
    /// Returns the stored row and whether it was inserted (`true`) or
    /// updated (`false`).
    #[instrument(skip(self))]
    pub async fn upsert(
        &self,
        participant_id: &i64,
        date_check: &DateTime<Utc>,
    ) -> Result<(NotificationCheck, bool), Error> {
        let mut tx = self.connection_pool.begin().await?;

        let existing: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notification_checks WHERE participant_id = ?",
        )
        .bind(participant_id)
        .fetch_one(&mut *tx)
        .await?;
        let existed = existing > 0;

        let check = sqlx::query_as::<_, NotificationCheck>(
            r#"
            INSERT INTO notification_checks (participant_id, date_check)
            VALUES (?, ?)
            ON CONFLICT (participant_id) DO UPDATE SET date_check = excluded.date_check
            RETURNING participant_id, date_check
            "#,
        )
        .bind(participant_id)
        .bind(date_check)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(created = !existed, "Notification checkpoint stored");
        Ok((check, !existed))
    }
}

impl Read<NotificationCheck, i64> for NotificationCheckRepository {
    #[instrument(skip(self), fields(participant_id = %id))]
    async fn read(&self, id: &i64) -> Result<Option<NotificationCheck>, Error> {
        sqlx::query_as::<_, NotificationCheck>(
            "SELECT participant_id, date_check FROM notification_checks WHERE participant_id = ?",
        )
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await
    }
}

//! ParticipationRepository - Join/leave/read-check records

use super::participant::ParticipantRepository;
use crate::dtos::CreateParticipationDTO;
use crate::entities::Participation;
use chrono::{DateTime, Utc};
use sqlx::{Error, QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, info, instrument};

const PARTICIPATION_COLUMNS: &str =
    "participation_id, participant_id, thread_id, date_joined, date_left, date_last_check";

#[derive(Clone)]
pub struct ParticipationRepository {
    connection_pool: SqlitePool,
}

impl ParticipationRepository {
    pub fn new(connection_pool: SqlitePool) -> Self {
        Self { connection_pool }
    }

    /// Every participation of a thread, closed ones included, oldest first
    #[instrument(skip(self))]
    pub async fn find_many_by_thread_id(&self, thread_id: &i64) -> Result<Vec<Participation>, Error> {
        let participations = sqlx::query_as::<_, Participation>(&format!(
            "SELECT {PARTICIPATION_COLUMNS} FROM participations WHERE thread_id = ? ORDER BY participation_id"
        ))
        .bind(thread_id)
        .fetch_all(&self.connection_pool)
        .await?;

        Ok(participations)
    }

    /// Every participation of the given threads, closed ones included
    #[instrument(skip(self, thread_ids), fields(count = thread_ids.len()))]
    pub async fn find_many_by_thread_ids(&self, thread_ids: &[i64]) -> Result<Vec<Participation>, Error> {
        if thread_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query_builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {PARTICIPATION_COLUMNS} FROM participations WHERE thread_id IN ("
        ));
        let mut separated = query_builder.separated(", ");
        for thread_id in thread_ids {
            separated.push_bind(*thread_id);
        }
        separated.push_unseparated(") ORDER BY participation_id");

        query_builder
            .build_query_as::<Participation>()
            .fetch_all(&self.connection_pool)
            .await
    }

    /// Whether the participant ever joined the thread
    #[instrument(skip(self))]
    pub async fn has_ever_joined(&self, thread_id: &i64, participant_id: &i64) -> Result<bool, Error> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM participations WHERE thread_id = ? AND participant_id = ?",
        )
        .bind(thread_id)
        .bind(participant_id)
        .fetch_one(&self.connection_pool)
        .await?;

        Ok(count > 0)
    }

    /// Opens several participations at once, creating missing participants.
    #[instrument(skip(self, data), fields(count = data.len()))]
    pub async fn create_many(&self, data: &[CreateParticipationDTO]) -> Result<Vec<Participation>, Error> {
        let mut tx = self.connection_pool.begin().await?;

        let participant_ids: Vec<i64> = data.iter().map(|row| row.participant_id).collect();
        ParticipantRepository::ensure_in(&mut *tx, &participant_ids).await?;
        let participations = Self::insert_in(&mut *tx, data).await?;

        tx.commit().await?;

        info!("{} participations created", participations.len());
        Ok(participations)
    }

    /// Inserts the rows on an existing connection or transaction.
    pub(crate) async fn insert_in(
        conn: &mut SqliteConnection,
        data: &[CreateParticipationDTO],
    ) -> Result<Vec<Participation>, Error> {
        let mut participations = Vec::with_capacity(data.len());

        for row in data {
            let participation = sqlx::query_as::<_, Participation>(&format!(
                "INSERT INTO participations (participant_id, thread_id, date_joined) \
                 VALUES (?, ?, ?) RETURNING {PARTICIPATION_COLUMNS}"
            ))
            .bind(row.participant_id)
            .bind(row.thread_id)
            .bind(row.date_joined)
            .fetch_one(&mut *conn)
            .await?;

            participations.push(participation);
        }

        Ok(participations)
    }

    /// Sets `date_left` on the open participation, returning the closed row.
    #[instrument(skip(self))]
    pub async fn close_active(
        &self,
        thread_id: &i64,
        participant_id: &i64,
        date_left: &DateTime<Utc>,
    ) -> Result<Option<Participation>, Error> {
        let closed = sqlx::query_as::<_, Participation>(&format!(
            "UPDATE participations SET date_left = ? \
             WHERE thread_id = ? AND participant_id = ? AND date_left IS NULL \
             RETURNING {PARTICIPATION_COLUMNS}"
        ))
        .bind(date_left)
        .bind(thread_id)
        .bind(participant_id)
        .fetch_optional(&self.connection_pool)
        .await?;

        if closed.is_some() {
            debug!("Participation closed");
        } else {
            debug!("No open participation to close");
        }
        Ok(closed)
    }

    /// Stores the read-up-to instant on the open participation.
    #[instrument(skip(self))]
    pub async fn update_last_check(
        &self,
        thread_id: &i64,
        participant_id: &i64,
        date_last_check: &DateTime<Utc>,
    ) -> Result<Option<Participation>, Error> {
        sqlx::query_as::<_, Participation>(&format!(
            "UPDATE participations SET date_last_check = ? \
             WHERE thread_id = ? AND participant_id = ? AND date_left IS NULL \
             RETURNING {PARTICIPATION_COLUMNS}"
        ))
        .bind(date_last_check)
        .bind(thread_id)
        .bind(participant_id)
        .fetch_optional(&self.connection_pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::db::connect_in_memory;
    use crate::dtos::CreateThreadDTO;
    use crate::repositories::ThreadRepository;
    use chrono::Duration;

    async fn setup() -> sqlx::Result<(ParticipationRepository, i64)> {
        let pool = connect_in_memory().await?;
        let (thread, _) = ThreadRepository::new(pool.clone())
            .create_with_participants(&CreateThreadDTO::default(), &[1, 2], Utc::now())
            .await?;
        Ok((ParticipationRepository::new(pool), thread.thread_id))
    }

    fn row(participant_id: i64, thread_id: i64) -> CreateParticipationDTO {
        CreateParticipationDTO {
            participant_id,
            thread_id,
            date_joined: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_second_active_participation_is_rejected() -> sqlx::Result<()> {
        let (repo, thread_id) = setup().await?;

        let result = repo.create_many(&[row(1, thread_id)]).await;

        match result {
            Err(sqlx::Error::Database(db_err)) => assert!(db_err.is_unique_violation()),
            other => panic!("expected a unique violation, got {:?}", other),
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_rejoining_after_leaving_opens_a_new_row() -> sqlx::Result<()> {
        let (repo, thread_id) = setup().await?;

        let closed = repo.close_active(&thread_id, &1, &Utc::now()).await?.unwrap();
        assert!(closed.date_left.is_some());

        let reopened = repo.create_many(&[row(1, thread_id)]).await?.remove(0);
        assert_ne!(reopened.participation_id, closed.participation_id);
        assert!(reopened.is_active());

        let all = repo.find_many_by_thread_id(&thread_id).await?;
        assert_eq!(all.len(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_close_active_without_open_row_returns_none() -> sqlx::Result<()> {
        let (repo, thread_id) = setup().await?;

        repo.close_active(&thread_id, &2, &Utc::now()).await?;

        assert!(repo.close_active(&thread_id, &2, &Utc::now()).await?.is_none());
        assert!(repo.has_ever_joined(&thread_id, &2).await?);
        assert!(!repo.has_ever_joined(&thread_id, &3).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_last_check_only_touches_open_rows() -> sqlx::Result<()> {
        let (repo, thread_id) = setup().await?;
        let checked_at = Utc::now() + Duration::seconds(5);

        let updated = repo.update_last_check(&thread_id, &1, &checked_at).await?.unwrap();
        assert_eq!(updated.date_last_check, Some(checked_at));

        repo.close_active(&thread_id, &2, &Utc::now()).await?;
        assert!(repo.update_last_check(&thread_id, &2, &checked_at).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_find_many_by_thread_ids() -> sqlx::Result<()> {
        let (repo, thread_id) = setup().await?;

        let found = repo.find_many_by_thread_ids(&[thread_id, 999]).await?;

        assert_eq!(found.len(), 2);
        assert!(repo.find_many_by_thread_ids(&[]).await?.is_empty());
        Ok(())
    }
}

//! ThreadRepository - Threads and the membership-based thread lookups

use super::participant::ParticipantRepository;
use super::participation::ParticipationRepository;
use super::{Read, Update};
use crate::dtos::{CreateParticipationDTO, CreateThreadDTO, UpdateThreadDTO};
use crate::entities::{Participation, Thread};
use chrono::{DateTime, Utc};
use sqlx::{Error, QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info, instrument};

#[derive(Clone)]
pub struct ThreadRepository {
    connection_pool: SqlitePool,
}

impl ThreadRepository {
    pub fn new(connection_pool: SqlitePool) -> Self {
        Self { connection_pool }
    }

    /// Threads where the participant currently has an open participation
    #[instrument(skip(self))]
    pub async fn find_many_active_for(&self, participant_id: &i64) -> Result<Vec<Thread>, Error> {
        let threads = sqlx::query_as::<_, Thread>(
            r#"
            SELECT DISTINCT t.thread_id, t.name
            FROM threads t
            INNER JOIN participations p ON p.thread_id = t.thread_id
            WHERE p.participant_id = ? AND p.date_left IS NULL
            ORDER BY t.thread_id
            "#,
        )
        .bind(participant_id)
        .fetch_all(&self.connection_pool)
        .await?;

        debug!("Participant is active in {} threads", threads.len());
        Ok(threads)
    }

    /// Threads the participant ever joined, whether they left or not
    #[instrument(skip(self))]
    pub async fn find_many_joined_by(&self, participant_id: &i64) -> Result<Vec<Thread>, Error> {
        let threads = sqlx::query_as::<_, Thread>(
            r#"
            SELECT DISTINCT t.thread_id, t.name
            FROM threads t
            INNER JOIN participations p ON p.thread_id = t.thread_id
            WHERE p.participant_id = ?
            ORDER BY t.thread_id
            "#,
        )
        .bind(participant_id)
        .fetch_all(&self.connection_pool)
        .await?;

        Ok(threads)
    }

    /// Threads whose active participants are exactly `participant_ids`
    ///
    /// Same GROUP BY + HAVING shape for both conditions: every requested id is
    /// active, and nobody else is. Ties come back ordered by thread id.
    /// `participant_ids` must be free of duplicates.
    #[instrument(skip(self, participant_ids), fields(count = participant_ids.len()))]
    pub async fn find_many_active_with_exactly(
        &self,
        participant_ids: &[i64],
    ) -> Result<Vec<Thread>, Error> {
        if participant_ids.is_empty() {
            return Ok(Vec::new());
        }
        let expected = participant_ids.len() as i64;

        let mut query_builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            r#"
            SELECT t.thread_id, t.name
            FROM threads t
            INNER JOIN participations p ON p.thread_id = t.thread_id
            WHERE p.date_left IS NULL
            GROUP BY t.thread_id, t.name
            HAVING COUNT(DISTINCT p.participant_id) = "#,
        );
        query_builder.push_bind(expected);
        query_builder.push(" AND COUNT(DISTINCT CASE WHEN p.participant_id IN (");
        let mut separated = query_builder.separated(", ");
        for participant_id in participant_ids {
            separated.push_bind(*participant_id);
        }
        separated.push_unseparated(") THEN p.participant_id END) = ");
        query_builder.push_bind(expected);
        query_builder.push(" ORDER BY t.thread_id");

        let threads = query_builder
            .build_query_as::<Thread>()
            .fetch_all(&self.connection_pool)
            .await?;

        if threads.is_empty() {
            debug!("No thread with exactly these active participants");
        } else {
            debug!("Found {} threads with exactly these active participants", threads.len());
        }

        Ok(threads)
    }

    /// Creates the thread and its founding participations in one transaction.
    /// Missing participant rows are created on the way.
    #[instrument(skip(self, data, participant_ids), fields(count = participant_ids.len()))]
    pub async fn create_with_participants(
        &self,
        data: &CreateThreadDTO,
        participant_ids: &[i64],
        date_joined: DateTime<Utc>,
    ) -> Result<(Thread, Vec<Participation>), Error> {
        let mut tx = self.connection_pool.begin().await?;

        let thread = sqlx::query_as::<_, Thread>(
            "INSERT INTO threads (name) VALUES (?) RETURNING thread_id, name",
        )
        .bind(&data.name)
        .fetch_one(&mut *tx)
        .await?;

        ParticipantRepository::ensure_in(&mut *tx, participant_ids).await?;

        let rows: Vec<CreateParticipationDTO> = participant_ids
            .iter()
            .map(|participant_id| CreateParticipationDTO {
                participant_id: *participant_id,
                thread_id: thread.thread_id,
                date_joined,
            })
            .collect();
        let participations = ParticipationRepository::insert_in(&mut *tx, &rows).await?;

        tx.commit().await?;

        info!(
            "Thread {} created with {} participants",
            thread.thread_id,
            participations.len()
        );
        Ok((thread, participations))
    }
}

impl Read<Thread, i64> for ThreadRepository {
    #[instrument(skip(self), fields(thread_id = %id))]
    async fn read(&self, id: &i64) -> Result<Option<Thread>, Error> {
        debug!("Reading thread by id");
        let thread = sqlx::query_as::<_, Thread>(
            "SELECT thread_id, name FROM threads WHERE thread_id = ?",
        )
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await?;

        Ok(thread)
    }
}

impl Update<Thread, UpdateThreadDTO, i64> for ThreadRepository {
    #[instrument(skip(self, data), fields(thread_id = %id))]
    async fn update(&self, id: &i64, data: &UpdateThreadDTO) -> Result<Thread, Error> {
        debug!("Updating thread");
        let current_thread = self.read(id).await?.ok_or(sqlx::Error::RowNotFound)?;

        // If no fields to update, return current thread
        if data.name.is_none() {
            debug!("No fields to update, returning current thread");
            return Ok(current_thread);
        }

        let thread = sqlx::query_as::<_, Thread>(
            "UPDATE threads SET name = ? WHERE thread_id = ? RETURNING thread_id, name",
        )
        .bind(&data.name)
        .bind(id)
        .fetch_one(&self.connection_pool)
        .await?;

        info!("Thread updated successfully");
        Ok(thread)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::db::connect_in_memory;

    async fn thread_with(repo: &ThreadRepository, ids: &[i64]) -> sqlx::Result<Thread> {
        let (thread, _) = repo
            .create_with_participants(&CreateThreadDTO::default(), ids, Utc::now())
            .await?;
        Ok(thread)
    }

    async fn leave(repo: &ThreadRepository, thread_id: i64, participant_id: i64) -> sqlx::Result<()> {
        sqlx::query(
            "UPDATE participations SET date_left = ? WHERE thread_id = ? AND participant_id = ?",
        )
        .bind(Utc::now())
        .bind(thread_id)
        .bind(participant_id)
        .execute(&repo.connection_pool)
        .await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_create_with_participants_creates_missing_participants() -> sqlx::Result<()> {
        let repo = ThreadRepository::new(connect_in_memory().await?);

        let (thread, participations) = repo
            .create_with_participants(
                &CreateThreadDTO {
                    name: Some("Book club".to_string()),
                },
                &[1, 2, 3],
                Utc::now(),
            )
            .await?;

        assert_eq!(thread.name, Some("Book club".to_string()));
        assert_eq!(participations.len(), 3);
        assert!(participations.iter().all(|p| p.is_active()));

        let participants: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM participants")
            .fetch_one(&repo.connection_pool)
            .await?;
        assert_eq!(participants, 3);

        Ok(())
    }

    #[tokio::test]
    async fn test_exact_match_is_order_independent() -> sqlx::Result<()> {
        let repo = ThreadRepository::new(connect_in_memory().await?);
        let thread = thread_with(&repo, &[1, 2, 3]).await?;

        let found = repo.find_many_active_with_exactly(&[3, 1, 2]).await?;

        assert_eq!(found, vec![thread]);
        Ok(())
    }

    #[tokio::test]
    async fn test_exact_match_ignores_supersets_and_subsets() -> sqlx::Result<()> {
        let repo = ThreadRepository::new(connect_in_memory().await?);
        thread_with(&repo, &[1, 2, 3]).await?;

        assert!(repo.find_many_active_with_exactly(&[1, 2]).await?.is_empty());
        assert!(repo.find_many_active_with_exactly(&[1, 2, 3, 4]).await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_exact_match_only_counts_active_participants() -> sqlx::Result<()> {
        let repo = ThreadRepository::new(connect_in_memory().await?);
        let thread = thread_with(&repo, &[1, 2, 3]).await?;

        leave(&repo, thread.thread_id, 3).await?;

        assert!(repo.find_many_active_with_exactly(&[1, 2, 3]).await?.is_empty());
        assert_eq!(repo.find_many_active_with_exactly(&[1, 2]).await?, vec![thread]);

        Ok(())
    }

    #[tokio::test]
    async fn test_active_and_joined_threads() -> sqlx::Result<()> {
        let repo = ThreadRepository::new(connect_in_memory().await?);
        let first = thread_with(&repo, &[1, 2]).await?;
        let second = thread_with(&repo, &[1, 3]).await?;

        leave(&repo, first.thread_id, 1).await?;

        assert_eq!(repo.find_many_active_for(&1).await?, vec![second.clone()]);
        assert_eq!(repo.find_many_joined_by(&1).await?, vec![first, second]);

        Ok(())
    }

    #[tokio::test]
    async fn test_update_name() -> sqlx::Result<()> {
        let repo = ThreadRepository::new(connect_in_memory().await?);
        let thread = thread_with(&repo, &[1, 2]).await?;

        let renamed = repo
            .update(
                &thread.thread_id,
                &UpdateThreadDTO {
                    name: Some("Renamed".to_string()),
                },
            )
            .await?;
        assert_eq!(renamed.name, Some("Renamed".to_string()));

        let missing = repo.update(&999, &UpdateThreadDTO::default()).await;
        assert!(matches!(missing, Err(sqlx::Error::RowNotFound)));

        Ok(())
    }
}

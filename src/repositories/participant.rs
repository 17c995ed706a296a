//! ParticipantRepository - Participants mirrored from the identity provider

use super::Read;
use crate::entities::Participant;
use sqlx::{Error, SqliteConnection, SqlitePool};
use tracing::{debug, instrument};

#[derive(Clone)]
pub struct ParticipantRepository {
    connection_pool: SqlitePool,
}

impl ParticipantRepository {
    pub fn new(connection_pool: SqlitePool) -> Self {
        Self { connection_pool }
    }

    /// Inserts the participant unless it already exists.
    #[instrument(skip(self))]
    pub async fn get_or_create(&self, participant_id: &i64) -> Result<Participant, Error> {
        let mut conn = self.connection_pool.acquire().await?;
        Self::ensure_in(&mut *conn, &[*participant_id]).await?;

        Ok(Participant {
            participant_id: *participant_id,
        })
    }

    /// Makes sure every id has a participant row, in one transaction.
    #[instrument(skip(self, participant_ids), fields(count = participant_ids.len()))]
    pub async fn ensure_many(&self, participant_ids: &[i64]) -> Result<(), Error> {
        let mut tx = self.connection_pool.begin().await?;
        Self::ensure_in(&mut *tx, participant_ids).await?;
        tx.commit().await?;

        Ok(())
    }

    /// `INSERT OR IGNORE` of the given ids on an existing connection or transaction.
    pub(crate) async fn ensure_in(
        conn: &mut SqliteConnection,
        participant_ids: &[i64],
    ) -> Result<(), Error> {
        for participant_id in participant_ids {
            let result = sqlx::query("INSERT OR IGNORE INTO participants (participant_id) VALUES (?)")
                .bind(participant_id)
                .execute(&mut *conn)
                .await?;

            if result.rows_affected() > 0 {
                debug!("Participant {} created", participant_id);
            }
        }

        Ok(())
    }
}

impl Read<Participant, i64> for ParticipantRepository {
    #[instrument(skip(self), fields(participant_id = %id))]
    async fn read(&self, id: &i64) -> Result<Option<Participant>, Error> {
        let participant = sqlx::query_as::<_, Participant>(
            "SELECT participant_id FROM participants WHERE participant_id = ?",
        )
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await?;

        Ok(participant)
    }
}

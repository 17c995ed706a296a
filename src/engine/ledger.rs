//! Participation Ledger - Join, leave and read-check records
//!
//! The ledger is the source of truth for "who is active in which thread" and
//! "who has read up to when". Rows are only ever appended or closed.

use crate::core::policy::ThreadRoster;
use crate::core::MessagingError;
use crate::dtos::CreateParticipationDTO;
use crate::entities::{Participation, Thread};
use crate::repositories::{ParticipationRepository, ThreadRepository};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info, instrument, warn};

#[derive(Clone)]
pub struct ParticipationLedger {
    participations: ParticipationRepository,
    threads: ThreadRepository,
}

impl ParticipationLedger {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            participations: ParticipationRepository::new(pool.clone()),
            threads: ThreadRepository::new(pool),
        }
    }

    /// Threads in which the participant currently has an open participation.
    #[instrument(skip(self))]
    pub async fn active_threads_for(&self, participant_id: i64) -> Result<Vec<Thread>, MessagingError> {
        Ok(self.threads.find_many_active_for(&participant_id).await?)
    }

    /// Threads the participant ever joined, deduplicated.
    #[instrument(skip(self))]
    pub async fn all_threads_for(&self, participant_id: i64) -> Result<Vec<Thread>, MessagingError> {
        Ok(self.threads.find_many_joined_by(&participant_id).await?)
    }

    /// Threads whose active participants are exactly `participant_ids`.
    ///
    /// Not a superset query: a thread with one more active participant does
    /// not match. Results are ordered by thread id.
    #[instrument(skip(self, participant_ids), fields(count = participant_ids.len()))]
    pub async fn active_threads_with_all(
        &self,
        participant_ids: &[i64],
    ) -> Result<Vec<Thread>, MessagingError> {
        let distinct = dedup_in_order(participant_ids);
        Ok(self.threads.find_many_active_with_exactly(&distinct).await?)
    }

    /// Records that the participant has read the thread up to `at`.
    #[instrument(skip(self))]
    pub async fn mark_read(
        &self,
        thread_id: i64,
        participant_id: i64,
        at: DateTime<Utc>,
    ) -> Result<Participation, MessagingError> {
        let participation = self
            .participations
            .update_last_check(&thread_id, &participant_id, &at)
            .await?
            .ok_or_else(|| {
                warn!("No active participation to mark as read");
                MessagingError::not_found(format!(
                    "Participant {} is not active in thread {}",
                    participant_id, thread_id
                ))
            })?;

        debug!("Thread marked as read");
        Ok(participation)
    }

    /// Active and historical participants of the thread.
    #[instrument(skip(self))]
    pub async fn roster(&self, thread_id: i64) -> Result<ThreadRoster, MessagingError> {
        let participations = self.participations.find_many_by_thread_id(&thread_id).await?;
        Ok(roster_from(thread_id, &participations))
    }

    /// Whether the participant ever joined the thread.
    ///
    /// Membership here is historical: a participant who left keeps passing
    /// this check, and keeps read access to the thread.
    #[instrument(skip(self))]
    pub async fn is_participant(&self, thread_id: i64, participant_id: i64) -> Result<bool, MessagingError> {
        Ok(self.participations.has_ever_joined(&thread_id, &participant_id).await?)
    }

    /// Every participation of the given threads, closed ones included.
    pub async fn participations_of(&self, thread_ids: &[i64]) -> Result<Vec<Participation>, MessagingError> {
        Ok(self.participations.find_many_by_thread_ids(thread_ids).await?)
    }

    /// Opens one participation per id; callers pass ids that are not active yet.
    #[instrument(skip(self, participant_ids), fields(count = participant_ids.len()))]
    pub async fn join(
        &self,
        thread_id: i64,
        participant_ids: &[i64],
        at: DateTime<Utc>,
    ) -> Result<Vec<Participation>, MessagingError> {
        if participant_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows: Vec<CreateParticipationDTO> = participant_ids
            .iter()
            .map(|participant_id| CreateParticipationDTO {
                participant_id: *participant_id,
                thread_id,
                date_joined: at,
            })
            .collect();

        let participations = self.participations.create_many(&rows).await?;
        info!("{} participants joined thread {}", participations.len(), thread_id);
        Ok(participations)
    }

    /// Closes the active participation of the participant.
    #[instrument(skip(self))]
    pub async fn leave(
        &self,
        thread_id: i64,
        participant_id: i64,
        at: DateTime<Utc>,
    ) -> Result<Participation, MessagingError> {
        self.participations
            .close_active(&thread_id, &participant_id, &at)
            .await?
            .ok_or_else(|| {
                MessagingError::not_found(format!(
                    "Participant {} is not active in thread {}",
                    participant_id, thread_id
                ))
            })
    }
}

pub(crate) fn roster_from(thread_id: i64, participations: &[Participation]) -> ThreadRoster {
    let mut roster = ThreadRoster::founding(thread_id);

    for participation in participations.iter().filter(|p| p.thread_id == thread_id) {
        if participation.is_active() && !roster.active.contains(&participation.participant_id) {
            roster.active.push(participation.participant_id);
        }
        if !roster.historical.contains(&participation.participant_id) {
            roster.historical.push(participation.participant_id);
        }
    }

    roster
}

pub(crate) fn dedup_in_order(ids: &[i64]) -> Vec<i64> {
    let mut distinct: Vec<i64> = Vec::with_capacity(ids.len());
    for id in ids {
        if !distinct.contains(id) {
            distinct.push(*id);
        }
    }
    distinct
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtos::CreateThreadDTO;
    use crate::core::db::connect_in_memory;

    async fn setup(founders: &[i64]) -> (ParticipationLedger, i64) {
        let pool = connect_in_memory().await.unwrap();
        let (thread, _) = ThreadRepository::new(pool.clone())
            .create_with_participants(&CreateThreadDTO::default(), founders, Utc::now())
            .await
            .unwrap();
        (ParticipationLedger::new(pool), thread.thread_id)
    }

    #[tokio::test]
    async fn test_leaving_drops_the_thread_from_active_threads() {
        let (ledger, thread_id) = setup(&[1, 2]).await;

        let active = ledger.active_threads_for(1).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].thread_id, thread_id);

        ledger.leave(thread_id, 1, Utc::now()).await.unwrap();

        assert!(ledger.active_threads_for(1).await.unwrap().is_empty());
        assert_eq!(ledger.all_threads_for(1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_exact_match_follows_membership_changes() {
        let (ledger, thread_id) = setup(&[1, 2, 3]).await;

        let found = ledger.active_threads_with_all(&[3, 2, 1, 1]).await.unwrap();
        assert_eq!(found.len(), 1);

        ledger.join(thread_id, &[4], Utc::now()).await.unwrap();
        assert!(ledger.active_threads_with_all(&[1, 2, 3]).await.unwrap().is_empty());

        ledger.leave(thread_id, 4, Utc::now()).await.unwrap();
        assert_eq!(ledger.active_threads_with_all(&[1, 2, 3]).await.unwrap().len(), 1);

        ledger.leave(thread_id, 3, Utc::now()).await.unwrap();
        assert!(ledger.active_threads_with_all(&[1, 2, 3]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mark_read_requires_an_active_participation() {
        let (ledger, thread_id) = setup(&[1, 2]).await;
        let at = Utc::now();

        let participation = ledger.mark_read(thread_id, 1, at).await.unwrap();
        assert_eq!(participation.date_last_check, Some(at));

        ledger.leave(thread_id, 2, Utc::now()).await.unwrap();
        assert!(matches!(
            ledger.mark_read(thread_id, 2, at).await,
            Err(MessagingError::NotFound(_))
        ));
        assert!(matches!(
            ledger.mark_read(thread_id, 9, at).await,
            Err(MessagingError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_roster_and_historical_membership() {
        let (ledger, thread_id) = setup(&[1, 2]).await;

        ledger.leave(thread_id, 2, Utc::now()).await.unwrap();
        ledger.join(thread_id, &[3], Utc::now()).await.unwrap();

        let roster = ledger.roster(thread_id).await.unwrap();
        assert_eq!(roster.active, vec![1, 3]);
        assert_eq!(roster.historical, vec![1, 2, 3]);

        assert!(ledger.is_participant(thread_id, 2).await.unwrap());
        assert!(!ledger.is_participant(thread_id, 4).await.unwrap());
    }

    #[tokio::test]
    async fn test_rejoin_opens_a_new_participation() {
        let (ledger, thread_id) = setup(&[1, 2]).await;

        ledger.leave(thread_id, 2, Utc::now()).await.unwrap();
        ledger.join(thread_id, &[2], Utc::now()).await.unwrap();

        let participations = ledger.participations_of(&[thread_id]).await.unwrap();
        assert_eq!(participations.iter().filter(|p| p.participant_id == 2).count(), 2);

        // second open participation for the same participant
        assert!(matches!(
            ledger.join(thread_id, &[2], Utc::now()).await,
            Err(MessagingError::Conflict(_))
        ));
    }

    #[test]
    fn test_dedup_in_order() {
        assert_eq!(dedup_in_order(&[3, 1, 3, 2, 1]), vec![3, 1, 2]);
    }
}

//! Thread Resolution Engine - Reuse or create threads, manage their membership
//!
//! Membership rules go through the `Policies` hooks; the participant cap is
//! applied by the engine after the add policy ran.

use super::ledger::{dedup_in_order, ParticipationLedger};
use super::registry::validate_identity;
use crate::core::policy::{admit, Policies, ThreadRoster};
use crate::core::{EventSink, MessagingError, ThreadEvent};
use crate::dtos::{CreateThreadDTO, UpdateThreadDTO};
use crate::entities::{Participant, Participation, Thread};
use crate::repositories::{Read, ThreadRepository, Update};
use chrono::Utc;
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

#[derive(Clone)]
pub struct ThreadResolver {
    threads: ThreadRepository,
    ledger: ParticipationLedger,
    policies: Policies,
    events: Arc<dyn EventSink>,
    unique_for_active_recipients: bool,
}

impl ThreadResolver {
    pub fn new(
        pool: SqlitePool,
        policies: Policies,
        events: Arc<dyn EventSink>,
        unique_for_active_recipients: bool,
    ) -> Self {
        Self {
            threads: ThreadRepository::new(pool.clone()),
            ledger: ParticipationLedger::new(pool),
            policies,
            events,
            unique_for_active_recipients,
        }
    }

    /// Looks a thread up by id.
    #[instrument(skip(self))]
    pub async fn thread(&self, thread_id: i64) -> Result<Thread, MessagingError> {
        self.threads.read(&thread_id).await?.ok_or_else(|| {
            debug!("Thread not found");
            MessagingError::not_found(format!("Thread {} does not exist", thread_id))
        })
    }

    /// Returns the thread the requester and `other_participant_ids` talk in.
    ///
    /// With `unique_for_active_recipients` on, a thread whose active
    /// participants are exactly the requested set is reused (lowest thread id
    /// first). Otherwise a new thread is created. The check and the creation
    /// are not atomic: two concurrent calls may both create a thread.
    #[instrument(skip(self, requester, name, other_participant_ids), fields(requester = %requester.participant_id))]
    pub async fn get_or_create_thread(
        &self,
        requester: &Participant,
        name: Option<String>,
        other_participant_ids: &[i64],
    ) -> Result<Thread, MessagingError> {
        for participant_id in other_participant_ids {
            validate_identity(*participant_id)?;
        }

        // the requester comes first so the cap never drops them
        let mut requested = Vec::with_capacity(other_participant_ids.len() + 1);
        requested.push(requester.participant_id);
        requested.extend_from_slice(other_participant_ids);
        let participant_ids = dedup_in_order(&requested);

        if participant_ids.len() < 2 {
            warn!("Thread requested with a single participant");
            return Err(MessagingError::validation(
                "At least two participants are required",
            ));
        }

        let data = CreateThreadDTO { name };
        data.validate()
            .map_err(|e| MessagingError::validation(e.to_string()))?;

        if self.unique_for_active_recipients {
            let existing = self.ledger.active_threads_with_all(&participant_ids).await?;
            if let Some(thread) = existing.into_iter().next() {
                info!("Reusing {}", thread.display_name());
                return Ok(thread);
            }
        }

        // thread id is unknown until creation; the founding roster is empty
        let founding = ThreadRoster::founding(0);
        let allowed = self.policies.add_participants.allowed(
            &founding,
            requester.participant_id,
            &participant_ids,
        );
        let admitted = admit(&founding, &allowed);
        if admitted.is_empty() {
            warn!("No founding participant allowed");
            return Err(MessagingError::authorization(
                "None of the participants may be added to a new thread",
            ));
        }

        let (thread, participations) = self
            .threads
            .create_with_participants(&data, &admitted, Utc::now())
            .await?;

        self.events.emit(ThreadEvent::ThreadCreated {
            thread_id: thread.thread_id,
            participant_ids: participations.iter().map(|p| p.participant_id).collect(),
            by: requester.participant_id,
        });

        info!(
            "Thread {} created with {} participants",
            thread.thread_id,
            participations.len()
        );
        Ok(thread)
    }

    /// Adds the candidates the add policy allows, up to the participant cap.
    ///
    /// Returns the ids actually added, in candidate order. Candidates dropped
    /// by the policy or the cap are not an error.
    #[instrument(skip(self, requester, candidate_ids), fields(requester = %requester.participant_id))]
    pub async fn add_participants(
        &self,
        thread_id: i64,
        requester: &Participant,
        candidate_ids: &[i64],
    ) -> Result<Vec<i64>, MessagingError> {
        for participant_id in candidate_ids {
            validate_identity(*participant_id)?;
        }
        self.thread(thread_id).await?;

        let roster = self.ledger.roster(thread_id).await?;
        let allowed = self.policies.add_participants.allowed(
            &roster,
            requester.participant_id,
            candidate_ids,
        );
        let admitted = admit(&roster, &allowed);

        if admitted.is_empty() {
            debug!("No participant added");
            return Ok(admitted);
        }

        self.ledger.join(thread_id, &admitted, Utc::now()).await?;

        self.events.emit(ThreadEvent::ParticipantsAdded {
            thread_id,
            participant_ids: admitted.clone(),
            by: requester.participant_id,
        });

        info!("{} participants added", admitted.len());
        Ok(admitted)
    }

    /// Ids the requester may remove from the thread.
    #[instrument(skip(self, requester), fields(requester = %requester.participant_id))]
    pub async fn removable_participants(
        &self,
        thread_id: i64,
        requester: &Participant,
    ) -> Result<Vec<i64>, MessagingError> {
        let roster = self.ledger.roster(thread_id).await?;
        Ok(self.removable_from(&roster, requester))
    }

    /// Removable ids computed on an already loaded roster.
    pub fn removable_from(&self, roster: &ThreadRoster, requester: &Participant) -> Vec<i64> {
        self.policies
            .remove_participants
            .removable(roster, requester.participant_id)
    }

    /// Closes the active participation of `target` when the remove policy allows it.
    #[instrument(skip(self, requester), fields(requester = %requester.participant_id))]
    pub async fn remove_participant(
        &self,
        thread_id: i64,
        requester: &Participant,
        target: i64,
    ) -> Result<Participation, MessagingError> {
        self.thread(thread_id).await?;

        let removable = self.removable_participants(thread_id, requester).await?;
        if !removable.contains(&target) {
            warn!("Participant {} may not be removed", target);
            return Err(MessagingError::authorization(
                "The participant may not be removed",
            ));
        }

        let participation = self.ledger.leave(thread_id, target, Utc::now()).await?;

        self.events.emit(ThreadEvent::ParticipantRemoved {
            thread_id,
            participant_id: target,
            by: requester.participant_id,
        });

        info!("Participant {} removed", target);
        Ok(participation)
    }

    /// Changes the informational name of the thread.
    #[instrument(skip(self, name))]
    pub async fn rename(&self, thread_id: i64, name: Option<String>) -> Result<Thread, MessagingError> {
        let data = UpdateThreadDTO { name };
        data.validate()
            .map_err(|e| MessagingError::validation(e.to_string()))?;

        let thread = self.threads.update(&thread_id, &data).await.map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                MessagingError::not_found(format!("Thread {} does not exist", thread_id))
            }
            other => MessagingError::from(other),
        })?;

        debug!("Thread renamed");
        Ok(thread)
    }
}

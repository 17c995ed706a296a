//! Message Store & Aggregator - Quota-checked posting and annotated listings

use super::ledger::ParticipationLedger;
use crate::core::policy::DailyLimitPolicy;
use crate::core::MessagingError;
use crate::dtos::CreateMessageDTO;
use crate::entities::{Message, Participant, Participation};
use crate::repositories::{Create, MessageRepository, NotificationCheckRepository, Read, ThreadRepository};
use chrono::{DateTime, Duration, Utc};
use futures_util::future::try_join;
use sqlx::SqlitePool;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// A message with the annotations the aggregator computed for a reader.
/// `None` means the annotation was not requested.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedMessage {
    pub message: Message,
    pub readers: Option<BTreeSet<i64>>,
    pub is_notification: Option<bool>,
}

impl From<Message> for AnnotatedMessage {
    fn from(message: Message) -> Self {
        Self {
            message,
            readers: None,
            is_notification: None,
        }
    }
}

#[derive(Clone)]
pub struct MessageStore {
    messages: MessageRepository,
    threads: ThreadRepository,
    checks: NotificationCheckRepository,
    ledger: ParticipationLedger,
    daily_limit: Arc<dyn DailyLimitPolicy>,
}

impl MessageStore {
    pub fn new(pool: SqlitePool, daily_limit: Arc<dyn DailyLimitPolicy>) -> Self {
        Self {
            messages: MessageRepository::new(pool.clone()),
            threads: ThreadRepository::new(pool.clone()),
            checks: NotificationCheckRepository::new(pool.clone()),
            ledger: ParticipationLedger::new(pool),
            daily_limit,
        }
    }

    /// Messages the sender posted during the last 24 hours.
    #[instrument(skip(self))]
    pub async fn daily_count(&self, sender_id: i64) -> Result<i64, MessagingError> {
        let since = Utc::now() - Duration::hours(24);
        Ok(self.messages.count_sent_since(&sender_id, &since).await?)
    }

    /// Persists a message unless the sender reached the daily quota.
    ///
    /// The count and the insert are separate statements; concurrent posts of
    /// the same sender may overshoot the quota.
    #[instrument(skip(self, sender, body), fields(sender = %sender.participant_id))]
    pub async fn post_message(
        &self,
        sender: &Participant,
        thread_id: i64,
        body: &str,
    ) -> Result<Message, MessagingError> {
        if body.trim().is_empty() {
            return Err(MessagingError::validation("Message body must not be empty"));
        }

        if self.threads.read(&thread_id).await?.is_none() {
            return Err(MessagingError::not_found(format!(
                "Thread {} does not exist",
                thread_id
            )));
        }

        if let Some(limit) = self.daily_limit.daily_limit(sender.participant_id, thread_id) {
            let count = self.daily_count(sender.participant_id).await?;
            if count >= i64::from(limit) {
                warn!("Daily limit of {} messages reached", limit);
                return Err(MessagingError::QuotaExceeded { limit });
            }
        }

        let message = self
            .messages
            .create(&CreateMessageDTO {
                thread_id,
                sender_id: sender.participant_id,
                body: body.to_string(),
                sent_at: Utc::now(),
            })
            .await?;

        info!("Message {} posted", message.message_id);
        Ok(message)
    }

    /// Latest message of every thread the participant is active in, most
    /// recent conversation first.
    #[instrument(skip(self))]
    pub async fn latest_message_per_thread(
        &self,
        participant_id: i64,
        with_readers: bool,
        with_notification_flag: bool,
    ) -> Result<Vec<AnnotatedMessage>, MessagingError> {
        let thread_ids: Vec<i64> = self
            .ledger
            .active_threads_for(participant_id)
            .await?
            .into_iter()
            .map(|thread| thread.thread_id)
            .collect();

        let latest = self.messages.find_latest_per_thread(&thread_ids).await?;
        let mut annotated: Vec<AnnotatedMessage> = latest.into_iter().map(AnnotatedMessage::from).collect();

        if with_readers {
            let participations = self.ledger.participations_of(&thread_ids).await?;
            annotate_readers(&mut annotated, &participations);
        }

        if with_notification_flag {
            let last_check = self.checks.read(&participant_id).await?;
            annotate_notifications(
                &mut annotated,
                participant_id,
                last_check.as_ref().map(|check| &check.date_check),
            );
        }

        debug!("Returning {} latest messages", annotated.len());
        Ok(annotated)
    }

    /// Every message of the thread, newest first, annotated with readers.
    /// An unknown thread yields an empty list.
    #[instrument(skip(self))]
    pub async fn all_messages_in_thread(
        &self,
        participant_id: i64,
        thread_id: i64,
    ) -> Result<Vec<AnnotatedMessage>, MessagingError> {
        let (messages, participations) = try_join(
            async { Ok::<_, MessagingError>(self.messages.find_many_by_thread_id(&thread_id).await?) },
            self.ledger.participations_of(&[thread_id]),
        )
        .await?;
        debug!("Participant {} reads {} messages", participant_id, messages.len());

        let mut annotated: Vec<AnnotatedMessage> = messages.into_iter().map(AnnotatedMessage::from).collect();
        annotate_readers(&mut annotated, &participations);

        Ok(annotated)
    }
}

/// Participants whose read-check in the message's thread is strictly after
/// the message was sent. Closed participations count too.
pub fn readers_of(message: &Message, participations: &[Participation]) -> BTreeSet<i64> {
    participations
        .iter()
        .filter(|p| p.thread_id == message.thread_id && p.has_read_since(&message.sent_at))
        .map(|p| p.participant_id)
        .collect()
}

/// Whether the message is new for `participant_id` given their last
/// notification check. Without any check every message is new.
pub fn is_notification(message: &Message, participant_id: i64, last_check: Option<&DateTime<Utc>>) -> bool {
    match last_check {
        None => true,
        Some(checked) => message.sent_at > *checked && message.sender_id != participant_id,
    }
}

fn annotate_readers(messages: &mut [AnnotatedMessage], participations: &[Participation]) {
    for annotated in messages.iter_mut() {
        annotated.readers = Some(readers_of(&annotated.message, participations));
    }
}

fn annotate_notifications(
    messages: &mut [AnnotatedMessage],
    participant_id: i64,
    last_check: Option<&DateTime<Utc>>,
) {
    for annotated in messages.iter_mut() {
        annotated.is_notification = Some(is_notification(&annotated.message, participant_id, last_check));
    }
}

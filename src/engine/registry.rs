//! Participant Registry - Participants keyed by their external identity

use crate::core::MessagingError;
use crate::entities::Participant;
use crate::repositories::{ParticipantRepository, Read};
use sqlx::SqlitePool;
use tracing::{debug, instrument, warn};

#[derive(Clone)]
pub struct ParticipantRegistry {
    participants: ParticipantRepository,
}

impl ParticipantRegistry {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            participants: ParticipantRepository::new(pool),
        }
    }

    /// Returns the participant mirroring `identity`, creating it on first sight.
    #[instrument(skip(self))]
    pub async fn get_or_create(&self, identity: i64) -> Result<Participant, MessagingError> {
        validate_identity(identity)?;
        let participant = self.participants.get_or_create(&identity).await?;
        debug!("Participant resolved");
        Ok(participant)
    }

    #[instrument(skip(self))]
    pub async fn find(&self, identity: i64) -> Result<Option<Participant>, MessagingError> {
        Ok(self.participants.read(&identity).await?)
    }

    /// Creates every missing participant of `identities` in one go.
    #[instrument(skip(self, identities), fields(count = identities.len()))]
    pub async fn ensure_all(&self, identities: &[i64]) -> Result<(), MessagingError> {
        for identity in identities {
            validate_identity(*identity)?;
        }
        self.participants.ensure_many(identities).await?;
        Ok(())
    }
}

/// External ids are positive integers.
pub(crate) fn validate_identity(identity: i64) -> Result<(), MessagingError> {
    if identity <= 0 {
        warn!("Rejected participant id {}", identity);
        return Err(MessagingError::validation(format!(
            "Invalid participant id {}",
            identity
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::db::connect_in_memory;

    #[tokio::test]
    async fn test_get_or_create_then_find() {
        let registry = ParticipantRegistry::new(connect_in_memory().await.unwrap());

        assert_eq!(registry.find(3).await.unwrap(), None);

        let created = registry.get_or_create(3).await.unwrap();
        assert_eq!(created.participant_id, 3);
        assert_eq!(registry.get_or_create(3).await.unwrap(), created);
        assert_eq!(registry.find(3).await.unwrap(), Some(created));
    }

    #[tokio::test]
    async fn test_non_positive_ids_are_rejected() {
        let registry = ParticipantRegistry::new(connect_in_memory().await.unwrap());

        assert!(matches!(
            registry.get_or_create(0).await,
            Err(MessagingError::Validation(_))
        ));
        assert!(matches!(
            registry.ensure_all(&[1, -4]).await,
            Err(MessagingError::Validation(_))
        ));
        assert_eq!(registry.find(1).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_ensure_all() {
        let registry = ParticipantRegistry::new(connect_in_memory().await.unwrap());

        registry.ensure_all(&[1, 2, 2]).await.unwrap();

        assert!(registry.find(1).await.unwrap().is_some());
        assert!(registry.find(2).await.unwrap().is_some());
    }
}

//! Participant cache - Read-through TTL cache from external identity to Participant
//!
//! Entries expire after the configured TTL and are never invalidated otherwise;
//! a stale entry is harmless because participants are never deleted. Expired
//! entries of identities that never come back are swept every
//! `SWEEP_EVERY` inserts.

use crate::core::MessagingError;
use crate::engine::ParticipantRegistry;
use crate::entities::Participant;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, instrument};

const SWEEP_EVERY: usize = 256;

struct CachedParticipant {
    participant: Participant,
    cached_at: Instant,
}

pub struct ParticipantCache {
    entries: DashMap<i64, CachedParticipant>,
    ttl: Duration,
    inserts: AtomicUsize,
}

impl ParticipantCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            inserts: AtomicUsize::new(0),
        }
    }

    /// Returns the cached participant if the entry is still fresh.
    pub fn get(&self, identity: i64) -> Option<Participant> {
        let fresh = self
            .entries
            .get(&identity)
            .filter(|entry| entry.cached_at.elapsed() < self.ttl)
            .map(|entry| entry.participant);

        if fresh.is_none() {
            self.entries
                .remove_if(&identity, |_, entry| entry.cached_at.elapsed() >= self.ttl);
        }
        fresh
    }

    pub fn insert(&self, participant: Participant) {
        if (self.inserts.fetch_add(1, Ordering::Relaxed) + 1) % SWEEP_EVERY == 0 {
            self.purge_expired();
        }
        self.entries.insert(
            participant.participant_id,
            CachedParticipant {
                participant,
                cached_at: Instant::now(),
            },
        );
    }

    /// Drops every expired entry.
    pub fn purge_expired(&self) {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| entry.cached_at.elapsed() < self.ttl);
        debug!("Swept {} expired participants", before.saturating_sub(self.entries.len()));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maps an authenticated identity onto its Participant, creating the
    /// participant on first sight.
    #[instrument(skip(self, registry))]
    pub async fn resolve(
        &self,
        registry: &ParticipantRegistry,
        identity: i64,
    ) -> Result<Participant, MessagingError> {
        if let Some(participant) = self.get(identity) {
            debug!("Participant served from cache");
            return Ok(participant);
        }

        let participant = registry.get_or_create(identity).await?;
        self.insert(participant);
        debug!("Participant cached");
        Ok(participant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::db::connect_in_memory;

    #[test]
    fn test_fresh_entries_are_served() {
        let cache = ParticipantCache::new(Duration::from_secs(60));
        cache.insert(Participant { participant_id: 7 });

        assert_eq!(cache.get(7), Some(Participant { participant_id: 7 }));
        assert_eq!(cache.get(8), None);
    }

    #[test]
    fn test_expired_entries_are_evicted() {
        let cache = ParticipantCache::new(Duration::ZERO);
        cache.insert(Participant { participant_id: 7 });

        assert_eq!(cache.get(7), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_unrequested_expired_entries_are_swept() {
        let cache = ParticipantCache::new(Duration::ZERO);

        for participant_id in 1..SWEEP_EVERY as i64 {
            cache.insert(Participant { participant_id });
        }
        assert_eq!(cache.len(), SWEEP_EVERY - 1);

        // the next insert sweeps the expired callers before storing itself
        cache.insert(Participant { participant_id: 1000 });
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_purge_keeps_fresh_entries() {
        let cache = ParticipantCache::new(Duration::from_secs(60));
        cache.insert(Participant { participant_id: 1 });
        cache.insert(Participant { participant_id: 2 });

        cache.purge_expired();

        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn test_resolve_creates_participant_on_first_sight() {
        let pool = connect_in_memory().await.unwrap();
        let registry = ParticipantRegistry::new(pool);
        let cache = ParticipantCache::new(Duration::from_secs(60));

        let participant = cache.resolve(&registry, 42).await.unwrap();

        assert_eq!(participant.participant_id, 42);
        assert_eq!(cache.len(), 1);
        assert!(registry.find(42).await.unwrap().is_some());
    }
}

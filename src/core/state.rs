//! Application State - Engine components shared by every request
//!
//! The engine is request-scoped: the only in-process state kept between
//! requests is the participant cache.

use crate::core::{BroadcastEventSink, Config, EventSink, ParticipantCache, Policies};
use crate::engine::{
    MessageStore, NotificationTracker, ParticipantRegistry, ParticipationLedger, ThreadResolver,
};
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;

pub struct AppState {
    /// Participant Registry
    pub participants: ParticipantRegistry,

    /// Participation Ledger
    pub ledger: ParticipationLedger,

    /// Thread Resolution Engine
    pub threads: ThreadResolver,

    /// Message Store & Aggregator
    pub messages: MessageStore,

    /// Notification Checkpoint Tracker
    pub notifications: NotificationTracker,

    /// Hooks in use, kept for the HTTP serialization of threads
    pub policies: Policies,

    /// External identity -> Participant, TTL bound
    pub identities: ParticipantCache,

    /// Secret key for JWT tokens
    pub jwt_secret: String,

    pub config: Config,
}

impl AppState {
    /// Builds the state with the default policies and a broadcast event sink.
    pub fn new(pool: SqlitePool, config: Config) -> Self {
        let policies = Policies::from_config(&config);
        Self::with_policies(pool, config, policies, Arc::new(BroadcastEventSink::default()))
    }

    /// Builds the state with caller supplied policies and event sink.
    pub fn with_policies(
        pool: SqlitePool,
        config: Config,
        policies: Policies,
        events: Arc<dyn EventSink>,
    ) -> Self {
        let participants = ParticipantRegistry::new(pool.clone());
        let ledger = ParticipationLedger::new(pool.clone());
        let threads = ThreadResolver::new(
            pool.clone(),
            policies.clone(),
            events,
            config.thread_unique_for_active_recipients,
        );
        let messages = MessageStore::new(pool.clone(), policies.daily_limit.clone());
        let notifications = NotificationTracker::new(pool);

        Self {
            participants,
            ledger,
            threads,
            messages,
            notifications,
            policies,
            identities: ParticipantCache::new(Duration::from_secs(config.participant_cache_ttl_secs)),
            jwt_secret: config.jwt_secret.clone(),
            config,
        }
    }
}

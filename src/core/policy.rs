//! Pluggable policies - Strategy hooks consulted by the engine
//!
//! Each hook ships with a default implementation. An application swaps a hook
//! by building its own `Policies` at startup and handing it to
//! `AppState::with_policies`.

use crate::core::Config;
use crate::entities::Thread;
use serde_json::Value;
use std::sync::Arc;

/// Hard cap on the number of active participants of a thread
pub const MAX_ACTIVE_PARTICIPANTS: usize = 10;

/// Membership snapshot of a thread handed to the policies.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThreadRoster {
    pub thread_id: i64,
    /// Participants with an open participation, in joining order
    pub active: Vec<i64>,
    /// Everybody who ever joined, deduplicated, in first-joining order
    pub historical: Vec<i64>,
}

impl ThreadRoster {
    /// Roster of a thread that has no participation yet.
    pub fn founding(thread_id: i64) -> Self {
        Self {
            thread_id,
            ..Self::default()
        }
    }

    /// True until the first participation of the thread exists. A thread
    /// whose members all left is not founding.
    pub fn is_founding(&self) -> bool {
        self.historical.is_empty()
    }

    pub fn is_active(&self, participant_id: i64) -> bool {
        self.active.contains(&participant_id)
    }

    pub fn has_ever_joined(&self, participant_id: i64) -> bool {
        self.historical.contains(&participant_id)
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }
}

/// Decides which candidates a requester may add to a thread.
pub trait AddParticipantsPolicy: Send + Sync {
    fn allowed(&self, roster: &ThreadRoster, requester: i64, candidates: &[i64]) -> Vec<i64>;
}

/// Decides which participants a requester may remove from a thread.
pub trait RemoveParticipantsPolicy: Send + Sync {
    fn removable(&self, roster: &ThreadRoster, requester: i64) -> Vec<i64>;
}

/// Resolves the rolling 24h quota of a sender, `None` meaning unlimited.
pub trait DailyLimitPolicy: Send + Sync {
    fn daily_limit(&self, sender_id: i64, thread_id: i64) -> Option<u32>;
}

/// Renders the participants of a thread for its serialized form.
pub trait ParticipantsView: Send + Sync {
    fn render(&self, thread: &Thread, participant_ids: &[i64]) -> Value;
}

/// Any active participant may add anyone; a thread being founded accepts its
/// founding participants.
#[derive(Debug, Default, Clone, Copy)]
pub struct ActiveMembersMayAdd;

impl AddParticipantsPolicy for ActiveMembersMayAdd {
    fn allowed(&self, roster: &ThreadRoster, requester: i64, candidates: &[i64]) -> Vec<i64> {
        if roster.is_founding() || roster.is_active(requester) {
            candidates.to_vec()
        } else {
            Vec::new()
        }
    }
}

/// A participant may only remove themself.
#[derive(Debug, Default, Clone, Copy)]
pub struct RemoveSelfOnly;

impl RemoveParticipantsPolicy for RemoveSelfOnly {
    fn removable(&self, roster: &ThreadRoster, requester: i64) -> Vec<i64> {
        // same historical check as the thread membership guard
        if roster.has_ever_joined(requester) {
            vec![requester]
        } else {
            Vec::new()
        }
    }
}

/// Quota read from `Config::daily_message_limit`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConfiguredDailyLimit(pub Option<u32>);

impl DailyLimitPolicy for ConfiguredDailyLimit {
    fn daily_limit(&self, _sender_id: i64, _thread_id: i64) -> Option<u32> {
        self.0
    }
}

impl<F> DailyLimitPolicy for F
where
    F: Fn(i64, i64) -> Option<u32> + Send + Sync,
{
    fn daily_limit(&self, sender_id: i64, thread_id: i64) -> Option<u32> {
        self(sender_id, thread_id)
    }
}

/// Plain list of participant ids.
#[derive(Debug, Default, Clone, Copy)]
pub struct ParticipantIds;

impl ParticipantsView for ParticipantIds {
    fn render(&self, _thread: &Thread, participant_ids: &[i64]) -> Value {
        Value::from(participant_ids.to_vec())
    }
}

#[derive(Clone)]
pub struct Policies {
    pub add_participants: Arc<dyn AddParticipantsPolicy>,
    pub remove_participants: Arc<dyn RemoveParticipantsPolicy>,
    pub daily_limit: Arc<dyn DailyLimitPolicy>,
    pub participants_view: Arc<dyn ParticipantsView>,
}

impl Policies {
    /// Default hooks, with the daily quota taken from the configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            add_participants: Arc::new(ActiveMembersMayAdd),
            remove_participants: Arc::new(RemoveSelfOnly),
            daily_limit: Arc::new(ConfiguredDailyLimit(config.daily_message_limit)),
            participants_view: Arc::new(ParticipantIds),
        }
    }
}

impl Default for Policies {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Applies the participant cap to the ids a policy allowed.
///
/// Candidates are taken in input order; ids already active or repeated are
/// skipped, and admission stops once the thread would exceed
/// `MAX_ACTIVE_PARTICIPANTS`. Dropped candidates are not an error.
pub fn admit(roster: &ThreadRoster, allowed: &[i64]) -> Vec<i64> {
    let slots = MAX_ACTIVE_PARTICIPANTS.saturating_sub(roster.active_count());
    let mut admitted: Vec<i64> = Vec::with_capacity(slots.min(allowed.len()));

    for &candidate in allowed {
        if admitted.len() >= slots {
            break;
        }
        if roster.is_active(candidate) || admitted.contains(&candidate) {
            continue;
        }
        admitted.push(candidate);
    }

    admitted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster(active: &[i64], historical: &[i64]) -> ThreadRoster {
        ThreadRoster {
            thread_id: 1,
            active: active.to_vec(),
            historical: historical.to_vec(),
        }
    }

    #[test]
    fn test_admit_stops_at_the_cap_in_input_order() {
        let active: Vec<i64> = (1..=8).collect();
        let roster = roster(&active, &active);

        assert_eq!(admit(&roster, &[20, 21, 22, 23, 24]), vec![20, 21]);
    }

    #[test]
    fn test_admit_skips_active_and_repeated_ids() {
        let roster = roster(&[1, 2], &[1, 2]);

        assert_eq!(admit(&roster, &[2, 3, 3, 1, 4]), vec![3, 4]);
    }

    #[test]
    fn test_admit_on_full_thread_is_empty() {
        let active: Vec<i64> = (1..=10).collect();
        let roster = roster(&active, &active);

        assert!(admit(&roster, &[11]).is_empty());
    }

    #[test]
    fn test_active_members_may_add() {
        let policy = ActiveMembersMayAdd;
        let thread = roster(&[1, 2], &[1, 2, 3]);

        assert_eq!(policy.allowed(&thread, 1, &[4, 5]), vec![4, 5]);
        // 3 left the thread
        assert!(policy.allowed(&thread, 3, &[4]).is_empty());
        // a thread being founded accepts everybody
        assert_eq!(policy.allowed(&ThreadRoster::founding(9), 1, &[1, 2]), vec![1, 2]);
    }

    #[test]
    fn test_abandoned_thread_is_not_founding() {
        let policy = ActiveMembersMayAdd;
        let abandoned = roster(&[], &[1, 2]);

        assert!(!abandoned.is_founding());
        assert!(policy.allowed(&abandoned, 1, &[5]).is_empty());
        assert!(policy.allowed(&abandoned, 99, &[5, 99]).is_empty());
    }

    #[test]
    fn test_remove_self_only() {
        let policy = RemoveSelfOnly;
        let thread = roster(&[1, 2], &[1, 2, 3]);

        assert_eq!(policy.removable(&thread, 1), vec![1]);
        assert_eq!(policy.removable(&thread, 3), vec![3]);
        assert!(policy.removable(&thread, 4).is_empty());
    }

    #[test]
    fn test_closures_are_daily_limit_policies() {
        let policy = |sender: i64, _thread: i64| if sender == 1 { Some(5) } else { None };

        assert_eq!(policy.daily_limit(1, 10), Some(5));
        assert_eq!(policy.daily_limit(2, 10), None);
    }

    #[test]
    fn test_participant_ids_view() {
        let thread = Thread {
            thread_id: 1,
            name: None,
        };

        assert_eq!(ParticipantIds.render(&thread, &[1, 2]), serde_json::json!([1, 2]));
    }
}

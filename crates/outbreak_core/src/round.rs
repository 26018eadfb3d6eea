//! Round-scoped state.
//!
//! Purchase counters, free-rebuy eligibility, and suicide flags are only
//! meaningful within the current round; [`RoundState::reset`] clears them
//! exactly once at round start. The infection flag tracks whether the
//! round's outbreak has begun (respawn side policy and suicide forcing only
//! apply while it has).

use std::collections::{HashMap, HashSet};

use crate::session::ParticipantId;

/// Per-round counters and flags, reset at round boundaries.
#[derive(Debug, Clone, Default)]
pub struct RoundState {
    purchases: HashMap<ParticipantId, HashMap<String, u32>>,
    free_rebuy_used: HashSet<ParticipantId>,
    suicides: HashSet<ParticipantId>,
    infection_underway: bool,
}

impl RoundState {
    /// Create a fresh round.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear everything for a new round.
    pub fn reset(&mut self) {
        self.purchases.clear();
        self.free_rebuy_used.clear();
        self.suicides.clear();
        self.infection_underway = false;
    }

    /// How many times a participant has purchased a weapon this round.
    #[must_use]
    pub fn purchase_count(&self, participant: ParticipantId, weapon: &str) -> u32 {
        self.purchases
            .get(&participant)
            .and_then(|counts| counts.get(weapon))
            .copied()
            .unwrap_or(0)
    }

    /// Record one successful purchase and return the new count.
    pub fn record_purchase(&mut self, participant: ParticipantId, weapon: &str) -> u32 {
        let count = self
            .purchases
            .entry(participant)
            .or_default()
            .entry(weapon.to_string())
            .or_insert(0);
        *count += 1;
        *count
    }

    /// Whether the participant still has a free rebuy this round.
    #[must_use]
    pub fn free_rebuy_available(&self, participant: ParticipantId) -> bool {
        !self.free_rebuy_used.contains(&participant)
    }

    /// Consume the participant's free rebuy for this round.
    pub fn mark_free_rebuy(&mut self, participant: ParticipantId) {
        self.free_rebuy_used.insert(participant);
    }

    /// Record a suicide death.
    pub fn record_suicide(&mut self, participant: ParticipantId) {
        self.suicides.insert(participant);
    }

    /// Clear the suicide flag (non-suicide death).
    pub fn clear_suicide(&mut self, participant: ParticipantId) {
        self.suicides.remove(&participant);
    }

    /// Whether the participant's last death was a suicide.
    #[must_use]
    pub fn was_suicide(&self, participant: ParticipantId) -> bool {
        self.suicides.contains(&participant)
    }

    /// Consume the suicide flag, returning whether it was set.
    pub fn take_suicide(&mut self, participant: ParticipantId) -> bool {
        self.suicides.remove(&participant)
    }

    /// Mark the round's outbreak as begun.
    pub fn begin_infection(&mut self) {
        self.infection_underway = true;
    }

    /// Mark the round's outbreak as over (round end).
    pub fn end_infection(&mut self) {
        self.infection_underway = false;
    }

    /// Whether the round's outbreak is underway.
    #[must_use]
    pub const fn infection_underway(&self) -> bool {
        self.infection_underway
    }

    /// Drop everything tracked for one participant (disconnect).
    pub fn forget(&mut self, participant: ParticipantId) {
        self.purchases.remove(&participant);
        self.free_rebuy_used.remove(&participant);
        self.suicides.remove(&participant);
    }
}

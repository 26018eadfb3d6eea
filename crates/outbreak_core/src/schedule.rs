//! Deferred work: next-safe-point tasks and delay timers.
//!
//! Engine callbacks must not mutate entity state inside their own execution
//! context, and several behaviors want wall-time delays (respawn, settle,
//! rebuy). Both kinds of deferred work are explicit task values with
//! captured-by-value arguments; the existence check of the target
//! participant happens when a task runs, never when it is scheduled, so
//! tasks that outlive their participant no-op safely.

use std::collections::VecDeque;

use crate::session::ParticipantId;

/// Game ticks per second.
pub const TICK_RATE: u32 = 64;

/// Seconds between a role application and its health/armor settle step.
pub const ROLE_SETTLE_DELAY_SECS: f32 = 0.3;

/// Seconds after damage before the role's speed scale is re-asserted.
pub const SPEED_REASSERT_DELAY_SECS: f32 = 0.5;

/// Seconds after spawn before the auto-rebuy runs.
pub const SPAWN_REBUY_DELAY_SECS: f32 = 0.5;

/// Seconds after a mid-round side join before the late respawn.
pub const LATE_JOIN_RESPAWN_DELAY_SECS: f32 = 1.0;

/// Convert a delay in seconds to ticks, rounding up, never less than one
/// tick so a delayed task can never run inside the scheduling callback.
#[must_use]
pub fn secs_to_ticks(secs: f32) -> u64 {
    if secs <= 0.0 {
        return 1;
    }
    let ticks = (secs * TICK_RATE as f32).ceil() as u64;
    ticks.max(1)
}

/// One unit of deferred work. Every variant captures its arguments by
/// value; nothing holds a live reference into the session table.
#[derive(Debug, Clone, PartialEq)]
pub enum ScheduledTask {
    /// Apply a role's model and speed at the next safe mutation point.
    ApplyRoleShell {
        /// Target participant.
        participant: ParticipantId,
        /// Resolved model path (side default already substituted).
        model: String,
        /// Speed scale relative to baseline.
        speed_scale: f32,
    },
    /// Settle a role after [`ROLE_SETTLE_DELAY_SECS`]: health, infected
    /// armor strip, regeneration restart.
    SettleRole {
        /// Target participant.
        participant: ParticipantId,
        /// Role unique name, re-resolved against the catalog on execution.
        role: String,
    },
    /// One regeneration pulse; reschedules itself while the role still
    /// applies.
    RegenPulse {
        /// Target participant.
        participant: ParticipantId,
        /// Role unique name the pulse belongs to.
        role: String,
    },
    /// Grant a validated purchase at the next safe mutation point.
    GrantPurchase {
        /// Target participant.
        participant: ParticipantId,
        /// Weapon unique name, re-resolved against the catalog on execution.
        weapon: String,
        /// Whether to subtract the price on grant.
        deduct: bool,
    },
    /// Scheduled respawn after the configured delay.
    Respawn {
        /// Target participant.
        participant: ParticipantId,
    },
    /// Spawn-triggered free rebuy after [`SPAWN_REBUY_DELAY_SECS`].
    SpawnRebuy {
        /// Target participant.
        participant: ParticipantId,
    },
    /// Post-damage speed correction after [`SPEED_REASSERT_DELAY_SECS`].
    ReassertSpeed {
        /// Target participant.
        participant: ParticipantId,
    },
    /// Late-join respawn after [`LATE_JOIN_RESPAWN_DELAY_SECS`].
    LateJoinRespawn {
        /// Target participant.
        participant: ParticipantId,
    },
}

#[derive(Debug, Clone)]
struct TimerEntry {
    due: u64,
    seq: u64,
    task: ScheduledTask,
}

/// Holds both categories of deferred work.
///
/// Next-safe-point tasks run at the start of the next tick, before due
/// timers, in scheduling order. Timers run once their due tick is reached,
/// ordered by due tick then scheduling order.
#[derive(Debug, Clone, Default)]
pub struct DeferredQueue {
    next_update: VecDeque<ScheduledTask>,
    timers: Vec<TimerEntry>,
    seq: u64,
}

impl DeferredQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a task for the next safe mutation point.
    pub fn defer(&mut self, task: ScheduledTask) {
        tracing::trace!(?task, "deferred to next update");
        self.next_update.push_back(task);
    }

    /// Queue a task to run `delay_secs` from `now`.
    pub fn delay(&mut self, task: ScheduledTask, delay_secs: f32, now: u64) {
        let due = now + secs_to_ticks(delay_secs);
        tracing::trace!(?task, due, "timer scheduled");
        self.seq += 1;
        self.timers.push(TimerEntry {
            due,
            seq: self.seq,
            task,
        });
    }

    /// Take every task that should run at tick `now`: the whole
    /// next-safe-point queue, then all due timers.
    pub fn take_runnable(&mut self, now: u64) -> Vec<ScheduledTask> {
        let mut runnable: Vec<ScheduledTask> = self.next_update.drain(..).collect();

        let mut due: Vec<TimerEntry> = Vec::new();
        self.timers.retain(|entry| {
            if entry.due <= now {
                due.push(entry.clone());
                false
            } else {
                true
            }
        });
        due.sort_by_key(|entry| (entry.due, entry.seq));
        runnable.extend(due.into_iter().map(|entry| entry.task));
        runnable
    }

    /// Outstanding task count (both categories).
    #[must_use]
    pub fn len(&self) -> usize {
        self.next_update.len() + self.timers.len()
    }

    /// Whether nothing is scheduled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.next_update.is_empty() && self.timers.is_empty()
    }
}

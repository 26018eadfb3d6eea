//! Death handling, respawn scheduling, and the manual respawn command.
//!
//! Deaths only record facts and start timers; the actual side and role
//! decisions happen on the spawn event that follows the respawn effect, so
//! a disconnect inside the delay window costs nothing.

use tracing::{debug, info};

use crate::catalog::Side;
use crate::effect::{EngineEffect, Notice};
use crate::mode::ModeContext;
use crate::schedule::{ScheduledTask, LATE_JOIN_RESPAWN_DELAY_SECS};
use crate::session::ParticipantId;

/// Process a death: clear the entity mirror, tag suicides, schedule the
/// respawn timer.
///
/// A death with no attacker (or self-inflicted) counts as suicide; the tag
/// is what later turns the respawn into a forced infection. Suicides are
/// scheduled even with general respawning off when the suicide-respawn
/// setting asks for it.
pub fn on_death(ctx: &mut ModeContext, victim: ParticipantId, attacker: Option<ParticipantId>) {
    let Some(session) = ctx.sessions.get_mut(victim) else {
        debug!(participant = %victim, "death of unknown participant");
        return;
    };
    session.alive = false;
    session.health = 0;
    session.armor = 0;
    session.helmet = false;
    session.held.clear();
    let suicide = attacker.is_none() || attacker == Some(victim);
    if suicide {
        ctx.round.record_suicide(victim);
    } else {
        ctx.round.clear_suicide(victim);
    }
    debug!(participant = %victim, suicide, "death recorded");
    let scheduled = (suicide && ctx.settings.suicide_respawn_infected)
        || ctx.settings.respawn_enabled;
    if scheduled {
        ctx.queue.delay(
            ScheduledTask::Respawn { participant: victim },
            ctx.settings.respawn_delay,
            ctx.tick,
        );
    }
}

/// Respawn the participant if they are connected, dead, on a side, and
/// respawning is enabled. Returns whether the respawn effect went out.
///
/// The enabled check runs here, at fire time, so a suicide timer scheduled
/// under a disabled toggle still refuses quietly.
pub fn respawn_now(ctx: &mut ModeContext, participant: ParticipantId) -> bool {
    let Some(session) = ctx.sessions.get(participant) else {
        debug!(participant = %participant, "respawn target gone");
        return false;
    };
    if session.alive {
        debug!(participant = %participant, "respawn skipped, already alive");
        return false;
    }
    if session.side.is_none() {
        debug!(participant = %participant, "respawn skipped, no side");
        return false;
    }
    if !ctx.settings.respawn_enabled {
        debug!(participant = %participant, "respawn skipped, respawning disabled");
        return false;
    }
    ctx.effects.push(EngineEffect::Respawn { participant });
    info!(participant = %participant, "respawn issued");
    true
}

/// Executes a scheduled respawn; every precondition is rechecked.
pub(crate) fn run_scheduled(ctx: &mut ModeContext, participant: ParticipantId) {
    respawn_now(ctx, participant);
}

/// The manual respawn command: dead participant, valid side, respawning
/// enabled. Refusals notify the caller.
pub fn manual_respawn(ctx: &mut ModeContext, participant: ParticipantId) {
    let Some(session) = ctx.sessions.get(participant) else {
        return;
    };
    if !ctx.settings.respawn_enabled {
        ctx.effects.notice(participant, Notice::RespawnDisabled);
        return;
    }
    if session.alive {
        ctx.effects.notice(participant, Notice::MustBeDead);
        return;
    }
    if session.side.is_none() {
        ctx.effects.notice(participant, Notice::MustJoinSide);
        return;
    }
    respawn_now(ctx, participant);
}

/// Track an engine team switch and schedule the late-join respawn when a
/// dead participant joins a side while the outbreak is underway.
pub fn on_side_changed(ctx: &mut ModeContext, participant: ParticipantId, side: Option<Side>) {
    let Some(session) = ctx.sessions.get_mut(participant) else {
        return;
    };
    session.side = side;
    debug!(participant = %participant, ?side, "side changed");
    let wants_respawn = side.is_some()
        && !session.alive
        && ctx.settings.late_join_respawn
        && ctx.round.infection_underway();
    if wants_respawn {
        ctx.queue.delay(
            ScheduledTask::LateJoinRespawn { participant },
            LATE_JOIN_RESPAWN_DELAY_SECS,
            ctx.tick,
        );
        debug!(participant = %participant, "late join respawn scheduled");
    }
}

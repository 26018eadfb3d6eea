//! Role assignment: two-stage application, regeneration, selection menus.
//!
//! Applying a role never touches the entity inline. The cosmetic shell
//! (model, speed scale) goes out at the next safe mutation point and the
//! authoritative attributes (health, infected armor strip, regeneration)
//! settle on a short timer, so an engine respawn that stomps attributes in
//! the same frame loses to the settle step.

use tracing::{debug, info, warn};

use crate::catalog::{RoleDefinition, Side, BASE_RUN_SPEED};
use crate::effect::{EngineEffect, Notice};
use crate::error::{ModeError, Result};
use crate::menu::{MenuChoice, MenuKind, MenuPresenter, MenuRequest};
use crate::mode::ModeContext;
use crate::schedule::{ScheduledTask, ROLE_SETTLE_DELAY_SECS};
use crate::session::{ParticipantId, ParticipantSession};
use crate::store::{PersistentRecord, RecordStore};

const INFECTED_ITEM: &str = "Infected class";
const DEFENDER_ITEM: &str = "Defender class";

/// Schedule a role application for a connected participant.
///
/// The shell stage (model and speed) runs at the next safe point; the
/// settle stage (health, infected armor strip, regeneration restart) runs
/// after [`ROLE_SETTLE_DELAY_SECS`]. The session's active-role snapshot is
/// taken now, so later catalog edits do not retroactively change what was
/// applied.
pub fn apply_role(ctx: &mut ModeContext, participant: ParticipantId, role_name: &str) -> Result<()> {
    let role = ctx
        .catalog
        .role(role_name)
        .cloned()
        .ok_or_else(|| ModeError::UnknownRole(role_name.to_string()))?;
    let Some(session) = ctx.sessions.get_mut(participant) else {
        return Err(ModeError::ParticipantMissing(participant));
    };
    let model = if role.uses_default_model() {
        ctx.settings.default_model(role.side).to_string()
    } else {
        role.model.clone()
    };
    let speed_scale = role.speed_scale();
    let role_name = role.name.clone();
    session.active_role = Some(role);
    ctx.queue.defer(ScheduledTask::ApplyRoleShell {
        participant,
        model,
        speed_scale,
    });
    ctx.queue.delay(
        ScheduledTask::SettleRole {
            participant,
            role: role_name.clone(),
        },
        ROLE_SETTLE_DELAY_SECS,
        ctx.tick,
    );
    debug!(participant = %participant, role = %role_name, "role application scheduled");
    Ok(())
}

/// Executes the deferred shell stage.
pub(crate) fn run_apply_shell(
    ctx: &mut ModeContext,
    participant: ParticipantId,
    model: String,
    speed_scale: f32,
) {
    if !ctx.sessions.contains(participant) {
        debug!(participant = %participant, "shell task target gone");
        return;
    }
    ctx.effects.push(EngineEffect::SetModel { participant, model });
    ctx.effects.push(EngineEffect::SetSpeedScale {
        participant,
        scale: speed_scale,
    });
}

/// Executes the settle stage. The role is re-resolved against the catalog;
/// dead or vanished participants are skipped, which is what makes the
/// settle delay safe against deaths in the window.
pub(crate) fn run_settle(ctx: &mut ModeContext, participant: ParticipantId, role_name: &str) {
    let Some(role) = ctx.catalog.role(role_name).cloned() else {
        warn!(role = %role_name, "settle task references a role no longer in the catalog");
        return;
    };
    let Some(session) = ctx.sessions.get_mut(participant) else {
        debug!(participant = %participant, "settle task target gone");
        return;
    };
    if !session.alive {
        debug!(participant = %participant, "settle skipped, participant is dead");
        return;
    }
    session.health = role.health;
    ctx.effects.push(EngineEffect::SetHealth {
        participant,
        health: role.health,
    });
    if role.side == Side::Infected {
        session.armor = 0;
        session.helmet = false;
        ctx.effects.push(EngineEffect::SetArmor {
            participant,
            armor: 0,
            helmet: false,
        });
    }
    if role.has_regen() {
        ctx.queue.delay(
            ScheduledTask::RegenPulse {
                participant,
                role: role.name.clone(),
            },
            role.regen_interval,
            ctx.tick,
        );
    }
    debug!(participant = %participant, role = %role.name, "role settled");
}

/// Executes one regeneration pulse and reschedules the chain.
///
/// The chain dies silently when the participant is gone, dead, or no
/// longer carries the role it was started for; the next settle starts a
/// fresh chain.
pub(crate) fn run_regen_pulse(ctx: &mut ModeContext, participant: ParticipantId, role_name: &str) {
    let Some(session) = ctx.sessions.get_mut(participant) else {
        return;
    };
    if !session.alive {
        return;
    }
    let Some(role) = session.active_role.clone() else {
        return;
    };
    if role.name != role_name || !role.has_regen() {
        debug!(participant = %participant, role = %role_name, "regen chain ended, role changed");
        return;
    }
    let healed = (session.health + role.regen_amount).min(role.health);
    if healed > session.health {
        session.health = healed;
        ctx.effects.push(EngineEffect::SetHealth {
            participant,
            health: healed,
        });
    }
    ctx.queue.delay(
        ScheduledTask::RegenPulse {
            participant,
            role: role.name,
        },
        role.regen_interval,
        ctx.tick,
    );
}

/// Executes the post-damage speed correction. Baseline-speed roles are
/// left alone so the effect stream stays quiet for them.
pub(crate) fn run_reassert_speed(ctx: &mut ModeContext, participant: ParticipantId) {
    let Some(session) = ctx.sessions.get(participant) else {
        return;
    };
    if !session.alive {
        return;
    }
    let Some(role) = &session.active_role else {
        return;
    };
    if (role.speed - BASE_RUN_SPEED).abs() < f32::EPSILON {
        return;
    }
    let scale = role.speed_scale();
    ctx.effects.push(EngineEffect::SetSpeedScale { participant, scale });
}

/// Seed a fresh session's role selections and kick off its record fetch.
///
/// Selections land immediately (random draw or configured defaults) so the
/// participant can spawn before the fetch resolves; the loaded record
/// overrides them when it arrives.
pub fn assign_on_connect(
    ctx: &mut ModeContext,
    store: &mut dyn RecordStore,
    participant: ParticipantId,
) {
    let (defender, infected) = connect_roles(ctx);
    let Some(session) = ctx.sessions.get_mut(participant) else {
        return;
    };
    if let Some(name) = defender {
        session.selected_defender = Some(name);
    }
    if let Some(name) = infected {
        session.selected_infected = Some(name);
    }
    if session.is_bot {
        return;
    }
    let Some(persist) = session.persist_id else {
        debug!(participant = %participant, "no stable identity, skipping record fetch");
        return;
    };
    store.request_fetch(participant, persist);
}

fn connect_roles(ctx: &mut ModeContext) -> (Option<String>, Option<String>) {
    if ctx.settings.random_role_on_connect {
        let defender = ctx
            .catalog
            .random_role(Side::Defender, &mut ctx.rng)
            .map(|role| role.name.clone());
        let infected = ctx
            .catalog
            .random_role(Side::Infected, &mut ctx.rng)
            .map(|role| role.name.clone());
        (defender, infected)
    } else {
        (
            ctx.catalog
                .default_role(Side::Defender)
                .map(|role| role.name.clone()),
            ctx.catalog
                .default_role(Side::Infected)
                .map(|role| role.name.clone()),
        )
    }
}

/// Re-roll both selections on spawn when the random-on-spawn setting is
/// active. The persisted record is not touched.
pub fn reroll_on_spawn(ctx: &mut ModeContext, participant: ParticipantId) {
    if !ctx.settings.random_role_on_spawn {
        return;
    }
    let defender = ctx
        .catalog
        .random_role(Side::Defender, &mut ctx.rng)
        .map(|role| role.name.clone());
    let infected = ctx
        .catalog
        .random_role(Side::Infected, &mut ctx.rng)
        .map(|role| role.name.clone());
    let Some(session) = ctx.sessions.get_mut(participant) else {
        return;
    };
    if let Some(name) = defender {
        session.selected_defender = Some(name);
    }
    if let Some(name) = infected {
        session.selected_infected = Some(name);
    }
}

/// Merge a resolved record fetch into the session, or create the initial
/// record when the identity has none stored yet.
pub fn on_record_loaded(
    ctx: &mut ModeContext,
    store: &mut dyn RecordStore,
    participant: ParticipantId,
    record: Option<PersistentRecord>,
) {
    let Some(session) = ctx.sessions.get_mut(participant) else {
        debug!(participant = %participant, "record fetch resolved after disconnect");
        return;
    };
    match record {
        Some(record) => {
            for side in [Side::Defender, Side::Infected] {
                if let Some(name) = record.role_for(side) {
                    if ctx
                        .catalog
                        .role(name)
                        .is_some_and(RoleDefinition::selectable)
                    {
                        session.set_selected_role(side, name);
                    } else {
                        debug!(
                            participant = %participant,
                            role = %name,
                            "stored role not selectable on this map"
                        );
                    }
                }
            }
            session.loadout = record.loadout;
            session.auto_rebuy = record.auto_rebuy;
            session.record_loaded = true;
            info!(participant = %participant, "persistent record loaded");
        }
        None => {
            session.record_loaded = true;
            let Some(persist) = session.persist_id else {
                return;
            };
            store.request_store(persist, record_from_session(session));
            info!(participant = %participant, "created initial persistent record");
        }
    }
}

/// Snapshot a session into its persistent record form.
pub(crate) fn record_from_session(session: &ParticipantSession) -> PersistentRecord {
    PersistentRecord {
        defender_role: session.selected_defender.clone(),
        infected_role: session.selected_infected.clone(),
        loadout: session.loadout.clone(),
        auto_rebuy: session.auto_rebuy,
    }
}

/// Persist the session's record if it has a stable identity.
pub(crate) fn persist_session(session: &ParticipantSession, store: &mut dyn RecordStore) {
    let Some(persist) = session.persist_id else {
        return;
    };
    store.request_store(persist, record_from_session(session));
}

/// Move a participant to the infected side and apply their infected role.
pub fn infect(ctx: &mut ModeContext, participant: ParticipantId) {
    set_side_role(ctx, participant, Side::Infected);
}

/// Move a participant to the defender side and apply their defender role.
pub fn humanize(ctx: &mut ModeContext, participant: ParticipantId) {
    set_side_role(ctx, participant, Side::Defender);
}

fn set_side_role(ctx: &mut ModeContext, participant: ParticipantId, side: Side) {
    let Some(session) = ctx.sessions.get_mut(participant) else {
        warn!(participant = %participant, "side transition for unknown participant");
        return;
    };
    session.side = Some(side);
    match resolve_side_role(ctx, participant, side) {
        Some(name) => {
            if let Err(err) = apply_role(ctx, participant, &name) {
                warn!(participant = %participant, %err, "side role application failed");
            }
        }
        None => warn!(participant = %participant, %side, "no role available for side"),
    }
    info!(participant = %participant, %side, "side transition");
}

/// The selected role if still enabled, else the side default.
fn resolve_side_role(ctx: &ModeContext, participant: ParticipantId, side: Side) -> Option<String> {
    let session = ctx.sessions.get(participant)?;
    if let Some(selected) = session.selected_role(side) {
        if ctx.catalog.role(selected).is_some_and(|role| role.enabled) {
            return Some(selected.to_string());
        }
    }
    ctx.catalog.default_role(side).map(|role| role.name.clone())
}

/// Opens the side-selection menu (the class command entry point).
pub fn open_side_menu(
    ctx: &mut ModeContext,
    presenter: &mut dyn MenuPresenter,
    participant: ParticipantId,
) {
    if !ctx.sessions.contains(participant) {
        return;
    }
    if !ctx.settings.role_change_allowed {
        ctx.effects.notice(participant, Notice::RoleChangeDisabled);
        return;
    }
    let mut request = MenuRequest::new(MenuKind::RoleSides, "Class settings");
    request.item(INFECTED_ITEM);
    request.item(DEFENDER_ITEM);
    if presenter.present(participant, request).is_err() {
        ctx.effects.notice(participant, Notice::MenuUnavailable);
    }
}

/// Opens the role list for one side. The current selection and anything
/// not selectable show up disabled.
pub fn open_role_menu(
    ctx: &mut ModeContext,
    presenter: &mut dyn MenuPresenter,
    participant: ParticipantId,
    side: Side,
) {
    let Some(session) = ctx.sessions.get(participant) else {
        return;
    };
    let current = session.selected_role(side).map(str::to_string);
    let mut request = MenuRequest::new(
        MenuKind::RoleSelect { side },
        format!("{side} classes"),
    );
    for role in ctx.catalog.roles_for_side(side) {
        let is_current = current.as_deref() == Some(role.name.as_str());
        if role.selectable() && !is_current {
            request.item(role.display_name.clone());
        } else {
            request.disabled_item(role.display_name.clone());
        }
    }
    if presenter.present(participant, request).is_err() {
        ctx.effects.notice(participant, Notice::MenuUnavailable);
    }
}

/// Routes choices from the role menus.
pub fn handle_menu_choice(
    ctx: &mut ModeContext,
    presenter: &mut dyn MenuPresenter,
    store: &mut dyn RecordStore,
    participant: ParticipantId,
    kind: MenuKind,
    choice: MenuChoice,
) {
    match (kind, choice) {
        (MenuKind::RoleSides, MenuChoice::Picked(label)) => {
            let side = match label.as_str() {
                INFECTED_ITEM => Some(Side::Infected),
                DEFENDER_ITEM => Some(Side::Defender),
                _ => None,
            };
            match side {
                Some(side) => open_role_menu(ctx, presenter, participant, side),
                None => debug!(label, "unrecognized side item"),
            }
        }
        (MenuKind::RoleSides, _) => presenter.close(participant),
        (MenuKind::RoleSelect { side }, MenuChoice::Picked(label)) => {
            select_role(ctx, store, participant, side, &label);
        }
        (MenuKind::RoleSelect { .. }, MenuChoice::Back) => {
            open_side_menu(ctx, presenter, participant);
        }
        (MenuKind::RoleSelect { .. }, MenuChoice::Closed) => {}
        (kind, _) => debug!(?kind, "choice for a menu this module does not own"),
    }
}

fn select_role(
    ctx: &mut ModeContext,
    store: &mut dyn RecordStore,
    participant: ParticipantId,
    side: Side,
    label: &str,
) {
    let Some(role) = ctx
        .catalog
        .roles_for_side(side)
        .into_iter()
        .find(|role| role.display_name == label)
    else {
        debug!(label, "selection label matches no role");
        return;
    };
    if !role.selectable() {
        debug!(role = %role.name, "selection refused, role not selectable");
        return;
    }
    let name = role.name.clone();
    let display = role.display_name.clone();
    let save = ctx.settings.save_role_on_select;
    let Some(session) = ctx.sessions.get_mut(participant) else {
        return;
    };
    session.set_selected_role(side, name.clone());
    ctx.effects
        .notice(participant, Notice::RoleSelected { role: display });
    if save {
        persist_session(session, store);
    }
    info!(participant = %participant, role = %name, %side, "role selected");
}

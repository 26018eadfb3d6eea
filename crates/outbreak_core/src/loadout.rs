//! Saved loadouts: save, rebuy, auto-rebuy, and the market menu tree.
//!
//! A saved loadout is a list of weapon unique names, one per singleton
//! slot plus grenades, resolved against the current catalog at buy time so
//! a stale entry degrades to a skipped line instead of an error.

use tracing::{debug, info};

use crate::catalog::{WeaponDefinition, WeaponSlot};
use crate::effect::Notice;
use crate::menu::{MenuChoice, MenuKind, MenuPresenter, MenuRequest};
use crate::mode::ModeContext;
use crate::purchase;
use crate::roles;
use crate::schedule::{ScheduledTask, SPAWN_REBUY_DELAY_SECS};
use crate::session::ParticipantId;
use crate::store::{RecordStore, SavedLoadout};

const BUY_SAVED_ITEM: &str = "Buy saved setup";
const SAVE_ITEM: &str = "Save current setup";
const VIEW_ITEM: &str = "View saved setup";
const AUTO_REBUY_ITEM: &str = "Auto-rebuy";
const BUY_WEAPONS_ITEM: &str = "Buy weapons";

/// Snapshot the participant's held items (plus worn armor) into the saved
/// loadout and persist it.
pub fn save_current_setup(
    ctx: &mut ModeContext,
    store: &mut dyn RecordStore,
    participant: ParticipantId,
) {
    let Some(session) = ctx.sessions.get(participant) else {
        return;
    };
    let mut saved = SavedLoadout::default();
    for entity in session.held.all_entities() {
        match ctx.catalog.weapon_by_entity(&entity) {
            Some(weapon) => saved.record(weapon.slot, weapon.name.clone()),
            None => debug!(entity, "held entity not in catalog, not saved"),
        }
    }
    if session.armor > 0 {
        if let Some(armor) = ctx.catalog.weapons_in_slot(WeaponSlot::Armor).first() {
            saved.record(WeaponSlot::Armor, armor.name.clone());
        }
    }
    let Some(session) = ctx.sessions.get_mut(participant) else {
        return;
    };
    session.loadout = saved;
    ctx.effects.notice(participant, Notice::SetupSaved);
    roles::persist_session(session, store);
    info!(participant = %participant, "setup saved");
}

/// Purchase everything in the saved loadout.
///
/// A `free` call waives the charge once per participant per round; the
/// manual command and menu paths pass `free = false` and always pay.
/// Per-item rejections notify and skip that item only.
pub fn buy_saved_setup(ctx: &mut ModeContext, participant: ParticipantId, free: bool) {
    let Some(session) = ctx.sessions.get(participant) else {
        return;
    };
    let list = session.loadout.purchase_list();
    if list.is_empty() {
        ctx.effects.notice(participant, Notice::NoSavedSetup);
        return;
    }
    let deduct = !(free && ctx.round.free_rebuy_available(participant));
    if !deduct {
        ctx.round.mark_free_rebuy(participant);
    }
    for name in list {
        let Some(weapon) = ctx.catalog.weapon(&name).cloned() else {
            debug!(weapon = %name, "saved weapon not in catalog, skipped");
            continue;
        };
        let _ = purchase::validate_and_execute(ctx, participant, &weapon, deduct);
    }
    info!(participant = %participant, free = !deduct, "saved setup purchase ran");
}

/// Flip the auto-rebuy preference and persist it.
pub fn toggle_auto_rebuy(
    ctx: &mut ModeContext,
    store: &mut dyn RecordStore,
    participant: ParticipantId,
) {
    let Some(session) = ctx.sessions.get_mut(participant) else {
        return;
    };
    session.auto_rebuy = !session.auto_rebuy;
    let enabled = session.auto_rebuy;
    ctx.effects.notice(participant, Notice::AutoRebuy { enabled });
    roles::persist_session(session, store);
}

/// Queue the post-spawn grace rebuy for qualifying participants.
pub fn schedule_spawn_rebuy(ctx: &mut ModeContext, participant: ParticipantId) {
    let eligible = ctx
        .sessions
        .get(participant)
        .is_some_and(|s| !s.is_bot && s.auto_rebuy && !s.is_infected());
    if eligible {
        ctx.queue.delay(
            ScheduledTask::SpawnRebuy { participant },
            SPAWN_REBUY_DELAY_SECS,
            ctx.tick,
        );
    }
}

/// Executes the grace rebuy; eligibility is rechecked at fire time.
pub(crate) fn run_spawn_rebuy(ctx: &mut ModeContext, participant: ParticipantId) {
    let eligible = ctx
        .sessions
        .get(participant)
        .is_some_and(|s| s.alive && s.auto_rebuy && !s.is_infected());
    if eligible {
        buy_saved_setup(ctx, participant, true);
    }
}

/// Opens the market root (the market command entry point).
pub fn open_market_menu(
    ctx: &mut ModeContext,
    presenter: &mut dyn MenuPresenter,
    participant: ParticipantId,
) {
    let Some(session) = ctx.sessions.get(participant) else {
        return;
    };
    if !ctx.settings.purchase_enabled {
        ctx.effects.notice(participant, Notice::PurchasingDisabled);
        return;
    }
    let has_setup = !session.loadout.is_empty();
    let auto = if session.auto_rebuy { "on" } else { "off" };
    let mut request = MenuRequest::new(MenuKind::Market, "Market");
    if has_setup {
        request.item(BUY_SAVED_ITEM);
    } else {
        request.disabled_item(BUY_SAVED_ITEM);
    }
    request.item(SAVE_ITEM);
    if has_setup {
        request.item(VIEW_ITEM);
    } else {
        request.disabled_item(VIEW_ITEM);
    }
    request.item(format!("{AUTO_REBUY_ITEM}: {auto}"));
    request.item(BUY_WEAPONS_ITEM);
    if presenter.present(participant, request).is_err() {
        ctx.effects.notice(participant, Notice::MenuUnavailable);
    }
}

fn open_slot_menu(
    ctx: &mut ModeContext,
    presenter: &mut dyn MenuPresenter,
    participant: ParticipantId,
    edit: bool,
) {
    if !ctx.sessions.contains(participant) {
        return;
    }
    let title = if edit { "Edit saved setup" } else { "Buy weapons" };
    let mut request = MenuRequest::new(MenuKind::MarketSlots { edit }, title);
    for slot in WeaponSlot::ALL {
        if ctx.catalog.weapons_in_slot(slot).is_empty() {
            request.disabled_item(slot.label());
        } else {
            request.item(slot.label());
        }
    }
    if presenter.present(participant, request).is_err() {
        ctx.effects.notice(participant, Notice::MenuUnavailable);
    }
}

fn open_weapon_menu(
    ctx: &mut ModeContext,
    presenter: &mut dyn MenuPresenter,
    participant: ParticipantId,
    slot: WeaponSlot,
    edit: bool,
) {
    if !ctx.sessions.contains(participant) {
        return;
    }
    let title = if edit {
        format!("Save a {} weapon", slot.label())
    } else {
        format!("Buy {}", slot.label())
    };
    let mut request = MenuRequest::new(MenuKind::MarketWeapons { slot, edit }, title);
    for weapon in ctx.catalog.weapons_in_slot(slot) {
        let label = weapon_item_label(weapon);
        if weapon.restricted {
            request.disabled_item(label);
        } else {
            request.item(label);
        }
    }
    if presenter.present(participant, request).is_err() {
        ctx.effects.notice(participant, Notice::MenuUnavailable);
    }
}

fn open_view_menu(
    ctx: &mut ModeContext,
    presenter: &mut dyn MenuPresenter,
    participant: ParticipantId,
) {
    let Some(session) = ctx.sessions.get(participant) else {
        return;
    };
    let mut request = MenuRequest::new(MenuKind::MarketView, "Saved setup");
    for slot in [
        WeaponSlot::Primary,
        WeaponSlot::Secondary,
        WeaponSlot::Utility,
        WeaponSlot::Armor,
    ] {
        let display = session
            .loadout
            .slot(slot)
            .and_then(|name| ctx.catalog.weapon(name))
            .map_or_else(|| "none".to_string(), |w| w.display_name.clone());
        request.item(format!("{}: {display}", slot.label()));
    }
    let grenades: Vec<String> = session
        .loadout
        .grenades
        .iter()
        .filter_map(|name| ctx.catalog.weapon(name))
        .map(|w| w.display_name.clone())
        .collect();
    let grenade_line = if grenades.is_empty() {
        "none".to_string()
    } else {
        grenades.join(", ")
    };
    request.item(format!("{}: {grenade_line}", WeaponSlot::Grenade.label()));
    if presenter.present(participant, request).is_err() {
        ctx.effects.notice(participant, Notice::MenuUnavailable);
    }
}

/// Routes choices from the market menus.
pub fn handle_menu_choice(
    ctx: &mut ModeContext,
    presenter: &mut dyn MenuPresenter,
    store: &mut dyn RecordStore,
    participant: ParticipantId,
    kind: MenuKind,
    choice: MenuChoice,
) {
    match (kind, choice) {
        (MenuKind::Market, MenuChoice::Picked(label)) => match label.as_str() {
            BUY_SAVED_ITEM => buy_saved_setup(ctx, participant, false),
            SAVE_ITEM => save_current_setup(ctx, store, participant),
            VIEW_ITEM => open_view_menu(ctx, presenter, participant),
            BUY_WEAPONS_ITEM => open_slot_menu(ctx, presenter, participant, false),
            other if other.starts_with(AUTO_REBUY_ITEM) => {
                toggle_auto_rebuy(ctx, store, participant);
                open_market_menu(ctx, presenter, participant);
            }
            other => debug!(label = other, "unrecognized market item"),
        },
        (MenuKind::Market, _) => presenter.close(participant),
        (MenuKind::MarketSlots { edit }, MenuChoice::Picked(label)) => {
            match slot_by_label(&label) {
                Some(slot) => open_weapon_menu(ctx, presenter, participant, slot, edit),
                None => debug!(label, "unrecognized slot item"),
            }
        }
        (MenuKind::MarketSlots { .. }, MenuChoice::Back) => {
            open_market_menu(ctx, presenter, participant);
        }
        (MenuKind::MarketSlots { .. }, MenuChoice::Closed) => {}
        (MenuKind::MarketWeapons { slot, edit }, MenuChoice::Picked(label)) => {
            let weapon = ctx
                .catalog
                .weapons_in_slot(slot)
                .into_iter()
                .find(|w| weapon_item_label(w) == label)
                .cloned();
            match weapon {
                Some(weapon) if edit => {
                    set_saved_slot(ctx, store, participant, slot, &weapon);
                    open_weapon_menu(ctx, presenter, participant, slot, true);
                }
                Some(weapon) => {
                    let _ = purchase::validate_and_execute(ctx, participant, &weapon, true);
                    open_weapon_menu(ctx, presenter, participant, slot, false);
                }
                None => debug!(label, "unrecognized weapon item"),
            }
        }
        (MenuKind::MarketWeapons { edit, .. }, MenuChoice::Back) => {
            open_slot_menu(ctx, presenter, participant, edit);
        }
        (MenuKind::MarketWeapons { .. }, MenuChoice::Closed) => {}
        (MenuKind::MarketView, MenuChoice::Picked(label)) => {
            let slot = label.split(':').next().and_then(slot_by_label);
            match slot {
                Some(slot) => open_weapon_menu(ctx, presenter, participant, slot, true),
                None => debug!(label, "unrecognized view item"),
            }
        }
        (MenuKind::MarketView, MenuChoice::Back) => {
            open_market_menu(ctx, presenter, participant);
        }
        (MenuKind::MarketView, MenuChoice::Closed) => {}
        (kind, _) => debug!(?kind, "choice for a menu this module does not own"),
    }
}

fn weapon_item_label(weapon: &WeaponDefinition) -> String {
    format!("{} (${})", weapon.display_name, weapon.price)
}

fn slot_by_label(label: &str) -> Option<WeaponSlot> {
    WeaponSlot::ALL.into_iter().find(|slot| slot.label() == label)
}

fn set_saved_slot(
    ctx: &mut ModeContext,
    store: &mut dyn RecordStore,
    participant: ParticipantId,
    slot: WeaponSlot,
    weapon: &WeaponDefinition,
) {
    let Some(session) = ctx.sessions.get_mut(participant) else {
        return;
    };
    session.loadout.record(slot, weapon.name.clone());
    ctx.effects.notice(participant, Notice::SetupSaved);
    roles::persist_session(session, store);
    info!(participant = %participant, weapon = %weapon.name, "saved slot edited");
}

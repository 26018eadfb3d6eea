//! The mode facade: owns all state, consumes events, emits effects.
//!
//! [`GameMode`] is single-threaded by construction. The host calls it from
//! one thread: lifecycle methods for connect/disconnect/map start, the
//! synchronous acquisition hook, [`GameMode::handle_event`] for everything
//! else, and [`GameMode::tick`] once per frame. Engine-side mutations come
//! back out of [`GameMode::drain_effects`]; nothing inside ever blocks or
//! performs IO.

use rand::rngs::SmallRng;
use rand::SeedableRng;
use tracing::{debug, info};

use crate::acquisition::{self, AcquisitionMethod, AcquisitionVerdict};
use crate::catalog::Catalog;
use crate::effect::{EffectSink, EngineEffect, Notice};
use crate::event::GameEvent;
use crate::loadout;
use crate::menu::{MenuChoice, MenuKind, MenuPresenter, NullMenuPresenter};
use crate::respawn;
use crate::roles;
use crate::round::RoundState;
use crate::schedule::{DeferredQueue, ScheduledTask, SPEED_REASSERT_DELAY_SECS};
use crate::session::{ParticipantId, ParticipantSession, PersistId, SessionTable};
use crate::settings::{ModeSettings, RespawnSide};
use crate::store::{MemoryRecordStore, RecordStore};

/// All mutable mode state. Component functions take the whole context and
/// split-borrow its fields; none of them sees the presenter or the store
/// unless it is passed in explicitly.
pub struct ModeContext {
    /// Runtime settings.
    pub settings: ModeSettings,
    /// Role and weapon lookup tables for the current map.
    pub catalog: Catalog,
    /// Connected participants.
    pub sessions: SessionTable,
    /// Per-round counters and tags.
    pub round: RoundState,
    /// Deferred tasks and timers.
    pub queue: DeferredQueue,
    /// Outbound effects.
    pub effects: EffectSink,
    /// Seeded generator for random role draws.
    pub rng: SmallRng,
    /// Current tick, advanced by [`GameMode::tick`].
    pub tick: u64,
}

impl ModeContext {
    /// Create a context with empty tables.
    #[must_use]
    pub fn new(settings: ModeSettings, catalog: Catalog, seed: u64) -> Self {
        Self {
            settings,
            catalog,
            sessions: SessionTable::new(),
            round: RoundState::new(),
            queue: DeferredQueue::new(),
            effects: EffectSink::new(),
            rng: SmallRng::seed_from_u64(seed),
            tick: 0,
        }
    }
}

/// Dispatch one deferred task. Tasks re-check the world they run in; a
/// participant who vanished inside the window costs a debug line, nothing
/// more.
pub(crate) fn run_task(ctx: &mut ModeContext, task: ScheduledTask) {
    match task {
        ScheduledTask::ApplyRoleShell {
            participant,
            model,
            speed_scale,
        } => roles::run_apply_shell(ctx, participant, model, speed_scale),
        ScheduledTask::SettleRole { participant, role } => {
            roles::run_settle(ctx, participant, &role);
        }
        ScheduledTask::RegenPulse { participant, role } => {
            roles::run_regen_pulse(ctx, participant, &role);
        }
        ScheduledTask::GrantPurchase {
            participant,
            weapon,
            deduct,
        } => crate::purchase::run_grant(ctx, participant, &weapon, deduct),
        ScheduledTask::Respawn { participant } | ScheduledTask::LateJoinRespawn { participant } => {
            respawn::run_scheduled(ctx, participant);
        }
        ScheduledTask::SpawnRebuy { participant } => loadout::run_spawn_rebuy(ctx, participant),
        ScheduledTask::ReassertSpeed { participant } => {
            roles::run_reassert_speed(ctx, participant);
        }
    }
}

/// Advance a bare context by whole ticks, running everything due. Test
/// helper; the production path is [`GameMode::tick`].
#[cfg(test)]
pub(crate) fn advance(ctx: &mut ModeContext, ticks: u64) {
    for _ in 0..ticks {
        ctx.tick += 1;
        for task in ctx.queue.take_runnable(ctx.tick) {
            run_task(ctx, task);
        }
    }
}

/// The game mode. One instance per server; owns every table and the two
/// injected collaborators (menu presentation, record storage).
pub struct GameMode {
    ctx: ModeContext,
    menu: Box<dyn MenuPresenter>,
    store: Box<dyn RecordStore>,
}

impl GameMode {
    /// Create a mode with no menu capability and in-memory storage.
    #[must_use]
    pub fn new(settings: ModeSettings, catalog: Catalog, seed: u64) -> Self {
        Self::with_collaborators(
            settings,
            catalog,
            seed,
            Box::new(NullMenuPresenter),
            Box::new(MemoryRecordStore::new()),
        )
    }

    /// Create a mode with injected collaborators.
    #[must_use]
    pub fn with_collaborators(
        settings: ModeSettings,
        catalog: Catalog,
        seed: u64,
        menu: Box<dyn MenuPresenter>,
        store: Box<dyn RecordStore>,
    ) -> Self {
        Self {
            ctx: ModeContext::new(settings, catalog, seed),
            menu,
            store,
        }
    }

    /// Register a connected participant and return their handle.
    ///
    /// Role selections are seeded immediately so the participant can spawn
    /// before their record fetch resolves; the fetch is issued here and
    /// merged whenever it lands.
    pub fn connect(
        &mut self,
        name: impl Into<String>,
        persist_id: Option<PersistId>,
        is_bot: bool,
        is_admin: bool,
    ) -> ParticipantId {
        let mut session = ParticipantSession::new(name, persist_id, is_bot);
        session.is_admin = is_admin;
        let participant = self.ctx.sessions.insert(session);
        roles::assign_on_connect(&mut self.ctx, self.store.as_mut(), participant);
        info!(participant = %participant, "participant connected");
        participant
    }

    /// Remove a participant. Outstanding timers and completions for the
    /// handle become no-ops; handles are never reused.
    pub fn disconnect(&mut self, participant: ParticipantId) {
        self.menu.close(participant);
        self.ctx.round.forget(participant);
        if self.ctx.sessions.remove(participant).is_none() {
            debug!(participant = %participant, "disconnect for unknown participant");
        }
    }

    /// Install the catalog for a new map. Round state and the deferred
    /// queue belong to the old map and are dropped; sessions survive, the
    /// engine reports its own disconnects.
    pub fn map_start(&mut self, catalog: Catalog) {
        self.ctx.catalog = catalog;
        self.ctx.round.reset();
        self.ctx.queue = DeferredQueue::new();
        info!(
            roles = self.ctx.catalog.role_count(),
            weapons = self.ctx.catalog.weapon_count(),
            "map catalog installed"
        );
    }

    /// The synchronous item-grant hook.
    pub fn acquisition(
        &mut self,
        participant: ParticipantId,
        entity: &str,
        method: AcquisitionMethod,
    ) -> AcquisitionVerdict {
        acquisition::handle(&mut self.ctx, participant, entity, method)
    }

    /// Move a participant to the infected side and apply their role.
    pub fn infect(&mut self, participant: ParticipantId) {
        roles::infect(&mut self.ctx, participant);
    }

    /// Move a participant to the defender side and apply their role.
    pub fn humanize(&mut self, participant: ParticipantId) {
        roles::humanize(&mut self.ctx, participant);
    }

    /// Consume one engine event.
    pub fn handle_event(&mut self, event: GameEvent) {
        match event {
            GameEvent::Spawned { participant } => self.on_spawned(participant),
            GameEvent::Died { victim, attacker } => {
                respawn::on_death(&mut self.ctx, victim, attacker);
            }
            GameEvent::Hurt {
                victim,
                attacker,
                damage,
                health_remaining,
            } => self.on_hurt(victim, attacker, damage, health_remaining),
            GameEvent::SideChanged { participant, side } => {
                respawn::on_side_changed(&mut self.ctx, participant, side);
            }
            GameEvent::BuyZone { participant, inside } => {
                if let Some(session) = self.ctx.sessions.get_mut(participant) {
                    session.in_buy_zone = inside;
                }
            }
            GameEvent::ItemAcquired { participant, entity } => {
                self.on_item_acquired(participant, &entity);
            }
            GameEvent::ItemDropped { participant, entity } => {
                if let Some(session) = self.ctx.sessions.get_mut(participant) {
                    session.held.remove_entity(&entity);
                }
            }
            GameEvent::BalanceSet { participant, balance } => {
                if let Some(session) = self.ctx.sessions.get_mut(participant) {
                    session.balance = balance;
                }
            }
            GameEvent::RoundStarted => self.on_round_started(),
            GameEvent::RoundEnded => {
                self.ctx.round.end_infection();
                info!("round ended");
            }
            GameEvent::InfectionStarted => {
                self.ctx.round.begin_infection();
                info!("outbreak underway");
            }
            GameEvent::MenuChoice {
                participant,
                kind,
                choice,
            } => self.on_menu_choice(participant, kind, choice),
            GameEvent::Command {
                participant,
                name,
                args,
            } => self.on_command(participant, &name, &args),
        }
    }

    /// Advance one tick: run safe-point tasks, then due timers, then merge
    /// resolved record fetches.
    pub fn tick(&mut self) {
        self.ctx.tick += 1;
        for task in self.ctx.queue.take_runnable(self.ctx.tick) {
            run_task(&mut self.ctx, task);
        }
        for completion in self.store.drain_completions() {
            roles::on_record_loaded(
                &mut self.ctx,
                self.store.as_mut(),
                completion.participant,
                completion.record,
            );
        }
    }

    /// Take every effect queued since the last drain.
    pub fn drain_effects(&mut self) -> Vec<EngineEffect> {
        self.ctx.effects.drain()
    }

    /// Current tick counter.
    #[must_use]
    pub fn current_tick(&self) -> u64 {
        self.ctx.tick
    }

    /// Borrow a participant session.
    #[must_use]
    pub fn session(&self, participant: ParticipantId) -> Option<&ParticipantSession> {
        self.ctx.sessions.get(participant)
    }

    /// Borrow the settings.
    #[must_use]
    pub fn settings(&self) -> &ModeSettings {
        &self.ctx.settings
    }

    /// Mutably borrow the settings (hosts mirror live config changes in).
    pub fn settings_mut(&mut self) -> &mut ModeSettings {
        &mut self.ctx.settings
    }

    /// Borrow the current catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.ctx.catalog
    }

    fn on_spawned(&mut self, participant: ParticipantId) {
        let Some(session) = self.ctx.sessions.get_mut(participant) else {
            debug!(participant = %participant, "spawn for unknown participant");
            return;
        };
        session.alive = true;
        session.health = 100;
        session.armor = 0;
        session.helmet = false;
        session.held.clear();
        roles::reroll_on_spawn(&mut self.ctx, participant);

        let forced_infected = self.ctx.round.infection_underway()
            && self.ctx.settings.suicide_respawn_infected
            && self.ctx.round.take_suicide(participant);
        if forced_infected {
            info!(participant = %participant, "suicide respawn joins the infected");
            roles::infect(&mut self.ctx, participant);
        } else if self.ctx.round.infection_underway() {
            match self.ctx.settings.respawn_side {
                RespawnSide::Infected => roles::infect(&mut self.ctx, participant),
                RespawnSide::Defender => roles::humanize(&mut self.ctx, participant),
                RespawnSide::Keep => {
                    let infected = self
                        .ctx
                        .sessions
                        .get(participant)
                        .is_some_and(ParticipantSession::is_infected);
                    if infected {
                        roles::infect(&mut self.ctx, participant);
                    } else {
                        roles::humanize(&mut self.ctx, participant);
                    }
                }
            }
        } else {
            roles::humanize(&mut self.ctx, participant);
        }
        loadout::schedule_spawn_rebuy(&mut self.ctx, participant);
    }

    fn on_hurt(
        &mut self,
        victim: ParticipantId,
        attacker: Option<ParticipantId>,
        damage: i32,
        health_remaining: i32,
    ) {
        if let Some(session) = self.ctx.sessions.get_mut(victim) {
            session.health = health_remaining;
            self.ctx.queue.delay(
                ScheduledTask::ReassertSpeed { participant: victim },
                SPEED_REASSERT_DELAY_SECS,
                self.ctx.tick,
            );
        }
        if self.ctx.settings.damage_cash_award {
            if let Some(attacker) = attacker.filter(|a| *a != victim) {
                let cap = self.ctx.settings.max_balance;
                if let Some(session) = self.ctx.sessions.get_mut(attacker) {
                    session.balance = (session.balance + damage.max(0)).min(cap);
                    let balance = session.balance;
                    self.ctx.effects.push(EngineEffect::SetBalance {
                        participant: attacker,
                        balance,
                    });
                }
            }
        }
    }

    fn on_item_acquired(&mut self, participant: ParticipantId, entity: &str) {
        let slot = self.ctx.catalog.weapon_by_entity(entity).map(|w| w.slot);
        let Some(session) = self.ctx.sessions.get_mut(participant) else {
            return;
        };
        match slot {
            Some(slot) => {
                session.held.give(slot, entity);
            }
            None => debug!(entity, "acquired entity not in catalog"),
        }
    }

    fn on_round_started(&mut self) {
        self.ctx.round.reset();
        info!("round started");
        for participant in self.ctx.sessions.sorted_ids() {
            let eligible = self
                .ctx
                .sessions
                .get(participant)
                .is_some_and(|s| !s.is_bot && s.alive && s.auto_rebuy && !s.is_infected());
            if eligible {
                loadout::buy_saved_setup(&mut self.ctx, participant, true);
            }
        }
    }

    fn on_menu_choice(&mut self, participant: ParticipantId, kind: MenuKind, choice: MenuChoice) {
        if !self.ctx.sessions.contains(participant) {
            return;
        }
        match kind {
            MenuKind::RoleSides | MenuKind::RoleSelect { .. } => roles::handle_menu_choice(
                &mut self.ctx,
                self.menu.as_mut(),
                self.store.as_mut(),
                participant,
                kind,
                choice,
            ),
            MenuKind::Market
            | MenuKind::MarketSlots { .. }
            | MenuKind::MarketWeapons { .. }
            | MenuKind::MarketView => loadout::handle_menu_choice(
                &mut self.ctx,
                self.menu.as_mut(),
                self.store.as_mut(),
                participant,
                kind,
                choice,
            ),
        }
    }

    fn on_command(&mut self, participant: ParticipantId, name: &str, args: &[String]) {
        match name {
            "zclass" => roles::open_side_menu(&mut self.ctx, self.menu.as_mut(), participant),
            "zmarket" => loadout::open_market_menu(&mut self.ctx, self.menu.as_mut(), participant),
            "rebuy" => loadout::buy_saved_setup(&mut self.ctx, participant, false),
            "zspawn" => respawn::manual_respawn(&mut self.ctx, participant),
            "restrict" => self.restrict_command(participant, args, true),
            "unrestrict" => self.restrict_command(participant, args, false),
            other => self.alias_purchase(participant, other),
        }
    }

    fn restrict_command(&mut self, participant: ParticipantId, args: &[String], restricted: bool) {
        let Some(session) = self.ctx.sessions.get(participant) else {
            return;
        };
        if !session.is_admin {
            self.ctx.effects.notice(participant, Notice::NoAccess);
            return;
        }
        let admin = session.name.clone();
        let Some(query) = args.first() else {
            let usage = if restricted {
                "restrict <weapon>"
            } else {
                "unrestrict <weapon>"
            };
            self.ctx.effects.notice(
                participant,
                Notice::CommandUsage {
                    usage: usage.to_string(),
                },
            );
            return;
        };
        match self.ctx.catalog.set_restricted(query, restricted) {
            Some(weapon) => {
                let weapon = weapon.display_name.clone();
                let notice = if restricted {
                    Notice::RestrictedBroadcast { admin, weapon }
                } else {
                    Notice::UnrestrictedBroadcast { admin, weapon }
                };
                self.ctx.effects.broadcast(notice);
            }
            None => self.ctx.effects.notice(
                participant,
                Notice::WeaponNotFound {
                    query: query.clone(),
                },
            ),
        }
    }

    /// Unrecognized commands double as purchase shortcuts: any weapon
    /// name, display name, or alias buys that weapon.
    fn alias_purchase(&mut self, participant: ParticipantId, name: &str) {
        let Some(weapon) = self.ctx.catalog.resolve_weapon(name).cloned() else {
            debug!(command = name, "unhandled command");
            return;
        };
        let _ = crate::purchase::validate_and_execute(&mut self.ctx, participant, &weapon, true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Side, WeaponSlot, BASE_RUN_SPEED};
    use crate::schedule::{secs_to_ticks, ROLE_SETTLE_DELAY_SECS};
    use crate::test_fixtures::{sample_catalog, sample_settings, SharedRecordStore};

    fn test_mode() -> GameMode {
        GameMode::new(sample_settings(), sample_catalog(), 7)
    }

    fn run_ticks(mode: &mut GameMode, ticks: u64) {
        for _ in 0..ticks {
            mode.tick();
        }
    }

    /// Connect, join the defenders, spawn, and settle the spawn role.
    fn connect_and_spawn(mode: &mut GameMode, name: &str, persist: u64) -> ParticipantId {
        let p = mode.connect(name, Some(PersistId(persist)), false, false);
        mode.handle_event(GameEvent::SideChanged {
            participant: p,
            side: Some(Side::Defender),
        });
        mode.handle_event(GameEvent::Spawned { participant: p });
        run_ticks(mode, secs_to_ticks(ROLE_SETTLE_DELAY_SECS) + 1);
        mode.handle_event(GameEvent::BalanceSet {
            participant: p,
            balance: 10_000,
        });
        mode.handle_event(GameEvent::BuyZone {
            participant: p,
            inside: true,
        });
        mode.drain_effects();
        p
    }

    #[test]
    fn test_spawn_before_outbreak_is_a_defender() {
        let mut mode = test_mode();
        let p = connect_and_spawn(&mut mode, "ada", 9001);
        let session = mode.session(p).unwrap();
        assert_eq!(session.side, Some(Side::Defender));
        assert_eq!(
            session.active_role.as_ref().map(|r| r.name.as_str()),
            Some("human_default")
        );
        assert_eq!(session.health, 100);
    }

    #[test]
    fn test_record_fetch_race_resolves_after_spawn() {
        let store = SharedRecordStore::default();
        store.seed(
            PersistId(9),
            crate::store::PersistentRecord {
                defender_role: Some("human_runner".to_string()),
                auto_rebuy: true,
                ..Default::default()
            },
        );
        let mut mode = GameMode::with_collaborators(
            sample_settings(),
            sample_catalog(),
            7,
            Box::new(NullMenuPresenter),
            Box::new(store.clone()),
        );

        let p = mode.connect("ada", Some(PersistId(9)), false, false);
        mode.handle_event(GameEvent::SideChanged {
            participant: p,
            side: Some(Side::Defender),
        });
        mode.handle_event(GameEvent::Spawned { participant: p });

        // The fetch has not resolved yet; the spawn used the default.
        assert_eq!(
            mode.session(p).unwrap().selected_defender.as_deref(),
            Some("human_default")
        );

        run_ticks(&mut mode, secs_to_ticks(ROLE_SETTLE_DELAY_SECS) + 1);

        // Resolved now: the stored preference replaced the default, the
        // already-applied role is untouched until the next spawn.
        let session = mode.session(p).unwrap();
        assert_eq!(session.selected_defender.as_deref(), Some("human_runner"));
        assert!(session.auto_rebuy);
        assert_eq!(
            session.active_role.as_ref().map(|r| r.name.as_str()),
            Some("human_default")
        );
    }

    #[test]
    fn test_infection_switches_sides_and_roles() {
        let mut mode = test_mode();
        let p = connect_and_spawn(&mut mode, "ada", 9001);

        mode.handle_event(GameEvent::InfectionStarted);
        mode.infect(p);
        run_ticks(&mut mode, secs_to_ticks(ROLE_SETTLE_DELAY_SECS) + 1);

        let session = mode.session(p).unwrap();
        assert_eq!(session.side, Some(Side::Infected));
        assert_eq!(
            session.active_role.as_ref().map(|r| r.name.as_str()),
            Some("zombie_default")
        );
        // zombie_default settles at its role health with armor stripped.
        assert_eq!(session.health, 1500);
        assert_eq!(session.armor, 0);
    }

    #[test]
    fn test_suicide_respawn_rejoins_as_infected_once() {
        let mut mode = test_mode();
        // A defender-side policy makes the override visible: only the
        // suicide rule can produce an infected respawn here.
        mode.settings_mut().respawn_side = RespawnSide::Defender;
        let p = connect_and_spawn(&mut mode, "ada", 9001);
        mode.handle_event(GameEvent::InfectionStarted);

        mode.handle_event(GameEvent::Died {
            victim: p,
            attacker: None,
        });
        let delay = secs_to_ticks(mode.settings().respawn_delay) + 1;
        run_ticks(&mut mode, delay);
        assert!(mode
            .drain_effects()
            .iter()
            .any(|e| matches!(e, EngineEffect::Respawn { .. })));

        mode.handle_event(GameEvent::Spawned { participant: p });
        assert_eq!(mode.session(p).unwrap().side, Some(Side::Infected));

        // The tag was consumed: a later kill-death respawns by policy.
        mode.handle_event(GameEvent::Died {
            victim: p,
            attacker: Some(ParticipantId(999)),
        });
        run_ticks(&mut mode, delay);
        mode.handle_event(GameEvent::Spawned { participant: p });
        assert_eq!(mode.session(p).unwrap().side, Some(Side::Defender));
    }

    #[test]
    fn test_respawn_side_policy_keep() {
        let mut mode = test_mode();
        mode.settings_mut().respawn_side = RespawnSide::Keep;
        mode.settings_mut().suicide_respawn_infected = false;
        let p = connect_and_spawn(&mut mode, "ada", 9001);
        mode.handle_event(GameEvent::InfectionStarted);

        mode.handle_event(GameEvent::Died {
            victim: p,
            attacker: Some(ParticipantId(999)),
        });
        let delay = secs_to_ticks(mode.settings().respawn_delay) + 1;
        run_ticks(&mut mode, delay);
        mode.handle_event(GameEvent::Spawned { participant: p });
        assert_eq!(mode.session(p).unwrap().side, Some(Side::Defender));
    }

    #[test]
    fn test_damage_awards_cash_to_the_attacker_capped() {
        let mut mode = test_mode();
        let attacker = connect_and_spawn(&mut mode, "ada", 9001);
        let victim = connect_and_spawn(&mut mode, "zed", 9002);
        mode.handle_event(GameEvent::BalanceSet {
            participant: attacker,
            balance: 15_990,
        });

        mode.handle_event(GameEvent::Hurt {
            victim,
            attacker: Some(attacker),
            damage: 55,
            health_remaining: 45,
        });

        assert_eq!(mode.session(attacker).unwrap().balance, 16_000);
        assert_eq!(mode.session(victim).unwrap().health, 45);
        assert!(mode.drain_effects().iter().any(|e| matches!(
            e,
            EngineEffect::SetBalance {
                balance: 16_000,
                ..
            }
        )));
    }

    #[test]
    fn test_self_damage_awards_nothing() {
        let mut mode = test_mode();
        let p = connect_and_spawn(&mut mode, "ada", 9001);
        mode.handle_event(GameEvent::Hurt {
            victim: p,
            attacker: Some(p),
            damage: 30,
            health_remaining: 70,
        });
        assert_eq!(mode.session(p).unwrap().balance, 10_000);
    }

    #[test]
    fn test_hurt_reasserts_off_baseline_speed() {
        let mut mode = test_mode();
        let p = connect_and_spawn(&mut mode, "ada", 9001);
        mode.handle_event(GameEvent::InfectionStarted);
        mode.infect(p);
        run_ticks(&mut mode, secs_to_ticks(ROLE_SETTLE_DELAY_SECS) + 1);
        mode.drain_effects();

        mode.handle_event(GameEvent::Hurt {
            victim: p,
            attacker: None,
            damage: 10,
            health_remaining: 1_490,
        });
        run_ticks(&mut mode, secs_to_ticks(SPEED_REASSERT_DELAY_SECS) + 1);

        let expected = mode
            .catalog()
            .role("zombie_default")
            .map(|r| r.speed / BASE_RUN_SPEED)
            .unwrap();
        assert!(mode.drain_effects().iter().any(|e| matches!(
            e,
            EngineEffect::SetSpeedScale { scale, .. }
            if (*scale - expected).abs() < f32::EPSILON
        )));
    }

    #[test]
    fn test_round_start_sweep_rebuys_for_flagged() {
        let mut mode = test_mode();
        let p = connect_and_spawn(&mut mode, "ada", 9001);
        mode.handle_event(GameEvent::Command {
            participant: p,
            name: "ak".to_string(),
            args: Vec::new(),
        });
        run_ticks(&mut mode, 1);
        mode.handle_event(GameEvent::MenuChoice {
            participant: p,
            kind: MenuKind::Market,
            choice: MenuChoice::Picked("Save current setup".to_string()),
        });
        let session = mode.session(p).unwrap();
        assert_eq!(session.loadout.primary.as_deref(), Some("rifle_ak"));

        // Flag auto-rebuy through the menu, then start a fresh round.
        mode.handle_event(GameEvent::MenuChoice {
            participant: p,
            kind: MenuKind::Market,
            choice: MenuChoice::Picked("Auto-rebuy: off".to_string()),
        });
        mode.drain_effects();
        mode.handle_event(GameEvent::RoundStarted);
        run_ticks(&mut mode, 1);

        assert!(mode.drain_effects().iter().any(|e| matches!(
            e,
            EngineEffect::GiveItem { entity, .. } if entity == "weapon_ak47"
        )));
    }

    #[test]
    fn test_alias_command_buys() {
        let mut mode = test_mode();
        let p = connect_and_spawn(&mut mode, "ada", 9001);

        mode.handle_event(GameEvent::Command {
            participant: p,
            name: "ak47".to_string(),
            args: Vec::new(),
        });
        run_ticks(&mut mode, 1);

        let session = mode.session(p).unwrap();
        assert_eq!(session.held.in_slot(WeaponSlot::Primary), Some("weapon_ak47"));
        assert_eq!(session.balance, 7_500);
    }

    #[test]
    fn test_restrict_requires_admin_and_broadcasts() {
        let mut mode = test_mode();
        let p = connect_and_spawn(&mut mode, "ada", 9001);
        let admin = mode.connect("root", Some(PersistId(1)), false, true);

        mode.handle_event(GameEvent::Command {
            participant: p,
            name: "restrict".to_string(),
            args: vec!["ak".to_string()],
        });
        assert!(mode.drain_effects().iter().any(|e| matches!(
            e,
            EngineEffect::Notice {
                notice: Notice::NoAccess,
                ..
            }
        )));
        assert!(!mode.catalog().weapon("rifle_ak").unwrap().restricted);

        mode.handle_event(GameEvent::Command {
            participant: admin,
            name: "restrict".to_string(),
            args: vec!["ak".to_string()],
        });
        assert!(mode.drain_effects().iter().any(|e| matches!(
            e,
            EngineEffect::Broadcast {
                notice: Notice::RestrictedBroadcast { .. },
            }
        )));
        assert!(mode.catalog().weapon("rifle_ak").unwrap().restricted);

        // Restricted now rejects the purchase shortcut.
        mode.handle_event(GameEvent::Command {
            participant: p,
            name: "ak".to_string(),
            args: Vec::new(),
        });
        assert!(mode.drain_effects().iter().any(|e| matches!(
            e,
            EngineEffect::Notice {
                notice: Notice::WeaponRestricted { .. },
                ..
            }
        )));

        mode.handle_event(GameEvent::Command {
            participant: admin,
            name: "unrestrict".to_string(),
            args: vec!["ak".to_string()],
        });
        assert!(!mode.catalog().weapon("rifle_ak").unwrap().restricted);
    }

    #[test]
    fn test_restrict_usage_and_unknown_weapon() {
        let mut mode = test_mode();
        let admin = mode.connect("root", Some(PersistId(1)), false, true);

        mode.handle_event(GameEvent::Command {
            participant: admin,
            name: "restrict".to_string(),
            args: Vec::new(),
        });
        assert!(mode.drain_effects().iter().any(|e| matches!(
            e,
            EngineEffect::Notice {
                notice: Notice::CommandUsage { .. },
                ..
            }
        )));

        mode.handle_event(GameEvent::Command {
            participant: admin,
            name: "restrict".to_string(),
            args: vec!["banana".to_string()],
        });
        assert!(mode.drain_effects().iter().any(|e| matches!(
            e,
            EngineEffect::Notice {
                notice: Notice::WeaponNotFound { .. },
                ..
            }
        )));
    }

    #[test]
    fn test_item_events_keep_the_held_mirror_honest() {
        let mut mode = test_mode();
        let p = connect_and_spawn(&mut mode, "ada", 9001);

        mode.handle_event(GameEvent::ItemAcquired {
            participant: p,
            entity: "weapon_glock".to_string(),
        });
        assert_eq!(
            mode.session(p).unwrap().held.in_slot(WeaponSlot::Secondary),
            Some("weapon_glock")
        );

        mode.handle_event(GameEvent::ItemDropped {
            participant: p,
            entity: "weapon_glock".to_string(),
        });
        assert!(mode.session(p).unwrap().held.is_empty());
    }

    #[test]
    fn test_disconnect_forgets_round_facts() {
        let mut mode = test_mode();
        let p = connect_and_spawn(&mut mode, "ada", 9001);
        mode.handle_event(GameEvent::Died {
            victim: p,
            attacker: None,
        });
        mode.disconnect(p);
        assert!(mode.session(p).is_none());

        // The scheduled respawn fires into nothing.
        let delay = secs_to_ticks(mode.settings().respawn_delay) + 1;
        run_ticks(&mut mode, delay);
        assert!(mode.drain_effects().is_empty());
    }

    #[test]
    fn test_handles_are_never_reused() {
        let mut mode = test_mode();
        let first = mode.connect("ada", None, false, false);
        mode.disconnect(first);
        let second = mode.connect("bob", None, false, false);
        assert_ne!(first, second);
    }

    #[test]
    fn test_map_start_replaces_catalog_and_drops_timers() {
        let mut mode = test_mode();
        let p = connect_and_spawn(&mut mode, "ada", 9001);
        mode.handle_event(GameEvent::Died {
            victim: p,
            attacker: None,
        });

        mode.map_start(sample_catalog());
        let delay = secs_to_ticks(mode.settings().respawn_delay) + 1;
        run_ticks(&mut mode, delay);
        assert!(mode.drain_effects().is_empty());
    }

    #[test]
    fn test_bots_skip_persistence() {
        let store = SharedRecordStore::default();
        let mut mode = GameMode::with_collaborators(
            sample_settings(),
            sample_catalog(),
            7,
            Box::new(NullMenuPresenter),
            Box::new(store.clone()),
        );
        let bot = mode.connect("bot_01", None, true, false);
        run_ticks(&mut mode, 2);
        assert!(store.is_empty());
        // Bot sessions still get playable selections.
        assert!(mode.session(bot).unwrap().selected_defender.is_some());
    }
}

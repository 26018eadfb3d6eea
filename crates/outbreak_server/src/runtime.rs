//! Tick driving and effect application.
//!
//! The mode core computes effects; somebody has to carry them out. A
//! real integration maps each [`EngineEffect`] onto engine calls. The
//! driver here pumps ticks and hands every drained effect to an apply
//! callback, and [`log_effect`] is the stand-in applier used by the demo
//! binary: it narrates what an engine would have done.

use tracing::info;

use outbreak_core::effect::EngineEffect;
use outbreak_core::mode::GameMode;
use outbreak_core::schedule::{secs_to_ticks, TICK_RATE};

/// Owns a [`GameMode`] and pumps its tick loop.
pub struct TickDriver {
    mode: GameMode,
}

impl TickDriver {
    /// Wrap a mode.
    #[must_use]
    pub fn new(mode: GameMode) -> Self {
        Self { mode }
    }

    /// Access the mode for lifecycle calls and events.
    pub fn mode(&mut self) -> &mut GameMode {
        &mut self.mode
    }

    /// Run one tick and return the effects it produced.
    pub fn step(&mut self) -> Vec<EngineEffect> {
        self.mode.tick();
        self.mode.drain_effects()
    }

    /// Run a number of ticks, handing every effect to `apply`.
    pub fn run_ticks(&mut self, ticks: u64, apply: &mut dyn FnMut(EngineEffect)) {
        for _ in 0..ticks {
            for effect in self.step() {
                apply(effect);
            }
        }
    }

    /// Run enough ticks to cover `secs` of game time.
    pub fn run_secs(&mut self, secs: f32, apply: &mut dyn FnMut(EngineEffect)) {
        self.run_ticks(secs_to_ticks(secs), apply);
    }

    /// Ticks per second, for hosts that pace against wall time.
    #[must_use]
    pub fn tick_rate(&self) -> u32 {
        TICK_RATE
    }
}

/// Log an effect the way an engine bridge would apply it.
pub fn log_effect(effect: &EngineEffect) {
    match effect {
        EngineEffect::SetModel { participant, model } => {
            info!(%participant, model, "apply: set model");
        }
        EngineEffect::SetSpeedScale { participant, scale } => {
            info!(%participant, scale, "apply: set speed scale");
        }
        EngineEffect::SetHealth {
            participant,
            health,
        } => {
            info!(%participant, health, "apply: set health");
        }
        EngineEffect::SetArmor {
            participant,
            armor,
            helmet,
        } => {
            info!(%participant, armor, helmet, "apply: set armor");
        }
        EngineEffect::SetBalance {
            participant,
            balance,
        } => {
            info!(%participant, balance, "apply: set balance");
        }
        EngineEffect::GiveItem {
            participant,
            entity,
        } => {
            info!(%participant, entity, "apply: give item");
        }
        EngineEffect::DropItem {
            participant,
            entity,
        } => {
            info!(%participant, entity, "apply: drop item");
        }
        EngineEffect::Respawn { participant } => {
            info!(%participant, "apply: respawn");
        }
        EngineEffect::Notice {
            participant,
            notice,
        } => {
            info!(%participant, "notice: {notice}");
        }
        EngineEffect::Broadcast { notice } => {
            info!("broadcast: {notice}");
        }
    }
}

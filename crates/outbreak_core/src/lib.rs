//! # Outbreak Core
//!
//! Gameplay core for the team-infection mode: roles, purchases, loadouts,
//! respawns.
//!
//! This crate contains **only** synchronous game logic:
//! - No rendering
//! - No IO
//! - No clocks (time is the host's tick counter)
//! - No ambient randomness (role draws use an injected seeded generator)
//!
//! The host owns the event loop. It feeds [`mode::GameMode`] engine events
//! and one [`mode::GameMode::tick`] per frame, then drains
//! [`effect::EngineEffect`] values and applies them to the real server.
//! Menus and persistent storage are injected collaborators behind the
//! [`menu::MenuPresenter`] and [`store::RecordStore`] traits, so the whole
//! mode runs headless in tests.
//!
//! ## Crate Structure
//!
//! - [`mode`] - the facade: context, event dispatch, tick loop
//! - [`catalog`] - role and weapon lookup tables
//! - [`roles`] - role assignment, settling, regeneration
//! - [`purchase`] - purchase validation and deferred grants
//! - [`acquisition`] - the synchronous item-grant gate
//! - [`loadout`] - saved setups, rebuy, the market menus
//! - [`respawn`] - death handling and respawn scheduling
//! - [`schedule`] - deferred tasks and delay timers
//! - [`store`] - persistent record seam
//! - [`data`] - raw catalog file schemas

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod acquisition;
pub mod catalog;
pub mod data;
pub mod effect;
pub mod error;
pub mod event;
pub mod loadout;
pub mod menu;
pub mod mode;
pub mod purchase;
pub mod respawn;
pub mod roles;
pub mod round;
pub mod schedule;
pub mod session;
pub mod settings;
pub mod store;

// Unit tests share the fixtures from `outbreak_test_utils`, but linking that
// crate into the lib test target pulls in a second build of this crate whose
// types do not unify with `crate::` ones. The fixture source is compiled
// directly into the test build instead; the self-alias lets its
// `outbreak_core::` imports resolve to this build.
#[cfg(test)]
extern crate self as outbreak_core;

#[cfg(test)]
#[path = "../../outbreak_test_utils/src/fixtures.rs"]
mod test_fixtures;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::acquisition::{AcquisitionMethod, AcquisitionVerdict};
    pub use crate::catalog::{
        Catalog, RoleDefinition, Side, WeaponDefinition, WeaponSlot, BASE_RUN_SPEED,
    };
    pub use crate::effect::{EngineEffect, Notice};
    pub use crate::error::{ModeError, Result};
    pub use crate::event::GameEvent;
    pub use crate::menu::{
        MenuChoice, MenuKind, MenuPresenter, MenuRequest, NullMenuPresenter,
    };
    pub use crate::mode::{GameMode, ModeContext};
    pub use crate::schedule::{ScheduledTask, TICK_RATE};
    pub use crate::session::{ParticipantId, ParticipantSession, PersistId};
    pub use crate::settings::{ModeSettings, RespawnSide};
    pub use crate::store::{
        FetchCompletion, MemoryRecordStore, PersistentRecord, RecordStore, SavedLoadout,
    };
}

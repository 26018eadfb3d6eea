//! Participant sessions and the session table.
//!
//! Sessions are keyed by [`ParticipantId`], a transient handle issued by the
//! table on connect and never reused. Engine callbacks, timers, and storage
//! completions all race against disconnects, so every path that touches a
//! session must go through the table's existence-checked accessors and
//! tolerate a miss.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::catalog::{RoleDefinition, Side, WeaponSlot};
use crate::store::SavedLoadout;

/// Transient per-connection handle. Issued by [`SessionTable`]; ids are
/// monotonically increasing and never reused within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParticipantId(pub u64);

impl std::fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Stable cross-session identity (platform account id). Bots have none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PersistId(pub u64);

impl std::fmt::Display for PersistId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Items the participant's entity currently holds, mirrored from grant and
/// drop effects. Singleton slots hold at most one entity; grenades form a
/// set deduplicated by entity identifier.
#[derive(Debug, Clone, Default)]
pub struct HeldItems {
    singletons: HashMap<WeaponSlot, String>,
    grenades: BTreeSet<String>,
}

impl HeldItems {
    /// Record a granted item. For a singleton slot the displaced entity, if
    /// any, is returned; grenades stack and never displace.
    pub fn give(&mut self, slot: WeaponSlot, entity: impl Into<String>) -> Option<String> {
        let entity = entity.into();
        if slot.is_singleton() {
            self.singletons.insert(slot, entity)
        } else {
            self.grenades.insert(entity);
            None
        }
    }

    /// The entity in a singleton slot.
    #[must_use]
    pub fn in_slot(&self, slot: WeaponSlot) -> Option<&str> {
        self.singletons.get(&slot).map(String::as_str)
    }

    /// Remove and return the entity in a singleton slot.
    pub fn drop_slot(&mut self, slot: WeaponSlot) -> Option<String> {
        self.singletons.remove(&slot)
    }

    /// Remove one entity wherever it is held.
    pub fn remove_entity(&mut self, entity: &str) {
        self.singletons.retain(|_, held| held != entity);
        self.grenades.remove(entity);
    }

    /// Held grenade entities, sorted.
    pub fn grenades(&self) -> impl Iterator<Item = &str> {
        self.grenades.iter().map(String::as_str)
    }

    /// Every held entity: singleton slots in slot order, then grenades.
    #[must_use]
    pub fn all_entities(&self) -> Vec<String> {
        let mut entities = Vec::new();
        for slot in WeaponSlot::ALL {
            if let Some(entity) = self.singletons.get(&slot) {
                entities.push(entity.clone());
            }
        }
        entities.extend(self.grenades.iter().cloned());
        entities
    }

    /// Forget everything (death and respawn drop the entity's inventory).
    pub fn clear(&mut self) {
        self.singletons.clear();
        self.grenades.clear();
    }

    /// Whether nothing is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.singletons.is_empty() && self.grenades.is_empty()
    }
}

/// Per-connection state for one participant.
///
/// Created on connect, destroyed on disconnect. Everything here is the
/// mode's authoritative view; the engine entity is only ever written through
/// drained effects.
#[derive(Debug, Clone)]
pub struct ParticipantSession {
    /// Display name.
    pub name: String,
    /// Stable identity; `None` for bots.
    pub persist_id: Option<PersistId>,
    /// Bots skip persistence and auto-rebuy sweeps.
    pub is_bot: bool,
    /// Admin participants may issue restrict/unrestrict.
    pub is_admin: bool,
    /// Current side; `None` while spectating or unassigned.
    pub side: Option<Side>,
    /// Whether the entity is currently alive.
    pub alive: bool,
    /// Whether the entity stands in a buy zone.
    pub in_buy_zone: bool,
    /// Cash balance.
    pub balance: i32,
    /// Mirrored entity health.
    pub health: i32,
    /// Mirrored armor value.
    pub armor: i32,
    /// Mirrored helmet flag.
    pub helmet: bool,
    /// Selected infected role (unique name).
    pub selected_infected: Option<String>,
    /// Selected defender role (unique name).
    pub selected_defender: Option<String>,
    /// Snapshot of the role last applied to the entity.
    pub active_role: Option<RoleDefinition>,
    /// Held items mirror.
    pub held: HeldItems,
    /// Cached saved loadout (authoritative once the record fetch resolves).
    pub loadout: SavedLoadout,
    /// Auto-rebuy preference.
    pub auto_rebuy: bool,
    /// Whether the persistent-record fetch has resolved for this session.
    pub record_loaded: bool,
}

impl ParticipantSession {
    /// Create a fresh session with nothing assigned.
    #[must_use]
    pub fn new(name: impl Into<String>, persist_id: Option<PersistId>, is_bot: bool) -> Self {
        Self {
            name: name.into(),
            persist_id,
            is_bot,
            is_admin: false,
            side: None,
            alive: false,
            in_buy_zone: false,
            balance: 0,
            health: 0,
            armor: 0,
            helmet: false,
            selected_infected: None,
            selected_defender: None,
            active_role: None,
            held: HeldItems::default(),
            loadout: SavedLoadout::default(),
            auto_rebuy: false,
            record_loaded: false,
        }
    }

    /// Grant admin capabilities.
    #[must_use]
    pub fn with_admin(mut self) -> Self {
        self.is_admin = true;
        self
    }

    /// Whether the participant is currently on the infected side.
    #[must_use]
    pub fn is_infected(&self) -> bool {
        self.side == Some(Side::Infected)
    }

    /// The selected role name for one side.
    #[must_use]
    pub fn selected_role(&self, side: Side) -> Option<&str> {
        match side {
            Side::Infected => self.selected_infected.as_deref(),
            Side::Defender => self.selected_defender.as_deref(),
        }
    }

    /// Update the selected role name for one side.
    pub fn set_selected_role(&mut self, side: Side, role: impl Into<String>) {
        let role = role.into();
        match side {
            Side::Infected => self.selected_infected = Some(role),
            Side::Defender => self.selected_defender = Some(role),
        }
    }
}

/// The session table: everyone connected, keyed by transient handle.
///
/// Mutated only from the tick thread. Lookups return `Option` so late
/// timers and storage completions can no-op on disconnected participants.
#[derive(Debug, Clone, Default)]
pub struct SessionTable {
    sessions: HashMap<ParticipantId, ParticipantSession>,
    next_id: u64,
}

impl SessionTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
            next_id: 1,
        }
    }

    /// Insert a session and issue its handle.
    pub fn insert(&mut self, session: ParticipantSession) -> ParticipantId {
        let id = ParticipantId(self.next_id);
        self.next_id += 1;
        tracing::debug!(participant = %id, name = %session.name, "session created");
        self.sessions.insert(id, session);
        id
    }

    /// Remove a session on disconnect.
    pub fn remove(&mut self, id: ParticipantId) -> Option<ParticipantSession> {
        let removed = self.sessions.remove(&id);
        if removed.is_some() {
            tracing::debug!(participant = %id, "session destroyed");
        }
        removed
    }

    /// Existence check.
    #[must_use]
    pub fn contains(&self, id: ParticipantId) -> bool {
        self.sessions.contains_key(&id)
    }

    /// Borrow a session.
    #[must_use]
    pub fn get(&self, id: ParticipantId) -> Option<&ParticipantSession> {
        self.sessions.get(&id)
    }

    /// Mutably borrow a session.
    #[must_use]
    pub fn get_mut(&mut self, id: ParticipantId) -> Option<&mut ParticipantSession> {
        self.sessions.get_mut(&id)
    }

    /// All handles in ascending order, for deterministic sweeps.
    #[must_use]
    pub fn sorted_ids(&self) -> Vec<ParticipantId> {
        let mut ids: Vec<ParticipantId> = self.sessions.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Number of connected participants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether nobody is connected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

//! Persistent participant records and the record-store seam.
//!
//! Storage crosses the process boundary, so the core never calls it
//! synchronously: [`RecordStore::request_fetch`] and
//! [`RecordStore::request_store`] are fire-and-forget, and fetch results
//! come back through [`RecordStore::drain_completions`], which the mode
//! drains from the tick thread. A fetch therefore always resolves at least
//! one tick after it was requested, which is exactly the connect/first-spawn
//! race the mode documents and tolerates.

use serde::{Deserialize, Serialize};

use crate::catalog::{Side, WeaponSlot};
use crate::session::{ParticipantId, PersistId};

/// A participant's saved purchase setup: one weapon per singleton slot plus
/// a deduplicated grenade list. Entries are weapon unique names, resolved
/// against the current catalog at buy time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SavedLoadout {
    /// Saved primary weapon.
    pub primary: Option<String>,
    /// Saved secondary weapon.
    pub secondary: Option<String>,
    /// Saved utility item.
    pub utility: Option<String>,
    /// Saved armor item.
    pub armor: Option<String>,
    /// Saved grenades, deduplicated by weapon identity, sorted.
    pub grenades: Vec<String>,
}

impl SavedLoadout {
    /// The saved entry for a singleton slot.
    #[must_use]
    pub fn slot(&self, slot: WeaponSlot) -> Option<&str> {
        match slot {
            WeaponSlot::Primary => self.primary.as_deref(),
            WeaponSlot::Secondary => self.secondary.as_deref(),
            WeaponSlot::Utility => self.utility.as_deref(),
            WeaponSlot::Armor => self.armor.as_deref(),
            WeaponSlot::Grenade => None,
        }
    }

    /// Record a weapon into the loadout: singleton slots replace, grenades
    /// dedup by weapon identity.
    pub fn record(&mut self, slot: WeaponSlot, weapon_name: impl Into<String>) {
        let name = weapon_name.into();
        match slot {
            WeaponSlot::Primary => self.primary = Some(name),
            WeaponSlot::Secondary => self.secondary = Some(name),
            WeaponSlot::Utility => self.utility = Some(name),
            WeaponSlot::Armor => self.armor = Some(name),
            WeaponSlot::Grenade => {
                if !self.grenades.contains(&name) {
                    self.grenades.push(name);
                    self.grenades.sort_unstable();
                }
            }
        }
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Whether nothing is saved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.primary.is_none()
            && self.secondary.is_none()
            && self.utility.is_none()
            && self.armor.is_none()
            && self.grenades.is_empty()
    }

    /// Everything saved, singleton slots first, as one purchase list.
    #[must_use]
    pub fn purchase_list(&self) -> Vec<String> {
        let mut list = Vec::new();
        for slot in [
            WeaponSlot::Primary,
            WeaponSlot::Secondary,
            WeaponSlot::Utility,
            WeaponSlot::Armor,
        ] {
            if let Some(name) = self.slot(slot) {
                list.push(name.to_string());
            }
        }
        list.extend(self.grenades.iter().cloned());
        list
    }
}

/// Everything persisted for one stable identity: role preferences, saved
/// loadout, auto-rebuy flag. Written in full on every mutating action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistentRecord {
    /// Preferred defender role (unique name).
    pub defender_role: Option<String>,
    /// Preferred infected role (unique name).
    pub infected_role: Option<String>,
    /// Saved purchase setup.
    pub loadout: SavedLoadout,
    /// Auto-rebuy preference.
    pub auto_rebuy: bool,
}

impl PersistentRecord {
    /// The preferred role for one side.
    #[must_use]
    pub fn role_for(&self, side: Side) -> Option<&str> {
        match side {
            Side::Defender => self.defender_role.as_deref(),
            Side::Infected => self.infected_role.as_deref(),
        }
    }

    /// Update the preferred role for one side.
    pub fn set_role_for(&mut self, side: Side, role: impl Into<String>) {
        let role = Some(role.into());
        match side {
            Side::Defender => self.defender_role = role,
            Side::Infected => self.infected_role = role,
        }
    }
}

/// A resolved fetch, tagged with the participant that asked for it. The
/// participant may have disconnected in the meantime; the mode checks.
#[derive(Debug, Clone)]
pub struct FetchCompletion {
    /// Who the fetch was issued for.
    pub participant: ParticipantId,
    /// The stored record, or `None` when the identity has no record yet.
    pub record: Option<PersistentRecord>,
}

/// Asynchronous key-value persistence for participant records.
///
/// Implementations must not block: fetches and stores are detached, and
/// completion delivery happens only through [`drain_completions`] on the
/// tick thread. Write failures are the implementation's to log; the
/// in-memory session stays authoritative and the next mutating action
/// rewrites the record anyway.
///
/// [`drain_completions`]: RecordStore::drain_completions
pub trait RecordStore {
    /// Begin fetching the record for `id` on behalf of `participant`.
    fn request_fetch(&mut self, participant: ParticipantId, id: PersistId);

    /// Persist a record, replacing whatever was stored for `id`.
    fn request_store(&mut self, id: PersistId, record: PersistentRecord);

    /// Take every fetch that has resolved since the last drain.
    fn drain_completions(&mut self) -> Vec<FetchCompletion>;
}

/// In-process store used by tests and the demo driver. Fetches resolve on
/// the next drain, preserving the asynchronous shape of a real backend.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: std::collections::HashMap<PersistId, PersistentRecord>,
    outbox: Vec<FetchCompletion>,
}

impl MemoryRecordStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record, as if a previous session had written it.
    pub fn seed(&mut self, id: PersistId, record: PersistentRecord) {
        self.records.insert(id, record);
    }

    /// Read a stored record directly (test inspection).
    #[must_use]
    pub fn stored(&self, id: PersistId) -> Option<&PersistentRecord> {
        self.records.get(&id)
    }

    /// Number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl RecordStore for MemoryRecordStore {
    fn request_fetch(&mut self, participant: ParticipantId, id: PersistId) {
        let record = self.records.get(&id).cloned();
        self.outbox.push(FetchCompletion {
            participant,
            record,
        });
    }

    fn request_store(&mut self, id: PersistId, record: PersistentRecord) {
        self.records.insert(id, record);
    }

    fn drain_completions(&mut self) -> Vec<FetchCompletion> {
        std::mem::take(&mut self.outbox)
    }
}

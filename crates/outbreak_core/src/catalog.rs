//! Weapon and role catalogs.
//!
//! The catalog is the immutable-per-round lookup layer for the mode: role
//! definitions and weapon definitions keyed by unique name, plus the three
//! privileged role references resolved from settings (default defender,
//! default infected, elevated infected). It is rebuilt from data files on
//! every map change and fully replaces the previous tables.
//!
//! The only runtime-mutable piece is the per-weapon `restricted` flag, which
//! admin commands toggle catalog-wide.

use std::collections::HashMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::settings::ModeSettings;

/// Baseline movement speed in engine units. Role speeds are divided by this
/// to produce the speed scale applied to the entity.
pub const BASE_RUN_SPEED: f32 = 250.0;

/// A participant's team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Side 0: the infected team.
    Infected,
    /// Side 1: the defending (human) team.
    Defender,
}

impl Side {
    /// Numeric side index used by the data files (0 = infected, 1 = defender).
    #[must_use]
    pub const fn index(self) -> u8 {
        match self {
            Side::Infected => 0,
            Side::Defender => 1,
        }
    }

    /// Parse a numeric side index from the data files.
    #[must_use]
    pub const fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Side::Infected),
            1 => Some(Side::Defender),
            _ => None,
        }
    }

    /// The opposing side.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Side::Infected => Side::Defender,
            Side::Defender => Side::Infected,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Infected => write!(f, "infected"),
            Side::Defender => write!(f, "defender"),
        }
    }
}

/// Equipment slot a weapon occupies.
///
/// Every slot except [`WeaponSlot::Grenade`] is a singleton: a participant
/// holds at most one item in it, and a saved loadout stores at most one
/// entry for it. Grenades form a set deduplicated by weapon identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeaponSlot {
    /// Primary weapon (rifles, shotguns, machine guns).
    Primary,
    /// Secondary weapon (pistols).
    Secondary,
    /// Utility item (tasers and similar).
    Utility,
    /// Grenades; multiple distinct grenades may be held at once.
    Grenade,
    /// Body armor; granted as an armor value rather than a held item.
    Armor,
}

impl WeaponSlot {
    /// All slots in menu presentation order.
    pub const ALL: [WeaponSlot; 5] = [
        WeaponSlot::Primary,
        WeaponSlot::Secondary,
        WeaponSlot::Utility,
        WeaponSlot::Grenade,
        WeaponSlot::Armor,
    ];

    /// Whether the slot holds at most one item.
    #[must_use]
    pub const fn is_singleton(self) -> bool {
        !matches!(self, WeaponSlot::Grenade)
    }

    /// Menu label for the slot.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            WeaponSlot::Primary => "Primary",
            WeaponSlot::Secondary => "Secondary",
            WeaponSlot::Utility => "Utility",
            WeaponSlot::Grenade => "Grenades",
            WeaponSlot::Armor => "Armor",
        }
    }
}

/// Catalog entry for a purchasable or acquirable weapon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeaponDefinition {
    /// Unique catalog key.
    pub name: String,
    /// Human-readable name used in menus and notices.
    pub display_name: String,
    /// Engine entity identifier (what the engine actually grants).
    pub entity: String,
    /// Slot the weapon occupies.
    pub slot: WeaponSlot,
    /// Purchase price.
    pub price: i32,
    /// Successful purchases allowed per participant per round; 0 = unlimited.
    pub purchase_cap: u32,
    /// Globally restricted: blocked from both pickup and purchase.
    pub restricted: bool,
    /// Chat/console purchase aliases (matched case-insensitively).
    pub aliases: Vec<String>,
}

impl WeaponDefinition {
    /// Create a definition with no cap, no restriction, and no aliases.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        display_name: impl Into<String>,
        entity: impl Into<String>,
        slot: WeaponSlot,
        price: i32,
    ) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            entity: entity.into(),
            slot,
            price,
            purchase_cap: 0,
            restricted: false,
            aliases: Vec::new(),
        }
    }

    /// Set the per-round purchase cap.
    #[must_use]
    pub fn with_cap(mut self, cap: u32) -> Self {
        self.purchase_cap = cap;
        self
    }

    /// Add purchase aliases.
    #[must_use]
    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases.extend(aliases.into_iter().map(Into::into));
        self
    }

    /// Whether `query` matches the unique name, display name, or an alias.
    #[must_use]
    pub fn matches(&self, query: &str) -> bool {
        self.name.eq_ignore_ascii_case(query)
            || self.display_name.eq_ignore_ascii_case(query)
            || self
                .aliases
                .iter()
                .any(|alias| alias.eq_ignore_ascii_case(query))
    }
}

/// Catalog entry for a playable role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleDefinition {
    /// Unique catalog key.
    pub name: String,
    /// Human-readable name used in menus and notices.
    pub display_name: String,
    /// Side the role belongs to.
    pub side: Side,
    /// Entity model path, or `"default"` for the side's default model.
    pub model: String,
    /// Health applied once entity state has settled after a role change.
    pub health: i32,
    /// Movement speed in engine units (baseline 250).
    pub speed: f32,
    /// Health restored per regeneration interval; 0 disables regeneration.
    pub regen_amount: i32,
    /// Seconds between regeneration ticks; ignored when `regen_amount` is 0.
    pub regen_interval: f32,
    /// Disabled roles are kept in menus but cannot be selected or drawn.
    pub enabled: bool,
    /// Elevated roles are reserved for forced infection and never offered.
    pub elevated: bool,
}

impl RoleDefinition {
    /// Create an enabled, non-elevated role with no regeneration.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        display_name: impl Into<String>,
        side: Side,
        health: i32,
        speed: f32,
    ) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            side,
            model: String::from("default"),
            health,
            speed,
            regen_amount: 0,
            regen_interval: 0.0,
            enabled: true,
            elevated: false,
        }
    }

    /// Set the entity model path.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set regeneration parameters.
    #[must_use]
    pub fn with_regen(mut self, amount: i32, interval: f32) -> Self {
        self.regen_amount = amount;
        self.regen_interval = interval;
        self
    }

    /// Mark the role elevated (forced-infection only).
    #[must_use]
    pub fn with_elevated(mut self) -> Self {
        self.elevated = true;
        self
    }

    /// Speed scale relative to the engine baseline.
    #[must_use]
    pub fn speed_scale(&self) -> f32 {
        self.speed / BASE_RUN_SPEED
    }

    /// Whether the role uses the side's default model.
    #[must_use]
    pub fn uses_default_model(&self) -> bool {
        self.model == "default"
    }

    /// Whether the role can regenerate health.
    #[must_use]
    pub fn has_regen(&self) -> bool {
        self.regen_amount > 0 && self.regen_interval > 0.0
    }

    /// Whether the role may be selected from a menu or random draw.
    #[must_use]
    pub const fn selectable(&self) -> bool {
        self.enabled && !self.elevated
    }
}

/// Lookup tables for roles and weapons, rebuilt at every map boundary.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    roles: HashMap<String, RoleDefinition>,
    weapons: HashMap<String, WeaponDefinition>,
    default_defender: Option<String>,
    default_infected: Option<String>,
    elevated_infected: Option<String>,
}

impl Catalog {
    /// Create an empty catalog. The mode still runs with an empty catalog;
    /// purchases and role selection just find nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from validated file data and resolve the privileged
    /// role references. Entries that fail conversion (invalid side index)
    /// are skipped with a warning rather than aborting map start.
    #[must_use]
    pub fn from_data(
        roles: &crate::data::RoleCatalogData,
        weapons: &crate::data::WeaponCatalogData,
        settings: &ModeSettings,
    ) -> Self {
        let mut catalog = Self::new();
        for (name, role) in &roles.roles {
            match role.to_definition(name) {
                Some(definition) => catalog.register_role(definition),
                None => {
                    tracing::warn!(role = %name, side = role.side, "skipping role with invalid side");
                }
            }
        }
        for (name, weapon) in &weapons.weapons {
            catalog.register_weapon(weapon.to_definition(name));
        }
        catalog.resolve_defaults(settings);
        #[cfg(feature = "debug-validation")]
        catalog.debug_validate();
        tracing::info!(
            roles = catalog.role_count(),
            weapons = catalog.weapon_count(),
            "catalog built"
        );
        catalog
    }

    /// Register a role definition, replacing any previous entry of the same
    /// unique name.
    pub fn register_role(&mut self, role: RoleDefinition) {
        if self.roles.insert(role.name.clone(), role).is_some() {
            tracing::warn!("duplicate role definition replaced");
        }
    }

    /// Register a weapon definition, replacing any previous entry of the
    /// same unique name.
    pub fn register_weapon(&mut self, weapon: WeaponDefinition) {
        if self.weapons.insert(weapon.name.clone(), weapon).is_some() {
            tracing::warn!("duplicate weapon definition replaced");
        }
    }

    /// Resolve the privileged role references from settings.
    ///
    /// A missing or wrong-side reference logs an error and leaves the
    /// reference unset; map start is never aborted over it.
    pub fn resolve_defaults(&mut self, settings: &ModeSettings) {
        self.default_defender =
            self.checked_default(&settings.default_defender_role, Side::Defender);
        self.default_infected =
            self.checked_default(&settings.default_infected_role, Side::Infected);
        self.elevated_infected = match &settings.elevated_infected_role {
            Some(name) => self.checked_default(name, Side::Infected),
            None => None,
        };
    }

    fn checked_default(&self, name: &str, side: Side) -> Option<String> {
        match self.roles.get(name) {
            Some(role) if role.side == side => Some(role.name.clone()),
            Some(role) => {
                tracing::error!(
                    role = %name,
                    expected = %side,
                    actual = %role.side,
                    "configured default role is on the wrong side"
                );
                None
            }
            None => {
                tracing::error!(role = %name, "configured default role not found in catalog");
                None
            }
        }
    }

    /// Look up a role by unique name.
    #[must_use]
    pub fn role(&self, name: &str) -> Option<&RoleDefinition> {
        self.roles.get(name)
    }

    /// All roles on one side, sorted by unique name for deterministic
    /// iteration.
    #[must_use]
    pub fn roles_for_side(&self, side: Side) -> Vec<&RoleDefinition> {
        let mut roles: Vec<&RoleDefinition> =
            self.roles.values().filter(|r| r.side == side).collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        roles
    }

    /// Draw one enabled, non-elevated role for a side.
    pub fn random_role<R: Rng>(&self, side: Side, rng: &mut R) -> Option<&RoleDefinition> {
        let pool: Vec<&RoleDefinition> = self
            .roles_for_side(side)
            .into_iter()
            .filter(|r| r.selectable())
            .collect();
        if pool.is_empty() {
            return None;
        }
        Some(pool[rng.gen_range(0..pool.len())])
    }

    /// The configured default role for a side, if it resolved.
    #[must_use]
    pub fn default_role(&self, side: Side) -> Option<&RoleDefinition> {
        let name = match side {
            Side::Defender => self.default_defender.as_deref()?,
            Side::Infected => self.default_infected.as_deref()?,
        };
        self.roles.get(name)
    }

    /// The elevated infected role, if configured and resolved.
    #[must_use]
    pub fn elevated_role(&self) -> Option<&RoleDefinition> {
        self.roles.get(self.elevated_infected.as_deref()?)
    }

    /// Look up a weapon by unique name.
    #[must_use]
    pub fn weapon(&self, name: &str) -> Option<&WeaponDefinition> {
        self.weapons.get(name)
    }

    /// Look up a weapon by engine entity identifier.
    #[must_use]
    pub fn weapon_by_entity(&self, entity: &str) -> Option<&WeaponDefinition> {
        self.weapons
            .values()
            .filter(|w| w.entity == entity)
            .min_by(|a, b| a.name.cmp(&b.name))
    }

    /// Resolve a weapon from a command argument: unique name, display name,
    /// or purchase alias, all case-insensitive.
    #[must_use]
    pub fn resolve_weapon(&self, query: &str) -> Option<&WeaponDefinition> {
        self.weapons
            .values()
            .filter(|w| w.matches(query))
            .min_by(|a, b| a.name.cmp(&b.name))
    }

    /// All weapons in one slot, sorted by unique name.
    #[must_use]
    pub fn weapons_in_slot(&self, slot: WeaponSlot) -> Vec<&WeaponDefinition> {
        let mut weapons: Vec<&WeaponDefinition> =
            self.weapons.values().filter(|w| w.slot == slot).collect();
        weapons.sort_by(|a, b| a.name.cmp(&b.name));
        weapons
    }

    /// Toggle the global restricted flag on a weapon resolved from `query`.
    ///
    /// Returns the updated definition, or `None` when nothing matched.
    pub fn set_restricted(&mut self, query: &str, restricted: bool) -> Option<&WeaponDefinition> {
        let name = self.resolve_weapon(query)?.name.clone();
        let weapon = self.weapons.get_mut(&name)?;
        weapon.restricted = restricted;
        tracing::info!(weapon = %weapon.name, restricted, "weapon restriction changed");
        Some(&self.weapons[&name])
    }

    /// Number of registered roles.
    #[must_use]
    pub fn role_count(&self) -> usize {
        self.roles.len()
    }

    /// Number of registered weapons.
    #[must_use]
    pub fn weapon_count(&self) -> usize {
        self.weapons.len()
    }

    /// Whether both tables are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty() && self.weapons.is_empty()
    }

    /// Extra cross-checks behind the `debug-validation` feature: alias
    /// collisions silently shadow each other in release builds.
    #[cfg(feature = "debug-validation")]
    pub fn debug_validate(&self) {
        let mut seen: HashMap<String, &str> = HashMap::new();
        for weapon in self.weapons.values() {
            for alias in &weapon.aliases {
                let key = alias.to_ascii_lowercase();
                if let Some(other) = seen.insert(key, &weapon.name) {
                    tracing::warn!(
                        alias = %alias,
                        first = %other,
                        second = %weapon.name,
                        "purchase alias is claimed by two weapons"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn sample_catalog() -> Catalog {
        let mut catalog = Catalog::new();
        catalog.register_role(RoleDefinition::new(
            "human_default",
            "Regular Human",
            Side::Defender,
            100,
            250.0,
        ));
        catalog.register_role(
            RoleDefinition::new("zombie_default", "Classic Zombie", Side::Infected, 4000, 290.0)
                .with_regen(5, 1.0),
        );
        catalog.register_role(
            RoleDefinition::new("zombie_mother", "Mother Zombie", Side::Infected, 8000, 300.0)
                .with_elevated(),
        );
        catalog.register_weapon(
            WeaponDefinition::new("ak47", "AK-47", "weapon_ak47", WeaponSlot::Primary, 2500)
                .with_aliases(["ak", "ak47"]),
        );
        catalog.register_weapon(WeaponDefinition::new(
            "kevlar",
            "Kevlar Vest",
            "item_kevlar",
            WeaponSlot::Armor,
            650,
        ));
        catalog
    }

    #[test]
    fn test_role_lookup() {
        let catalog = sample_catalog();
        assert!(catalog.role("human_default").is_some());
        assert!(catalog.role("missing").is_none());
        assert_eq!(catalog.role_count(), 3);
    }

    #[test]
    fn test_roles_for_side_sorted() {
        let catalog = sample_catalog();
        let infected = catalog.roles_for_side(Side::Infected);
        let names: Vec<&str> = infected.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["zombie_default", "zombie_mother"]);
    }

    #[test]
    fn test_random_role_skips_elevated() {
        let catalog = sample_catalog();
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..32 {
            let role = catalog.random_role(Side::Infected, &mut rng);
            assert_eq!(role.map(|r| r.name.as_str()), Some("zombie_default"));
        }
    }

    #[test]
    fn test_random_role_empty_side_pool() {
        let catalog = Catalog::new();
        let mut rng = SmallRng::seed_from_u64(7);
        assert!(catalog.random_role(Side::Defender, &mut rng).is_none());
    }

    #[test]
    fn test_resolve_weapon_by_alias_case_insensitive() {
        let catalog = sample_catalog();
        assert!(catalog.resolve_weapon("AK").is_some());
        assert!(catalog.resolve_weapon("ak-47").is_some());
        assert!(catalog.resolve_weapon("awp").is_none());
    }

    #[test]
    fn test_weapon_by_entity() {
        let catalog = sample_catalog();
        let weapon = catalog.weapon_by_entity("weapon_ak47");
        assert_eq!(weapon.map(|w| w.name.as_str()), Some("ak47"));
    }

    #[test]
    fn test_set_restricted_roundtrip() {
        let mut catalog = sample_catalog();
        assert!(catalog.set_restricted("ak", true).is_some());
        assert!(catalog.weapon("ak47").is_some_and(|w| w.restricted));
        assert!(catalog.set_restricted("ak", false).is_some());
        assert!(!catalog.weapon("ak47").is_some_and(|w| w.restricted));
        assert!(catalog.set_restricted("missing", true).is_none());
    }

    #[test]
    fn test_resolve_defaults_reports_missing() {
        let mut catalog = sample_catalog();
        let settings = ModeSettings {
            default_defender_role: String::from("human_default"),
            default_infected_role: String::from("not_registered"),
            elevated_infected_role: Some(String::from("zombie_mother")),
            ..ModeSettings::default()
        };
        catalog.resolve_defaults(&settings);

        assert!(catalog.default_role(Side::Defender).is_some());
        assert!(catalog.default_role(Side::Infected).is_none());
        assert_eq!(
            catalog.elevated_role().map(|r| r.name.as_str()),
            Some("zombie_mother")
        );
    }

    #[test]
    fn test_resolve_defaults_rejects_wrong_side() {
        let mut catalog = sample_catalog();
        let settings = ModeSettings {
            default_defender_role: String::from("zombie_default"),
            ..ModeSettings::default()
        };
        catalog.resolve_defaults(&settings);
        assert!(catalog.default_role(Side::Defender).is_none());
    }

    #[test]
    fn test_speed_scale() {
        let role = RoleDefinition::new("r", "R", Side::Infected, 100, 300.0);
        assert!((role.speed_scale() - 1.2).abs() < f32::EPSILON);
    }

    #[test]
    fn test_slot_singletons() {
        assert!(WeaponSlot::Primary.is_singleton());
        assert!(WeaponSlot::Armor.is_singleton());
        assert!(!WeaponSlot::Grenade.is_singleton());
    }
}

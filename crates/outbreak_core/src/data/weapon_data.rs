//! Raw schema for the weapon catalog file.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::catalog::{WeaponDefinition, WeaponSlot};

/// The weapon catalog file: unique weapon name mapped to its definition.
///
/// # Example RON
///
/// ```ron
/// WeaponCatalogData(
///     weapons: {
///         "ak47": (
///             display_name: "AK-47",
///             entity: "weapon_ak47",
///             slot: primary,
///             price: 2500,
///             purchase_cap: 1,
///             aliases: ["ak"],
///         ),
///     },
/// )
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeaponCatalogData {
    /// All weapon entries, keyed by unique name.
    pub weapons: BTreeMap<String, WeaponData>,
}

/// One weapon entry as written in the catalog file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeaponData {
    /// Human-readable name used in menus and notices.
    pub display_name: String,

    /// Engine entity identifier.
    pub entity: String,

    /// Slot the weapon occupies.
    pub slot: WeaponSlot,

    /// Purchase price.
    pub price: i32,

    /// Successful purchases per participant per round; 0 = unlimited.
    #[serde(default)]
    pub purchase_cap: u32,

    /// Start the map with the weapon restricted.
    #[serde(default)]
    pub restricted: bool,

    /// Chat/console purchase aliases.
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl WeaponData {
    /// Convert into the runtime definition.
    #[must_use]
    pub fn to_definition(&self, name: &str) -> WeaponDefinition {
        WeaponDefinition {
            name: name.to_string(),
            display_name: self.display_name.clone(),
            entity: self.entity.clone(),
            slot: self.slot,
            price: self.price,
            purchase_cap: self.purchase_cap,
            restricted: self.restricted,
            aliases: self.aliases.clone(),
        }
    }
}

impl WeaponCatalogData {
    /// Validate internal consistency of the weapon table.
    ///
    /// Checks for:
    /// - Empty display names or entity identifiers
    /// - Negative prices
    /// - Purchase aliases claimed by more than one weapon
    ///
    /// Returns a list of validation errors; empty means valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let mut alias_owners: HashMap<String, &str> = HashMap::new();

        for (name, weapon) in &self.weapons {
            if weapon.display_name.is_empty() {
                errors.push(format!("Weapon '{name}' has an empty display name"));
            }
            if weapon.entity.is_empty() {
                errors.push(format!("Weapon '{name}' has an empty entity identifier"));
            }
            if weapon.price < 0 {
                errors.push(format!("Weapon '{name}' has a negative price"));
            }
            for alias in &weapon.aliases {
                if alias.is_empty() {
                    errors.push(format!("Weapon '{name}' has an empty alias"));
                    continue;
                }
                let key = alias.to_ascii_lowercase();
                if let Some(owner) = alias_owners.insert(key, name) {
                    errors.push(format!(
                        "Alias '{alias}' is claimed by both '{owner}' and '{name}'"
                    ));
                }
            }
        }

        errors
    }
}

//! Raw schema for the role catalog file.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::{RoleDefinition, Side};

/// The role catalog file: unique role name mapped to its definition.
///
/// # Example RON
///
/// ```ron
/// RoleCatalogData(
///     roles: {
///         "zombie_default": (
///             display_name: "Classic Zombie",
///             side: 0,
///             health: 4000,
///             speed: 290.0,
///             regen_amount: 5,
///             regen_interval: 1.0,
///         ),
///         "human_default": (
///             display_name: "Regular Human",
///             side: 1,
///             health: 100,
///             speed: 250.0,
///         ),
///     },
/// )
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoleCatalogData {
    /// All role entries, keyed by unique name.
    pub roles: BTreeMap<String, RoleData>,
}

/// One role entry as written in the catalog file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleData {
    /// Human-readable name used in menus and notices.
    pub display_name: String,

    /// Side index: 0 = infected, 1 = defender.
    pub side: u8,

    /// Entity model path, or `"default"` for the side's default model.
    #[serde(default = "default_model")]
    pub model: String,

    /// Health applied after the role settles.
    pub health: i32,

    /// Movement speed in engine units (baseline 250).
    pub speed: f32,

    /// Health restored per regeneration interval; 0 disables regeneration.
    #[serde(default)]
    pub regen_amount: i32,

    /// Seconds between regeneration ticks.
    #[serde(default)]
    pub regen_interval: f32,

    /// Disabled roles stay listed but cannot be selected or drawn.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Elevated roles are reserved for forced infection.
    #[serde(default)]
    pub elevated: bool,
}

/// Default model marker.
fn default_model() -> String {
    String::from("default")
}

/// Roles are enabled unless the file says otherwise.
const fn default_enabled() -> bool {
    true
}

impl RoleData {
    /// Convert into the runtime definition. Returns `None` when the side
    /// index is out of range.
    #[must_use]
    pub fn to_definition(&self, name: &str) -> Option<RoleDefinition> {
        let side = Side::from_index(self.side)?;
        Some(RoleDefinition {
            name: name.to_string(),
            display_name: self.display_name.clone(),
            side,
            model: self.model.clone(),
            health: self.health,
            speed: self.speed,
            regen_amount: self.regen_amount,
            regen_interval: self.regen_interval,
            enabled: self.enabled,
            elevated: self.elevated,
        })
    }
}

impl RoleCatalogData {
    /// Validate internal consistency of the role table.
    ///
    /// Returns a list of validation errors; empty means valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (name, role) in &self.roles {
            if role.display_name.is_empty() {
                errors.push(format!("Role '{name}' has an empty display name"));
            }
            if Side::from_index(role.side).is_none() {
                errors.push(format!(
                    "Role '{name}' has invalid side {} (expected 0 or 1)",
                    role.side
                ));
            }
            if role.health <= 0 {
                errors.push(format!("Role '{name}' has non-positive health"));
            }
            if role.speed <= 0.0 {
                errors.push(format!("Role '{name}' has non-positive speed"));
            }
            if role.regen_amount > 0 && role.regen_interval <= 0.0 {
                errors.push(format!(
                    "Role '{name}' regenerates but has no positive regen_interval"
                ));
            }
            if role.model.is_empty() {
                errors.push(format!(
                    "Role '{name}' has an empty model (use \"default\" for the side model)"
                ));
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(side: u8) -> RoleData {
        RoleData {
            display_name: String::from("Classic Zombie"),
            side,
            model: String::from("default"),
            health: 4000,
            speed: 290.0,
            regen_amount: 0,
            regen_interval: 0.0,
            enabled: true,
            elevated: false,
        }
    }

    #[test]
    fn test_validate_valid_entry() {
        let mut data = RoleCatalogData::default();
        data.roles.insert(String::from("zombie_default"), entry(0));
        assert!(data.validate().is_empty());
    }

    #[test]
    fn test_validate_rejects_bad_side() {
        let mut data = RoleCatalogData::default();
        data.roles.insert(String::from("broken"), entry(3));
        let errors = data.validate();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("invalid side"));
    }

    #[test]
    fn test_validate_rejects_regen_without_interval() {
        let mut data = RoleCatalogData::default();
        let mut role = entry(0);
        role.regen_amount = 5;
        data.roles.insert(String::from("regen"), role);
        assert_eq!(data.validate().len(), 1);
    }

    #[test]
    fn test_to_definition_maps_side() {
        let def = entry(0).to_definition("zombie_default");
        assert!(def.is_some_and(|d| d.side == Side::Infected));
        assert!(entry(9).to_definition("broken").is_none());
    }
}

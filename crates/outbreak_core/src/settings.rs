//! Mode settings.
//!
//! Every field is optional in the settings file; absent fields take the
//! defaults below. Fixed scheduling constants (settle delays, tick rate)
//! live in [`crate::schedule`] and are not configurable.

use serde::{Deserialize, Serialize};

use crate::catalog::Side;

/// Which side a participant respawns on while infection is underway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RespawnSide {
    /// Respawn everyone as infected (the classic rule).
    #[default]
    Infected,
    /// Respawn everyone as a defender.
    Defender,
    /// Respawn on whichever side the participant last held.
    Keep,
}

/// Tunables and feature toggles for the mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModeSettings {
    /// Master switch for the purchase pipeline.
    pub purchase_enabled: bool,
    /// Restrict purchases to participants inside a buy zone.
    pub buy_zone_only: bool,
    /// Draw random roles on connect instead of the configured defaults.
    pub random_role_on_connect: bool,
    /// Re-roll both side roles on every spawn (overrides saved selections
    /// for that life only).
    pub random_role_on_spawn: bool,
    /// Allow participants to open the role-selection menu.
    pub role_change_allowed: bool,
    /// Persist role selections as they are made.
    pub save_role_on_select: bool,
    /// Unique name of the default defender role.
    pub default_defender_role: String,
    /// Unique name of the default infected role.
    pub default_infected_role: String,
    /// Unique name of the elevated infected role, if any.
    pub elevated_infected_role: Option<String>,
    /// Model applied when a defender role requests `"default"`.
    pub default_defender_model: String,
    /// Model applied when an infected role requests `"default"`.
    pub default_infected_model: String,
    /// Entity identifier of the melee weapon the infected may always hold.
    pub melee_entity: String,
    /// Master switch for scheduled respawns.
    pub respawn_enabled: bool,
    /// Seconds between death and scheduled respawn.
    pub respawn_delay: f32,
    /// Respawn suicides as infected while a round is underway.
    pub suicide_respawn_infected: bool,
    /// Side policy for respawns while infection is underway.
    pub respawn_side: RespawnSide,
    /// Respawn participants who join a playable side mid-round.
    pub late_join_respawn: bool,
    /// Award the attacker cash equal to damage dealt.
    pub damage_cash_award: bool,
    /// Hard ceiling on a participant's cash balance.
    pub max_balance: i32,
}

impl Default for ModeSettings {
    fn default() -> Self {
        Self {
            purchase_enabled: true,
            buy_zone_only: false,
            random_role_on_connect: false,
            random_role_on_spawn: false,
            role_change_allowed: true,
            save_role_on_select: true,
            default_defender_role: String::from("human_default"),
            default_infected_role: String::from("zombie_default"),
            elevated_infected_role: None,
            default_defender_model: String::from("models/player/defender.mdl"),
            default_infected_model: String::from("models/player/infected.mdl"),
            melee_entity: String::from("weapon_knife"),
            respawn_enabled: true,
            respawn_delay: 5.0,
            suicide_respawn_infected: true,
            respawn_side: RespawnSide::Infected,
            late_join_respawn: true,
            damage_cash_award: true,
            max_balance: 16_000,
        }
    }
}

impl ModeSettings {
    /// The side-based default model for roles that request `"default"`.
    #[must_use]
    pub fn default_model(&self, side: Side) -> &str {
        match side {
            Side::Defender => &self.default_defender_model,
            Side::Infected => &self.default_infected_model,
        }
    }

    /// Validate ranges. Returns a list of problems; empty means valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.respawn_delay < 0.0 {
            problems.push(format!(
                "respawn_delay must not be negative (got {})",
                self.respawn_delay
            ));
        }
        if self.max_balance < 0 {
            problems.push(format!(
                "max_balance must not be negative (got {})",
                self.max_balance
            ));
        }
        if self.default_defender_role.is_empty() {
            problems.push(String::from("default_defender_role must not be empty"));
        }
        if self.default_infected_role.is_empty() {
            problems.push(String::from("default_infected_role must not be empty"));
        }
        if self.melee_entity.is_empty() {
            problems.push(String::from("melee_entity must not be empty"));
        }
        problems
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(ModeSettings::default().validate().is_empty());
    }

    #[test]
    fn test_validate_flags_bad_ranges() {
        let settings = ModeSettings {
            respawn_delay: -1.0,
            max_balance: -5,
            default_defender_role: String::new(),
            ..ModeSettings::default()
        };
        let problems = settings.validate();
        assert_eq!(problems.len(), 3);
    }

    #[test]
    fn test_default_model_per_side() {
        let settings = ModeSettings::default();
        assert_ne!(
            settings.default_model(Side::Defender),
            settings.default_model(Side::Infected)
        );
    }
}

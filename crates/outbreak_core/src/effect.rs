//! Outbound engine effects and user-facing notices.
//!
//! The core never touches the engine directly: every entity mutation,
//! respawn, and chat line is pushed into the [`EffectSink`] and drained by
//! the host after each event or tick. This keeps every mutation at a safe
//! point and makes the whole mode assertable in tests.

use serde::{Deserialize, Serialize};

use crate::session::ParticipantId;

/// A user-facing message. Variants carry their data; turning a notice into
/// localized text is the host's job (the [`std::fmt::Display`] impl is the
/// untranslated default).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Notice {
    /// The purchase pipeline is switched off.
    PurchasingDisabled,
    /// Purchases require a living participant.
    MustBeAlive,
    /// Purchases require a defender; the infected buy nothing.
    MustBeDefender,
    /// Purchases are limited to buy zones.
    MustBeInBuyZone,
    /// The weapon is globally restricted.
    WeaponRestricted {
        /// Display name of the weapon.
        weapon: String,
    },
    /// The participant cannot afford the weapon.
    InsufficientFunds {
        /// Purchase price.
        price: i32,
    },
    /// The per-round purchase cap is exhausted.
    PurchaseCapReached {
        /// Display name of the weapon.
        weapon: String,
        /// The cap that was hit.
        cap: u32,
    },
    /// Successful purchase of an uncapped weapon.
    Purchased {
        /// Display name of the weapon.
        weapon: String,
    },
    /// Successful purchase of a capped weapon.
    PurchasedCapped {
        /// Display name of the weapon.
        weapon: String,
        /// Purchases left within the cap this round.
        remaining: u32,
    },
    /// Buy-saved ran with nothing saved.
    NoSavedSetup,
    /// The current setup was saved.
    SetupSaved,
    /// Auto-rebuy preference changed.
    AutoRebuy {
        /// New state.
        enabled: bool,
    },
    /// The menu collaborator is not available.
    MenuUnavailable,
    /// A role was selected.
    RoleSelected {
        /// Display name of the role.
        role: String,
    },
    /// Role changes are switched off.
    RoleChangeDisabled,
    /// Manual respawn refused: respawning is switched off.
    RespawnDisabled,
    /// Manual respawn refused: the participant is alive.
    MustBeDead,
    /// Manual respawn refused: the participant is on no playable side.
    MustJoinSide,
    /// Admin commands require admin capabilities.
    NoAccess,
    /// A command was issued with missing arguments.
    CommandUsage {
        /// Usage line for the command.
        usage: String,
    },
    /// A restrict/unrestrict query matched no weapon.
    WeaponNotFound {
        /// The query as typed.
        query: String,
    },
    /// Broadcast: a weapon was restricted.
    RestrictedBroadcast {
        /// Name of the admin who issued the command.
        admin: String,
        /// Display name of the weapon.
        weapon: String,
    },
    /// Broadcast: a weapon restriction was lifted.
    UnrestrictedBroadcast {
        /// Name of the admin who issued the command.
        admin: String,
        /// Display name of the weapon.
        weapon: String,
    },
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Notice::PurchasingDisabled => write!(f, "Weapon purchasing is disabled."),
            Notice::MustBeAlive => write!(f, "You must be alive to do that."),
            Notice::MustBeDefender => write!(f, "You must be human to purchase weapons."),
            Notice::MustBeInBuyZone => write!(f, "You must be inside a buy zone."),
            Notice::WeaponRestricted { weapon } => write!(f, "{weapon} is restricted."),
            Notice::InsufficientFunds { price } => {
                write!(f, "You need ${price} to purchase this item.")
            }
            Notice::PurchaseCapReached { weapon, cap } => {
                write!(f, "You have reached the purchase limit of {cap} for {weapon}.")
            }
            Notice::Purchased { weapon } => write!(f, "You purchased {weapon}."),
            Notice::PurchasedCapped { weapon, remaining } => {
                write!(f, "You purchased {weapon}. You can buy {remaining} more this round.")
            }
            Notice::NoSavedSetup => write!(f, "You have no saved setup."),
            Notice::SetupSaved => write!(f, "Your current setup has been saved."),
            Notice::AutoRebuy { enabled } => {
                let state = if *enabled { "enabled" } else { "disabled" };
                write!(f, "Auto-rebuy is now {state}.")
            }
            Notice::MenuUnavailable => write!(f, "Menus are not available on this server."),
            Notice::RoleSelected { role } => write!(f, "Your class is now {role}."),
            Notice::RoleChangeDisabled => write!(f, "Class changes are disabled."),
            Notice::RespawnDisabled => write!(f, "Respawning is disabled."),
            Notice::MustBeDead => write!(f, "You are still alive."),
            Notice::MustJoinSide => write!(f, "You must join a team first."),
            Notice::NoAccess => write!(f, "You do not have access to that command."),
            Notice::CommandUsage { usage } => write!(f, "Usage: {usage}"),
            Notice::WeaponNotFound { query } => write!(f, "No weapon matches '{query}'."),
            Notice::RestrictedBroadcast { admin, weapon } => {
                write!(f, "{admin} restricted {weapon}.")
            }
            Notice::UnrestrictedBroadcast { admin, weapon } => {
                write!(f, "{admin} unrestricted {weapon}.")
            }
        }
    }
}

/// One engine-side mutation or message, applied by the host when drained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EngineEffect {
    /// Set the entity's model.
    SetModel {
        /// Target participant.
        participant: ParticipantId,
        /// Model path.
        model: String,
    },
    /// Set the entity's movement speed scale.
    SetSpeedScale {
        /// Target participant.
        participant: ParticipantId,
        /// Scale relative to the engine baseline.
        scale: f32,
    },
    /// Set the entity's health.
    SetHealth {
        /// Target participant.
        participant: ParticipantId,
        /// New health value.
        health: i32,
    },
    /// Set the entity's armor and helmet.
    SetArmor {
        /// Target participant.
        participant: ParticipantId,
        /// New armor value.
        armor: i32,
        /// Whether a helmet is worn.
        helmet: bool,
    },
    /// Set the participant's cash balance (purchase deduction, damage
    /// award).
    SetBalance {
        /// Target participant.
        participant: ParticipantId,
        /// New balance.
        balance: i32,
    },
    /// Grant a named item.
    GiveItem {
        /// Target participant.
        participant: ParticipantId,
        /// Entity identifier to grant.
        entity: String,
    },
    /// Drop a held item.
    DropItem {
        /// Target participant.
        participant: ParticipantId,
        /// Entity identifier to drop.
        entity: String,
    },
    /// Respawn the participant's entity.
    Respawn {
        /// Target participant.
        participant: ParticipantId,
    },
    /// Send a notice to one participant.
    Notice {
        /// Target participant.
        participant: ParticipantId,
        /// The message.
        notice: Notice,
    },
    /// Send a notice to everyone.
    Broadcast {
        /// The message.
        notice: Notice,
    },
}

/// Accumulates effects until the host drains them.
#[derive(Debug, Clone, Default)]
pub struct EffectSink {
    effects: Vec<EngineEffect>,
}

impl EffectSink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an effect.
    pub fn push(&mut self, effect: EngineEffect) {
        tracing::trace!(?effect, "effect queued");
        self.effects.push(effect);
    }

    /// Queue a notice to one participant.
    pub fn notice(&mut self, participant: ParticipantId, notice: Notice) {
        self.push(EngineEffect::Notice {
            participant,
            notice,
        });
    }

    /// Queue a broadcast notice.
    pub fn broadcast(&mut self, notice: Notice) {
        self.push(EngineEffect::Broadcast { notice });
    }

    /// Take everything queued so far.
    pub fn drain(&mut self) -> Vec<EngineEffect> {
        std::mem::take(&mut self.effects)
    }

    /// Number of queued effects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    /// Whether nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_empties_sink() {
        let mut sink = EffectSink::new();
        sink.notice(ParticipantId(1), Notice::MustBeAlive);
        sink.broadcast(Notice::RespawnDisabled);
        assert_eq!(sink.len(), 2);

        let effects = sink.drain();
        assert_eq!(effects.len(), 2);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_notice_display_mentions_payload() {
        let text = Notice::PurchaseCapReached {
            weapon: String::from("AK-47"),
            cap: 2,
        }
        .to_string();
        assert!(text.contains("AK-47"));
        assert!(text.contains('2'));
    }
}

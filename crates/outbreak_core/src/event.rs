//! Inbound engine events.
//!
//! Everything the host forwards into the mode after a session exists is a
//! [`GameEvent`]. Connect, disconnect, and map start are direct methods on
//! [`crate::mode::GameMode`] instead: connect issues the participant handle
//! the host must keep, and map start carries the freshly built catalog.

use serde::{Deserialize, Serialize};

use crate::catalog::Side;
use crate::menu::{MenuChoice, MenuKind};
use crate::session::ParticipantId;

/// One engine-side fact delivered to the mode on the tick thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// The participant's entity spawned.
    Spawned {
        /// Who spawned.
        participant: ParticipantId,
    },
    /// The participant's entity died.
    Died {
        /// Who died.
        victim: ParticipantId,
        /// The killer; `None` for environmental/self-inflicted deaths.
        attacker: Option<ParticipantId>,
    },
    /// The participant's entity took damage and survived.
    Hurt {
        /// Who was hit.
        victim: ParticipantId,
        /// Who dealt the damage, if anyone.
        attacker: Option<ParticipantId>,
        /// Damage dealt.
        damage: i32,
        /// Victim health after the hit.
        health_remaining: i32,
    },
    /// The participant joined a side (or left for spectator: `None`).
    SideChanged {
        /// Who moved.
        participant: ParticipantId,
        /// New side.
        side: Option<Side>,
    },
    /// The participant entered or left a buy zone.
    BuyZone {
        /// Who moved.
        participant: ParticipantId,
        /// Whether they are now inside a buy zone.
        inside: bool,
    },
    /// The engine granted an item (pickup or default loadout) after the
    /// acquisition hook allowed it. Keeps the held-items mirror honest.
    ItemAcquired {
        /// Who received it.
        participant: ParticipantId,
        /// Entity identifier granted.
        entity: String,
    },
    /// The engine removed a held item (manual drop, strip).
    ItemDropped {
        /// Who lost it.
        participant: ParticipantId,
        /// Entity identifier dropped.
        entity: String,
    },
    /// The engine set the participant's cash balance (round income, kill
    /// rewards, admin grants).
    BalanceSet {
        /// Whose balance.
        participant: ParticipantId,
        /// New balance.
        balance: i32,
    },
    /// A round started. Resets round state and runs the auto-rebuy sweep.
    RoundStarted,
    /// The round ended.
    RoundEnded,
    /// The round's outbreak began (first infection wave fired).
    InfectionStarted,
    /// The participant acted on a presented menu.
    MenuChoice {
        /// Who acted.
        participant: ParticipantId,
        /// Which menu the choice belongs to.
        kind: MenuKind,
        /// What they did.
        choice: MenuChoice,
    },
    /// The participant issued a command (platform prefix already stripped).
    Command {
        /// Who issued it.
        participant: ParticipantId,
        /// Command name, lowercase.
        name: String,
        /// Arguments as typed.
        args: Vec<String>,
    },
}

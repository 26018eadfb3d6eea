//! Error types for the game-mode core.

use thiserror::Error;

use crate::session::ParticipantId;

/// Result type alias using [`ModeError`].
pub type Result<T> = std::result::Result<T, ModeError>;

/// Top-level error type for game-mode operations.
///
/// Nothing in this taxonomy is fatal to the process; every failure is
/// contained to one participant or one action and logged where it occurs.
#[derive(Debug, Error)]
pub enum ModeError {
    /// A per-participant table lookup missed.
    #[error("Participant not connected: {0}")]
    ParticipantMissing(ParticipantId),

    /// A catalog lookup by unique name missed.
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    /// A purchase failed validation. The buyer already got the notice;
    /// this carries the reason for callers.
    #[error("Purchase rejected: {0}")]
    PurchaseRejected(crate::purchase::PurchaseRejection),
}

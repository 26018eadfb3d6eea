//! Menu request/response types and the presenter seam.
//!
//! The mode never owns menu rendering. It builds a [`MenuRequest`], hands it
//! to the injected [`MenuPresenter`], and later receives the participant's
//! [`MenuChoice`] as an event tagged with the originating [`MenuKind`]. A
//! host without any menu capability injects [`NullMenuPresenter`], and every
//! menu entry point degrades to an "unavailable" notice instead of probing
//! for the capability at each call site.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{Side, WeaponSlot};
use crate::session::ParticipantId;

/// Identity of a presented menu, echoed back with the selection so the mode
/// can route it without retaining per-menu callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MenuKind {
    /// Top-level role menu: pick a side to configure.
    RoleSides,
    /// Role list for one side.
    RoleSelect {
        /// Side being configured.
        side: Side,
    },
    /// Top-level market menu.
    Market,
    /// Slot list of the buy/edit tree.
    MarketSlots {
        /// When set, selections edit the saved loadout instead of buying.
        edit: bool,
    },
    /// Weapon list for one slot of the buy/edit tree.
    MarketWeapons {
        /// Slot being browsed.
        slot: WeaponSlot,
        /// When set, selections edit the saved loadout instead of buying.
        edit: bool,
    },
    /// Read-only view of the saved setup.
    MarketView,
}

/// One selectable line of a menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    /// Text shown to the participant; also the selection key.
    pub label: String,
    /// Disabled lines are shown but cannot be picked.
    pub disabled: bool,
}

/// A menu ready for presentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuRequest {
    /// Routing identity.
    pub kind: MenuKind,
    /// Menu title.
    pub title: String,
    /// Lines in presentation order.
    pub items: Vec<MenuItem>,
}

impl MenuRequest {
    /// Start a menu with no items.
    #[must_use]
    pub fn new(kind: MenuKind, title: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            items: Vec::new(),
        }
    }

    /// Append a selectable item.
    pub fn item(&mut self, label: impl Into<String>) {
        self.items.push(MenuItem {
            label: label.into(),
            disabled: false,
        });
    }

    /// Append a visible but unselectable item.
    pub fn disabled_item(&mut self, label: impl Into<String>) {
        self.items.push(MenuItem {
            label: label.into(),
            disabled: true,
        });
    }
}

/// What the participant did with a presented menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MenuChoice {
    /// Picked the item with this label.
    Picked(String),
    /// Asked for the parent menu.
    Back,
    /// Closed the menu.
    Closed,
}

/// The presentation collaborator was not available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("menu presentation is unavailable")]
pub struct MenuUnavailable;

/// Presents menus to participants.
///
/// `present` is fire-and-forget: the selection arrives later as an event.
/// Presenting a new menu to a participant replaces whatever menu they had
/// open.
pub trait MenuPresenter {
    /// Show a menu to a participant.
    fn present(
        &mut self,
        participant: ParticipantId,
        request: MenuRequest,
    ) -> Result<(), MenuUnavailable>;

    /// Close whatever menu the participant has open.
    fn close(&mut self, _participant: ParticipantId) {}
}

/// Null object for hosts without menu capability: every `present` reports
/// [`MenuUnavailable`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NullMenuPresenter;

impl MenuPresenter for NullMenuPresenter {
    fn present(
        &mut self,
        participant: ParticipantId,
        request: MenuRequest,
    ) -> Result<(), MenuUnavailable> {
        tracing::debug!(
            participant = %participant,
            kind = ?request.kind,
            "menu requested but presentation is unavailable"
        );
        Err(MenuUnavailable)
    }
}

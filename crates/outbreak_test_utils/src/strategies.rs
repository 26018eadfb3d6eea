//! Property-based testing strategies.
//!
//! Random but reproducible weapons, roles, and loadout entries for
//! property tests over the pure validation and bookkeeping code.

use proptest::prelude::*;

use outbreak_core::catalog::{RoleDefinition, Side, WeaponDefinition, WeaponSlot};

/// Generate either side.
pub fn arb_side() -> impl Strategy<Value = Side> {
    prop_oneof![Just(Side::Infected), Just(Side::Defender)]
}

/// Generate any weapon slot.
pub fn arb_slot() -> impl Strategy<Value = WeaponSlot> {
    prop_oneof![
        Just(WeaponSlot::Primary),
        Just(WeaponSlot::Secondary),
        Just(WeaponSlot::Utility),
        Just(WeaponSlot::Grenade),
        Just(WeaponSlot::Armor),
    ]
}

/// Generate a singleton (non-grenade) slot.
pub fn arb_singleton_slot() -> impl Strategy<Value = WeaponSlot> {
    prop_oneof![
        Just(WeaponSlot::Primary),
        Just(WeaponSlot::Secondary),
        Just(WeaponSlot::Utility),
        Just(WeaponSlot::Armor),
    ]
}

/// Generate a purchase price.
///
/// Range: 0 to 10000 (typical economy scale)
pub fn arb_price() -> impl Strategy<Value = i32> {
    0i32..10_000i32
}

/// Generate a weapon with arbitrary slot, price, cap, and restriction.
pub fn arb_weapon() -> impl Strategy<Value = WeaponDefinition> {
    (0u32..1000u32, arb_slot(), arb_price(), 0u32..3u32, any::<bool>()).prop_map(
        |(index, slot, price, cap, restricted)| {
            let mut weapon = WeaponDefinition::new(
                format!("weapon_{index}"),
                format!("Weapon {index}"),
                format!("ent_{index}"),
                slot,
                price,
            )
            .with_cap(cap);
            weapon.restricted = restricted;
            weapon
        },
    )
}

/// Generate a weapon that is never restricted.
pub fn arb_unrestricted_weapon() -> impl Strategy<Value = WeaponDefinition> {
    arb_weapon().prop_map(|mut weapon| {
        weapon.restricted = false;
        weapon
    })
}

/// Generate an enabled, non-elevated role.
pub fn arb_role() -> impl Strategy<Value = RoleDefinition> {
    (0u32..1000u32, arb_side(), 1i32..5000i32, 100i32..400i32).prop_map(
        |(index, side, health, speed)| {
            RoleDefinition::new(
                format!("role_{index}"),
                format!("Role {index}"),
                side,
                health,
                speed as f32,
            )
        },
    )
}

/// Generate loadout entries: a slot paired with a weapon unique name.
pub fn arb_loadout_entries(max_len: usize) -> impl Strategy<Value = Vec<(WeaponSlot, String)>> {
    proptest::collection::vec(
        (arb_slot(), (0u32..50u32).prop_map(|n| format!("weapon_{n}"))),
        0..max_len,
    )
}

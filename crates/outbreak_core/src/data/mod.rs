//! Data structures for catalog configuration.
//!
//! This module contains the raw schemas for the role and weapon catalog
//! files, designed to be deserialized from RON. Each schema validates
//! itself and converts into the runtime types in [`crate::catalog`].
//!
//! **Note:** This module contains no IO - it only defines data types.
//! File loading is handled by `outbreak_server`.

mod role_data;
mod weapon_data;

pub use role_data::{RoleCatalogData, RoleData};
pub use weapon_data::{WeaponCatalogData, WeaponData};

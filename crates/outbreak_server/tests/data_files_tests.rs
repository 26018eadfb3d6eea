//! Tests for the shipped data files.
//!
//! Verifies that the RON files under `data/` parse, validate cleanly,
//! and resolve the settings defaults, so a fresh checkout runs the demo
//! without edits.

use std::path::Path;

use outbreak_core::catalog::Side;
use outbreak_server::data_loader::{load_catalog, load_settings, validate_data_dir};

/// Locate the shipped data directory (tests may run from the workspace
/// root or from the crate directory).
fn shipped_data_dir() -> &'static Path {
    let candidates = [
        Path::new("crates/outbreak_server/data"),
        Path::new("data"),
    ];
    for path in candidates {
        if path.exists() {
            return path;
        }
    }
    panic!("could not find the shipped data directory");
}

#[test]
fn test_shipped_files_validate_cleanly() {
    let problems = validate_data_dir(shipped_data_dir()).expect("shipped files parse");
    assert!(problems.is_empty(), "problems in shipped data: {problems:?}");
}

#[test]
fn test_shipped_catalog_loads_with_both_sides() {
    let dir = shipped_data_dir();
    let settings = load_settings(dir).expect("shipped settings parse");
    let catalog = load_catalog(dir, &settings).expect("shipped catalog loads");

    assert!(catalog.role_count() >= 2, "need at least one role per side");
    let defender = catalog
        .role(&settings.default_defender_role)
        .expect("default defender role exists");
    assert_eq!(defender.side, Side::Defender);
    let infected = catalog
        .role(&settings.default_infected_role)
        .expect("default infected role exists");
    assert_eq!(infected.side, Side::Infected);
}

#[test]
fn test_shipped_elevated_role_is_reserved() {
    let dir = shipped_data_dir();
    let settings = load_settings(dir).expect("shipped settings parse");
    let catalog = load_catalog(dir, &settings).expect("shipped catalog loads");

    let name = settings
        .elevated_infected_role
        .as_deref()
        .expect("demo settings name an elevated role");
    let role = catalog.role(name).expect("elevated role exists");
    assert!(role.elevated, "role '{name}' must be flagged elevated");
    assert_eq!(role.side, Side::Infected);
}

#[test]
fn test_shipped_aliases_resolve() {
    let dir = shipped_data_dir();
    let settings = load_settings(dir).expect("shipped settings parse");
    let catalog = load_catalog(dir, &settings).expect("shipped catalog loads");

    for alias in ["ak", "deagle", "kevlar"] {
        assert!(
            catalog.resolve_weapon(alias).is_some(),
            "alias '{alias}' must resolve"
        );
    }
    assert!(
        catalog
            .resolve_weapon("awp")
            .is_some_and(|weapon| weapon.restricted),
        "the demo script expects the AWP to start restricted"
    );
}

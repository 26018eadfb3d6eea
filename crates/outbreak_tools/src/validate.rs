//! Data directory validation.
//!
//! Wraps the server's loader checks into a report a CI job can fail on:
//! every problem across settings, roles, and weapons, plus the counts a
//! clean catalog would carry.

use std::path::Path;

use outbreak_server::data_loader::{self, DataLoadError};

/// Outcome of validating one data directory.
#[derive(Debug, Clone)]
pub struct ValidationReport {
    /// Every problem found, prefixed with the file it came from.
    pub problems: Vec<String>,
    /// Roles the catalog would hold.
    pub role_count: usize,
    /// Weapons the catalog would hold.
    pub weapon_count: usize,
}

impl ValidationReport {
    /// Whether the directory validated without problems.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.problems.is_empty()
    }
}

/// Validate all data files in a directory.
///
/// Files that fail to read or parse are hard errors; validation
/// problems inside files that parse land in the report.
pub fn validate_data_directory(path: &Path) -> Result<ValidationReport, DataLoadError> {
    let problems = data_loader::validate_data_dir(path)?;

    let settings = data_loader::load_settings(path)?;
    let catalog = data_loader::load_catalog(path, &settings)?;

    Ok(ValidationReport {
        problems,
        role_count: catalog.role_count(),
        weapon_count: catalog.weapon_count(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;

    const MINIMAL_ROLES: &str = r#"RoleCatalogData(
        roles: {
            "human_default": (
                display_name: "Survivor",
                side: 1,
                health: 100,
                speed: 250.0,
            ),
            "zombie_default": (
                display_name: "Zombie",
                side: 0,
                health: 2000,
                speed: 280.0,
            ),
        },
    )"#;

    const MINIMAL_WEAPONS: &str = r#"WeaponCatalogData(
        weapons: {
            "pistol_glock": (
                display_name: "Glock-18",
                entity: "weapon_glock",
                slot: secondary,
                price: 200,
            ),
        },
    )"#;

    fn minimal_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().expect("temp dir");
        fs::write(dir.path().join("roles.ron"), MINIMAL_ROLES).expect("write roles");
        fs::write(dir.path().join("weapons.ron"), MINIMAL_WEAPONS).expect("write weapons");
        dir
    }

    #[test]
    fn test_minimal_directory_is_clean() {
        let dir = minimal_dir();
        let report = validate_data_directory(dir.path()).expect("validates");
        assert!(report.is_clean());
        assert_eq!(report.role_count, 2);
        assert_eq!(report.weapon_count, 1);
    }

    #[test]
    fn test_problems_land_in_the_report() {
        let dir = minimal_dir();
        fs::write(
            dir.path().join("weapons.ron"),
            r#"WeaponCatalogData(
                weapons: {
                    "broken": (
                        display_name: "",
                        entity: "weapon_x",
                        slot: primary,
                        price: -5,
                    ),
                },
            )"#,
        )
        .expect("write weapons");

        let report = validate_data_directory(dir.path()).expect("parses");

        assert!(!report.is_clean());
        assert_eq!(report.problems.len(), 2);
        assert!(report.problems.iter().all(|p| p.starts_with("weapons.ron")));
    }

    #[test]
    fn test_missing_directory_is_a_hard_error() {
        let result = validate_data_directory(Path::new("/no/such/dir"));
        assert!(matches!(result, Err(DataLoadError::DirectoryNotFound(_))));
    }
}

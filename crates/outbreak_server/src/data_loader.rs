//! Catalog and settings loading from RON data files.
//!
//! A data directory holds three files: [`ROLES_FILE`], [`WEAPONS_FILE`],
//! and [`SETTINGS_FILE`]. The settings file is optional; the other two
//! must parse. Validation problems inside a file that parses are logged
//! and the offending entries are skipped, so one bad role never takes
//! the whole catalog down.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{error, info, warn};

use outbreak_core::catalog::Catalog;
use outbreak_core::data::{RoleCatalogData, WeaponCatalogData};
use outbreak_core::settings::ModeSettings;

/// Role catalog file name inside a data directory.
pub const ROLES_FILE: &str = "roles.ron";

/// Weapon catalog file name inside a data directory.
pub const WEAPONS_FILE: &str = "weapons.ron";

/// Settings file name inside a data directory. Optional.
pub const SETTINGS_FILE: &str = "settings.ron";

/// Environment variable overriding the data directory search.
pub const DATA_DIR_ENV: &str = "OUTBREAK_DATA_DIR";

/// Errors that can occur while loading data files.
#[derive(Debug, Clone, Error)]
pub enum DataLoadError {
    /// Failed to read a file. Carries the path and the OS error text.
    #[error("IO error reading '{0}': {1}")]
    Io(String, String),

    /// Failed to parse RON. Carries the path and the parser's message.
    #[error("Parse error in '{0}': {1}")]
    Parse(String, String),

    /// The data directory does not exist.
    #[error("Data directory not found: {0}")]
    DirectoryNotFound(String),
}

fn read_ron<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let content = fs::read_to_string(path)
        .map_err(|e| DataLoadError::Io(path.display().to_string(), e.to_string()))?;

    ron::from_str(&content)
        .map_err(|e| DataLoadError::Parse(path.display().to_string(), e.to_string()))
}

/// Load the role catalog file.
pub fn load_role_data(path: &Path) -> Result<RoleCatalogData, DataLoadError> {
    read_ron(path)
}

/// Load the weapon catalog file.
pub fn load_weapon_data(path: &Path) -> Result<WeaponCatalogData, DataLoadError> {
    read_ron(path)
}

/// Load the settings file. A missing file is not an error; the defaults
/// apply and an info line says so.
pub fn load_settings(dir: &Path) -> Result<ModeSettings, DataLoadError> {
    let path = dir.join(SETTINGS_FILE);
    if !path.exists() {
        info!(path = %path.display(), "no settings file, using defaults");
        return Ok(ModeSettings::default());
    }

    let settings: ModeSettings = read_ron(&path)?;
    for problem in settings.validate() {
        warn!(path = %path.display(), "settings problem: {problem}");
    }
    Ok(settings)
}

/// Load the full catalog from a data directory.
///
/// Validation problems in entries that parsed are logged as warnings;
/// the conversion in [`Catalog::from_data`] drops entries it cannot
/// represent, so the returned catalog only holds usable definitions.
pub fn load_catalog(dir: &Path, settings: &ModeSettings) -> Result<Catalog, DataLoadError> {
    if !dir.exists() {
        return Err(DataLoadError::DirectoryNotFound(dir.display().to_string()));
    }

    let roles = load_role_data(&dir.join(ROLES_FILE))?;
    let weapons = load_weapon_data(&dir.join(WEAPONS_FILE))?;

    for problem in roles.validate() {
        warn!(file = ROLES_FILE, "catalog problem: {problem}");
    }
    for problem in weapons.validate() {
        warn!(file = WEAPONS_FILE, "catalog problem: {problem}");
    }

    let catalog = Catalog::from_data(&roles, &weapons, settings);
    info!(
        roles = catalog.role_count(),
        weapons = catalog.weapon_count(),
        dir = %dir.display(),
        "catalog loaded"
    );
    Ok(catalog)
}

/// Load the catalog, falling back to an empty one when loading fails.
///
/// A host never refuses to run a map over bad data files: the failure is
/// logged and the mode runs with nothing listed and nothing purchasable,
/// leaving participants on the side fallbacks.
#[must_use]
pub fn load_catalog_or_empty(dir: &Path, settings: &ModeSettings) -> Catalog {
    match load_catalog(dir, settings) {
        Ok(catalog) => catalog,
        Err(e) => {
            error!("{e}; running with an empty catalog");
            Catalog::new()
        }
    }
}

/// Collect every validation problem in a data directory without building
/// a catalog. Used by the `outbreak_tools` validator.
pub fn validate_data_dir(dir: &Path) -> Result<Vec<String>, DataLoadError> {
    if !dir.exists() {
        return Err(DataLoadError::DirectoryNotFound(dir.display().to_string()));
    }

    let mut problems = Vec::new();

    let settings = load_settings(dir)?;
    for problem in settings.validate() {
        problems.push(format!("{SETTINGS_FILE}: {problem}"));
    }

    let roles = load_role_data(&dir.join(ROLES_FILE))?;
    for problem in roles.validate() {
        problems.push(format!("{ROLES_FILE}: {problem}"));
    }

    let weapons = load_weapon_data(&dir.join(WEAPONS_FILE))?;
    for problem in weapons.validate() {
        problems.push(format!("{WEAPONS_FILE}: {problem}"));
    }

    // Cross-file checks: the settings defaults must resolve to enabled
    // roles on the right side, or every participant lands on a fallback.
    let catalog = Catalog::from_data(&roles, &weapons, &settings);
    if catalog.role(&settings.default_defender_role).is_none() {
        problems.push(format!(
            "{SETTINGS_FILE}: default_defender_role '{}' is not in {ROLES_FILE}",
            settings.default_defender_role
        ));
    }
    if catalog.role(&settings.default_infected_role).is_none() {
        problems.push(format!(
            "{SETTINGS_FILE}: default_infected_role '{}' is not in {ROLES_FILE}",
            settings.default_infected_role
        ));
    }
    if let Some(elevated) = &settings.elevated_infected_role {
        if catalog.role(elevated).is_none() {
            problems.push(format!(
                "{SETTINGS_FILE}: elevated_infected_role '{elevated}' is not in {ROLES_FILE}"
            ));
        }
    }

    Ok(problems)
}

/// Resolve the default data directory.
///
/// Checks [`DATA_DIR_ENV`] first, then standard locations relative to
/// the working directory (workspace root or the server crate).
#[must_use]
pub fn default_data_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        let path = PathBuf::from(dir);
        if path.exists() {
            return Some(path);
        }
    }

    let candidates = ["crates/outbreak_server/data", "data", "../outbreak_server/data"];
    for candidate in &candidates {
        let path = PathBuf::from(candidate);
        if path.exists() {
            return Some(path);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    use outbreak_test_utils::fixtures::{SAMPLE_ROLES_RON, SAMPLE_WEAPONS_RON};

    fn write_sample_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().expect("create temp dir");
        fs::write(dir.path().join(ROLES_FILE), SAMPLE_ROLES_RON).expect("write roles");
        fs::write(dir.path().join(WEAPONS_FILE), SAMPLE_WEAPONS_RON).expect("write weapons");
        dir
    }

    #[test]
    fn test_load_catalog_from_sample_files() {
        let dir = write_sample_dir();
        let settings = ModeSettings::default();

        let catalog = load_catalog(dir.path(), &settings).expect("catalog loads");

        assert_eq!(catalog.role_count(), 6);
        assert_eq!(catalog.weapon_count(), 9);
        assert!(catalog.role("zombie_default").is_some());
        assert!(catalog.resolve_weapon("ak").is_some());
    }

    #[test]
    fn test_missing_settings_file_uses_defaults() {
        let dir = write_sample_dir();

        let settings = load_settings(dir.path()).expect("defaults apply");

        assert_eq!(settings.default_defender_role, "human_default");
        assert!(settings.purchase_enabled);
    }

    #[test]
    fn test_settings_file_overrides_defaults() {
        let dir = write_sample_dir();
        fs::write(
            dir.path().join(SETTINGS_FILE),
            "ModeSettings(respawn_delay: 2.5, damage_cash_award: false)",
        )
        .expect("write settings");

        let settings = load_settings(dir.path()).expect("settings load");

        assert!((settings.respawn_delay - 2.5).abs() < f32::EPSILON);
        assert!(!settings.damage_cash_award);
        assert!(settings.purchase_enabled, "absent fields keep defaults");
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let settings = ModeSettings::default();
        let result = load_catalog(Path::new("/no/such/dir"), &settings);
        assert!(matches!(result, Err(DataLoadError::DirectoryNotFound(_))));
    }

    #[test]
    fn test_or_empty_fallback_keeps_the_mode_running() {
        let settings = ModeSettings::default();
        let catalog = load_catalog_or_empty(Path::new("/no/such/dir"), &settings);
        assert_eq!(catalog.role_count(), 0);
        assert_eq!(catalog.weapon_count(), 0);
    }

    #[test]
    fn test_parse_error_names_the_file() {
        let dir = write_sample_dir();
        fs::write(dir.path().join(ROLES_FILE), "RoleCatalogData(roles: {").expect("write");

        let result = load_catalog(dir.path(), &ModeSettings::default());

        match result {
            Err(DataLoadError::Parse(path, _)) => assert!(path.contains(ROLES_FILE)),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_data_dir_flags_bad_defaults() {
        let dir = write_sample_dir();
        fs::write(
            dir.path().join(SETTINGS_FILE),
            "ModeSettings(default_infected_role: \"zombie_missing\")",
        )
        .expect("write settings");

        let problems = validate_data_dir(dir.path()).expect("files parse");

        assert_eq!(problems.len(), 1);
        assert!(problems[0].contains("zombie_missing"));
    }

    #[test]
    fn test_validate_data_dir_accepts_sample_files() {
        let dir = write_sample_dir();
        let problems = validate_data_dir(dir.path()).expect("files parse");
        assert!(problems.is_empty(), "unexpected problems: {problems:?}");
    }
}

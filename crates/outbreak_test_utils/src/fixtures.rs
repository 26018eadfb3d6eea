//! Test fixtures and helpers.
//!
//! Pre-built catalogs, contexts, and scripted collaborators for consistent
//! testing across crates. The sample catalog is small but covers every
//! branch the mode cares about: a disabled role, an elevated role, roles
//! with and without regeneration, a restricted weapon, purchase caps, and
//! aliases.

use std::cell::RefCell;
use std::rc::Rc;

use outbreak_core::catalog::{Catalog, RoleDefinition, Side, WeaponDefinition, WeaponSlot};
use outbreak_core::data::{RoleCatalogData, WeaponCatalogData};
use outbreak_core::menu::{MenuPresenter, MenuRequest, MenuUnavailable};
use outbreak_core::mode::ModeContext;
use outbreak_core::session::{ParticipantId, ParticipantSession, PersistId};
use outbreak_core::settings::ModeSettings;
use outbreak_core::store::{FetchCompletion, MemoryRecordStore, PersistentRecord, RecordStore};

/// Seed shared by every fixture context, so random draws are reproducible.
pub const FIXTURE_SEED: u64 = 0x0b5e55ed;

/// Default settings plus an elevated mother-zombie role.
#[must_use]
pub fn sample_settings() -> ModeSettings {
    ModeSettings {
        elevated_infected_role: Some(String::from("zombie_mother")),
        ..ModeSettings::default()
    }
}

/// The standard test catalog.
///
/// Defenders: `human_default` (baseline), `human_runner` (fast), and
/// `human_bench` (disabled). Infected: `zombie_default` (1500 hp,
/// regenerates), `zombie_raptor` (fast, light), and `zombie_mother`
/// (elevated, forced-infection only). Weapons span every slot and include
/// the restricted AWP and capped grenades.
#[must_use]
pub fn sample_catalog() -> Catalog {
    let mut catalog = Catalog::new();

    catalog.register_role(RoleDefinition::new(
        "human_default",
        "Regular Human",
        Side::Defender,
        100,
        250.0,
    ));
    catalog.register_role(RoleDefinition::new(
        "human_runner",
        "Runner",
        Side::Defender,
        100,
        290.0,
    ));
    let mut bench = RoleDefinition::new("human_bench", "Benchwarmer", Side::Defender, 100, 250.0);
    bench.enabled = false;
    catalog.register_role(bench);

    catalog.register_role(
        RoleDefinition::new("zombie_default", "Classic Zombie", Side::Infected, 1500, 280.0)
            .with_model("models/player/zombie_classic.mdl")
            .with_regen(5, 1.0),
    );
    catalog.register_role(
        RoleDefinition::new("zombie_raptor", "Raptor", Side::Infected, 800, 330.0)
            .with_model("models/player/zombie_raptor.mdl")
            .with_regen(2, 0.5),
    );
    catalog.register_role(
        RoleDefinition::new("zombie_mother", "Mother Zombie", Side::Infected, 4000, 300.0)
            .with_model("models/player/zombie_mother.mdl")
            .with_elevated(),
    );

    catalog.register_weapon(
        WeaponDefinition::new("rifle_ak", "AK-47", "weapon_ak47", WeaponSlot::Primary, 2500)
            .with_aliases(["ak", "ak47"]),
    );
    catalog.register_weapon(WeaponDefinition::new(
        "rifle_m4",
        "M4A1",
        "weapon_m4a1",
        WeaponSlot::Primary,
        3100,
    ));
    let mut awp = WeaponDefinition::new("rifle_awp", "AWP", "weapon_awp", WeaponSlot::Primary, 4750);
    awp.restricted = true;
    catalog.register_weapon(awp);
    catalog.register_weapon(WeaponDefinition::new(
        "pistol_glock",
        "Glock-18",
        "weapon_glock",
        WeaponSlot::Secondary,
        200,
    ));
    catalog.register_weapon(WeaponDefinition::new(
        "pistol_deagle",
        "Desert Eagle",
        "weapon_deagle",
        WeaponSlot::Secondary,
        700,
    ));
    catalog.register_weapon(
        WeaponDefinition::new(
            "grenade_he",
            "High Explosive",
            "weapon_hegrenade",
            WeaponSlot::Grenade,
            300,
        )
        .with_cap(1),
    );
    catalog.register_weapon(
        WeaponDefinition::new(
            "grenade_flash",
            "Flashbang",
            "weapon_flashbang",
            WeaponSlot::Grenade,
            200,
        )
        .with_cap(2),
    );
    catalog.register_weapon(WeaponDefinition::new(
        "utility_medishot",
        "Medi-Shot",
        "weapon_healthshot",
        WeaponSlot::Utility,
        450,
    ));
    catalog.register_weapon(WeaponDefinition::new(
        "kevlar",
        "Kevlar Vest",
        "item_kevlar",
        WeaponSlot::Armor,
        650,
    ));

    catalog.resolve_defaults(&sample_settings());
    catalog
}

/// The sample role catalog as it would appear in a data file.
pub const SAMPLE_ROLES_RON: &str = r#"RoleCatalogData(
    roles: {
        "human_default": (
            display_name: "Regular Human",
            side: 1,
            health: 100,
            speed: 250.0,
        ),
        "human_runner": (
            display_name: "Runner",
            side: 1,
            health: 100,
            speed: 290.0,
        ),
        "human_bench": (
            display_name: "Benchwarmer",
            side: 1,
            health: 100,
            speed: 250.0,
            enabled: false,
        ),
        "zombie_default": (
            display_name: "Classic Zombie",
            side: 0,
            model: "models/player/zombie_classic.mdl",
            health: 1500,
            speed: 280.0,
            regen_amount: 5,
            regen_interval: 1.0,
        ),
        "zombie_raptor": (
            display_name: "Raptor",
            side: 0,
            model: "models/player/zombie_raptor.mdl",
            health: 800,
            speed: 330.0,
            regen_amount: 2,
            regen_interval: 0.5,
        ),
        "zombie_mother": (
            display_name: "Mother Zombie",
            side: 0,
            model: "models/player/zombie_mother.mdl",
            health: 4000,
            speed: 300.0,
            elevated: true,
        ),
    },
)"#;

/// The sample weapon catalog as it would appear in a data file.
pub const SAMPLE_WEAPONS_RON: &str = r#"WeaponCatalogData(
    weapons: {
        "rifle_ak": (
            display_name: "AK-47",
            entity: "weapon_ak47",
            slot: primary,
            price: 2500,
            aliases: ["ak", "ak47"],
        ),
        "rifle_m4": (
            display_name: "M4A1",
            entity: "weapon_m4a1",
            slot: primary,
            price: 3100,
        ),
        "rifle_awp": (
            display_name: "AWP",
            entity: "weapon_awp",
            slot: primary,
            price: 4750,
            restricted: true,
        ),
        "pistol_glock": (
            display_name: "Glock-18",
            entity: "weapon_glock",
            slot: secondary,
            price: 200,
        ),
        "pistol_deagle": (
            display_name: "Desert Eagle",
            entity: "weapon_deagle",
            slot: secondary,
            price: 700,
        ),
        "grenade_he": (
            display_name: "High Explosive",
            entity: "weapon_hegrenade",
            slot: grenade,
            price: 300,
            purchase_cap: 1,
        ),
        "grenade_flash": (
            display_name: "Flashbang",
            entity: "weapon_flashbang",
            slot: grenade,
            price: 200,
            purchase_cap: 2,
        ),
        "utility_medishot": (
            display_name: "Medi-Shot",
            entity: "weapon_healthshot",
            slot: utility,
            price: 450,
        ),
        "kevlar": (
            display_name: "Kevlar Vest",
            entity: "item_kevlar",
            slot: armor,
            price: 650,
        ),
    },
)"#;

/// Build the sample catalog through the data-file path instead of the
/// builders, so loader tests and core tests agree on content.
#[must_use]
pub fn sample_catalog_from_ron() -> Catalog {
    let roles: RoleCatalogData =
        ron::from_str(SAMPLE_ROLES_RON).expect("sample role RON is valid");
    let weapons: WeaponCatalogData =
        ron::from_str(SAMPLE_WEAPONS_RON).expect("sample weapon RON is valid");
    Catalog::from_data(&roles, &weapons, &sample_settings())
}

/// A context over the sample settings and catalog with a fixed seed.
#[must_use]
pub fn sample_context() -> ModeContext {
    ModeContext::new(sample_settings(), sample_catalog(), FIXTURE_SEED)
}

/// Insert a living participant on the given side: full health, $10,000,
/// standing in a buy zone, with a stable identity.
pub fn join_side(ctx: &mut ModeContext, name: &str, side: Side) -> ParticipantId {
    let persist = PersistId(9_000 + ctx.sessions.len() as u64);
    let mut session = ParticipantSession::new(name, Some(persist), false);
    session.side = Some(side);
    session.alive = true;
    session.health = 100;
    session.balance = 10_000;
    session.in_buy_zone = true;
    ctx.sessions.insert(session)
}

/// Insert a living defender. See [`join_side`].
pub fn join_defender(ctx: &mut ModeContext, name: &str) -> ParticipantId {
    join_side(ctx, name, Side::Defender)
}

/// Insert a living infected participant. See [`join_side`].
pub fn join_infected(ctx: &mut ModeContext, name: &str) -> ParticipantId {
    join_side(ctx, name, Side::Infected)
}

/// A menu presenter that records what it is asked to show.
///
/// The default instance accepts every request; [`ScriptedMenu::failing`]
/// refuses them all, standing in for a host without menu capability.
#[derive(Debug, Default)]
pub struct ScriptedMenu {
    requests: Vec<MenuRequest>,
    closes: Vec<ParticipantId>,
    fail: bool,
}

impl ScriptedMenu {
    /// A presenter that refuses every request.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Every request presented so far, oldest first.
    #[must_use]
    pub fn presented(&self) -> &[MenuRequest] {
        &self.requests
    }

    /// Every close call so far.
    #[must_use]
    pub fn closes(&self) -> &[ParticipantId] {
        &self.closes
    }
}

impl MenuPresenter for ScriptedMenu {
    fn present(
        &mut self,
        _participant: ParticipantId,
        request: MenuRequest,
    ) -> Result<(), MenuUnavailable> {
        if self.fail {
            return Err(MenuUnavailable);
        }
        self.requests.push(request);
        Ok(())
    }

    fn close(&mut self, participant: ParticipantId) {
        self.closes.push(participant);
    }
}

/// A cloneable record store for facade tests: the test keeps one handle to
/// seed and inspect records while the mode owns another.
#[derive(Debug, Clone, Default)]
pub struct SharedRecordStore {
    inner: Rc<RefCell<MemoryRecordStore>>,
}

impl SharedRecordStore {
    /// Seed a record, as if a previous session had written it.
    pub fn seed(&self, id: PersistId, record: PersistentRecord) {
        self.inner.borrow_mut().seed(id, record);
    }

    /// Read back a stored record.
    #[must_use]
    pub fn stored(&self, id: PersistId) -> Option<PersistentRecord> {
        self.inner.borrow().stored(id).cloned()
    }

    /// Whether nothing has been stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }
}

impl RecordStore for SharedRecordStore {
    fn request_fetch(&mut self, participant: ParticipantId, id: PersistId) {
        self.inner.borrow_mut().request_fetch(participant, id);
    }

    fn request_store(&mut self, id: PersistId, record: PersistentRecord) {
        self.inner.borrow_mut().request_store(id, record);
    }

    fn drain_completions(&mut self) -> Vec<FetchCompletion> {
        self.inner.borrow_mut().drain_completions()
    }
}

//! Outbreak mode demo host.
//!
//! Loads the catalog from RON data files, opens the JSON record store,
//! and drives a scripted session through the mode: connects, spawns, an
//! outbreak, purchases, a death and respawn. Every effect the core
//! produces is logged the way an engine bridge would apply it.
//!
//! # Usage
//!
//! ```bash
//! # Run the scripted demo with the shipped data files
//! cargo run -p outbreak_server
//!
//! # Point at another data directory and record file
//! cargo run -p outbreak_server -- --data-dir mod/data --store-file mod/records.json
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use outbreak_core::catalog::Side;
use outbreak_core::event::GameEvent;
use outbreak_core::menu::NullMenuPresenter;
use outbreak_core::mode::GameMode;
use outbreak_core::session::PersistId;

use outbreak_server::data_loader::{self, load_catalog_or_empty, load_settings};
use outbreak_server::runtime::{log_effect, TickDriver};
use outbreak_server::store::JsonRecordStore;

#[derive(Parser)]
#[command(name = "outbreak_server")]
#[command(about = "Scripted demo host for the outbreak game mode")]
#[command(version)]
struct Cli {
    /// Data directory holding roles.ron, weapons.ron, settings.ron
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Record file for persistent participant data
    #[arg(short, long, default_value = "records.json")]
    store_file: PathBuf,

    /// Seed for role draws
    #[arg(long, default_value = "1984")]
    seed: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    let Some(data_dir) = cli.data_dir.or_else(data_loader::default_data_dir) else {
        error!("no data directory found; pass --data-dir or set OUTBREAK_DATA_DIR");
        std::process::exit(1);
    };

    let settings = match load_settings(&data_dir) {
        Ok(settings) => settings,
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };
    let catalog = load_catalog_or_empty(&data_dir, &settings);

    let store = match JsonRecordStore::open(&cli.store_file).await {
        Ok(store) => store,
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };

    let mode = GameMode::with_collaborators(
        settings,
        catalog,
        cli.seed,
        Box::new(NullMenuPresenter),
        Box::new(store.clone()),
    );
    let mut driver = TickDriver::new(mode);

    run_script(&mut driver);

    store.flush().await;
    info!(records = store.len(), "demo finished, store flushed");
}

/// One scripted session: a connect wave, an outbreak, purchases, and a
/// death-and-respawn cycle.
fn run_script(driver: &mut TickDriver) {
    let respawn_delay = driver.mode().settings().respawn_delay;
    let mut apply = |effect| log_effect(&effect);

    info!("--- connect wave ---");
    let alice = driver
        .mode()
        .connect("Alice", Some(PersistId(1001)), false, true);
    let bob = driver
        .mode()
        .connect("Bob", Some(PersistId(1002)), false, false);
    let eve = driver
        .mode()
        .connect("Eve", Some(PersistId(1003)), false, false);
    for participant in [alice, bob, eve] {
        driver.mode().handle_event(GameEvent::SideChanged {
            participant,
            side: Some(Side::Defender),
        });
        driver.mode().handle_event(GameEvent::Spawned { participant });
        driver.mode().handle_event(GameEvent::BalanceSet {
            participant,
            balance: 16_000,
        });
        driver.mode().handle_event(GameEvent::BuyZone {
            participant,
            inside: true,
        });
    }
    driver.run_secs(1.0, &mut apply);

    info!("--- round start and purchases ---");
    driver.mode().handle_event(GameEvent::RoundStarted);
    driver.mode().handle_event(GameEvent::Command {
        participant: alice,
        name: String::from("ak"),
        args: Vec::new(),
    });
    driver.mode().handle_event(GameEvent::Command {
        participant: eve,
        name: String::from("awp"),
        args: Vec::new(),
    });
    driver.mode().handle_event(GameEvent::Command {
        participant: alice,
        name: String::from("unrestrict"),
        args: vec![String::from("awp")],
    });
    driver.mode().handle_event(GameEvent::Command {
        participant: eve,
        name: String::from("awp"),
        args: Vec::new(),
    });
    driver.run_secs(1.0, &mut apply);

    info!("--- outbreak ---");
    driver.mode().handle_event(GameEvent::InfectionStarted);
    driver.mode().infect(eve);
    driver.run_secs(1.0, &mut apply);

    info!("--- combat ---");
    driver.mode().handle_event(GameEvent::Hurt {
        victim: bob,
        attacker: Some(eve),
        damage: 37,
        health_remaining: 63,
    });
    driver.mode().handle_event(GameEvent::Died {
        victim: bob,
        attacker: Some(eve),
    });
    driver.run_secs(respawn_delay + 1.0, &mut apply);
    driver.mode().handle_event(GameEvent::Spawned { participant: bob });
    driver.run_secs(1.0, &mut apply);

    info!("--- round end ---");
    driver.mode().handle_event(GameEvent::RoundEnded);
    driver.run_secs(1.0, &mut apply);

    for participant in [alice, bob, eve] {
        driver.mode().disconnect(participant);
    }
}

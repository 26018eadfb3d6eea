//! Outbreak Mode - Development Tools

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use outbreak_server::data_loader;

#[derive(Parser)]
#[command(name = "outbreak-tools")]
#[command(about = "Development tools for the outbreak game mode")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate data files
    Validate {
        /// Path to the data directory (defaults to the shipped files)
        #[arg(short, long)]
        data_dir: Option<PathBuf>,
    },

    /// List the contents of a record file
    Records {
        /// Path to the record file
        #[arg(default_value = "records.json")]
        file: PathBuf,
    },
}

fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { data_dir } => {
            let Some(path) = data_dir.or_else(data_loader::default_data_dir) else {
                tracing::error!("no data directory found; pass --data-dir or set OUTBREAK_DATA_DIR");
                std::process::exit(1);
            };
            tracing::info!("Validating data files in: {}", path.display());
            match outbreak_tools::validate::validate_data_directory(&path) {
                Ok(report) if report.is_clean() => {
                    tracing::info!(
                        roles = report.role_count,
                        weapons = report.weapon_count,
                        "Validation passed"
                    );
                }
                Ok(report) => {
                    for problem in &report.problems {
                        tracing::warn!("{problem}");
                    }
                    tracing::error!("Validation failed: {} problem(s)", report.problems.len());
                    std::process::exit(1);
                }
                Err(e) => {
                    tracing::error!("Validation failed: {e}");
                    std::process::exit(1);
                }
            }
        }
        Commands::Records { file } => match outbreak_tools::records::load_records(&file) {
            Ok(records) => {
                for (id, record) in &records {
                    println!("{}", outbreak_tools::records::describe(*id, record));
                }
                tracing::info!(count = records.len(), "record file read");
            }
            Err(e) => {
                tracing::error!("{e}");
                std::process::exit(1);
            }
        },
    }
}

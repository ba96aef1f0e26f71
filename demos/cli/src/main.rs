use std::path::{Path, PathBuf};

use anyhow::Context;
use burden_core::{BurdenConfig, RegisteredPatient};
use burden_facilities::FacilityStore;
use burden_model::{compute_burden_str, WaitingRoom};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "burden-cli",
    about = "Estimate waiting-room burden for emergency department patients."
)]
struct Args {
    /// JSON file overriding the default model parameters.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute the burden curve for one visit descriptor.
    Compute {
        /// Path to the visit JSON.
        #[arg(short, long)]
        input: PathBuf,
        #[arg(long)]
        pretty: bool,
    },
    /// List the facilities in the reference snapshot.
    Facilities,
    /// Recompute a list of registered patients as of now and print the board.
    Board {
        /// Path to a JSON array of registered patients.
        #[arg(short, long)]
        input: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;
    let store = FacilityStore::alberta().context("Bundled facility snapshot is invalid")?;
    tracing::debug!(facilities = store.len(), "facility snapshot loaded");

    match args.command {
        Command::Compute { input, pretty } => {
            let data = read_input(&input)?;
            let result = compute_burden_str(&data, &store, &config)
                .with_context(|| format!("Could not compute burden for {input:?}"))?;
            let json = if pretty {
                serde_json::to_string_pretty(&result)?
            } else {
                serde_json::to_string(&result)?
            };
            println!("{json}");
        }
        Command::Facilities => {
            let provenance = store.provenance();
            println!(
                "Source: {} / {}\nCaptured at: {}",
                provenance.source.wait_times, provenance.source.lwbs, provenance.snapshot_taken_at
            );
            for facility in store.facilities() {
                println!(
                    "{:>2}  {:<34} {:<12} {:>4} min",
                    facility.id, facility.name, facility.city, facility.average_wait_minutes
                );
            }
        }
        Command::Board { input } => {
            let data = read_input(&input)?;
            let patients: Vec<RegisteredPatient> = serde_json::from_str(&data)
                .with_context(|| format!("Could not parse patients in {input:?}"))?;

            let mut room = WaitingRoom::new(store, config)?;
            for patient in patients {
                room.register(patient)?;
            }
            room.recompute_all(chrono::Utc::now());

            for patient in room.board() {
                println!(
                    "{:<12} {:<6} {:>6.1}  {}",
                    patient.id,
                    patient
                        .alert_level
                        .map(|level| level.as_str())
                        .unwrap_or("-"),
                    patient.burden_index.unwrap_or(0.0),
                    patient.assigned_hospital_key
                );
            }
        }
    }

    Ok(())
}

fn read_input(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Could not read file {path:?}"))
}

fn load_config(path: Option<&Path>) -> anyhow::Result<BurdenConfig> {
    let Some(path) = path else {
        return Ok(BurdenConfig::default());
    };
    let data = read_input(path)?;
    let config: BurdenConfig = serde_json::from_str(&data)
        .with_context(|| format!("Could not parse config {path:?}"))?;
    config.validate()?;
    Ok(config)
}

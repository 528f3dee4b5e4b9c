//! # eventure
//!
//! Command-line front end: inspect saved event files, walk cascades, and run
//! the bundled simulation.

#![deny(unsafe_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use eventure::render::{render_cascade_report, render_summary, render_tick};
use eventure::{demo, init_logging, EventLog, EventureSettings, IdGenerator, LogConfig};
use tracing::{info, warn};

/// Inspect and replay eventure event files.
#[derive(Parser, Debug)]
#[command(name = "eventure", version, about = "Inspect and replay eventure event files")]
struct Cli {
    /// Settings file (defaults to `~/.eventure/settings.json`).
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Event count, tick span and per-type counts.
    Inspect {
        /// Event file; falls back to `storage.logPath`.
        file: Option<PathBuf>,
    },
    /// List the events recorded at one tick.
    Tick {
        /// Event file.
        file: PathBuf,
        /// Tick to list.
        tick: u64,
    },
    /// Tree view of everything caused by one event.
    Cascade {
        /// Event file.
        file: PathBuf,
        /// Root event ID, e.g. `0-FCFB-1`.
        id: String,
    },
    /// Run the bundled simulation and save its log.
    Demo {
        /// Ticks to simulate.
        #[arg(long, default_value_t = 8)]
        ticks: u64,
        /// Output file; falls back to `storage.logPath`, then `events.jsonl`.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn log_config(settings: &EventureSettings) -> LogConfig {
    LogConfig {
        level: settings.logging.level.clone(),
        json: settings.logging.json,
        module_levels: settings
            .logging
            .module_levels
            .iter()
            .map(|(module, level)| (module.clone(), level.clone()))
            .collect(),
    }
}

fn load_log(path: &Path) -> Result<EventLog> {
    EventLog::load(path).with_context(|| format!("failed to load {}", path.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = match &cli.settings {
        Some(path) => eventure_settings::load_settings_from_path(path),
        None => eventure_settings::load_settings(),
    }
    .context("failed to load settings")?;
    init_logging(&log_config(&settings)).context("failed to initialise logging")?;

    match cli.command {
        Command::Inspect { file } => {
            let Some(path) = file.or_else(|| settings.storage.log_path.clone()) else {
                bail!("no event file given and storage.logPath is not set");
            };
            let log = load_log(&path)?;
            print!("{}", render_summary(&log));
        }
        Command::Tick { file, tick } => {
            let log = load_log(&file)?;
            print!("{}", render_tick(&log, tick));
        }
        Command::Cascade { file, id } => {
            let log = load_log(&file)?;
            let report = log.cascade_report(&id);
            if !report.is_clean() {
                warn!(anomalies = report.anomalies.len(), "cascade is not a tree");
            }
            match render_cascade_report(&report, &id) {
                Some(tree) => print!("{tree}"),
                None => bail!("no event with id {id} in {}", file.display()),
            }
        }
        Command::Demo { ticks, out } => {
            let path = out
                .or_else(|| settings.storage.log_path.clone())
                .unwrap_or_else(|| PathBuf::from("events.jsonl"));
            let ids = Arc::new(IdGenerator::with_type_hash_len(settings.ids.type_hash_len));
            let run = demo::run(ticks, ids);
            run.log
                .save(&path)
                .with_context(|| format!("failed to save {}", path.display()))?;
            info!(path = %path.display(), events = run.log.len(), "demo log saved");
            println!("wrote {} event(s) to {}", run.log.len(), path.display());
        }
    }
    Ok(())
}

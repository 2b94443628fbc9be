#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! # gpsinfo
//!
//! Offline GPS readout. Reads a stream of raw fixes and prints the current
//! latitude, longitude, accuracy, altitude, speed and nearest large city
//! after every fix, plus distance and altitude difference to a reference
//! marker when one is set.
//!
//! ## Subcommands
//!
//! - `gpsinfo run` (default): process a fix stream from a file or stdin
//! - `gpsinfo nearest --lat <deg> --lon <deg>`: one-off closest-city lookup
//! - `gpsinfo import-cities --csv <in> --out <out>`: build a gazetteer JSON
//!   file from a local world-cities CSV
//!
//! ## Architecture
//!
//! ```text
//! main.rs          entry point, clap subcommands, tracing setup
//! app.rs           event loop: gazetteer handoff, fix channel, shutdown
//! processor.rs     LocationProcessor (snapshot, debounce, marker)
//! gazetteer.rs     city list, closest-city scan, loader, CSV import
//! readout.rs       labelled display table
//! source.rs        JSON-lines fix reader task
//! config.rs        TOML + env-var configuration
//! ```

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::{error, info};

use gpsinfo::app;
use gpsinfo::config::{fixes_path, Config};
use gpsinfo::gazetteer;
use gpsinfo::geo::Coordinate;

/// Offline GPS readout with nearest-city lookup.
#[derive(Parser)]
#[command(name = "gpsinfo", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Process a fix stream and print a readout after every event (default).
    Run {
        /// Path to TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Newline-delimited JSON events; `-` or omitted reads stdin.
        #[arg(long)]
        fixes: Option<PathBuf>,
        /// Gazetteer JSON file.
        #[arg(long)]
        gazetteer: Option<PathBuf>,
    },
    /// Print the closest city to a coordinate.
    Nearest {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        /// Path to TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Gazetteer JSON file.
        #[arg(long)]
        gazetteer: Option<PathBuf>,
    },
    /// Convert a world-cities CSV (city, lat, lng columns) into gazetteer JSON.
    ImportCities {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long)]
        out: PathBuf,
    },
}

fn init_tracing(config: &Config) {
    let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| config.logging.level.clone());
    tracing_subscriber::fmt()
        .with_env_filter(log_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<Config, ()> {
    Config::load(path.map(PathBuf::as_path)).map_err(|e| {
        // Tracing is not up yet, the log level comes from this config.
        eprintln!("gpsinfo: {e}");
    })
}

async fn run_pipeline(
    config_path: Option<&PathBuf>,
    fixes: Option<PathBuf>,
    gazetteer: Option<PathBuf>,
) -> Result<(), ()> {
    let mut config = load_config(config_path)?;
    init_tracing(&config);

    if let Some(fixes) = fixes {
        config.source.path = fixes_path(fixes);
    }
    if let Some(gazetteer) = gazetteer {
        config.gazetteer.path = Some(gazetteer);
    }

    info!("gpsinfo v{} starting", env!("CARGO_PKG_VERSION"));
    app::run(&config).await.map_err(|e| {
        error!("{e}");
    })
}

async fn run_nearest(
    config_path: Option<&PathBuf>,
    at: Coordinate,
    gazetteer: Option<PathBuf>,
) -> Result<(), ()> {
    let config = load_config(config_path)?;
    init_tracing(&config);

    let Some(path) = gazetteer.or(config.gazetteer.path) else {
        error!("No gazetteer given: pass --gazetteer or set gazetteer.path");
        return Err(());
    };
    let line = app::nearest(&path, at, config.processor.search_radius_m)
        .await
        .map_err(|e| {
            error!("{e}");
        })?;
    println!("{line}");
    Ok(())
}

fn run_import(csv: &Path, out: &Path) -> Result<(), ()> {
    init_tracing(&Config::default());
    let count = gazetteer::import_cities(csv, out).map_err(|e| {
        error!("{e}");
    })?;
    println!("{count} cities written to {}", out.display());
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Run {
            config,
            fixes,
            gazetteer,
        }) => run_pipeline(config.as_ref(), fixes, gazetteer).await,
        Some(Commands::Nearest {
            lat,
            lon,
            config,
            gazetteer,
        }) => run_nearest(config.as_ref(), Coordinate::new(lat, lon), gazetteer).await,
        Some(Commands::ImportCities { csv, out }) => run_import(&csv, &out),
        None => run_pipeline(None, None, None).await,
    };

    // Exit directly: a blocked stdin read would otherwise hold up runtime shutdown.
    std::process::exit(i32::from(result.is_err()));
}

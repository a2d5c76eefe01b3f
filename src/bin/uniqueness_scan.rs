use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use glam::{DMat2, DVec2};
use serde::Deserialize;

use gridcodingrange::{
    compute_grid_uniqueness_hypercube, find_grid_code_zero, interrupt, PhaseModule,
    PlaneProjection, UniquenessError,
};

/// One module in the geometry file: the two rows of its 2xN projection and
/// the two rows of its 2x2 lattice basis (whose columns are the basis
/// vectors).
#[derive(Deserialize)]
struct ModuleSpec {
    domain_to_plane: [Vec<f64>; 2],
    lattice_basis: [[f64; 2]; 2],
}

#[derive(Parser)]
#[command(
    name = "uniqueness_scan",
    about = "Search a multi-module grid code for grid-code-zero points"
)]
struct Cli {
    /// Path to a JSON file containing an array of module definitions.
    #[arg(long)]
    geometry: PathBuf,

    /// Readout resolution of the grid code.
    #[arg(long, default_value_t = 0.2)]
    resolution: f64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decide whether one hyperrectangle contains a grid-code-zero point.
    Probe {
        /// Lower corner of the hyperrectangle, comma separated.
        #[arg(long, value_delimiter = ',', required = true)]
        x0: Vec<f64>,
        /// Extent of the hyperrectangle per axis, comma separated.
        #[arg(long, value_delimiter = ',', required = true)]
        dims: Vec<f64>,
    },
    /// Expand a hypercube from the origin until a grid-code-zero point
    /// appears outside it.
    Uniqueness {
        /// Diameter of the central region to ignore.
        #[arg(long, default_value_t = 0.5)]
        ignored_center: f64,
        /// Abort the expansion after this many seconds.
        #[arg(long)]
        max_seconds: Option<f64>,
    },
}

fn load_modules(path: &PathBuf) -> Result<Vec<PhaseModule>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read geometry file {}", path.display()))?;
    let specs: Vec<ModuleSpec> =
        serde_json::from_str(&text).context("parse geometry file")?;

    specs
        .iter()
        .enumerate()
        .map(|(i, spec)| {
            let projection = PlaneProjection::from_rows(&spec.domain_to_plane)
                .with_context(|| format!("module {}: bad projection", i))?;
            let rows = spec.lattice_basis;
            let basis = DMat2::from_cols(
                DVec2::new(rows[0][0], rows[1][0]),
                DVec2::new(rows[0][1], rows[1][1]),
            );
            PhaseModule::new(projection, basis)
                .with_context(|| format!("module {}: bad lattice basis", i))
        })
        .collect()
}

fn format_point(point: &[f64]) -> String {
    let coords: Vec<String> = point.iter().map(|v| format!("{:.6}", v)).collect();
    format!("[{}]", coords.join(", "))
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let modules = load_modules(&cli.geometry)?;

    match cli.command {
        Command::Probe { x0, dims } => {
            let mut witness = vec![0.0; x0.len()];
            let found = find_grid_code_zero(
                &modules,
                &x0,
                &dims,
                cli.resolution,
                Some(&mut witness),
            )?;
            if found {
                println!("grid code zero found at {}", format_point(&witness));
            } else {
                println!("no grid code zero in the queried hyperrectangle");
            }
        }
        Command::Uniqueness {
            ignored_center,
            max_seconds,
        } => {
            if let Some(seconds) = max_seconds {
                thread::spawn(move || {
                    thread::sleep(Duration::from_secs_f64(seconds));
                    interrupt::request_stop();
                });
            }

            match compute_grid_uniqueness_hypercube(&modules, cli.resolution, ignored_center)
            {
                Ok((radius, witness)) => {
                    println!("hypercube half-side bound: {}", radius);
                    println!("grid code zero found at {}", format_point(&witness));
                }
                Err(UniquenessError::Interrupted) => {
                    println!("search interrupted before a grid code zero was found");
                }
                Err(other) => return Err(other.into()),
            }
        }
    }

    Ok(())
}

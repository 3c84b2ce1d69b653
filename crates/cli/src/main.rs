//! Command-line surface for avalanche runout estimation.
//!
//! Reads a terrain DEM (ESRI ASCII grid) and a GeoJSON file of trigger
//! points, evaluates the alpha-angle reachability test for every trigger and
//! writes the accumulated runout mask as a geo-referenced ASCII grid ready
//! for external vectorization (`gdal_polygonize` + `ogr2ogr`).

mod ascii_grid;
mod error;
mod geojson;

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use runout_core::{
    evaluate, evaluate_sequential, CoordinateTransform, IdentityProjection, RunoutConfig,
    TerrainGrid, TriggerSet, WebMercator,
};

use crate::ascii_grid::AsciiGrid;
use crate::error::CliError;

/// Runout estimation from a DEM and a set of trigger points.
///
/// Trigger points should mark the highest point of a potential avalanche
/// path; markers and the waypoints of lines, routes and tracks all work.
#[derive(Parser, Debug)]
#[command(name = "runout")]
#[command(about = "Estimate avalanche runout extent from a terrain DEM and trigger points", long_about = None)]
struct Args {
    /// Terrain DEM in ESRI ASCII grid format
    #[arg(short, long)]
    dem: PathBuf,

    /// GeoJSON file with trigger point features
    #[arg(short, long)]
    triggers: PathBuf,

    /// Alpha (runout) angle in degrees
    #[arg(short, long, default_value_t = RunoutConfig::DEFAULT_ANGLE_DEGREES)]
    alpha: f64,

    /// Output runout mask, ESRI ASCII grid with 1 marking runout cells
    #[arg(short, long, default_value = "runout.asc")]
    output: PathBuf,

    /// CRS identifier of the DEM's planar coordinates
    #[arg(long, default_value = "EPSG:3857")]
    dem_crs: String,

    /// Trigger coordinates: lonlat (projected via web mercator) or grid (already in the DEM CRS)
    #[arg(long, default_value = "lonlat")]
    trigger_crs: String,

    /// Evaluate triggers one at a time instead of in parallel
    #[arg(long)]
    sequential: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), CliError> {
    // Everything that can fail fails here, before the evaluation loop
    let config = RunoutConfig::new(args.alpha)?;

    let source = AsciiGrid::read(&args.dem, &args.dem_crs)?;
    let grid = TerrainGrid::from_source(&source)?;
    info!(
        width = grid.width(),
        height = grid.height(),
        crs = grid.crs(),
        "Loaded DEM"
    );

    let text = fs::read_to_string(&args.triggers)
        .map_err(|e| CliError::TriggerRead(format!("{}: {e}", args.triggers.display())))?;
    let geometries = geojson::parse_triggers(&text)?;

    let triggers = match args.trigger_crs.as_str() {
        "lonlat" => {
            let projection = WebMercator;
            if grid.crs() != projection.target_crs() {
                return Err(CliError::CrsMismatch {
                    grid: grid.crs().to_string(),
                    triggers: projection.target_crs().to_string(),
                });
            }
            TriggerSet::from_geometries(&geometries, &projection, &grid)
        }
        "grid" => {
            TriggerSet::from_geometries(&geometries, &IdentityProjection::new(grid.crs()), &grid)
        }
        other => {
            return Err(CliError::InvalidArgument(format!(
                "--trigger-crs must be lonlat or grid, got {other}"
            )));
        }
    };
    info!(
        triggers = triggers.len(),
        duplicates_dropped = triggers.duplicates_dropped(),
        sampling_gaps = triggers.sampling_gaps(),
        "Prepared triggers"
    );

    let outcome = if args.sequential {
        evaluate_sequential(&grid, &triggers, &config)
    } else {
        evaluate(&grid, &triggers, &config)
    };

    ascii_grid::write_mask(&args.output, &outcome)?;

    println!("=== Runout Evaluation Complete ===");
    println!(
        "Triggers evaluated: {} ({} skipped)",
        outcome.triggers_evaluated, outcome.triggers_skipped
    );
    println!(
        "Cells in runout zone: {} of {}",
        outcome.mask.count_set(),
        grid.width() * grid.height()
    );
    println!("Mask written to {}", args.output.display());

    Ok(())
}

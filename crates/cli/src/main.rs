#![deny(unsafe_code)]
//! CLI driver for geofield grids.
//!
//! Subcommands:
//! - `info <grid>` — geometry, extent and value range of a descriptor
//! - `sample <grid>` — nearest and interpolated value at a coordinate
//! - `derive <grid>` — magnitude or direction grid from a vector grid
//! - `advect <grid>` — run particle advection headlessly

mod error;
mod input;
mod logger;

use clap::{ArgAction, Parser, Subcommand};
use error::CliError;
use geofield_advection::{ParticleAdvector, Segment, StepStats};
use geofield_core::{
    CellValue, Extent, Field, FieldValue, GridGeometry, LonLat, Range, ScalarKind,
};
use input::GridFile;
use serde::Serialize;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser)]
#[command(name = "geofield", about = "Query and animate lon/lat grid fields")]
struct Cli {
    /// Output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Log to stderr; repeat for more detail.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print geometry, extent, continuity and value range of a grid.
    Info {
        /// Grid descriptor JSON.
        grid: PathBuf,

        /// GeoJSON polygon restricting the field.
        #[arg(long)]
        mask: Option<PathBuf>,
    },
    /// Sample a grid at one coordinate.
    Sample {
        /// Grid descriptor JSON.
        grid: PathBuf,

        /// Longitude in degrees.
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        /// Latitude in degrees.
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        /// GeoJSON polygon restricting the field.
        #[arg(long)]
        mask: Option<PathBuf>,
    },
    /// Derive a scalar grid from a vector grid.
    Derive {
        /// Vector grid descriptor JSON.
        grid: PathBuf,

        /// magnitude, direction-to or direction-from.
        #[arg(short, long, default_value = "magnitude")]
        kind: ScalarKind,

        /// Output file; stdout when omitted.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Advect particles through a vector grid and report the segments.
    Advect {
        /// Vector grid descriptor JSON.
        grid: PathBuf,

        /// Number of ticks to run.
        #[arg(short, long, default_value_t = 100)]
        steps: usize,

        /// Advector parameters as a JSON string.
        #[arg(long, default_value = "{}")]
        params: String,

        /// PRNG seed, overriding any seed in --params.
        #[arg(long)]
        seed: Option<u64>,

        /// Visible area as xmin,ymin,xmax,ymax.
        #[arg(long, value_parser = parse_viewport, allow_hyphen_values = true)]
        viewport: Option<Extent>,

        /// GeoJSON polygon restricting the field.
        #[arg(long)]
        mask: Option<PathBuf>,

        /// Write the last tick's segments to this file.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Serialize)]
struct InfoReport {
    kind: &'static str,
    geometry: GridGeometry,
    extent: Extent,
    continuous: bool,
    longitude_needs_wrapping: bool,
    valid_cells: usize,
    masked: bool,
    range: Option<Range>,
}

#[derive(Serialize)]
struct SampleReport {
    position: LonLat,
    contains: bool,
    has_value: bool,
    value: Option<CellValue>,
    interpolated: Option<CellValue>,
}

#[derive(Serialize)]
struct AdvectReport {
    steps: usize,
    particles: usize,
    segments: usize,
    last_tick_segments: usize,
    respawned: usize,
    expired: usize,
    magnitude: Option<Range>,
    params: Value,
}

fn parse_viewport(s: &str) -> Result<Extent, String> {
    let parts = s
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid viewport '{s}': {e}"))?;
    match parts.as_slice() {
        &[xmin, ymin, xmax, ymax] if xmin <= xmax && ymin <= ymax => {
            Ok(Extent::new(xmin, ymin, xmax, ymax))
        }
        _ => Err(format!(
            "invalid viewport '{s}': expected xmin,ymin,xmax,ymax with min <= max"
        )),
    }
}

fn load(grid: &Path, mask: Option<&Path>) -> Result<GridFile, CliError> {
    let mut field = input::load_grid(grid)?;
    if let Some(mask) = mask {
        field.set_spatial_mask(input::load_mask(mask)?);
    }
    Ok(field)
}

fn info<T: FieldValue>(kind: &'static str, field: &Field<T>) -> InfoReport {
    InfoReport {
        kind,
        geometry: *field.geometry(),
        extent: field.extent(),
        continuous: field.is_continuous(),
        longitude_needs_wrapping: field.longitude_needs_wrapping(),
        valid_cells: field.values().iter().flatten().count(),
        masked: field.spatial_mask().is_some(),
        range: field.range(),
    }
}

fn sample<T: FieldValue>(field: &Field<T>, lon: f64, lat: f64) -> SampleReport {
    SampleReport {
        position: LonLat::new(lon, lat),
        contains: field.contains(lon, lat),
        has_value: field.has_value_at(lon, lat),
        value: field.value_at(lon, lat).map(FieldValue::to_cell_value),
        interpolated: field
            .interpolated_value_at(lon, lat)
            .map(FieldValue::to_cell_value),
    }
}

fn describe(value: Option<CellValue>) -> String {
    match value {
        Some(CellValue::Scalar(z)) => format!("{z}"),
        Some(CellValue::Vector(v)) => format!(
            "({}, {}) magnitude {:.3}, to {:.1}°",
            v.u(),
            v.v(),
            v.magnitude(),
            v.direction_to()
        ),
        None => "no data".into(),
    }
}

fn magnitude_range(range: Option<Range>, segments: &[Segment]) -> Option<Range> {
    segments.iter().fold(range, |acc, s| {
        Some(match acc {
            Some(r) => Range {
                min: r.min.min(s.magnitude),
                max: r.max.max(s.magnitude),
            },
            None => Range {
                min: s.magnitude,
                max: s.magnitude,
            },
        })
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Info { grid, mask } => {
            let field = load(&grid, mask.as_deref())?;
            let report = match &field {
                GridFile::Scalar(f) => info(field.kind(), f),
                GridFile::Vector(f) => info(field.kind(), f),
            };
            if cli.json {
                print_json(&report)?;
            } else {
                let g = report.geometry;
                let e = report.extent;
                println!("{} grid {}x{}", report.kind, g.n_cols(), g.n_rows());
                println!("  cell size   {} x {}", g.cell_x_size(), g.cell_y_size());
                println!("  extent      [{}, {}, {}, {}]", e.xmin, e.ymin, e.xmax, e.ymax);
                println!("  continuous  {}", report.continuous);
                println!("  wraps       {}", report.longitude_needs_wrapping);
                println!("  valid cells {} of {}", report.valid_cells, g.num_cells());
                if report.masked {
                    println!("  masked      true");
                }
                match report.range {
                    Some(r) => println!("  range       [{}, {}]", r.min, r.max),
                    None => println!("  range       none"),
                }
            }
        }
        Command::Sample {
            grid,
            lon,
            lat,
            mask,
        } => {
            let report = match load(&grid, mask.as_deref())? {
                GridFile::Scalar(f) => sample(&f, lon, lat),
                GridFile::Vector(f) => sample(&f, lon, lat),
            };
            if cli.json {
                print_json(&report)?;
            } else {
                println!("({lon}, {lat})");
                println!("  nearest       {}", describe(report.value));
                println!("  interpolated  {}", describe(report.interpolated));
            }
        }
        Command::Derive { grid, kind, output } => {
            let field = input::load_grid(&grid)?.into_vector()?;
            let derived = field.scalar_field(kind).to_grid();
            match output {
                Some(path) => {
                    input::write_json(&path, &derived)?;
                    if cli.json {
                        print_json(&json!({
                            "kind": kind,
                            "output": path.display().to_string(),
                        }))?;
                    } else {
                        eprintln!("derived {kind} grid -> {}", path.display());
                    }
                }
                None => print_json(&derived)?,
            }
        }
        Command::Advect {
            grid,
            steps,
            params,
            seed,
            viewport,
            mask,
            output,
        } => {
            let field = load(&grid, mask.as_deref())?.into_vector()?;
            let mut params: Value = serde_json::from_str(&params)
                .map_err(|e| CliError::Input(format!("invalid --params JSON: {e}")))?;
            let object = params
                .as_object_mut()
                .ok_or_else(|| CliError::Input("--params must be a JSON object".into()))?;
            if let Some(seed) = seed {
                object.insert("seed".into(), json!(seed));
            }

            let mut advector = ParticleAdvector::from_json(&field, &params)?;
            let viewport = viewport.unwrap_or_else(|| field.extent());

            let mut totals = StepStats::default();
            let mut emitted = 0;
            let mut magnitude = None;
            let mut last = Vec::new();
            for _ in 0..steps {
                let stats = advector.step();
                totals.respawned += stats.respawned;
                totals.expired += stats.expired;
                totals.moved += stats.moved;
                last = advector.advance(viewport);
                emitted += last.len();
                magnitude = magnitude_range(magnitude, &last);
            }

            if let Some(path) = &output {
                input::write_json(path, &last)?;
            }

            let report = AdvectReport {
                steps,
                particles: advector.particles().len(),
                segments: emitted,
                last_tick_segments: last.len(),
                respawned: totals.respawned,
                expired: totals.expired,
                magnitude,
                params: advector.params(),
            };
            if cli.json {
                print_json(&report)?;
            } else {
                eprintln!(
                    "advected {} particles for {steps} ticks: {emitted} segments, {} expired, {} respawned",
                    report.particles, report.expired, report.respawned
                );
                if let Some(r) = report.magnitude {
                    eprintln!("  magnitude [{}, {}]", r.min, r.max);
                }
                if let Some(path) = &output {
                    eprintln!("  last tick -> {}", path.display());
                }
            }
        }
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();
    logger::init(cli.verbose);
    let json_mode = cli.json;
    if let Err(e) = run(cli) {
        if json_mode {
            let j = serde_json::json!({"error": e.to_string(), "exit_code": e.exit_code()});
            eprintln!("{}", serde_json::to_string_pretty(&j).unwrap_or_default());
        } else {
            eprintln!("error: {e}");
        }
        process::exit(e.exit_code());
    }
}

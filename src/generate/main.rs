//! Batch generator for the office Voronoi map.
//!
//! Loads the office CSV, tessellates the assigned offices, writes the three
//! KMZ containers and a standalone interactive HTML page.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use voronoi_offices::config::Config;
use voronoi_offices::kml::{read_kmz, Geometry};
use voronoi_offices::pipeline;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(name = "generate")]
#[command(about = "Build the office Voronoi map and export it as KMZ")]
struct Args {
    /// Office CSV file (plain or .gz)
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory for the KMZ containers and the HTML page
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// CSV field delimiter
    #[arg(long)]
    delimiter: Option<char>,

    /// Minimum number of assigned offices required to tessellate
    #[arg(long)]
    min_points: Option<usize>,

    /// Embed district colors as KML styles in the polygon container
    #[arg(long)]
    styled: bool,

    /// List the features of an existing KMZ container and exit
    #[arg(long)]
    inspect: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    if let Some(path) = &args.inspect {
        return inspect(path);
    }

    let mut config = match &args.config {
        Some(path) => Config::load_from_file(path).context("Failed to load config file")?,
        None => Config::default(),
    };
    if let Some(file) = args.file {
        config.input.path = file;
    }
    if let Some(dir) = args.out_dir {
        config.output.dir = dir;
    }
    if let Some(delimiter) = args.delimiter {
        config.input.delimiter = delimiter;
    }
    if let Some(min_points) = args.min_points {
        config.tessellation.min_points = min_points;
    }
    config.output.styled |= args.styled;
    config.validate()?;

    info!("Office Voronoi generator");
    info!("File: {}", config.input.path.display());

    std::fs::create_dir_all(&config.output.dir).with_context(|| {
        format!(
            "Failed to create output directory {}",
            config.output.dir.display()
        )
    })?;

    let report = pipeline::run(&config).context("Pipeline failed")?;

    info!(
        "Done: {} offices, {} regions, {} polygons, {} + {} point features",
        report.points,
        report.regions,
        report.export.polygons.features,
        report.export.unassigned_points.features,
        report.export.assigned_points.features
    );
    if report.export.partial_regions > 0 {
        info!(
            "{} hull regions are open and were exported with a closing chord",
            report.export.partial_regions
        );
    }

    Ok(())
}

fn inspect(path: &Path) -> Result<()> {
    let doc = read_kmz(path).with_context(|| format!("Failed to read {}", path.display()))?;
    info!("{}: {} features", path.display(), doc.len());
    for placemark in &doc.placemarks {
        match &placemark.geometry {
            Geometry::Point(c) => println!("{}\tpoint\t{},{}", placemark.name, c.x, c.y),
            Geometry::Polygon(ring) => {
                println!("{}\tpolygon\t{} vertices", placemark.name, ring.len())
            }
        }
    }
    Ok(())
}

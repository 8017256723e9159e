//! tinspline CLI - Thin plate spline gridding of scattered points

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use tinspline_algorithms::interpolation::{
    points_from_features, tps_tin_interpolation_with_progress, GriddingReport, NeighborhoodLevel,
    SamplePoint, TpsTinParams,
};
use tinspline_core::io::{
    read_geotiff, read_xyz, write_geotiff, write_xyz, PartSeparator, XyzFields, XyzOptions,
};
use tinspline_core::vector::FeatureCollection;
use tinspline_core::{GridDefinition, Raster};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "tinspline")]
#[command(author, version, about = "Thin plate spline gridding over a TIN", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a raster file
    Info {
        /// Input raster file
        input: PathBuf,
    },
    /// Grid scattered points with thin plate splines fitted over a TIN
    Grid {
        /// Input XYZ point file
        input: PathBuf,
        /// Output GeoTIFF
        output: PathBuf,
        /// Output cell size in map units
        #[arg(short, long)]
        cell_size: f64,
        /// Attribute holding the values to grid
        #[arg(short, long, default_value = "Z")]
        field: String,
        /// Grid extent as xmin,ymin,xmax,ymax (defaults to the points' bounding box)
        #[arg(short, long, allow_hyphen_values = true)]
        extent: Option<String>,
        /// Smoothing parameter (0 = exact interpolation)
        #[arg(short, long, default_value = "0.0001")]
        regularization: f64,
        /// Neighborhood: 0 (immediate), 1 or 2
        #[arg(short, long, default_value = "1")]
        level: NeighborhoodLevel,
        /// Do not add the grid corners to the triangulation
        #[arg(long)]
        no_frame: bool,
    },
    /// Re-write an XYZ point file
    ExportXyz {
        /// Input XYZ point file
        input: PathBuf,
        /// Output XYZ file
        output: PathBuf,
        /// Attribute to export
        #[arg(short, long, default_value = "Z", conflicts_with = "all_fields")]
        field: String,
        /// Export every attribute
        #[arg(long)]
        all_fields: bool,
        /// Omit the header line
        #[arg(long)]
        no_header: bool,
        /// Line before each geometry part: none, asterisk or count
        #[arg(long, default_value = "none", value_parser = parse_separator)]
        separator: PartSeparator,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber failed")
}

fn spinner(msg: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

fn progress_bar(msg: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{bar:40.cyan/blue}] {pos}/{len} triangles ({eta})")?
            .progress_chars("=> "),
    );
    pb.set_message(msg.to_string());
    Ok(pb)
}

fn read_points(path: &Path) -> Result<FeatureCollection> {
    let pb = spinner("Reading points...")?;
    let features = read_xyz(path).with_context(|| format!("Failed to read points: {}", path.display()))?;
    pb.finish_and_clear();
    Ok(features)
}

fn write_result(raster: &Raster<f64>, path: &Path) -> Result<()> {
    let pb = spinner("Writing output...")?;
    write_geotiff(raster, path, None).with_context(|| format!("Failed to write output: {}", path.display()))?;
    pb.finish_and_clear();
    Ok(())
}

fn done(name: &str, path: &Path, elapsed: Duration) {
    println!("{} saved to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

fn parse_extent(s: &str) -> Result<(f64, f64, f64, f64)> {
    let values: Vec<f64> = s
        .split(',')
        .map(|v| v.trim().parse::<f64>())
        .collect::<std::result::Result<_, _>>()
        .with_context(|| format!("Invalid extent '{}'", s))?;

    match values.as_slice() {
        &[x_min, y_min, x_max, y_max] => Ok((x_min, y_min, x_max, y_max)),
        _ => bail!("Extent must have 4 values: xmin,ymin,xmax,ymax"),
    }
}

fn parse_separator(s: &str) -> Result<PartSeparator> {
    match s.to_lowercase().as_str() {
        "none" => Ok(PartSeparator::None),
        "asterisk" | "*" => Ok(PartSeparator::Asterisk),
        "count" => Ok(PartSeparator::PointCount),
        _ => bail!("Unknown separator '{}': expected none, asterisk or count", s),
    }
}

fn points_extent(points: &[SamplePoint]) -> Result<(f64, f64, f64, f64)> {
    if points.is_empty() {
        bail!("No points to grid");
    }
    Ok(points.iter().fold(
        (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        |(x0, y0, x1, y1), p| (x0.min(p.x), y0.min(p.y), x1.max(p.x), y1.max(p.y)),
    ))
}

fn print_report(report: &GriddingReport) {
    println!("  Triangles: {}", report.triangles);
    println!("  Fitted: {}", report.fitted);
    if report.skipped_singular > 0 {
        println!("  Skipped (singular): {}", report.skipped_singular);
    }
    if report.outside_grid > 0 {
        println!("  Outside grid: {}", report.outside_grid);
    }
    println!("  Cells written: {}", report.cells_written);
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    match cli.command {
        Commands::Info { input } => {
            let raster: Raster<f64> =
                read_geotiff(&input).with_context(|| format!("Failed to read raster: {}", input.display()))?;
            let (rows, cols) = raster.shape();
            let bounds = raster.bounds();
            let stats = raster.statistics();

            println!("File: {}", input.display());
            println!("Dimensions: {} x {} ({} cells)", cols, rows, raster.len());
            println!("Cell size: {}", raster.cell_size());
            println!(
                "Bounds: ({:.6}, {:.6}) - ({:.6}, {:.6})",
                bounds.0, bounds.1, bounds.2, bounds.3
            );
            if let Some(nodata) = raster.nodata() {
                println!("NoData: {}", nodata);
            }
            println!("\nStatistics:");
            if let Some(min) = stats.min {
                println!("  Min: {:.4}", min);
            }
            if let Some(max) = stats.max {
                println!("  Max: {:.4}", max);
            }
            if let Some(mean) = stats.mean {
                println!("  Mean: {:.4}", mean);
            }
            if !raster.is_empty() {
                println!(
                    "  Valid cells: {} ({:.1}%)",
                    stats.valid_count,
                    100.0 * stats.valid_count as f64 / raster.len() as f64
                );
            }
        }

        Commands::Grid {
            input,
            output,
            cell_size,
            field,
            extent,
            regularization,
            level,
            no_frame,
        } => {
            let features = read_points(&input)?;
            let points = points_from_features(&features, &field)?;
            info!("Read {} points with attribute '{}'", points.len(), field);

            let (x_min, y_min, x_max, y_max) = match extent {
                Some(s) => parse_extent(&s)?,
                None => points_extent(&points)?,
            };
            let grid = GridDefinition::from_extent(x_min, y_min, x_max, y_max, cell_size)?;
            info!("Output grid: {} x {} cells", grid.cols, grid.rows);

            let params = TpsTinParams {
                grid,
                regularization,
                level,
                add_frame: !no_frame,
            };

            let start = Instant::now();
            let pb = progress_bar("Gridding")?;
            let result = tps_tin_interpolation_with_progress(&points, &params, |done, total| {
                pb.set_length(total as u64);
                pb.set_position(done as u64);
            });
            pb.finish_and_clear();
            let out = result.context("Gridding failed")?;
            let elapsed = start.elapsed();

            write_result(&out.raster, &output)?;
            done("TPS TIN grid", &output, elapsed);
            print_report(&out.report);
        }

        Commands::ExportXyz {
            input,
            output,
            field,
            all_fields,
            no_header,
            separator,
        } => {
            let features = read_points(&input)?;
            let options = XyzOptions {
                fields: if all_fields { XyzFields::All } else { XyzFields::Single(field) },
                header: !no_header,
                separator,
            };
            let written = write_xyz(&features, &output, &options)
                .with_context(|| format!("Failed to write points: {}", output.display()))?;
            println!("{} points saved to: {}", written, output.display());
        }
    }

    Ok(())
}

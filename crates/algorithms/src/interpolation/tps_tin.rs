//! Thin Plate Spline gridding over a TIN
//!
//! Scattered points are triangulated; for every triangle a local thin plate
//! spline is fitted to the nodes in the triangle's topological neighborhood
//! and evaluated at the grid cells whose centers the triangle covers.
//! Compared with a single global spline this keeps each linear system small
//! while the overlapping neighborhoods keep the surface close to continuous
//! across triangle edges.
//!
//! With `add_frame` the TIN is extended by the four corners of the grid, each
//! taking the value of the nearest input point, so the triangulation covers
//! the whole grid.

use serde::{Deserialize, Serialize};
use tinspline_core::{Algorithm, Error, GeoTransform, GridDefinition, Raster, Result};

use crate::maybe_rayon::*;

use super::neighborhood::{collect_neighborhood, NeighborhoodLevel};
use super::rasterize::rasterize_triangle;
use super::tin::{Tin, TinBuilder};
use super::tps::ThinPlateSpline;
use super::SamplePoint;

/// Parameters for TPS-over-TIN gridding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TpsTinParams {
    /// Output grid
    pub grid: GridDefinition,
    /// Smoothing parameter (λ ≥ 0). 0 interpolates the neighborhood exactly.
    pub regularization: f64,
    /// Extent of the point neighborhood around each triangle
    pub level: NeighborhoodLevel,
    /// Add the grid corners to the TIN so the whole grid is covered
    pub add_frame: bool,
}

impl Default for TpsTinParams {
    fn default() -> Self {
        Self {
            grid: GridDefinition::new(100, 100, GeoTransform::default()),
            regularization: 0.0001,
            level: NeighborhoodLevel::default(),
            add_frame: true,
        }
    }
}

impl TpsTinParams {
    pub fn validate(&self) -> Result<()> {
        if !(self.regularization.is_finite() && self.regularization >= 0.0) {
            return Err(Error::InvalidParameter {
                name: "regularization",
                value: self.regularization.to_string(),
                reason: "must be a finite number >= 0".into(),
            });
        }
        self.grid.validate()
    }
}

/// Counters collected during a gridding run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GriddingReport {
    /// Triangles in the TIN
    pub triangles: usize,
    /// Triangles with a successfully fitted spline
    pub fitted: usize,
    /// Triangles skipped because their spline system was singular
    pub skipped_singular: usize,
    /// Triangles whose bounding box contains no cell center
    pub outside_grid: usize,
    /// Cell writes, counting overwrites on shared edges
    pub cells_written: usize,
}

/// Result of [`tps_tin_interpolation_with_progress`]
#[derive(Debug, Clone)]
pub struct TpsTinOutput {
    pub raster: Raster<f64>,
    pub report: GriddingReport,
}

enum Fit {
    Outside,
    Singular,
    Spline(ThinPlateSpline),
}

/// Thin Plate Spline over TIN gridding algorithm
#[derive(Debug, Clone, Default)]
pub struct ThinPlateSplineTin;

impl Algorithm for ThinPlateSplineTin {
    type Input = Vec<SamplePoint>;
    type Output = Raster<f64>;
    type Params = TpsTinParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "ThinPlateSplineTin"
    }

    fn description(&self) -> &'static str {
        "Thin plate spline gridding with local fits over a Delaunay triangulation"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        tps_tin_interpolation(&input, &params)
    }
}

/// Grid scattered points with local thin plate splines fitted per triangle.
///
/// Cells not covered by any triangle are NaN.
pub fn tps_tin_interpolation(points: &[SamplePoint], params: &TpsTinParams) -> Result<Raster<f64>> {
    tps_tin_interpolation_with_progress(points, params, |_, _| {}).map(|out| out.raster)
}

/// Like [`tps_tin_interpolation`], reporting `(done, total)` triangles to
/// `progress` and returning run counters alongside the raster.
///
/// # Errors
/// Invalid parameters, or a point set that cannot be triangulated. A
/// triangle whose spline cannot be fitted is skipped, not an error.
pub fn tps_tin_interpolation_with_progress<F>(
    points: &[SamplePoint],
    params: &TpsTinParams,
    mut progress: F,
) -> Result<TpsTinOutput>
where
    F: FnMut(usize, usize),
{
    params.validate()?;

    let grid = params.grid;
    let mut raster = grid.create_raster();

    let mut builder = TinBuilder::new();
    if params.add_frame {
        builder = builder.frame(grid.center_extent());
    }
    let tin = builder.build(points)?;
    tracing::debug!(
        nodes = tin.node_count(),
        triangles = tin.triangle_count(),
        "triangulated input points"
    );

    let fits = fit_triangles(&tin, &grid, params)?;

    let total = fits.len();
    let mut report = GriddingReport {
        triangles: total,
        ..GriddingReport::default()
    };

    for (index, fit) in fits.iter().enumerate() {
        match fit {
            Fit::Outside => report.outside_grid += 1,
            Fit::Singular => report.skipped_singular += 1,
            Fit::Spline(spline) => {
                report.fitted += 1;
                let vertices = tin.triangle(index).vertices();
                report.cells_written += rasterize_triangle(&grid, &mut raster, vertices, spline);
            }
        }
        progress(index + 1, total);
    }

    if report.skipped_singular > 0 {
        tracing::warn!(
            skipped = report.skipped_singular,
            "triangles left empty: singular spline system"
        );
    }
    tracing::info!(
        triangles = report.triangles,
        fitted = report.fitted,
        skipped_singular = report.skipped_singular,
        outside_grid = report.outside_grid,
        cells_written = report.cells_written,
        "TPS TIN gridding finished"
    );

    Ok(TpsTinOutput { raster, report })
}

/// Fit one spline per triangle, in triangle order
fn fit_triangles(tin: &Tin, grid: &GridDefinition, params: &TpsTinParams) -> Result<Vec<Fit>> {
    let regularization = params.regularization;
    let level = params.level;

    (0..tin.triangle_count())
        .into_par_iter()
        .map(|index| {
            let (min_x, min_y, max_x, max_y) = tin.triangle(index).extent();
            if grid.cell_range(min_x, min_y, max_x, max_y).is_none() {
                return Ok(Fit::Outside);
            }

            let neighborhood: Vec<SamplePoint> = collect_neighborhood(tin, index, level)
                .into_iter()
                .map(|n| tin.node(n).sample())
                .collect();

            match ThinPlateSpline::fit(&neighborhood, regularization) {
                Ok(spline) => Ok(Fit::Spline(spline)),
                Err(Error::SingularSystem { size }) => {
                    tracing::debug!(triangle = index, size, "singular spline system, triangle skipped");
                    Ok(Fit::Singular)
                }
                Err(e) => Err(e),
            }
        })
        .collect()
}

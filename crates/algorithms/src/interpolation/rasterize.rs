//! Writing a fitted spline into the grid cells covered by one triangle

use tinspline_core::{GridDefinition, Raster};

use super::tin::point_in_triangle;
use super::tps::ThinPlateSpline;

/// Evaluate `spline` at every cell center that lies inside the triangle.
///
/// Only cells within the triangle's bounding box (clamped to the grid) are
/// tested. Existing values are overwritten. Returns the number of cells
/// written.
pub fn rasterize_triangle(
    grid: &GridDefinition,
    raster: &mut Raster<f64>,
    triangle: &[(f64, f64); 3],
    spline: &ThinPlateSpline,
) -> usize {
    let (min_x, min_y, max_x, max_y) = triangle.iter().fold(
        (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        |(x0, y0, x1, y1), &(x, y)| (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
    );

    let Some(range) = grid.cell_range(min_x, min_y, max_x, max_y) else {
        return 0;
    };

    let data = raster.data_mut();
    let mut written = 0;
    for row in range.row_min..=range.row_max {
        for col in range.col_min..=range.col_max {
            let (x, y) = grid.cell_center(col, row);
            if point_in_triangle(x, y, triangle) {
                data[[row, col]] = spline.value(x, y);
                written += 1;
            }
        }
    }

    written
}

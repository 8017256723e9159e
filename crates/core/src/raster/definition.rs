//! Target grid specification for gridding algorithms

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::raster::{GeoTransform, Raster};

/// Shape and georeferencing of a grid that an algorithm writes into.
///
/// The grid must be north-up. Cell values are sampled at cell centers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridDefinition {
    /// Number of rows
    pub rows: usize,
    /// Number of columns
    pub cols: usize,
    /// Georeferencing of the upper-left corner and cell size
    pub transform: GeoTransform,
}

/// Largest grid `from_extent` will define
pub const MAX_CELLS: usize = 1 << 31;

/// Cells along one axis for `steps` whole cell steps, `None` if unrepresentable
fn cell_count(steps: f64) -> Option<usize> {
    if !(steps.is_finite() && steps >= 0.0 && steps < MAX_CELLS as f64) {
        return None;
    }
    (steps as usize).checked_add(1)
}

/// Inclusive range of cells, as returned by [`GridDefinition::cell_range`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    pub col_min: usize,
    pub col_max: usize,
    pub row_min: usize,
    pub row_max: usize,
}

impl CellRange {
    /// Number of cells covered by the range
    pub fn cell_count(&self) -> usize {
        (self.col_max - self.col_min + 1) * (self.row_max - self.row_min + 1)
    }
}

impl GridDefinition {
    pub fn new(rows: usize, cols: usize, transform: GeoTransform) -> Self {
        Self { rows, cols, transform }
    }

    /// Build a grid whose corner cell centers lie on the given extent.
    ///
    /// `x_min`/`y_min` become the center of the lower-left cell; the grid
    /// grows by whole cells until it reaches `x_max`/`y_max`.
    pub fn from_extent(x_min: f64, y_min: f64, x_max: f64, y_max: f64, cell_size: f64) -> Result<Self> {
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(Error::InvalidParameter {
                name: "cell_size",
                value: cell_size.to_string(),
                reason: "must be a positive finite number".into(),
            });
        }
        let finite = [x_min, y_min, x_max, y_max].iter().all(|v| v.is_finite());
        if !(finite && x_max >= x_min && y_max >= y_min) {
            return Err(Error::InvalidParameter {
                name: "extent",
                value: format!("{},{},{},{}", x_min, y_min, x_max, y_max),
                reason: "expected finite xmin <= xmax and ymin <= ymax".into(),
            });
        }

        let steps_x = ((x_max - x_min) / cell_size + 1e-6).floor();
        let steps_y = ((y_max - y_min) / cell_size + 1e-6).floor();
        let cols = cell_count(steps_x);
        let rows = cell_count(steps_y);
        let (cols, rows) = match (cols, rows) {
            (Some(c), Some(r)) if c.checked_mul(r).is_some_and(|n| n <= MAX_CELLS) => (c, r),
            _ => {
                return Err(Error::InvalidDimensions {
                    width: cols.unwrap_or(usize::MAX),
                    height: rows.unwrap_or(usize::MAX),
                })
            }
        };

        let half = 0.5 * cell_size;
        let origin_x = x_min - half;
        let origin_y = y_min + (rows - 1) as f64 * cell_size + half;

        Ok(Self::new(rows, cols, GeoTransform::new(origin_x, origin_y, cell_size, -cell_size)))
    }

    /// Check dimensions and georeferencing
    pub fn validate(&self) -> Result<()> {
        if self.rows == 0 || self.cols == 0 {
            return Err(Error::InvalidDimensions {
                width: self.cols,
                height: self.rows,
            });
        }

        let t = &self.transform;
        let finite = [t.origin_x, t.origin_y, t.pixel_width, t.pixel_height]
            .iter()
            .all(|v| v.is_finite());
        if !finite || t.pixel_width <= 0.0 || !t.is_north_up() {
            return Err(Error::InvalidParameter {
                name: "transform",
                value: format!("{:?}", t),
                reason: "grid must be north-up with positive finite cell size".into(),
            });
        }

        Ok(())
    }

    /// World coordinates of the center of cell (col, row)
    pub fn cell_center(&self, col: usize, row: usize) -> (f64, f64) {
        self.transform.pixel_to_geo(col, row)
    }

    /// Extent `(min_x, min_y, max_x, max_y)` spanned by the corner cell centers
    pub fn center_extent(&self) -> (f64, f64, f64, f64) {
        let (x0, y0) = self.cell_center(0, self.rows.saturating_sub(1));
        let (x1, y1) = self.cell_center(self.cols.saturating_sub(1), 0);
        (x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1))
    }

    /// Cells whose centers fall inside a world bounding box.
    ///
    /// The range is clamped to the grid; `None` when no cell center can lie
    /// inside the box.
    pub fn cell_range(&self, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Option<CellRange> {
        const TOLERANCE: f64 = 1e-9;

        let (c0, r0) = self.transform.geo_to_pixel(min_x, max_y);
        let (c1, r1) = self.transform.geo_to_pixel(max_x, min_y);
        if [c0, r0, c1, r1].iter().any(|v| v.is_nan()) {
            return None;
        }

        // Pixel coordinate of the center of cell i is i + 0.5
        let col_lo = (c0.min(c1) - 0.5 - TOLERANCE).ceil();
        let col_hi = (c0.max(c1) - 0.5 + TOLERANCE).floor();
        let row_lo = (r0.min(r1) - 0.5 - TOLERANCE).ceil();
        let row_hi = (r0.max(r1) - 0.5 + TOLERANCE).floor();

        let last_col = (self.cols as f64) - 1.0;
        let last_row = (self.rows as f64) - 1.0;
        if col_hi < 0.0 || row_hi < 0.0 || col_lo > last_col || row_lo > last_row || col_lo > col_hi || row_lo > row_hi {
            return None;
        }

        Some(CellRange {
            col_min: col_lo.max(0.0) as usize,
            col_max: col_hi.min(last_col) as usize,
            row_min: row_lo.max(0.0) as usize,
            row_max: row_hi.min(last_row) as usize,
        })
    }

    /// Allocate an output raster filled with NaN (no-data)
    pub fn create_raster(&self) -> Raster<f64> {
        let mut raster = Raster::filled(self.rows, self.cols, f64::NAN);
        raster.set_transform(self.transform);
        raster.set_nodata(Some(f64::NAN));
        raster
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_from_extent_unit_square() {
        let grid = GridDefinition::from_extent(0.0, 0.0, 1.0, 1.0, 0.1).unwrap();
        assert_eq!((grid.rows, grid.cols), (11, 11));

        let (x, y) = grid.cell_center(0, 10);
        assert_relative_eq!(x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(y, 0.0, epsilon = 1e-12);

        let (x, y) = grid.cell_center(5, 5);
        assert_relative_eq!(x, 0.5, epsilon = 1e-12);
        assert_relative_eq!(y, 0.5, epsilon = 1e-12);

        let (min_x, min_y, max_x, max_y) = grid.center_extent();
        assert_relative_eq!(min_x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(min_y, 0.0, epsilon = 1e-12);
        assert_relative_eq!(max_x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(max_y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_from_extent_rejects_bad_cell_size() {
        assert!(GridDefinition::from_extent(0.0, 0.0, 1.0, 1.0, 0.0).is_err());
        assert!(GridDefinition::from_extent(0.0, 0.0, 1.0, 1.0, f64::NAN).is_err());
        assert!(GridDefinition::from_extent(1.0, 0.0, 0.0, 1.0, 0.5).is_err());
    }

    #[test]
    fn test_from_extent_rejects_unbounded_grids() {
        assert!(matches!(
            GridDefinition::from_extent(0.0, 0.0, f64::INFINITY, 1.0, 1.0),
            Err(Error::InvalidParameter { name: "extent", .. })
        ));
        assert!(GridDefinition::from_extent(0.0, 0.0, 1.0, f64::NAN, 1.0).is_err());
        assert!(matches!(
            GridDefinition::from_extent(0.0, 0.0, 1e300, 1.0, 1.0),
            Err(Error::InvalidDimensions { .. })
        ));
        assert!(matches!(
            GridDefinition::from_extent(0.0, 0.0, 1.0, 1.0, 1e-12),
            Err(Error::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_from_extent_degree_cells() {
        let grid = GridDefinition::from_extent(-70.7, -33.5, -70.6, -33.4, 1e-5).unwrap();
        assert_eq!((grid.rows, grid.cols), (10_001, 10_001));
        assert!(grid.validate().is_ok());

        let range = grid.cell_range(-70.650003, -33.450003, -70.649897, -33.449897).unwrap();
        assert_eq!(range.cell_count(), 11 * 11);
    }

    #[test]
    fn test_validate() {
        let grid = GridDefinition::new(10, 10, GeoTransform::new(0.0, 10.0, 1.0, -1.0));
        assert!(grid.validate().is_ok());

        let empty = GridDefinition::new(0, 10, GeoTransform::default());
        assert!(matches!(empty.validate(), Err(Error::InvalidDimensions { .. })));

        let south_up = GridDefinition::new(10, 10, GeoTransform::new(0.0, 0.0, 1.0, 1.0));
        assert!(matches!(south_up.validate(), Err(Error::InvalidParameter { .. })));
    }

    #[test]
    fn test_cell_range_inside() {
        // 10x10 grid over [0, 10] x [0, 10], centers at 0.5, 1.5, ...
        let grid = GridDefinition::new(10, 10, GeoTransform::new(0.0, 10.0, 1.0, -1.0));
        let range = grid.cell_range(2.0, 3.0, 4.0, 5.0).unwrap();

        // Columns with centers in [2, 4]: 2.5, 3.5 -> cols 2, 3
        assert_eq!((range.col_min, range.col_max), (2, 3));
        // Rows with centers in [3, 5]: y = 4.5 (row 5), 3.5 (row 6)
        assert_eq!((range.row_min, range.row_max), (5, 6));
        assert_eq!(range.cell_count(), 4);
    }

    #[test]
    fn test_cell_range_clamped() {
        let grid = GridDefinition::new(10, 10, GeoTransform::new(0.0, 10.0, 1.0, -1.0));
        let range = grid.cell_range(-50.0, -50.0, 50.0, 50.0).unwrap();
        assert_eq!(range, CellRange { col_min: 0, col_max: 9, row_min: 0, row_max: 9 });
    }

    #[test]
    fn test_cell_range_outside() {
        let grid = GridDefinition::new(10, 10, GeoTransform::new(0.0, 10.0, 1.0, -1.0));
        assert!(grid.cell_range(20.0, 20.0, 30.0, 30.0).is_none());
        // Box between two cell centers
        assert!(grid.cell_range(2.6, 2.6, 2.9, 2.9).is_none());
    }

    #[test]
    fn test_create_raster_is_nodata() {
        let grid = GridDefinition::new(3, 4, GeoTransform::new(0.0, 3.0, 1.0, -1.0));
        let raster = grid.create_raster();
        assert_eq!(raster.shape(), (3, 4));
        assert_eq!(raster.statistics().valid_count, 0);
        assert_eq!(raster.transform(), &grid.transform);
    }
}

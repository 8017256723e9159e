//! Raster data structures and operations

mod definition;
mod element;
mod geotransform;
mod grid;

pub use definition::{CellRange, GridDefinition, MAX_CELLS};
pub use element::RasterElement;
pub use geotransform::GeoTransform;
pub use grid::{Raster, RasterStatistics};

//! Spatial interpolation algorithms
//!
//! Grid scattered point data with thin plate splines fitted locally over a
//! Delaunay triangulation:
//! - TIN: Delaunay triangulation with node adjacency and an optional frame
//! - Neighborhood: node rings around a triangle
//! - TPS: regularized thin plate spline fit
//! - TPS TIN: the complete gridding pipeline

mod neighborhood;
mod rasterize;
mod tin;
mod tps;
mod tps_tin;

pub use neighborhood::{collect_neighborhood, NeighborhoodLevel};
pub use rasterize::rasterize_triangle;
pub use tin::{Node, Tin, TinBuilder, Triangle};
pub use tps::ThinPlateSpline;
pub use tps_tin::{
    tps_tin_interpolation, tps_tin_interpolation_with_progress, GriddingReport, ThinPlateSplineTin,
    TpsTinOutput, TpsTinParams,
};

use tinspline_core::vector::FeatureCollection;
use tinspline_core::{Error, Result};

/// A sample point with x, y coordinates and a value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplePoint {
    pub x: f64,
    pub y: f64,
    pub value: f64,
}

impl SamplePoint {
    pub fn new(x: f64, y: f64, value: f64) -> Self {
        Self { x, y, value }
    }

    /// Squared Euclidean distance to another point
    #[inline]
    pub fn dist_sq(&self, other_x: f64, other_y: f64) -> f64 {
        let dx = self.x - other_x;
        let dy = self.y - other_y;
        dx * dx + dy * dy
    }

    /// Euclidean distance to another point
    #[inline]
    pub fn dist(&self, other_x: f64, other_y: f64) -> f64 {
        self.dist_sq(other_x, other_y).sqrt()
    }
}

/// Sample points from every vertex of every feature, valued by `field`.
///
/// Features without geometry, or whose attribute is missing or not numeric,
/// are skipped.
///
/// # Errors
/// [`Error::InvalidParameter`] if no feature of a non-empty collection
/// carries `field`.
pub fn points_from_features(features: &FeatureCollection, field: &str) -> Result<Vec<SamplePoint>> {
    if !features.is_empty() && features.iter().all(|f| f.get_property(field).is_none()) {
        return Err(Error::InvalidParameter {
            name: "field",
            value: field.to_string(),
            reason: "attribute not present on any feature".into(),
        });
    }

    let mut points = Vec::with_capacity(features.len());
    let mut skipped = 0usize;

    for feature in features.iter() {
        let Some(value) = feature.get_property(field).and_then(|v| v.as_f64()) else {
            skipped += 1;
            continue;
        };
        points.extend(feature.coords().into_iter().map(|c| SamplePoint::new(c.x, c.y, value)));
    }

    if skipped > 0 {
        tracing::debug!(skipped, field, "features without a numeric value skipped");
    }

    Ok(points)
}

//! # tinspline algorithms
//!
//! Gridding of scattered point data with thin plate splines fitted locally
//! over a triangulated irregular network.
//!
//! ## Modules
//!
//! - **interpolation**: TIN construction, triangle neighborhoods, thin
//!   plate spline fitting and the TPS-over-TIN gridding pipeline

mod maybe_rayon;

pub mod interpolation;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::interpolation::{
        collect_neighborhood, points_from_features, tps_tin_interpolation,
        tps_tin_interpolation_with_progress, GriddingReport, NeighborhoodLevel, SamplePoint,
        ThinPlateSpline, ThinPlateSplineTin, Tin, TinBuilder, TpsTinOutput, TpsTinParams,
    };
    pub use tinspline_core::prelude::*;
}

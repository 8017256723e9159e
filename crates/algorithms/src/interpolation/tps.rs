//! Thin Plate Spline (TPS) surface fitting
//!
//! The TPS interpolant has the form:
//! ```text
//! f(x,y) = a₁ + a₂·x + a₃·y + Σᵢ wᵢ · U(‖(x,y) - (xᵢ,yᵢ)‖)
//! ```
//! where U(r) = r²·ln(r) is the TPS radial basis function in 2D.
//!
//! The coefficients solve the (n+3)×(n+3) system
//! ```text
//! [K + λ·ᾱ²·I  P] [w]   [z]
//! [Pᵀ          0] [a] = [0]
//! ```
//! where ᾱ is the mean distance between the points, which makes the
//! regularization λ independent of the coordinate scale. λ = 0 gives exact
//! interpolation; larger values trade fidelity for a smoother surface.
//!
//! Reference:
//! Donato, G., Belongie, S. (2002). Approximation methods for thin plate
//! spline mappings and principal warps. ECCV 2002, LNCS 2352, 21-31.
//! Wahba, G. (1990). Spline Models for Observational Data. SIAM.

use ndarray::{Array1, Array2};
use tinspline_core::{Error, Result};

use super::SamplePoint;

/// TPS radial basis function: U(r) = r² · ln(r), with U(0) = 0
#[inline]
pub(crate) fn tps_kernel(r: f64) -> f64 {
    if r < 1e-15 {
        0.0
    } else {
        r * r * r.ln()
    }
}

/// A fitted thin plate spline surface.
///
/// The spline is fitted in a local frame: coordinates are shifted to the
/// centroid of the control points and divided by their mean pairwise
/// distance ᾱ. This keeps the system well conditioned for projected or
/// geographic coordinates far from the origin, and turns the `λ·ᾱ²`
/// diagonal into plain `λ`. [`value`](Self::value) takes world coordinates.
#[derive(Debug, Clone)]
pub struct ThinPlateSpline {
    /// Control points in the local frame
    points: Vec<SamplePoint>,
    weights: Vec<f64>,
    affine: [f64; 3],
    center: (f64, f64),
    scale: f64,
}

impl ThinPlateSpline {
    /// Fit a spline through (or, with regularization, near) the points.
    ///
    /// # Errors
    /// - [`Error::InvalidParameter`] if `regularization` is negative or not finite
    /// - [`Error::InsufficientPoints`] for fewer than 3 points
    /// - [`Error::SingularSystem`] if the points do not span a plane
    ///   (collinear or coincident)
    pub fn fit(points: &[SamplePoint], regularization: f64) -> Result<Self> {
        if !(regularization.is_finite() && regularization >= 0.0) {
            return Err(Error::InvalidParameter {
                name: "regularization",
                value: regularization.to_string(),
                reason: "must be a finite number >= 0".into(),
            });
        }

        let n = points.len();
        if n < 3 {
            return Err(Error::InsufficientPoints { required: 3, found: n });
        }

        let m = n + 3;
        let (center, scale) = local_frame(points);
        if !(scale.is_finite() && scale > 0.0) {
            return Err(Error::SingularSystem { size: m });
        }

        let local: Vec<SamplePoint> = points
            .iter()
            .map(|p| SamplePoint::new((p.x - center.0) / scale, (p.y - center.1) / scale, p.value))
            .collect();

        let mut mat = Array2::<f64>::zeros((m, m));
        let mut rhs = Array1::<f64>::zeros(m);

        for i in 0..n {
            for j in (i + 1)..n {
                let u = tps_kernel(local[i].dist(local[j].x, local[j].y));
                mat[[i, j]] = u;
                mat[[j, i]] = u;
            }
        }

        // ᾱ is 1 in the local frame
        for (i, p) in local.iter().enumerate() {
            mat[[i, i]] = regularization;

            mat[[i, n]] = 1.0;
            mat[[i, n + 1]] = p.x;
            mat[[i, n + 2]] = p.y;

            mat[[n, i]] = 1.0;
            mat[[n + 1, i]] = p.x;
            mat[[n + 2, i]] = p.y;

            rhs[i] = p.value;
        }

        let coeffs = gauss_solve(mat, rhs)?;

        Ok(Self {
            points: local,
            weights: coeffs.iter().take(n).copied().collect(),
            affine: [coeffs[n], coeffs[n + 1], coeffs[n + 2]],
            center,
            scale,
        })
    }

    /// Evaluate the surface at world coordinates (x, y)
    pub fn value(&self, x: f64, y: f64) -> f64 {
        let x = (x - self.center.0) / self.scale;
        let y = (y - self.center.1) / self.scale;
        let [a1, a2, a3] = self.affine;
        self.points
            .iter()
            .zip(&self.weights)
            .fold(a1 + a2 * x + a3 * y, |acc, (p, w)| acc + w * tps_kernel(p.dist(x, y)))
    }

    /// Bending energy `wᵀ K w` of the fitted surface in the local frame
    pub fn bending_energy(&self) -> f64 {
        let n = self.points.len();
        let mut energy = 0.0;
        for i in 0..n {
            for j in (i + 1)..n {
                let r = self.points[i].dist(self.points[j].x, self.points[j].y);
                energy += 2.0 * self.weights[i] * self.weights[j] * tps_kernel(r);
            }
        }
        energy
    }

    /// Number of control points
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Kernel weights, one per control point
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Affine coefficients `[a₁, a₂, a₃]` in the local frame
    pub fn affine(&self) -> [f64; 3] {
        self.affine
    }

    /// Centroid and scale mapping world to local coordinates
    pub fn frame(&self) -> ((f64, f64), f64) {
        (self.center, self.scale)
    }
}

/// Centroid of the points and their mean distance over all n² pairs
fn local_frame(points: &[SamplePoint]) -> ((f64, f64), f64) {
    let n = points.len() as f64;
    let (sx, sy) = points.iter().fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    let center = (sx / n, sy / n);

    let mut distance_sum = 0.0;
    for (i, a) in points.iter().enumerate() {
        for b in &points[i + 1..] {
            distance_sum += 2.0 * a.dist(b.x, b.y);
        }
    }

    (center, distance_sum / (n * n))
}

/// Solve Ax = b using Gaussian elimination with partial pivoting.
///
/// A pivot smaller than `1e-12 ×` the largest entry of A is treated as zero.
fn gauss_solve(mut mat: Array2<f64>, mut rhs: Array1<f64>) -> Result<Array1<f64>> {
    let n = rhs.len();
    let scale = mat.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    let tolerance = 1e-12 * scale.max(f64::MIN_POSITIVE);

    for col in 0..n {
        let (pivot_row, pivot_abs) = (col..n)
            .map(|row| (row, mat[[row, col]].abs()))
            .fold((col, -1.0), |best, cur| if cur.1 > best.1 { cur } else { best });

        if !(pivot_abs > tolerance) {
            return Err(Error::SingularSystem { size: n });
        }

        if pivot_row != col {
            for j in 0..n {
                mat.swap([col, j], [pivot_row, j]);
            }
            rhs.swap(col, pivot_row);
        }

        let pivot = mat[[col, col]];
        for row in (col + 1)..n {
            let factor = mat[[row, col]] / pivot;
            if factor == 0.0 {
                continue;
            }
            mat[[row, col]] = 0.0;
            for j in (col + 1)..n {
                mat[[row, j]] -= factor * mat[[col, j]];
            }
            rhs[row] -= factor * rhs[col];
        }
    }

    let mut x = Array1::<f64>::zeros(n);
    for col in (0..n).rev() {
        let mut sum = rhs[col];
        for j in (col + 1)..n {
            sum -= mat[[col, j]] * x[j];
        }
        x[col] = sum / mat[[col, col]];
    }

    Ok(x)
}

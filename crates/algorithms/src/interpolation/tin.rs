//! TIN (Triangulated Irregular Network) construction
//!
//! Builds a Delaunay triangulation of scattered sample points with an
//! incremental Bowyer-Watson algorithm and derives the node adjacency
//! graph from the triangle edges.
//!
//! Nodes live in an arena (`Vec<Node>`); triangles and neighbor lists refer
//! to them by index.

use std::collections::{HashMap, HashSet};

use tinspline_core::{Error, Result};
use tracing::debug;

use super::SamplePoint;

/// A triangulation vertex carrying one scalar value
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub x: f64,
    pub y: f64,
    pub value: f64,
    /// Indices of adjacent nodes, sorted and unique
    neighbors: Vec<usize>,
}

impl Node {
    pub(crate) fn new(x: f64, y: f64, value: f64) -> Self {
        Self {
            x,
            y,
            value,
            neighbors: Vec::new(),
        }
    }

    /// Indices of nodes sharing a triangle edge with this one
    pub fn neighbors(&self) -> &[usize] {
        &self.neighbors
    }

    /// Position and value as a sample point
    pub fn sample(&self) -> SamplePoint {
        SamplePoint::new(self.x, self.y, self.value)
    }
}

/// A triangle of three node indices with cached geometry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    nodes: [usize; 3],
    vertices: [(f64, f64); 3],
    extent: (f64, f64, f64, f64),
}

impl Triangle {
    fn new(nodes: [usize; 3], arena: &[Node]) -> Self {
        let vertices = nodes.map(|i| (arena[i].x, arena[i].y));
        let extent = vertices.iter().fold(
            (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
            |(x0, y0, x1, y1), &(x, y)| (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        );
        Self {
            nodes,
            vertices,
            extent,
        }
    }

    /// Node indices of the three corners
    pub fn nodes(&self) -> [usize; 3] {
        self.nodes
    }

    /// Corner coordinates
    pub fn vertices(&self) -> &[(f64, f64); 3] {
        &self.vertices
    }

    /// Bounding box `(min_x, min_y, max_x, max_y)`
    pub fn extent(&self) -> (f64, f64, f64, f64) {
        self.extent
    }

    /// Point-in-triangle test; edges and corners count as inside.
    ///
    /// Degenerate (zero area) triangles contain nothing.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        point_in_triangle(x, y, &self.vertices)
    }
}

/// Closed point-in-triangle test on raw vertices
pub(crate) fn point_in_triangle(x: f64, y: f64, t: &[(f64, f64); 3]) -> bool {
    const EPS: f64 = -1e-10;
    match barycentric(x, y, t) {
        Some((u, v, w)) => u >= EPS && v >= EPS && w >= EPS,
        None => false,
    }
}

/// Barycentric coordinates of (px, py) in triangle `t`, `None` if degenerate
fn barycentric(px: f64, py: f64, t: &[(f64, f64); 3]) -> Option<(f64, f64, f64)> {
    let (p0, p1, p2) = (t[0], t[1], t[2]);
    let v0x = p1.0 - p0.0;
    let v0y = p1.1 - p0.1;
    let v1x = p2.0 - p0.0;
    let v1y = p2.1 - p0.1;
    let v2x = px - p0.0;
    let v2y = py - p0.1;

    let dot00 = v0x * v0x + v0y * v0y;
    let dot01 = v0x * v1x + v0y * v1y;
    let dot02 = v0x * v2x + v0y * v2y;
    let dot11 = v1x * v1x + v1y * v1y;
    let dot12 = v1x * v2x + v1y * v2y;

    let denom = dot00 * dot11 - dot01 * dot01;
    if denom.abs() <= f64::EPSILON * dot00 * dot11 || denom == 0.0 {
        return None;
    }

    let v = (dot11 * dot02 - dot01 * dot12) / denom;
    let w = (dot00 * dot12 - dot01 * dot02) / denom;
    Some((1.0 - v - w, v, w))
}

/// Triangulated irregular network: node arena plus triangles
#[derive(Debug, Clone, Default)]
pub struct Tin {
    nodes: Vec<Node>,
    triangles: Vec<Triangle>,
}

impl Tin {
    /// Triangulate points without a frame
    pub fn from_points(points: &[SamplePoint]) -> Result<Self> {
        TinBuilder::new().build(points)
    }

    /// Assemble a TIN from nodes and triangle corner indices, deriving adjacency
    pub(crate) fn assemble(mut nodes: Vec<Node>, corners: Vec<[usize; 3]>) -> Self {
        for node in &mut nodes {
            node.neighbors.clear();
        }
        for c in &corners {
            for (a, b) in [(c[0], c[1]), (c[1], c[2]), (c[2], c[0])] {
                nodes[a].neighbors.push(b);
                nodes[b].neighbors.push(a);
            }
        }
        for node in &mut nodes {
            node.neighbors.sort_unstable();
            node.neighbors.dedup();
        }

        let triangles = corners.into_iter().map(|c| Triangle::new(c, &nodes)).collect();
        Self { nodes, triangles }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> &Node {
        &self.nodes[index]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn triangle(&self, index: usize) -> &Triangle {
        &self.triangles[index]
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Neighbor indices of node `index`
    pub fn neighbors(&self, index: usize) -> &[usize] {
        &self.nodes[index].neighbors
    }

    /// Whether two nodes share a triangle edge
    pub fn is_adjacent(&self, a: usize, b: usize) -> bool {
        self.nodes[a].neighbors.binary_search(&b).is_ok()
    }
}

/// Builder for [`Tin`], optionally padding the point set with a frame.
#[derive(Debug, Clone, Default)]
pub struct TinBuilder {
    frame: Option<(f64, f64, f64, f64)>,
}

impl TinBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the four corners of `(min_x, min_y, max_x, max_y)` as extra nodes.
    ///
    /// Each corner takes the value of the nearest input point; on equal
    /// distances the first point in input order wins.
    pub fn frame(mut self, extent: (f64, f64, f64, f64)) -> Self {
        self.frame = Some(extent);
        self
    }

    /// Build the triangulation.
    ///
    /// # Errors
    /// - [`Error::InsufficientPoints`] if fewer than 3 distinct nodes remain
    /// - [`Error::Triangulation`] if no triangle can be formed (collinear input)
    pub fn build(&self, points: &[SamplePoint]) -> Result<Tin> {
        let valid: Vec<SamplePoint> = points
            .iter()
            .filter(|p| p.x.is_finite() && p.y.is_finite() && p.value.is_finite())
            .copied()
            .collect();
        if valid.len() < points.len() {
            debug!(dropped = points.len() - valid.len(), "ignoring non-finite sample points");
        }

        let mut nodes: Vec<Node> = Vec::with_capacity(valid.len() + 4);
        let mut positions: HashSet<(u64, u64)> = HashSet::with_capacity(valid.len() + 4);
        let mut duplicates = 0usize;

        let mut insert = |x: f64, y: f64, value: f64, nodes: &mut Vec<Node>| {
            // +0.0 folds -0.0 into 0.0 so both hash alike
            let key = ((x + 0.0).to_bits(), (y + 0.0).to_bits());
            if positions.insert(key) {
                nodes.push(Node::new(x, y, value));
            } else {
                duplicates += 1;
            }
        };

        for p in &valid {
            insert(p.x, p.y, p.value, &mut nodes);
        }

        if let Some(extent) = self.frame {
            for (x, y, value) in frame_corners(extent, &valid) {
                insert(x, y, value, &mut nodes);
            }
        }

        if duplicates > 0 {
            debug!(duplicates, "merged coincident points");
        }

        if nodes.len() < 3 {
            return Err(Error::InsufficientPoints {
                required: 3,
                found: nodes.len(),
            });
        }

        let corners = delaunay(&nodes);
        if corners.is_empty() {
            return Err(Error::Triangulation(
                "no triangle could be formed (collinear points?)".into(),
            ));
        }

        let tin = Tin::assemble(nodes, corners);
        debug!(
            nodes = tin.node_count(),
            triangles = tin.triangle_count(),
            "built TIN"
        );
        Ok(tin)
    }
}

/// Frame corners (lower-left, upper-left, upper-right, lower-right) with
/// the value of the nearest input point. Empty when there are no points.
///
/// A corner within rounding distance of an input point is left out; the
/// point already anchors that corner.
fn frame_corners(extent: (f64, f64, f64, f64), points: &[SamplePoint]) -> Vec<(f64, f64, f64)> {
    let (x_min, y_min, x_max, y_max) = extent;
    let corners = [(x_min, y_min), (x_min, y_max), (x_max, y_max), (x_max, y_min)];
    let snap = 1e-9 * (x_max - x_min).max(y_max - y_min);

    corners
        .iter()
        .filter_map(|&(cx, cy)| {
            let mut best: Option<(f64, f64)> = None;
            for p in points {
                let d = p.dist_sq(cx, cy);
                if best.map_or(true, |(bd, _)| d < bd) {
                    best = Some((d, p.value));
                }
            }
            match best {
                Some((d, _)) if d <= snap * snap => None,
                Some((_, value)) => Some((cx, cy, value)),
                None => None,
            }
        })
        .collect()
}

/// Circumcircle of a triangle
#[derive(Debug, Clone, Copy)]
struct Circumcircle {
    cx: f64,
    cy: f64,
    radius_sq: f64,
}

/// Circumcircle, `None` for (near) collinear corners.
///
/// Computed relative to `a` so far-from-origin coordinates keep precision;
/// the collinearity test is relative to the edge lengths.
fn circumcircle(a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> Option<Circumcircle> {
    let (bx, by) = (b.0 - a.0, b.1 - a.1);
    let (cx, cy) = (c.0 - a.0, c.1 - a.1);

    let b2 = bx * bx + by * by;
    let c2 = cx * cx + cy * cy;
    let d = 2.0 * (bx * cy - by * cx);
    if !(d.abs() > 1e-12 * 2.0 * (b2 * c2).sqrt()) {
        return None;
    }

    let ux = (cy * b2 - by * c2) / d;
    let uy = (bx * c2 - cx * b2) / d;

    Some(Circumcircle {
        cx: a.0 + ux,
        cy: a.1 + uy,
        radius_sq: ux * ux + uy * uy,
    })
}

/// Bowyer-Watson Delaunay triangulation; returns corner indices into `nodes`.
///
/// Points are inserted in order of x. A triangle whose circumcircle lies
/// entirely left of the current point can no longer be invalidated and is
/// moved out of the search set, so each insertion only scans triangles near
/// the sweep line.
fn delaunay(nodes: &[Node]) -> Vec<[usize; 3]> {
    if nodes.len() < 3 {
        return Vec::new();
    }

    let (min_x, min_y, max_x, max_y) = nodes.iter().fold(
        (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        |(x0, y0, x1, y1), n| (x0.min(n.x), y0.min(n.y), x1.max(n.x), y1.max(n.y)),
    );

    let dx = max_x - min_x;
    let dy = max_y - min_y;
    let span = dx.max(dy);
    let delta = if span > 0.0 { span } else { 1.0 };

    // Super-triangle occupies indices 0..3; node i is vertex i + 3
    let mut vertices: Vec<(f64, f64)> = vec![
        (min_x - 10.0 * delta, min_y - delta),
        (min_x + 0.5 * dx, max_y + 10.0 * delta),
        (max_x + 10.0 * delta, min_y - delta),
    ];
    vertices.extend(nodes.iter().map(|n| (n.x, n.y)));

    let mut order: Vec<usize> = (3..vertices.len()).collect();
    order.sort_by(|&a, &b| {
        vertices[a]
            .0
            .total_cmp(&vertices[b].0)
            .then(vertices[a].1.total_cmp(&vertices[b].1))
    });

    let mut closed: Vec<[usize; 3]> = Vec::with_capacity(2 * nodes.len());
    let mut open: Vec<([usize; 3], Circumcircle)> = Vec::new();
    match circumcircle(vertices[0], vertices[1], vertices[2]) {
        Some(cc) => open.push(([0, 1, 2], cc)),
        None => return Vec::new(),
    }

    let mut edge_count: HashMap<(usize, usize), u32> = HashMap::new();

    for vi in order {
        let (px, py) = vertices[vi];

        let mut bad: Vec<[usize; 3]> = Vec::new();
        let mut kept = Vec::with_capacity(open.len() + 2);
        for (t, cc) in open.drain(..) {
            let ddx = px - cc.cx;
            let ddy = py - cc.cy;
            if ddx > 0.0 && ddx * ddx > cc.radius_sq {
                closed.push(t);
            } else if ddx * ddx + ddy * ddy <= cc.radius_sq {
                bad.push(t);
            } else {
                kept.push((t, cc));
            }
        }
        open = kept;

        // Hole boundary: edges of bad triangles not shared with another bad triangle
        edge_count.clear();
        for t in &bad {
            for (ea, eb) in [(t[0], t[1]), (t[1], t[2]), (t[2], t[0])] {
                *edge_count.entry((ea.min(eb), ea.max(eb))).or_insert(0) += 1;
            }
        }
        for t in &bad {
            for (ea, eb) in [(t[0], t[1]), (t[1], t[2]), (t[2], t[0])] {
                if edge_count.get(&(ea.min(eb), ea.max(eb))) == Some(&1) {
                    let tri = [ea, eb, vi];
                    match circumcircle(vertices[ea], vertices[eb], vertices[vi]) {
                        Some(cc) => open.push((tri, cc)),
                        None => closed.push(tri),
                    }
                }
            }
        }
    }

    closed.extend(open.into_iter().map(|(t, _)| t));
    closed
        .into_iter()
        .filter(|t| t.iter().all(|&v| v >= 3))
        .filter(|t| circumcircle(vertices[t[0]], vertices[t[1]], vertices[t[2]]).is_some())
        .map(|t| t.map(|v| v - 3))
        .collect()
}

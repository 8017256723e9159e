//! Topological neighborhoods of TIN triangles
//!
//! The point set used to fit a triangle's local spline is the triangle's
//! corners, their direct neighbors, and optionally one or two further
//! rings of neighbors.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tinspline_core::Error;

use super::tin::Tin;

/// How far beyond the immediate neighbors of a triangle to collect nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NeighborhoodLevel {
    /// Corners and their direct neighbors
    Immediate,
    /// Plus the neighbors of those
    #[default]
    Level1,
    /// Plus one more ring
    Level2,
}

impl NeighborhoodLevel {
    /// Number of extra rings beyond the immediate neighbors
    pub fn depth(self) -> usize {
        match self {
            NeighborhoodLevel::Immediate => 0,
            NeighborhoodLevel::Level1 => 1,
            NeighborhoodLevel::Level2 => 2,
        }
    }
}

impl TryFrom<u8> for NeighborhoodLevel {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(NeighborhoodLevel::Immediate),
            1 => Ok(NeighborhoodLevel::Level1),
            2 => Ok(NeighborhoodLevel::Level2),
            _ => Err(Error::InvalidParameter {
                name: "level",
                value: value.to_string(),
                reason: "expected 0 (immediate), 1 or 2".into(),
            }),
        }
    }
}

impl FromStr for NeighborhoodLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "immediate" | "0" => Ok(NeighborhoodLevel::Immediate),
            "level1" | "level 1" | "1" => Ok(NeighborhoodLevel::Level1),
            "level2" | "level 2" | "2" => Ok(NeighborhoodLevel::Level2),
            other => Err(Error::InvalidParameter {
                name: "level",
                value: other.to_string(),
                reason: "expected immediate, level1 or level2".into(),
            }),
        }
    }
}

impl fmt::Display for NeighborhoodLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NeighborhoodLevel::Immediate => "immediate",
            NeighborhoodLevel::Level1 => "level 1",
            NeighborhoodLevel::Level2 => "level 2",
        };
        f.write_str(name)
    }
}

/// Linear membership test; neighborhoods are small.
fn push_unique(collected: &mut Vec<usize>, node: usize) -> bool {
    if collected.contains(&node) {
        false
    } else {
        collected.push(node);
        true
    }
}

/// Node indices within reach of a triangle, without duplicates.
///
/// The result starts with the three corners, followed by their direct
/// neighbors and then `level.depth()` further breadth-first rings, each in
/// discovery order.
pub fn collect_neighborhood(tin: &Tin, triangle: usize, level: NeighborhoodLevel) -> Vec<usize> {
    let corners = tin.triangle(triangle).nodes();
    let mut collected = Vec::with_capacity(16);

    for &c in &corners {
        push_unique(&mut collected, c);
    }

    let mut frontier: Vec<usize> = Vec::new();
    for &c in &corners {
        for &n in tin.neighbors(c) {
            if push_unique(&mut collected, n) {
                frontier.push(n);
            }
        }
    }

    for _ in 0..level.depth() {
        let mut next = Vec::new();
        for &node in &frontier {
            for &n in tin.neighbors(node) {
                if push_unique(&mut collected, n) {
                    next.push(n);
                }
            }
        }
        if next.is_empty() {
            break;
        }
        frontier = next;
    }

    collected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpolation::tin::Node;
    use crate::interpolation::SamplePoint;
    use std::collections::BTreeSet;

    fn grid_tin(n: usize) -> Tin {
        let mut points = Vec::new();
        for i in 0..n {
            for j in 0..n {
                // Small jitter avoids cocircular quadruples
                let x = i as f64 + ((i * 5 + j * 3) % 7) as f64 * 0.03;
                let y = j as f64 + ((i * 2 + j * 5) % 7) as f64 * 0.03;
                points.push(SamplePoint::new(x, y, x * y));
            }
        }
        Tin::from_points(&points).unwrap()
    }

    fn central_triangle(tin: &Tin) -> usize {
        let (cx, cy) = (3.0, 3.0);
        (0..tin.triangle_count())
            .min_by(|&a, &b| {
                let da = centroid_dist(tin, a, cx, cy);
                let db = centroid_dist(tin, b, cx, cy);
                da.total_cmp(&db)
            })
            .unwrap()
    }

    fn centroid_dist(tin: &Tin, t: usize, cx: f64, cy: f64) -> f64 {
        let v = tin.triangle(t).vertices();
        let x = (v[0].0 + v[1].0 + v[2].0) / 3.0;
        let y = (v[0].1 + v[1].1 + v[2].1) / 3.0;
        (x - cx).powi(2) + (y - cy).powi(2)
    }

    #[test]
    fn test_immediate_is_union_of_corner_neighbors() {
        let tin = grid_tin(7);
        let t = central_triangle(&tin);
        let collected = collect_neighborhood(&tin, t, NeighborhoodLevel::Immediate);

        let mut expected = BTreeSet::new();
        for c in tin.triangle(t).nodes() {
            expected.insert(c);
            expected.extend(tin.neighbors(c).iter().copied());
        }

        let as_set: BTreeSet<usize> = collected.iter().copied().collect();
        assert_eq!(as_set.len(), collected.len(), "duplicates in neighborhood");
        assert_eq!(as_set, expected);
        assert_eq!(&collected[..3], &tin.triangle(t).nodes());
    }

    #[test]
    fn test_levels_are_nested() {
        let tin = grid_tin(7);
        let t = central_triangle(&tin);

        let l0: BTreeSet<usize> = collect_neighborhood(&tin, t, NeighborhoodLevel::Immediate).into_iter().collect();
        let l1: BTreeSet<usize> = collect_neighborhood(&tin, t, NeighborhoodLevel::Level1).into_iter().collect();
        let l2: BTreeSet<usize> = collect_neighborhood(&tin, t, NeighborhoodLevel::Level2).into_iter().collect();

        assert!(l0.is_subset(&l1));
        assert!(l1.is_subset(&l2));
        assert!(l1.len() > l0.len());
        assert!(l2.len() > l1.len());
    }

    #[test]
    fn test_level1_adds_neighbors_of_neighbors() {
        let tin = grid_tin(7);
        let t = central_triangle(&tin);
        let l0 = collect_neighborhood(&tin, t, NeighborhoodLevel::Immediate);
        let l1: BTreeSet<usize> = collect_neighborhood(&tin, t, NeighborhoodLevel::Level1).into_iter().collect();

        for &n in &l0 {
            for nn in tin.neighbors(n) {
                assert!(l1.contains(nn));
            }
        }
    }

    #[test]
    fn test_isolated_node_is_never_collected() {
        let nodes = vec![
            Node::new(0.0, 0.0, 1.0),
            Node::new(1.0, 0.0, 2.0),
            Node::new(0.0, 1.0, 3.0),
            Node::new(9.0, 9.0, 4.0),
        ];
        let tin = Tin::assemble(nodes, vec![[0, 1, 2]]);
        assert!(tin.neighbors(3).is_empty());

        let collected = collect_neighborhood(&tin, 0, NeighborhoodLevel::Level2);
        assert_eq!(collected, vec![0, 1, 2]);
    }

    #[test]
    fn test_level_parsing() {
        assert_eq!("immediate".parse::<NeighborhoodLevel>().unwrap(), NeighborhoodLevel::Immediate);
        assert_eq!("2".parse::<NeighborhoodLevel>().unwrap(), NeighborhoodLevel::Level2);
        assert_eq!(NeighborhoodLevel::try_from(1).unwrap(), NeighborhoodLevel::Level1);
        assert!(NeighborhoodLevel::try_from(3).is_err());
        assert!("level3".parse::<NeighborhoodLevel>().is_err());
        assert_eq!(NeighborhoodLevel::default(), NeighborhoodLevel::Level1);
    }
}

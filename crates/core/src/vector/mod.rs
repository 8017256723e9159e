//! Point, line and polygon features carrying attribute values
//!
//! Gridding consumes every vertex of every part of a feature's geometry,
//! paired with one numeric attribute chosen by name.

use geo_types::{Coord, Geometry, Point, Polygon};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Attribute value types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl AttributeValue {
    /// Numeric interpretation of the value.
    ///
    /// Strings are parsed; booleans and nulls have no numeric value.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Int(v) => Some(*v as f64),
            AttributeValue::Float(v) => Some(*v),
            AttributeValue::String(s) => s.trim().parse().ok(),
            AttributeValue::Null | AttributeValue::Bool(_) => None,
        }
    }
}

impl std::fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttributeValue::Null => Ok(()),
            AttributeValue::Bool(v) => write!(f, "{}", v),
            AttributeValue::Int(v) => write!(f, "{}", v),
            AttributeValue::Float(v) => write!(f, "{}", v),
            AttributeValue::String(v) => write!(f, "{}", v),
        }
    }
}

/// A geographic feature with geometry and attributes
#[derive(Debug, Clone)]
pub struct Feature {
    /// Feature geometry
    pub geometry: Option<Geometry<f64>>,
    /// Feature attributes
    pub properties: HashMap<String, AttributeValue>,
    /// Optional feature ID
    pub id: Option<String>,
}

impl Feature {
    /// Create a new feature with geometry
    pub fn new(geometry: Geometry<f64>) -> Self {
        Self {
            geometry: Some(geometry),
            properties: HashMap::new(),
            id: None,
        }
    }

    /// Create a point feature
    pub fn point(x: f64, y: f64) -> Self {
        Self::new(Geometry::Point(Point::new(x, y)))
    }

    /// Create a feature with no geometry
    pub fn empty() -> Self {
        Self {
            geometry: None,
            properties: HashMap::new(),
            id: None,
        }
    }

    /// Builder-style attribute setter
    pub fn with_property(mut self, key: impl Into<String>, value: AttributeValue) -> Self {
        self.set_property(key, value);
        self
    }

    /// Set an attribute
    pub fn set_property(&mut self, key: impl Into<String>, value: AttributeValue) {
        self.properties.insert(key.into(), value);
    }

    /// Get an attribute
    pub fn get_property(&self, key: &str) -> Option<&AttributeValue> {
        self.properties.get(key)
    }

    /// Every vertex of every part of the geometry, in storage order.
    ///
    /// Polygon rings are reported exterior first, then interiors; a ring's
    /// closing vertex is included as stored.
    pub fn coords(&self) -> Vec<Coord<f64>> {
        self.parts().into_iter().flatten().collect()
    }

    /// Vertices grouped by geometry part: one per line string or ring,
    /// a single part for points and multipoints.
    pub fn parts(&self) -> Vec<Vec<Coord<f64>>> {
        let mut out = Vec::new();
        if let Some(geometry) = &self.geometry {
            collect_parts(geometry, &mut out);
        }
        out
    }
}

fn collect_polygon(poly: &Polygon<f64>, out: &mut Vec<Vec<Coord<f64>>>) {
    out.push(poly.exterior().0.clone());
    out.extend(poly.interiors().iter().map(|ring| ring.0.clone()));
}

fn collect_parts(geometry: &Geometry<f64>, out: &mut Vec<Vec<Coord<f64>>>) {
    match geometry {
        Geometry::Point(p) => out.push(vec![p.0]),
        Geometry::Line(l) => out.push(vec![l.start, l.end]),
        Geometry::LineString(ls) => out.push(ls.0.clone()),
        Geometry::Polygon(poly) => collect_polygon(poly, out),
        Geometry::MultiPoint(mp) => out.push(mp.0.iter().map(|p| p.0).collect()),
        Geometry::MultiLineString(mls) => out.extend(mls.0.iter().map(|ls| ls.0.clone())),
        Geometry::MultiPolygon(mpoly) => {
            for poly in &mpoly.0 {
                collect_polygon(poly, out);
            }
        }
        Geometry::GeometryCollection(gc) => {
            for g in &gc.0 {
                collect_parts(g, out);
            }
        }
        Geometry::Rect(r) => collect_polygon(&r.to_polygon(), out),
        Geometry::Triangle(t) => out.push(t.to_array().to_vec()),
    }
}

/// Collection of features
#[derive(Debug, Clone, Default)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new() -> Self {
        Self { features: Vec::new() }
    }

    pub fn push(&mut self, feature: Feature) {
        self.features.push(feature);
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter()
    }

    /// Attribute names present on any feature, sorted
    pub fn field_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .features
            .iter()
            .flat_map(|f| f.properties.keys().cloned())
            .collect();
        names.sort();
        names.dedup();
        names
    }
}

impl FromIterator<Feature> for FeatureCollection {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        Self {
            features: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for FeatureCollection {
    type Item = Feature;
    type IntoIter = std::vec::IntoIter<Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.into_iter()
    }
}

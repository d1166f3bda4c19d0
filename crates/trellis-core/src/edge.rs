//! Graph edges and their curve geometry.

use std::{fmt, str::FromStr};

use indexmap::IndexMap;

use crate::{geometry::Position, identifier::Id};

/// How an edge is drawn between its endpoints.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Curve {
    #[default]
    Straight,
    Curved,
    /// A polyline through an ordered list of control points.
    Composite(Vec<Position>),
}

impl Curve {
    /// The textual kind, as used by the `_rendering_type` attribute.
    pub fn kind(&self) -> &'static str {
        match self {
            Curve::Straight => "straight",
            Curve::Curved => "curved",
            Curve::Composite(_) => "composite",
        }
    }

    /// Control points of a composite curve, empty for the other kinds.
    pub fn control_points(&self) -> &[Position] {
        match self {
            Curve::Composite(points) => points,
            _ => &[],
        }
    }
}

/// Error returned when parsing an unknown curve kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCurveKind(pub String);

impl fmt::Display for UnknownCurveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown curve kind `{}`", self.0)
    }
}

impl std::error::Error for UnknownCurveKind {}

impl FromStr for Curve {
    type Err = UnknownCurveKind;

    /// Parses a curve kind. Composite curves start without control points.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "straight" => Ok(Curve::Straight),
            "curved" => Ok(Curve::Curved),
            "composite" => Ok(Curve::Composite(Vec::new())),
            _ => Err(UnknownCurveKind(s.to_string())),
        }
    }
}

/// A connection between two nodes of a [`Graph`](crate::graph::Graph).
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    id: Id,
    source: Id,
    target: Id,
    directed: bool,
    curve: Curve,
    attributes: IndexMap<String, String>,
}

impl Edge {
    /// Creates a straight directed edge.
    pub fn new(id: Id, source: Id, target: Id) -> Self {
        Self {
            id,
            source,
            target,
            directed: true,
            curve: Curve::Straight,
            attributes: IndexMap::new(),
        }
    }

    pub fn with_directed(mut self, directed: bool) -> Self {
        self.directed = directed;
        self
    }

    pub fn with_curve(mut self, curve: Curve) -> Self {
        self.curve = curve;
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn source(&self) -> Id {
        self.source
    }

    pub fn target(&self) -> Id {
        self.target
    }

    pub fn is_directed(&self) -> bool {
        self.directed
    }

    pub fn curve(&self) -> &Curve {
        &self.curve
    }

    pub fn set_curve(&mut self, curve: Curve) {
        self.curve = curve;
    }

    pub fn attributes(&self) -> &IndexMap<String, String> {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut IndexMap<String, String> {
        &mut self.attributes
    }

    /// Returns `true` if `node` is either endpoint.
    pub fn touches(&self, node: Id) -> bool {
        self.source == node || self.target == node
    }

    /// The endpoint opposite to `node`, if `node` is an endpoint.
    pub fn opposite(&self, node: Id) -> Option<Id> {
        if self.source == node {
            Some(self.target)
        } else if self.target == node {
            Some(self.source)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_curve_kind_round_trip() {
        for curve in [Curve::Straight, Curve::Curved, Curve::Composite(Vec::new())] {
            let parsed: Curve = curve.kind().parse().unwrap();
            assert_eq!(parsed, curve);
        }
        assert!("wiggly".parse::<Curve>().is_err());
        assert_eq!("CURVED".parse::<Curve>(), Ok(Curve::Curved));
    }

    #[test]
    fn test_control_points() {
        let points = vec![Position::planar(1.0, 1.0), Position::planar(2.0, 0.0)];
        assert_eq!(Curve::Composite(points.clone()).control_points(), &points[..]);
        assert!(Curve::Curved.control_points().is_empty());
    }

    #[test]
    fn test_touches_and_opposite() {
        let edge = Edge::new(Id::new("e"), Id::new("a"), Id::new("b"));
        assert!(edge.touches(Id::new("a")));
        assert!(edge.touches(Id::new("b")));
        assert!(!edge.touches(Id::new("c")));
        assert_eq!(edge.opposite(Id::new("a")), Some(Id::new("b")));
        assert_eq!(edge.opposite(Id::new("c")), None);
    }

    #[test]
    fn test_defaults() {
        let edge = Edge::new(Id::new("e"), Id::new("a"), Id::new("b"));
        assert!(edge.is_directed());
        assert_eq!(edge.curve(), &Curve::Straight);
        assert!(!edge.with_directed(false).is_directed());
    }
}

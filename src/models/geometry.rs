//! GeoJSON geometries.

use serde::{Deserialize, Serialize};

/// A GeoJSON position: longitude, latitude and optional altitude.
pub type Position = Vec<f64>;

/// A GeoJSON geometry object, tagged by its `type` member.
///
/// # Example
///
/// ```rust
/// use stapi::models::Geometry;
///
/// let point = Geometry::point(-122.4194, 37.7749);
/// let json = serde_json::to_value(&point).unwrap();
/// assert_eq!(json["type"], "Point");
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    /// A single position.
    Point {
        /// The position.
        coordinates: Position,
    },
    /// Several positions.
    MultiPoint {
        /// The positions.
        coordinates: Vec<Position>,
    },
    /// A line through two or more positions.
    LineString {
        /// The positions along the line.
        coordinates: Vec<Position>,
    },
    /// Several lines.
    MultiLineString {
        /// The lines.
        coordinates: Vec<Vec<Position>>,
    },
    /// A polygon made of linear rings; the first ring is the exterior.
    Polygon {
        /// The rings.
        coordinates: Vec<Vec<Position>>,
    },
    /// Several polygons.
    MultiPolygon {
        /// The polygons.
        coordinates: Vec<Vec<Vec<Position>>>,
    },
    /// A heterogeneous collection of geometries.
    GeometryCollection {
        /// The member geometries.
        geometries: Vec<Geometry>,
    },
}

impl Geometry {
    /// Creates a point geometry.
    #[must_use]
    pub fn point(lon: f64, lat: f64) -> Self {
        Self::Point {
            coordinates: vec![lon, lat],
        }
    }

    /// Returns the GeoJSON type name.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Point { .. } => "Point",
            Self::MultiPoint { .. } => "MultiPoint",
            Self::LineString { .. } => "LineString",
            Self::MultiLineString { .. } => "MultiLineString",
            Self::Polygon { .. } => "Polygon",
            Self::MultiPolygon { .. } => "MultiPolygon",
            Self::GeometryCollection { .. } => "GeometryCollection",
        }
    }
}

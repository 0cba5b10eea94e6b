//! Minimal KML document model with KMZ (zipped KML) persistence.

mod reader;
mod writer;

use geo::Coord;

use crate::colors::Rgba;

pub use reader::{parse_kml, read_kmz};
pub use writer::{to_kml, write_kmz};

/// Entry name of the KML document inside a KMZ archive
pub const KMZ_ENTRY: &str = "doc.kml";

#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Coord<f64>),
    /// Outer boundary only, coordinates in (longitude, latitude) order
    Polygon(Vec<Coord<f64>>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Placemark {
    pub name: String,
    pub geometry: Geometry,
    /// Fill color, written as a KML style when present
    pub fill: Option<Rgba>,
}

impl Placemark {
    pub fn point(name: impl Into<String>, coord: Coord<f64>) -> Self {
        Self {
            name: name.into(),
            geometry: Geometry::Point(coord),
            fill: None,
        }
    }

    pub fn polygon(name: impl Into<String>, ring: Vec<Coord<f64>>) -> Self {
        Self {
            name: name.into(),
            geometry: Geometry::Polygon(ring),
            fill: None,
        }
    }

    pub fn with_fill(mut self, fill: Rgba) -> Self {
        self.fill = Some(fill);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct KmlDocument {
    pub placemarks: Vec<Placemark>,
}

impl KmlDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, placemark: Placemark) {
        self.placemarks.push(placemark);
    }

    pub fn len(&self) -> usize {
        self.placemarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placemarks.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.placemarks.iter().map(|p| p.name.as_str())
    }
}

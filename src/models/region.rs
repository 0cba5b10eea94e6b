//! Voronoi regions attached to the office that generated them.

use geo::{Area, Coord, LineString, Polygon};

use super::{DistrictCode, PointId};

/// Geometry of a single Voronoi region.
#[derive(Debug, Clone, PartialEq)]
pub enum RegionShape {
    /// Every vertex of the cell is finite.
    Bounded(Vec<Coord<f64>>),
    /// The cell touches the convex hull. Its unbounded vertices were dropped,
    /// so consecutive ring entries listed in `gaps` are joined by a chord
    /// instead of the true (infinite) boundary.
    Partial {
        ring: Vec<Coord<f64>>,
        /// Ring positions followed by a dropped vertex
        gaps: Vec<usize>,
    },
    /// No finite vertex at all.
    Degenerate,
}

impl RegionShape {
    /// Vertices of the region in listed order (empty for degenerate cells)
    pub fn polygon(&self) -> &[Coord<f64>] {
        match self {
            RegionShape::Bounded(ring) => ring,
            RegionShape::Partial { ring, .. } => ring,
            RegionShape::Degenerate => &[],
        }
    }

    pub fn is_partial(&self) -> bool {
        matches!(self, RegionShape::Partial { .. })
    }

    pub fn is_empty(&self) -> bool {
        self.polygon().is_empty()
    }

    pub fn kind(&self) -> &'static str {
        match self {
            RegionShape::Bounded(_) => "bounded",
            RegionShape::Partial { .. } => "partial",
            RegionShape::Degenerate => "degenerate",
        }
    }
}

/// A Voronoi cell classified by the district of its office
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub point_id: PointId,
    pub district: DistrictCode,
    pub shape: RegionShape,
}

impl Region {
    /// Feature name used in the polygon container and the legend
    pub fn name(&self) -> String {
        format!("Districte {}", self.district)
    }

    /// Closed polygon built from the listed vertices, if there are any.
    ///
    /// `geo` closes the exterior ring, so a partial region comes out as the
    /// chord-joined approximation.
    pub fn to_polygon(&self) -> Option<Polygon<f64>> {
        let ring = self.shape.polygon();
        if ring.is_empty() {
            return None;
        }
        Some(Polygon::new(LineString::from(ring.to_vec()), vec![]))
    }

    /// Planar area in squared degrees; only bounded cells have a true area
    pub fn area(&self) -> Option<f64> {
        match &self.shape {
            RegionShape::Bounded(_) => self.to_polygon().map(|p| p.unsigned_area()),
            _ => None,
        }
    }
}

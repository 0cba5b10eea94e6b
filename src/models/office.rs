//! Office records loaded from the input dataset.

use geo::Coord;
use serde::{Deserialize, Serialize};

/// Stable identifier of an office: its zero-based row in the input dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PointId(pub usize);

impl std::fmt::Display for PointId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Administrative district classifying an office. `0` means unassigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DistrictCode(pub u32);

impl DistrictCode {
    pub const UNASSIGNED: DistrictCode = DistrictCode(0);

    pub fn is_assigned(&self) -> bool {
        self.0 > 0
    }
}

impl std::fmt::Display for DistrictCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single geo-located office
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OfficePoint {
    pub id: PointId,
    /// Longitude
    pub x: f64,
    /// Latitude
    pub y: f64,
    pub district: DistrictCode,
}

impl OfficePoint {
    pub fn new(id: usize, x: f64, y: f64, district: u32) -> Self {
        Self {
            id: PointId(id),
            x,
            y,
            district: DistrictCode(district),
        }
    }

    pub fn coord(&self) -> Coord<f64> {
        Coord {
            x: self.x,
            y: self.y,
        }
    }

    /// Feature name used in the point containers
    pub fn label(&self) -> String {
        format!("Oficina {}", self.id)
    }
}

/// Read-only collection of offices in dataset order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointSet {
    points: Vec<OfficePoint>,
}

impl PointSet {
    pub fn new(points: Vec<OfficePoint>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OfficePoint> {
        self.points.iter()
    }

    pub fn as_slice(&self) -> &[OfficePoint] {
        &self.points
    }

    pub fn get(&self, id: PointId) -> Option<&OfficePoint> {
        // Ids are row indices, but a filtered set no longer lines up with them.
        match self.points.get(id.0) {
            Some(p) if p.id == id => Some(p),
            _ => self.points.iter().find(|p| p.id == id),
        }
    }

    /// Offices that take part in the tessellation (`district > 0`)
    pub fn assigned(&self) -> Vec<OfficePoint> {
        self.points
            .iter()
            .filter(|p| p.district.is_assigned())
            .copied()
            .collect()
    }

    /// Offices exported as bare markers (`district == 0`)
    pub fn unassigned(&self) -> Vec<OfficePoint> {
        self.points
            .iter()
            .filter(|p| !p.district.is_assigned())
            .copied()
            .collect()
    }

    /// Offices of one district, in dataset order
    pub fn in_district(&self, code: DistrictCode) -> impl Iterator<Item = &OfficePoint> {
        self.points.iter().filter(move |p| p.district == code)
    }

    /// Distinct district codes in first-seen order, including `0`.
    pub fn districts(&self) -> Vec<DistrictCode> {
        let mut seen = hashbrown::HashSet::new();
        self.points
            .iter()
            .map(|p| p.district)
            .filter(|code| seen.insert(*code))
            .collect()
    }
}

impl FromIterator<OfficePoint> for PointSet {
    fn from_iter<I: IntoIterator<Item = OfficePoint>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

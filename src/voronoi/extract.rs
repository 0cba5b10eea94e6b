use geo::Coord;
use hashbrown::HashMap;
use tracing::{info, warn};

use super::{Diagram, DiagramRegion, RegionVertex};
use crate::models::{OfficePoint, PointId, Region, RegionShape};

/// Turns diagram regions into polygons classified by district.
pub struct RegionExtractor;

impl RegionExtractor {
    /// One [`Region`] per diagram region, joined to `points` by id.
    pub fn extract(diagram: &Diagram, points: &[OfficePoint]) -> Vec<Region> {
        let by_id: HashMap<PointId, &OfficePoint> = points.iter().map(|p| (p.id, p)).collect();

        let regions: Vec<Region> = diagram
            .regions
            .iter()
            .filter_map(|dr| {
                let Some(point) = by_id.get(&dr.point_id) else {
                    warn!("Diagram region for unknown office {}", dr.point_id);
                    return None;
                };
                Some(Region {
                    point_id: point.id,
                    district: point.district,
                    shape: Self::shape(diagram, dr),
                })
            })
            .collect();

        let partial = regions.iter().filter(|r| r.shape.is_partial()).count();
        let degenerate = regions.iter().filter(|r| r.shape.is_empty()).count();
        info!(
            "Extracted {} regions ({} bounded, {} partial, {} degenerate)",
            regions.len(),
            regions.len() - partial - degenerate,
            partial,
            degenerate
        );

        regions
    }

    /// Resolve vertex indices, dropping unbounded entries and recording
    /// where the ring was cut.
    pub fn shape(diagram: &Diagram, region: &DiagramRegion) -> RegionShape {
        let mut ring: Vec<Coord<f64>> = Vec::with_capacity(region.vertices.len());
        let mut gaps = Vec::new();
        let mut leading_gap = false;

        for v in &region.vertices {
            match v {
                RegionVertex::Finite(k) => match diagram.vertices.get(*k) {
                    Some(c) => ring.push(*c),
                    None => {
                        warn!("Region of office {} references missing vertex {}", region.point_id, k);
                        Self::mark_gap(&ring, &mut gaps, &mut leading_gap);
                    }
                },
                RegionVertex::Unbounded => Self::mark_gap(&ring, &mut gaps, &mut leading_gap),
            }
        }

        if ring.is_empty() {
            return RegionShape::Degenerate;
        }
        // A cut before the first vertex closes between the last and the first
        if leading_gap {
            let last = ring.len() - 1;
            if !gaps.contains(&last) {
                gaps.push(last);
            }
        }
        if gaps.is_empty() {
            RegionShape::Bounded(ring)
        } else {
            RegionShape::Partial { ring, gaps }
        }
    }

    fn mark_gap(ring: &[Coord<f64>], gaps: &mut Vec<usize>, leading_gap: &mut bool) {
        match ring.len().checked_sub(1) {
            Some(last) if gaps.last() != Some(&last) => gaps.push(last),
            Some(_) => {}
            None => *leading_gap = true,
        }
    }
}

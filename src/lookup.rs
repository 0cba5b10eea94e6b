//! Reverse lookup: which office's Voronoi region contains a location.
//!
//! A location lies in the region of its nearest office, so the lookup is a
//! nearest-neighbour query on an R-tree of the tessellated offices.

use rstar::{PointDistance, RTree, RTreeObject, AABB};
use tracing::info;

use crate::models::OfficePoint;

/// Wrapper for R-tree indexing of offices
#[derive(Debug, Clone)]
pub struct IndexedOffice {
    pub office: OfficePoint,
}

impl RTreeObject for IndexedOffice {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.office.x, self.office.y])
    }
}

impl PointDistance for IndexedOffice {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.office.x - point[0];
        let dy = self.office.y - point[1];
        dx * dx + dy * dy
    }
}

pub struct OfficeIndex {
    tree: RTree<IndexedOffice>,
}

impl OfficeIndex {
    pub fn build(offices: &[OfficePoint]) -> Self {
        let indexed: Vec<IndexedOffice> = offices
            .iter()
            .map(|office| IndexedOffice { office: *office })
            .collect();
        let tree = RTree::bulk_load(indexed);
        info!("Office index built with {} entries", tree.size());
        Self { tree }
    }

    /// Office whose region contains (`lon`, `lat`)
    pub fn locate(&self, lon: f64, lat: f64) -> Option<&OfficePoint> {
        self.tree
            .nearest_neighbor(&[lon, lat])
            .map(|indexed| &indexed.office)
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DistrictCode, PointId};

    #[test]
    fn test_empty_index() {
        let index = OfficeIndex::build(&[]);
        assert!(index.is_empty());
        assert!(index.locate(2.17, 41.38).is_none());
    }

    #[test]
    fn test_locate_nearest_office() {
        let index = OfficeIndex::build(&[
            OfficePoint::new(0, 0.0, 0.0, 1),
            OfficePoint::new(1, 2.0, 0.0, 2),
            OfficePoint::new(2, 2.0, 2.0, 3),
            OfficePoint::new(3, 0.0, 2.0, 4),
        ]);
        assert_eq!(index.len(), 4);

        let office = index.locate(1.8, 0.3).unwrap();
        assert_eq!(office.id, PointId(1));
        assert_eq!(office.district, DistrictCode(2));

        // Far outside the hull still resolves to the open region
        assert_eq!(index.locate(-50.0, 60.0).unwrap().id, PointId(3));
    }
}

use geo::Coord;
use hashbrown::HashMap;
use spade::{DelaunayTriangulation, Point2, Triangulation};
use tracing::{debug, info};

use crate::error::{Result, VoronoiError};
use crate::models::{OfficePoint, PointId};

/// Reference from a region into [`Diagram::vertices`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegionVertex {
    Finite(usize),
    /// The region is open towards infinity here
    Unbounded,
}

impl RegionVertex {
    pub fn index(&self) -> Option<usize> {
        match self {
            RegionVertex::Finite(i) => Some(*i),
            RegionVertex::Unbounded => None,
        }
    }
}

impl std::fmt::Display for RegionVertex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegionVertex::Finite(i) => write!(f, "{}", i),
            RegionVertex::Unbounded => write!(f, "-1"),
        }
    }
}

/// Region definition of one input point, in counter-clockwise order
#[derive(Debug, Clone, PartialEq)]
pub struct DiagramRegion {
    pub point_id: PointId,
    pub vertices: Vec<RegionVertex>,
}

impl DiagramRegion {
    pub fn is_bounded(&self) -> bool {
        !self.vertices.is_empty() && !self.vertices.contains(&RegionVertex::Unbounded)
    }
}

/// Voronoi vertices plus one region per input point
#[derive(Debug, Clone, PartialEq)]
pub struct Diagram {
    pub vertices: Vec<Coord<f64>>,
    /// Same length and order as the points the diagram was built from
    pub regions: Vec<DiagramRegion>,
}

impl Diagram {
    pub fn region(&self, id: PointId) -> Option<&DiagramRegion> {
        self.regions.iter().find(|r| r.point_id == id)
    }
}

/// Builds a [`Diagram`] from a sequence of offices
#[derive(Debug, Clone, Copy)]
pub struct TessellationBuilder {
    min_points: usize,
}

impl Default for TessellationBuilder {
    fn default() -> Self {
        Self { min_points: 4 }
    }
}

impl TessellationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the minimum number of points (clamped to 3, the smallest
    /// set with a triangle)
    pub fn with_min_points(mut self, min_points: usize) -> Self {
        self.min_points = min_points.max(3);
        self
    }

    pub fn min_points(&self) -> usize {
        self.min_points
    }

    pub fn build(&self, points: &[OfficePoint]) -> Result<Diagram> {
        if points.len() < self.min_points {
            return Err(VoronoiError::DegenerateInput(format!(
                "need at least {} points, got {}",
                self.min_points,
                points.len()
            )));
        }

        info!("Triangulating {} points...", points.len());

        let mut triangulation: DelaunayTriangulation<Point2<f64>> = DelaunayTriangulation::new();
        let mut handles = Vec::with_capacity(points.len());
        for p in points {
            let handle = triangulation
                .insert(Point2::new(p.x, p.y))
                .map_err(|e| {
                    VoronoiError::DegenerateInput(format!(
                        "point {} at ({}, {}) rejected: {:?}",
                        p.id, p.x, p.y, e
                    ))
                })?;
            handles.push(handle);
        }

        if triangulation.num_vertices() < points.len() {
            debug!(
                "{} duplicate points share a vertex",
                points.len() - triangulation.num_vertices()
            );
        }

        if triangulation.num_inner_faces() == 0 || triangulation.all_vertices_on_line() {
            return Err(VoronoiError::DegenerateInput(
                "all points are collinear".to_string(),
            ));
        }

        // Voronoi vertex k is the circumcenter of inner face k
        let mut face_index: HashMap<usize, usize> = HashMap::new();
        let mut vertices = Vec::with_capacity(triangulation.num_inner_faces());
        for face in triangulation.inner_faces() {
            let center = face.circumcenter();
            face_index.insert(face.fix().index(), vertices.len());
            vertices.push(Coord {
                x: center.x,
                y: center.y,
            });
        }

        let regions = points
            .iter()
            .zip(&handles)
            .map(|(p, handle)| {
                let vertex = triangulation.vertex(*handle);
                let site = vertex.position();

                // Each out edge's left face spans up to the next edge counter-clockwise
                let mut around: Vec<(f64, RegionVertex)> = vertex
                    .out_edges()
                    .map(|edge| {
                        let to = edge.to().position();
                        let angle = (to.y - site.y).atan2(to.x - site.x);
                        let entry = match edge.face().as_inner() {
                            Some(face) => face_index
                                .get(&face.fix().index())
                                .map_or(RegionVertex::Unbounded, |k| RegionVertex::Finite(*k)),
                            None => RegionVertex::Unbounded,
                        };
                        (angle, entry)
                    })
                    .collect();
                around.sort_by(|a, b| a.0.total_cmp(&b.0));

                DiagramRegion {
                    point_id: p.id,
                    vertices: around.into_iter().map(|(_, v)| v).collect(),
                }
            })
            .collect::<Vec<_>>();

        let unbounded = regions.iter().filter(|r| !r.is_bounded()).count();
        info!(
            "Diagram built: {} vertices, {} regions ({} unbounded)",
            vertices.len(),
            regions.len(),
            unbounded
        );

        Ok(Diagram { vertices, regions })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offices(coords: &[(f64, f64)]) -> Vec<OfficePoint> {
        coords
            .iter()
            .enumerate()
            .map(|(i, (x, y))| OfficePoint::new(i, *x, *y, 1))
            .collect()
    }

    fn square_with_center() -> Vec<OfficePoint> {
        offices(&[(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0), (1.0, 1.0)])
    }

    /// Small deterministic generator so tests need no extra dependency
    fn scatter(n: usize, seed: u64) -> Vec<OfficePoint> {
        let mut state = seed;
        let mut next = move || {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (state >> 11) as f64 / (1u64 << 53) as f64
        };
        (0..n)
            .map(|i| OfficePoint::new(i, 2.0 + next() * 0.2, 41.3 + next() * 0.2, 1))
            .collect()
    }

    #[test]
    fn test_vertex_is_circumcenter() {
        let diagram = TessellationBuilder::new()
            .with_min_points(3)
            .build(&offices(&[(0.0, 0.0), (2.0, 0.0), (1.0, 1.0)]))
            .unwrap();
        let c = diagram.vertices[0];
        assert!((c.x - 1.0).abs() < 1e-12);
        assert!(c.y.abs() < 1e-12);
    }

    #[test]
    fn test_too_few_points() {
        let err = TessellationBuilder::new()
            .build(&offices(&[(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)]))
            .unwrap_err();
        assert!(matches!(err, VoronoiError::DegenerateInput(_)));
    }

    #[test]
    fn test_collinear_points() {
        let points = offices(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (3.0, 3.0), (4.0, 4.0)]);
        let err = TessellationBuilder::new().build(&points).unwrap_err();
        assert!(matches!(err, VoronoiError::DegenerateInput(_)));
    }

    #[test]
    fn test_coincident_points() {
        let points = offices(&[(1.0, 1.0); 5]);
        let err = TessellationBuilder::new().build(&points).unwrap_err();
        assert!(matches!(err, VoronoiError::DegenerateInput(_)));
    }

    #[test]
    fn test_non_finite_coordinate() {
        let mut points = square_with_center();
        points[2].x = f64::NAN;
        let err = TessellationBuilder::new().build(&points).unwrap_err();
        assert!(matches!(err, VoronoiError::DegenerateInput(_)));
    }

    #[test]
    fn test_interior_point_is_bounded() {
        let diagram = TessellationBuilder::new().build(&square_with_center()).unwrap();
        assert_eq!(diagram.vertices.len(), 4);
        assert_eq!(diagram.regions.len(), 5);

        let center = diagram.region(PointId(4)).unwrap();
        assert!(center.is_bounded());
        assert_eq!(center.vertices.len(), 4);

        let mut ring: Vec<(f64, f64)> = center
            .vertices
            .iter()
            .filter_map(|v| v.index())
            .map(|k| (diagram.vertices[k].x, diagram.vertices[k].y))
            .collect();
        ring.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let expected = [(0.0, 1.0), (1.0, 0.0), (1.0, 2.0), (2.0, 1.0)];
        for (got, want) in ring.iter().zip(expected.iter()) {
            assert!((got.0 - want.0).abs() < 1e-9 && (got.1 - want.1).abs() < 1e-9);
        }
    }

    #[test]
    fn test_hull_points_carry_one_sentinel() {
        let diagram = TessellationBuilder::new().build(&square_with_center()).unwrap();
        for id in 0..4 {
            let region = diagram.region(PointId(id)).unwrap();
            let sentinels = region
                .vertices
                .iter()
                .filter(|v| **v == RegionVertex::Unbounded)
                .count();
            assert_eq!(sentinels, 1, "corner {} should be open once", id);
            assert_eq!(region.vertices.len(), 3);
        }
    }

    #[test]
    fn test_regions_keep_input_order_and_ids() {
        let mut points = scatter(40, 7);
        for (i, p) in points.iter_mut().enumerate() {
            p.id = PointId(1000 + i * 3);
        }
        let diagram = TessellationBuilder::new().build(&points).unwrap();
        assert_eq!(diagram.regions.len(), points.len());
        for (p, r) in points.iter().zip(&diagram.regions) {
            assert_eq!(p.id, r.point_id);
            assert!(!r.vertices.is_empty());
        }
    }

    #[test]
    fn test_vertices_are_equidistant_to_nearest_sites() {
        let dist = |a: Coord<f64>, p: &OfficePoint| (a.x - p.x).hypot(a.y - p.y);
        for seed in 0..30 {
            let points = scatter(80, seed);
            let diagram = TessellationBuilder::new().build(&points).unwrap();

            for (p, region) in points.iter().zip(&diagram.regions) {
                let ring: Vec<Coord<f64>> = region
                    .vertices
                    .iter()
                    .filter_map(RegionVertex::index)
                    .map(|k| diagram.vertices[k])
                    .collect();

                for v in &ring {
                    let own = dist(*v, p);
                    let nearest = points
                        .iter()
                        .map(|q| dist(*v, q))
                        .fold(f64::INFINITY, f64::min);
                    assert!(
                        (own - nearest).abs() <= 1e-6 * own.max(1e-3),
                        "seed {seed}: vertex of {} is {own} from its site, nearest site {nearest}",
                        p.id
                    );
                }

                if region.is_bounded() {
                    let twice_area: f64 = ring
                        .iter()
                        .zip(ring.iter().cycle().skip(1))
                        .map(|(a, b)| a.x * b.y - b.x * a.y)
                        .sum();
                    assert!(twice_area > 0.0, "seed {seed}: ring of {} is clockwise", p.id);
                }
            }
        }
    }

    #[test]
    fn test_duplicates_share_region() {
        let mut points = square_with_center();
        points.push(OfficePoint::new(5, 1.0, 1.0, 2));
        let diagram = TessellationBuilder::new().build(&points).unwrap();
        assert_eq!(diagram.regions.len(), 6);
        assert_eq!(
            diagram.region(PointId(4)).unwrap().vertices,
            diagram.region(PointId(5)).unwrap().vertices
        );
    }

    #[test]
    fn test_sentinel_display() {
        assert_eq!(RegionVertex::Unbounded.to_string(), "-1");
        assert_eq!(RegionVertex::Finite(3).to_string(), "3");
    }

    #[test]
    fn test_min_points_override() {
        let three = offices(&[(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)]);
        let diagram = TessellationBuilder::new()
            .with_min_points(3)
            .build(&three)
            .unwrap();
        assert_eq!(diagram.vertices.len(), 1);
        assert!(diagram.regions.iter().all(|r| !r.is_bounded()));
        assert_eq!(TessellationBuilder::new().with_min_points(1).min_points(), 3);
    }
}

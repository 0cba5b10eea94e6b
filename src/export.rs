//! Geospatial export of regions and offices as KMZ containers.
//!
//! Three independent files are written in order: region polygons,
//! unassigned offices, assigned offices. A failed write aborts the export;
//! files written earlier in the same run are left in place.

use std::path::PathBuf;

use serde::Serialize;
use tracing::{info, warn};

use crate::colors::ColorMap;
use crate::config::OutputConfig;
use crate::error::Result;
use crate::kml::{write_kmz, KmlDocument, Placemark};
use crate::models::{OfficePoint, PointSet, Region, RegionShape};

#[derive(Debug, Clone, Serialize)]
pub struct ContainerReport {
    pub path: PathBuf,
    pub features: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportReport {
    pub polygons: ContainerReport,
    pub unassigned_points: ContainerReport,
    pub assigned_points: ContainerReport,
    /// Regions without any finite vertex
    pub skipped_regions: usize,
    /// Regions exported with a chord across their unbounded side
    pub partial_regions: usize,
}

/// Writes the polygon and point containers
pub struct GeoExporter {
    polygons: PathBuf,
    unassigned_points: PathBuf,
    assigned_points: PathBuf,
    styled: bool,
}

impl GeoExporter {
    pub fn new(
        polygons: impl Into<PathBuf>,
        unassigned_points: impl Into<PathBuf>,
        assigned_points: impl Into<PathBuf>,
    ) -> Self {
        Self {
            polygons: polygons.into(),
            unassigned_points: unassigned_points.into(),
            assigned_points: assigned_points.into(),
            styled: false,
        }
    }

    pub fn from_config(config: &OutputConfig) -> Self {
        Self::new(
            config.polygons_path(),
            config.unassigned_points_path(),
            config.assigned_points_path(),
        )
        .with_styles(config.styled)
    }

    /// Embed district fill colors as KML styles
    pub fn with_styles(mut self, styled: bool) -> Self {
        self.styled = styled;
        self
    }

    /// One polygon placemark per region with at least one vertex
    pub fn polygon_document(&self, regions: &[Region], colors: &ColorMap) -> KmlDocument {
        let mut doc = KmlDocument::new();
        for region in regions {
            let ring = match &region.shape {
                RegionShape::Bounded(ring) => ring,
                RegionShape::Partial { ring, .. } => ring,
                RegionShape::Degenerate => continue,
            };
            let mut placemark = Placemark::polygon(region.name(), ring.clone());
            if self.styled {
                if let Some(fill) = colors.get(region.district) {
                    placemark = placemark.with_fill(fill);
                }
            }
            doc.push(placemark);
        }
        doc
    }

    pub fn point_document<'a, I>(points: I) -> KmlDocument
    where
        I: IntoIterator<Item = &'a OfficePoint>,
    {
        let mut doc = KmlDocument::new();
        for p in points {
            doc.push(Placemark::point(p.label(), p.coord()));
        }
        doc
    }

    pub fn export(
        &self,
        regions: &[Region],
        colors: &ColorMap,
        points: &PointSet,
    ) -> Result<ExportReport> {
        let polygons = self.polygon_document(regions, colors);
        let skipped_regions = regions.len() - polygons.len();
        let partial_regions = regions.iter().filter(|r| r.shape.is_partial()).count();
        if skipped_regions > 0 {
            warn!("{} degenerate regions have no polygon", skipped_regions);
        }
        write_kmz(&polygons, &self.polygons)?;
        info!(
            "Wrote {} region polygons ({} partial) to {}",
            polygons.len(),
            partial_regions,
            self.polygons.display()
        );

        let unassigned =
            Self::point_document(points.iter().filter(|p| !p.district.is_assigned()));
        write_kmz(&unassigned, &self.unassigned_points)?;
        info!(
            "Wrote {} unassigned offices to {}",
            unassigned.len(),
            self.unassigned_points.display()
        );

        let assigned = Self::point_document(points.iter().filter(|p| p.district.is_assigned()));
        write_kmz(&assigned, &self.assigned_points)?;
        info!(
            "Wrote {} assigned offices to {}",
            assigned.len(),
            self.assigned_points.display()
        );

        Ok(ExportReport {
            polygons: ContainerReport {
                path: self.polygons.clone(),
                features: polygons.len(),
            },
            unassigned_points: ContainerReport {
                path: self.unassigned_points.clone(),
                features: unassigned.len(),
            },
            assigned_points: ContainerReport {
                path: self.assigned_points.clone(),
                features: assigned.len(),
            },
            skipped_regions,
            partial_regions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colors::ColorAssigner;
    use crate::error::VoronoiError;
    use crate::kml::{read_kmz, Geometry};
    use crate::models::{DistrictCode, PointId};
    use geo::Coord;

    fn region(id: usize, code: u32, shape: RegionShape) -> Region {
        Region {
            point_id: PointId(id),
            district: DistrictCode(code),
            shape,
        }
    }

    fn triangle() -> Vec<Coord<f64>> {
        vec![
            Coord { x: 2.10, y: 41.30 },
            Coord { x: 2.20, y: 41.30 },
            Coord { x: 2.15, y: 41.40 },
        ]
    }

    fn exporter(dir: &std::path::Path) -> GeoExporter {
        GeoExporter::new(
            dir.join("voronoi.kmz"),
            dir.join("punts0.kmz"),
            dir.join("punts.kmz"),
        )
    }

    #[test]
    fn test_polygon_container_round_trip() {
        let regions = vec![
            region(0, 1, RegionShape::Bounded(triangle())),
            region(
                1,
                1,
                RegionShape::Partial {
                    ring: triangle()[..2].to_vec(),
                    gaps: vec![1],
                },
            ),
            region(2, 2, RegionShape::Degenerate),
            region(3, 2, RegionShape::Bounded(triangle())),
        ];
        let points = PointSet::new(vec![
            OfficePoint::new(0, 2.1, 41.3, 1),
            OfficePoint::new(1, 2.2, 41.3, 1),
            OfficePoint::new(2, 2.3, 41.4, 2),
            OfficePoint::new(3, 2.4, 41.4, 2),
            OfficePoint::new(4, 2.5, 41.5, 0),
        ]);
        let colors = ColorAssigner::default().assign(points.districts());

        let dir = tempfile::tempdir().unwrap();
        let report = exporter(dir.path())
            .export(&regions, &colors, &points)
            .unwrap();
        assert_eq!(report.polygons.features, 3);
        assert_eq!(report.skipped_regions, 1);
        assert_eq!(report.partial_regions, 1);

        let doc = read_kmz(&dir.path().join("voronoi.kmz")).unwrap();
        assert_eq!(
            doc.names().collect::<Vec<_>>(),
            vec!["Districte 1", "Districte 1", "Districte 2"]
        );
        match &doc.placemarks[0].geometry {
            Geometry::Polygon(ring) => {
                assert_eq!(ring.len(), 4);
                assert_eq!(ring[0], ring[3]);
            }
            other => panic!("expected polygon, got {:?}", other),
        }

        let unassigned = read_kmz(&dir.path().join("punts0.kmz")).unwrap();
        assert_eq!(unassigned.names().collect::<Vec<_>>(), vec!["Oficina 4"]);
        let assigned = read_kmz(&dir.path().join("punts.kmz")).unwrap();
        assert_eq!(assigned.len(), 4);
    }

    #[test]
    fn test_export_overwrites_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = exporter(dir.path());
        let colors = ColorAssigner::default().assign([DistrictCode(1)]);
        let many: Vec<Region> = (0..5)
            .map(|i| region(i, 1, RegionShape::Bounded(triangle())))
            .collect();
        exporter.export(&many, &colors, &PointSet::default()).unwrap();
        exporter.export(&many[..2], &colors, &PointSet::default()).unwrap();

        assert_eq!(read_kmz(&dir.path().join("voronoi.kmz")).unwrap().len(), 2);
        assert!(read_kmz(&dir.path().join("punts.kmz")).unwrap().is_empty());
    }

    #[test]
    fn test_failed_write_keeps_earlier_containers() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = GeoExporter::new(
            dir.path().join("voronoi.kmz"),
            dir.path().join("missing").join("punts0.kmz"),
            dir.path().join("punts.kmz"),
        );
        let colors = ColorAssigner::default().assign([DistrictCode(1)]);
        let regions = vec![region(0, 1, RegionShape::Bounded(triangle()))];

        let err = exporter
            .export(&regions, &colors, &PointSet::default())
            .unwrap_err();
        assert!(matches!(err, VoronoiError::ExportWrite { .. }));
        assert!(dir.path().join("voronoi.kmz").exists());
        assert!(!dir.path().join("punts.kmz").exists());
    }

    #[test]
    fn test_styles_use_district_colors() {
        let colors = ColorAssigner::default().assign([DistrictCode(1)]);
        let regions = vec![region(0, 1, RegionShape::Bounded(triangle()))];
        let plain = GeoExporter::new("a", "b", "c").polygon_document(&regions, &colors);
        assert!(plain.placemarks[0].fill.is_none());

        let styled = GeoExporter::new("a", "b", "c")
            .with_styles(true)
            .polygon_document(&regions, &colors);
        assert_eq!(styled.placemarks[0].fill, colors.get(DistrictCode(1)));
    }
}

use serde::Serialize;

use crate::colors::{ColorMap, Rgba};
use crate::models::{DistrictCode, PointSet, Region, RegionShape};

pub const TITLE: &str = "Diagrama de Voronoi d'Oficines per Districte";
const MARKER_SIZE: u32 = 10;

/// Districts to draw and whether to overlay office markers
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub districts: Vec<DistrictCode>,
    pub show_points: bool,
}

impl Selection {
    /// Every known district, with markers (the initial state of the page)
    pub fn all(colors: &ColorMap) -> Self {
        Self {
            districts: colors.codes().to_vec(),
            show_points: true,
        }
    }

    pub fn contains(&self, code: DistrictCode) -> bool {
        self.districts.contains(&code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceKind {
    Region,
    Markers,
}

#[derive(Debug, Clone, Serialize)]
pub struct LineStyle {
    pub color: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dash: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MarkerStyle {
    pub size: u32,
    pub color: Option<Rgba>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Trace {
    #[serde(skip)]
    pub kind: TraceKind,
    #[serde(rename = "type")]
    pub plot_type: &'static str,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fillcolor: Option<Rgba>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<LineStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<MarkerStyle>,
    pub name: String,
    pub legendgroup: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Axis {
    pub title: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scaleanchor: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Layout {
    pub title: &'static str,
    pub xaxis: Axis,
    pub yaxis: Axis,
    pub showlegend: bool,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            title: TITLE,
            // Locks the longitude/latitude aspect ratio
            xaxis: Axis {
                title: "Longitud",
                scaleanchor: Some("y"),
            },
            yaxis: Axis {
                title: "Latitud",
                scaleanchor: None,
            },
            showlegend: true,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

impl Figure {
    pub fn count(&self, kind: TraceKind) -> usize {
        self.data.iter().filter(|t| t.kind == kind).count()
    }
}

/// Builds figures from a fixed set of regions, offices and colors
pub struct InteractiveRenderer<'a> {
    regions: &'a [Region],
    points: &'a PointSet,
    colors: &'a ColorMap,
}

impl<'a> InteractiveRenderer<'a> {
    pub fn new(regions: &'a [Region], points: &'a PointSet, colors: &'a ColorMap) -> Self {
        Self {
            regions,
            points,
            colors,
        }
    }

    /// Region traces for selected districts, then one marker layer per
    /// selected district when points are shown.
    pub fn figure(&self, selection: &Selection) -> Figure {
        let mut data = Vec::new();

        for region in self.regions {
            if !selection.contains(region.district) {
                continue;
            }
            let (ring, dash) = match &region.shape {
                RegionShape::Bounded(ring) => (ring, None),
                // Dotted outline marks the chord across the open side
                RegionShape::Partial { ring, .. } => (ring, Some("dot")),
                RegionShape::Degenerate => continue,
            };
            data.push(Trace {
                kind: TraceKind::Region,
                plot_type: "scatter",
                x: ring.iter().map(|c| c.x).collect(),
                y: ring.iter().map(|c| c.y).collect(),
                mode: "lines",
                fill: Some("toself"),
                fillcolor: self.colors.get(region.district),
                line: Some(LineStyle {
                    color: "black",
                    dash,
                }),
                marker: None,
                name: region.name(),
                legendgroup: region.district.to_string(),
            });
        }

        if selection.show_points {
            for code in &selection.districts {
                let (x, y) = self.points.in_district(*code).map(|p| (p.x, p.y)).unzip();
                data.push(Trace {
                    kind: TraceKind::Markers,
                    plot_type: "scatter",
                    x,
                    y,
                    mode: "markers",
                    fill: None,
                    fillcolor: None,
                    line: None,
                    marker: Some(MarkerStyle {
                        size: MARKER_SIZE,
                        color: self.colors.get(*code),
                    }),
                    name: format!("Punts districte {}", code),
                    legendgroup: code.to_string(),
                });
            }
        }

        Figure {
            data,
            layout: Layout::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colors::ColorAssigner;
    use crate::models::{OfficePoint, PointId};
    use geo::Coord;

    fn fixture() -> (Vec<Region>, PointSet) {
        let ring = vec![
            Coord { x: 0.0, y: 0.0 },
            Coord { x: 1.0, y: 0.0 },
            Coord { x: 0.0, y: 1.0 },
        ];
        let regions = vec![
            Region {
                point_id: PointId(0),
                district: DistrictCode(1),
                shape: RegionShape::Bounded(ring.clone()),
            },
            Region {
                point_id: PointId(1),
                district: DistrictCode(2),
                shape: RegionShape::Partial {
                    ring: ring.clone(),
                    gaps: vec![2],
                },
            },
            Region {
                point_id: PointId(2),
                district: DistrictCode(2),
                shape: RegionShape::Degenerate,
            },
            Region {
                point_id: PointId(3),
                district: DistrictCode(3),
                shape: RegionShape::Bounded(ring),
            },
        ];
        let points = PointSet::new(vec![
            OfficePoint::new(0, 0.1, 0.1, 1),
            OfficePoint::new(1, 0.2, 0.2, 2),
            OfficePoint::new(2, 0.3, 0.3, 2),
            OfficePoint::new(3, 0.4, 0.4, 3),
            OfficePoint::new(4, 0.5, 0.5, 0),
        ]);
        (regions, points)
    }

    fn codes(raw: &[u32]) -> Vec<DistrictCode> {
        raw.iter().map(|c| DistrictCode(*c)).collect()
    }

    #[test]
    fn test_filtering_law() {
        let (regions, points) = fixture();
        let colors = ColorAssigner::default().assign(points.districts());
        let renderer = InteractiveRenderer::new(&regions, &points, &colors);

        let subsets: [&[u32]; 6] = [&[], &[1], &[2], &[1, 2, 3], &[0, 3], &[1, 2, 3, 0]];
        for subset in subsets {
            for show_points in [false, true] {
                let selection = Selection {
                    districts: codes(subset),
                    show_points,
                };
                let expected_regions = regions
                    .iter()
                    .filter(|r| selection.contains(r.district) && !r.shape.is_empty())
                    .count();
                let expected_markers = if show_points { subset.len() } else { 0 };

                let figure = renderer.figure(&selection);
                assert_eq!(figure.count(TraceKind::Region), expected_regions);
                assert_eq!(figure.count(TraceKind::Markers), expected_markers);
                assert_eq!(figure.data.len(), expected_regions + expected_markers);
            }
        }
    }

    #[test]
    fn test_colors_outline_and_legend() {
        let (regions, points) = fixture();
        let colors = ColorAssigner::default().assign(points.districts());
        let renderer = InteractiveRenderer::new(&regions, &points, &colors);
        let figure = renderer.figure(&Selection::all(&colors));

        let first = &figure.data[0];
        assert_eq!(first.name, "Districte 1");
        assert_eq!(first.fillcolor, colors.get(DistrictCode(1)));
        assert_eq!(first.line.as_ref().unwrap().color, "black");

        let partial = &figure.data[1];
        assert_eq!(partial.line.as_ref().unwrap().dash, Some("dot"));

        let unassigned = figure
            .data
            .iter()
            .find(|t| t.name == "Punts districte 0")
            .unwrap();
        assert_eq!(unassigned.marker.as_ref().unwrap().color, Some(Rgba::YELLOW));
        assert_eq!(unassigned.x, vec![0.5]);
    }

    #[test]
    fn test_all_without_unassigned_offices() {
        let points = PointSet::new(vec![
            OfficePoint::new(0, 0.1, 0.1, 1),
            OfficePoint::new(1, 0.9, 0.9, 2),
        ]);
        let colors = ColorAssigner::default().assign(points.districts());
        let selection = Selection::all(&colors);
        assert_eq!(selection.districts, codes(&[1, 2]));
        assert!(!selection.contains(DistrictCode::UNASSIGNED));

        let figure = InteractiveRenderer::new(&[], &points, &colors).figure(&selection);
        let layers: Vec<&str> = figure.data.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(layers, vec!["Punts districte 1", "Punts districte 2"]);
    }

    #[test]
    fn test_layout_locks_aspect_ratio() {
        let json = serde_json::to_value(Layout::default()).unwrap();
        assert_eq!(json["xaxis"]["scaleanchor"], "y");
        assert_eq!(json["xaxis"]["title"], "Longitud");
        assert!(json["yaxis"].get("scaleanchor").is_none());
    }

    #[test]
    fn test_trace_serialization() {
        let (regions, points) = fixture();
        let colors = ColorAssigner::default().assign(points.districts());
        let figure = InteractiveRenderer::new(&regions, &points, &colors).figure(&Selection {
            districts: codes(&[1]),
            show_points: false,
        });
        let json = serde_json::to_value(&figure).unwrap();
        let trace = &json["data"][0];
        assert_eq!(trace["type"], "scatter");
        assert_eq!(trace["fill"], "toself");
        assert!(trace.get("kind").is_none());
        assert!(trace.get("marker").is_none());
    }
}

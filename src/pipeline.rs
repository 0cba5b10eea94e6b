//! End-to-end batch pipeline: load, tessellate, classify, export, render.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::cache::{ContentCache, ContentHasher};
use crate::colors::{ColorAssigner, ColorMap};
use crate::config::Config;
use crate::dataset::DatasetLoader;
use crate::error::{Result, VoronoiError};
use crate::export::{ExportReport, GeoExporter};
use crate::models::{PointSet, Region};
use crate::render::{render_html, InteractiveRenderer, Selection};
use crate::voronoi::{Diagram, RegionExtractor, TessellationBuilder};

/// Everything derived from one point set
#[derive(Debug)]
pub struct Tessellation {
    /// Content hash of the point set it was built from
    pub key: u64,
    pub diagram: Diagram,
    pub regions: Vec<Region>,
    pub colors: ColorMap,
}

/// Hash of ids, coordinates and districts in dataset order
pub fn point_set_hash(points: &PointSet) -> u64 {
    let mut hasher = ContentHasher::new();
    hasher.write_u64(points.len() as u64);
    for p in points.iter() {
        hasher
            .write_u64(p.id.0 as u64)
            .write_f64(p.x)
            .write_f64(p.y)
            .write_u64(p.district.0 as u64);
    }
    hasher.finish()
}

/// Tessellation and color assignment, memoized by point set content
pub struct Pipeline {
    builder: TessellationBuilder,
    assigner: ColorAssigner,
    cache: ContentCache<Tessellation>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl Pipeline {
    pub fn from_config(config: &Config) -> Self {
        Self {
            builder: TessellationBuilder::new().with_min_points(config.tessellation.min_points),
            assigner: ColorAssigner::from_config(&config.palette),
            cache: ContentCache::new(),
        }
    }

    /// Build the diagram from the assigned offices only, then classify and
    /// color every region.
    pub fn tessellate(&mut self, points: &PointSet) -> Result<Arc<Tessellation>> {
        let key = point_set_hash(points);
        let builder = self.builder;
        let assigner = &self.assigner;

        self.cache.get_or_try_insert_with::<VoronoiError, _>(key, || {
            let assigned = points.assigned();
            info!(
                "Tessellating {} assigned offices ({} unassigned left out)",
                assigned.len(),
                points.len() - assigned.len()
            );
            let diagram = builder.build(&assigned)?;
            let regions = RegionExtractor::extract(&diagram, &assigned);
            let colors = assigner.assign(points.districts());
            Ok(Tessellation {
                key,
                diagram,
                regions,
                colors,
            })
        })
    }

    /// Forget every memoized tessellation
    pub fn invalidate(&mut self) {
        self.cache.clear();
    }

    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub content_hash: String,
    pub points: usize,
    pub unassigned: usize,
    pub regions: usize,
    pub export: ExportReport,
    pub html: PathBuf,
}

/// Run the whole batch once with `config`.
///
/// A degenerate point set aborts before any container is written.
pub fn run(config: &Config) -> Result<RunReport> {
    let mut loader = DatasetLoader::new(config.input.delimiter)?;
    let (hash, points) = loader.load(&config.input.path)?;
    info!("Districts (first seen): {:?}", points.districts());

    let mut pipeline = Pipeline::from_config(config);
    let tessellation = pipeline.tessellate(&points)?;

    let exporter = GeoExporter::from_config(&config.output);
    let export = exporter.export(&tessellation.regions, &tessellation.colors, &points)?;

    let renderer = InteractiveRenderer::new(&tessellation.regions, &points, &tessellation.colors);
    let figure = renderer.figure(&Selection::all(&tessellation.colors));
    let html_path = config.output.html_path();
    fs::write(&html_path, render_html(&figure, None))
        .map_err(|e| VoronoiError::export_write(&html_path, e))?;
    info!("Wrote interactive page to {}", html_path.display());

    Ok(RunReport {
        content_hash: format!("{:016x}", hash),
        points: points.len(),
        unassigned: points.unassigned().len(),
        regions: tessellation.regions.len(),
        export,
        html: html_path,
    })
}

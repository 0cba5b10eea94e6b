//! Voronoi tessellation of office locations classified by district.
//!
//! This library provides the pipeline shared by the `generate` and `serve`
//! binaries: dataset loading, Delaunay-dual tessellation, region
//! classification, district colors, KMZ export and interactive rendering.

pub mod cache;
pub mod colors;
pub mod config;
pub mod dataset;
pub mod error;
pub mod export;
pub mod kml;
pub mod lookup;
pub mod models;
pub mod pipeline;
pub mod render;
pub mod voronoi;

pub use error::{Result, VoronoiError};
pub use models::{DistrictCode, OfficePoint, PointId, PointSet, Region, RegionShape};

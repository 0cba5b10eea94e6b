//! Voronoi tessellation of office locations.
//!
//! The diagram is the dual of a Delaunay triangulation: every inner
//! triangle contributes its circumcenter as a Voronoi vertex, and every
//! office's region lists the circumcenters of the triangles around it.

mod builder;
mod extract;

pub use builder::{Diagram, DiagramRegion, RegionVertex, TessellationBuilder};
pub use extract::RegionExtractor;

//! Interactive rendering of the tessellation.
//!
//! [`InteractiveRenderer`] turns regions and offices into a [`Figure`] of
//! Plotly-compatible traces for a district selection; [`render_html`] wraps a
//! figure into a standalone page that loads Plotly from its CDN.

mod figure;
mod html;

pub use figure::{Figure, InteractiveRenderer, Layout, Selection, Trace, TraceKind};
pub use html::{render_html, Controls};

use std::fmt::Write as _;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use geo::Coord;
use quick_xml::escape::escape;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::{Geometry, KmlDocument, KMZ_ENTRY};
use crate::colors::Rgba;
use crate::error::{Result, VoronoiError};

/// Serialize a document as KML 2.2
pub fn to_kml(doc: &KmlDocument) -> String {
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str("<kml xmlns=\"http://www.opengis.net/kml/2.2\">\n");
    out.push_str("  <Document>\n");

    for placemark in &doc.placemarks {
        out.push_str("    <Placemark>\n");
        let _ = writeln!(out, "      <name>{}</name>", escape(placemark.name.as_str()));
        if let Some(fill) = placemark.fill {
            let _ = writeln!(
                out,
                "      <Style><LineStyle><color>ff000000</color></LineStyle><PolyStyle><color>{}</color></PolyStyle></Style>",
                kml_color(fill)
            );
        }
        match &placemark.geometry {
            Geometry::Point(c) => {
                let _ = writeln!(
                    out,
                    "      <Point><coordinates>{}</coordinates></Point>",
                    coordinate(c)
                );
            }
            Geometry::Polygon(ring) => {
                out.push_str("      <Polygon><outerBoundaryIs><LinearRing><coordinates>");
                let mut coords: Vec<String> = ring.iter().map(coordinate).collect();
                // LinearRing must be closed
                if ring.len() > 1 && ring.first() != ring.last() {
                    coords.push(coordinate(&ring[0]));
                }
                out.push_str(&coords.join(" "));
                out.push_str("</coordinates></LinearRing></outerBoundaryIs></Polygon>\n");
            }
        }
        out.push_str("    </Placemark>\n");
    }

    out.push_str("  </Document>\n");
    out.push_str("</kml>\n");
    out
}

/// KML colors are `aabbggrr` hex
fn kml_color(c: Rgba) -> String {
    let alpha = (c.a.clamp(0.0, 1.0) * 255.0).round() as u8;
    format!("{:02x}{:02x}{:02x}{:02x}", alpha, c.b, c.g, c.r)
}

fn coordinate(c: &Coord<f64>) -> String {
    format!("{},{},0", c.x, c.y)
}

/// Write `doc` to `path` as a KMZ archive, replacing any existing file.
pub fn write_kmz(doc: &KmlDocument, path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|e| VoronoiError::export_write(path, e))?;
    let mut zip = ZipWriter::new(BufWriter::new(file));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file(KMZ_ENTRY, options)
        .map_err(|e| VoronoiError::export_write(path, io::Error::other(e)))?;
    zip.write_all(to_kml(doc).as_bytes())
        .map_err(|e| VoronoiError::export_write(path, e))?;
    let mut inner = zip
        .finish()
        .map_err(|e| VoronoiError::export_write(path, io::Error::other(e)))?;
    inner.flush().map_err(|e| VoronoiError::export_write(path, e))?;

    debug!("Wrote {} placemarks to {}", doc.len(), path.display());
    Ok(())
}

use std::fs::File;
use std::io::Read;
use std::path::Path;

use geo::Coord;
use quick_xml::events::Event;
use quick_xml::Reader;
use zip::ZipArchive;

use super::{Geometry, KmlDocument, Placemark, KMZ_ENTRY};
use crate::error::{Result, VoronoiError};

#[derive(Clone, Copy, PartialEq)]
enum Kind {
    Point,
    Polygon,
}

#[derive(Default)]
struct PlacemarkState {
    name: String,
    kind: Option<Kind>,
    coordinates: String,
}

/// Parse the placemarks of a KML document.
///
/// Only names plus point and outer-boundary polygon geometry are read;
/// everything else is skipped.
pub fn parse_kml(xml: &str) -> Result<KmlDocument> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut doc = KmlDocument::new();
    let mut current: Option<PlacemarkState> = None;
    let mut in_name = false;
    let mut in_coordinates = false;
    let mut in_inner_boundary = false;

    loop {
        match reader
            .read_event()
            .map_err(|e| VoronoiError::Kml(e.to_string()))?
        {
            Event::Start(e) => match e.local_name().as_ref() {
                b"Placemark" => current = Some(PlacemarkState::default()),
                b"name" => in_name = current.is_some(),
                b"Point" => set_kind(&mut current, Kind::Point),
                b"Polygon" => set_kind(&mut current, Kind::Polygon),
                b"innerBoundaryIs" => in_inner_boundary = true,
                b"coordinates" => in_coordinates = current.is_some() && !in_inner_boundary,
                _ => {}
            },
            Event::End(e) => match e.local_name().as_ref() {
                b"Placemark" => {
                    if let Some(state) = current.take() {
                        doc.push(finish(state)?);
                    }
                }
                b"name" => in_name = false,
                b"innerBoundaryIs" => in_inner_boundary = false,
                b"coordinates" => in_coordinates = false,
                _ => {}
            },
            Event::Text(t) => {
                let text = t
                    .unescape()
                    .map_err(|e| VoronoiError::Kml(e.to_string()))?;
                if let Some(state) = current.as_mut() {
                    if in_name {
                        state.name.push_str(&text);
                    } else if in_coordinates {
                        state.coordinates.push(' ');
                        state.coordinates.push_str(&text);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(doc)
}

fn set_kind(current: &mut Option<PlacemarkState>, kind: Kind) {
    if let Some(state) = current.as_mut() {
        state.kind.get_or_insert(kind);
    }
}

fn finish(state: PlacemarkState) -> Result<Placemark> {
    let coords = parse_coordinates(&state.coordinates)?;
    match state.kind {
        Some(Kind::Point) => {
            let coord = coords.first().copied().ok_or_else(|| {
                VoronoiError::Kml(format!("point '{}' has no coordinates", state.name))
            })?;
            Ok(Placemark::point(state.name, coord))
        }
        Some(Kind::Polygon) => Ok(Placemark::polygon(state.name, coords)),
        None => Err(VoronoiError::Kml(format!(
            "placemark '{}' has no supported geometry",
            state.name
        ))),
    }
}

/// Parse a whitespace separated list of `lon,lat[,alt]` tuples
fn parse_coordinates(raw: &str) -> Result<Vec<Coord<f64>>> {
    raw.split_whitespace()
        .map(|tuple| {
            let mut parts = tuple.split(',').map(str::parse::<f64>);
            match (parts.next(), parts.next()) {
                (Some(Ok(x)), Some(Ok(y))) => Ok(Coord { x, y }),
                _ => Err(VoronoiError::Kml(format!("bad coordinate tuple '{}'", tuple))),
            }
        })
        .collect()
}

/// Read the KML document stored in a KMZ archive
pub fn read_kmz(path: &Path) -> Result<KmlDocument> {
    let file = File::open(path)
        .map_err(|e| VoronoiError::Kml(format!("{}: {}", path.display(), e)))?;
    let mut archive =
        ZipArchive::new(file).map_err(|e| VoronoiError::Kml(format!("{}: {}", path.display(), e)))?;

    // Fall back to the first .kml entry for archives written by other tools
    let entry = if archive.index_for_name(KMZ_ENTRY).is_some() {
        KMZ_ENTRY.to_string()
    } else {
        archive
            .file_names()
            .find(|n| n.ends_with(".kml"))
            .map(str::to_string)
            .ok_or_else(|| VoronoiError::Kml(format!("{}: no KML entry", path.display())))?
    };

    let mut xml = String::new();
    archive
        .by_name(&entry)
        .map_err(|e| VoronoiError::Kml(e.to_string()))?
        .read_to_string(&mut xml)
        .map_err(|e| VoronoiError::Kml(e.to_string()))?;

    parse_kml(&xml)
}

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use csv::ReaderBuilder;
use flate2::read::GzDecoder;
use tracing::{debug, info};

use crate::cache::{content_hash, ContentCache};
use crate::error::{Result, VoronoiError};
use crate::models::{OfficePoint, PointSet};

pub const LONGITUDE: &str = "Longitud";
pub const LATITUDE: &str = "Latitud";
pub const DISTRICT: &str = "Codi_Districte";

/// Loads office datasets and keeps parsed copies keyed by file content.
pub struct DatasetLoader {
    delimiter: u8,
    cache: ContentCache<PointSet>,
}

impl DatasetLoader {
    /// Fails with [`VoronoiError::Config`] unless `delimiter` is a single
    /// ASCII character.
    pub fn new(delimiter: char) -> Result<Self> {
        let delimiter = u8::try_from(delimiter)
            .ok()
            .filter(u8::is_ascii)
            .ok_or_else(|| {
                VoronoiError::Config(format!(
                    "delimiter {:?} is not a single ASCII character",
                    delimiter
                ))
            })?;
        Ok(Self {
            delimiter,
            cache: ContentCache::new(),
        })
    }

    /// Load the dataset at `path`, returning its content hash and points.
    ///
    /// The file is always re-read; parsing is skipped when its bytes are
    /// unchanged since a previous load.
    pub fn load(&mut self, path: &Path) -> Result<(u64, Arc<PointSet>)> {
        info!("Loading offices from {}", path.display());

        let bytes = fs::read(path).map_err(|source| VoronoiError::MissingDataset {
            path: PathBuf::from(path),
            source,
        })?;
        let hash = content_hash(&bytes);
        let gzip = path.extension().map_or(false, |e| e == "gz");
        let delimiter = self.delimiter;

        let points = self.cache.get_or_try_insert_with(hash, || {
            if gzip {
                parse_points(GzDecoder::new(bytes.as_slice()), delimiter)
            } else {
                parse_points(bytes.as_slice(), delimiter)
            }
        })?;

        info!(
            "Loaded {} offices ({} unassigned), content hash {:016x}",
            points.len(),
            points.unassigned().len(),
            hash
        );
        Ok((hash, points))
    }

    /// Drop every memoized dataset
    pub fn invalidate(&mut self) {
        self.cache.clear();
    }
}

/// Parse office records from CSV.
///
/// `Longitud` and `Latitud` are required floats. `Codi_Districte` is an
/// optional non-negative integer; an empty cell or a missing column means
/// `0` (unassigned). Point ids are zero-based data row indices.
pub fn parse_points<R: Read>(reader: R, delimiter: u8) -> Result<PointSet> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| malformed(0, "<header>", e.to_string()))?
        .clone();

    // Find column indices
    let lon_idx = column(&headers, LONGITUDE)?;
    let lat_idx = column(&headers, LATITUDE)?;
    let district_idx = headers.iter().position(|h| h == DISTRICT);
    if district_idx.is_none() {
        debug!("Column '{}' absent, every office is unassigned", DISTRICT);
    }

    let mut points = Vec::new();
    for (row, result) in csv_reader.records().enumerate() {
        let record = result.map_err(|e| malformed(row, "<record>", e.to_string()))?;

        let x = parse_coordinate(record.get(lon_idx).unwrap_or(""), row, LONGITUDE)?;
        let y = parse_coordinate(record.get(lat_idx).unwrap_or(""), row, LATITUDE)?;
        let district = match district_idx {
            Some(idx) => parse_district(record.get(idx).unwrap_or(""), row)?,
            None => 0,
        };

        points.push(OfficePoint::new(row, x, y, district));
    }

    Ok(PointSet::new(points))
}

fn column(headers: &csv::StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| VoronoiError::MissingColumn(name.to_string()))
}

fn parse_coordinate(raw: &str, row: usize, column: &str) -> Result<f64> {
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(malformed(row, column, raw)),
    }
}

fn parse_district(raw: &str, row: usize) -> Result<u32> {
    if raw.is_empty() || raw.eq_ignore_ascii_case("nan") {
        return Ok(0);
    }
    if let Ok(code) = raw.parse::<u32>() {
        return Ok(code);
    }
    // Columns with gaps are often written as floats ("3.0")
    match raw.parse::<f64>() {
        Ok(v) if v.fract() == 0.0 && v >= 0.0 && v <= u32::MAX as f64 => Ok(v as u32),
        _ => Err(malformed(row, DISTRICT, raw)),
    }
}

fn malformed(row: usize, column: &str, value: impl Into<String>) -> VoronoiError {
    VoronoiError::MalformedField {
        row,
        column: column.to_string(),
        value: value.into(),
    }
}

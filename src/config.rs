use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, VoronoiError};

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub input: InputConfig,
    pub output: OutputConfig,
    pub tessellation: TessellationConfig,
    pub palette: PaletteConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct InputConfig {
    pub path: PathBuf,
    pub delimiter: char,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("Oficines_minim.csv"),
            delimiter: ',',
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub polygons: String,
    pub unassigned_points: String,
    pub assigned_points: String,
    pub html: String,
    /// Embed district colors in the polygon container
    pub styled: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            polygons: "voronoi.kmz".to_string(),
            unassigned_points: "punts0.kmz".to_string(),
            assigned_points: "punts.kmz".to_string(),
            html: "voronoi.html".to_string(),
            styled: false,
        }
    }
}

impl OutputConfig {
    pub fn polygons_path(&self) -> PathBuf {
        self.dir.join(&self.polygons)
    }

    pub fn unassigned_points_path(&self) -> PathBuf {
        self.dir.join(&self.unassigned_points)
    }

    pub fn assigned_points_path(&self) -> PathBuf {
        self.dir.join(&self.assigned_points)
    }

    pub fn html_path(&self) -> PathBuf {
        self.dir.join(&self.html)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TessellationConfig {
    pub min_points: usize,
}

impl Default for TessellationConfig {
    fn default() -> Self {
        Self { min_points: 4 }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PaletteConfig {
    /// Alpha applied to every district color
    pub alpha: f32,
    pub saturation: f64,
    pub value: f64,
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            alpha: 0.5,
            saturation: 0.55,
            value: 0.75,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub listen: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:3000".to_string(),
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            VoronoiError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| VoronoiError::Config(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tessellation.min_points < 3 {
            return Err(VoronoiError::Config(format!(
                "tessellation.min_points must be at least 3, got {}",
                self.tessellation.min_points
            )));
        }
        if !(0.0..=1.0).contains(&self.palette.alpha) {
            return Err(VoronoiError::Config(format!(
                "palette.alpha must be within [0, 1], got {}",
                self.palette.alpha
            )));
        }
        if !self.input.delimiter.is_ascii() {
            return Err(VoronoiError::Config(
                "input.delimiter must be a single ASCII character".to_string(),
            ));
        }
        Ok(())
    }
}

//! Deterministic district colors.
//!
//! Non-zero districts get evenly spaced hues in first-seen order; the
//! unassigned district `0` is always opaque yellow.

use hashbrown::HashMap;
use serde::{Serialize, Serializer};

use crate::config::PaletteConfig;
use crate::models::DistrictCode;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const YELLOW: Rgba = Rgba {
        r: 255,
        g: 255,
        b: 0,
        a: 1.0,
    };

    pub fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

impl std::fmt::Display for Rgba {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

impl Serialize for Rgba {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// `n` visually distinct opaque colors, evenly spaced around the hue circle
pub fn palette(n: usize, saturation: f64, value: f64) -> Vec<(u8, u8, u8)> {
    (0..n)
        .map(|i| hsv_to_rgb(360.0 * i as f64 / n as f64, saturation, value))
        .collect()
}

fn hsv_to_rgb(hue: f64, saturation: f64, value: f64) -> (u8, u8, u8) {
    let c = value * saturation;
    let h = (hue % 360.0) / 60.0;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = value - c;
    let channel = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    (channel(r), channel(g), channel(b))
}

/// District to color mapping, iterated in first-seen order
#[derive(Debug, Clone, PartialEq)]
pub struct ColorMap {
    order: Vec<DistrictCode>,
    colors: HashMap<DistrictCode, Rgba>,
}

impl ColorMap {
    pub fn get(&self, code: DistrictCode) -> Option<Rgba> {
        self.colors.get(&code).copied()
    }

    pub fn codes(&self) -> &[DistrictCode] {
        &self.order
    }

    pub fn iter(&self) -> impl Iterator<Item = (DistrictCode, Rgba)> + '_ {
        self.order.iter().map(move |code| (*code, self.colors[code]))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Assigns palette colors to district codes
#[derive(Debug, Clone)]
pub struct ColorAssigner {
    alpha: f32,
    saturation: f64,
    value: f64,
}

impl Default for ColorAssigner {
    fn default() -> Self {
        Self::from_config(&PaletteConfig::default())
    }
}

impl ColorAssigner {
    pub fn from_config(config: &PaletteConfig) -> Self {
        Self {
            alpha: config.alpha,
            saturation: config.saturation,
            value: config.value,
        }
    }

    /// Build the map for `codes` as they appear in the dataset (repeats allowed).
    pub fn assign<I>(&self, codes: I) -> ColorMap
    where
        I: IntoIterator<Item = DistrictCode>,
    {
        let mut order = Vec::new();
        for code in codes {
            if !order.contains(&code) {
                order.push(code);
            }
        }

        let assigned: Vec<DistrictCode> = order
            .iter()
            .copied()
            .filter(DistrictCode::is_assigned)
            .collect();
        let mut colors: HashMap<DistrictCode, Rgba> = assigned
            .iter()
            .zip(palette(assigned.len(), self.saturation, self.value))
            .map(|(code, (r, g, b))| (*code, Rgba::new(r, g, b, self.alpha)))
            .collect();
        // Lookup fallback only; 0 is listed in `order` when the data has it
        colors.insert(DistrictCode::UNASSIGNED, Rgba::YELLOW);

        ColorMap { order, colors }
    }
}

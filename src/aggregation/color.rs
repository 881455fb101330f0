use crate::datamodel::MetricName;
use crate::error::{MachineViewError, Result};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex
            .strip_prefix('#')
            .filter(|d| d.len() == 6 && d.is_ascii())
            .ok_or_else(|| MachineViewError::InvalidColor(hex.to_string()))?;
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16)
                .map_err(|_| MachineViewError::InvalidColor(hex.to_string()))
        };
        Ok(Rgb {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }

    pub fn with_alpha(&self, alpha: f64) -> Rgba {
        Rgba {
            r: self.r,
            g: self.g,
            b: self.b,
            a: alpha,
        }
    }

    /// CSS `rgba(...)` string, used for translucent chart fills.
    pub fn to_rgba(&self, alpha: f64) -> String {
        self.with_alpha(alpha).to_string()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

impl Serialize for Rgba {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Hue in degrees, saturation and lightness in percent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsl {
    pub h: f64,
    pub s: f64,
    pub l: f64,
}

impl Hsl {
    pub fn to_rgb(&self) -> Rgb {
        let l = self.l / 100.0;
        let a = self.s * l.min(1.0 - l) / 100.0;
        let channel = |n: f64| {
            let k = (n + self.h / 30.0) % 12.0;
            let color = l - a * (k - 3.0).min(9.0 - k).min(1.0).max(-1.0);
            (255.0 * color).round().clamp(0.0, 255.0) as u8
        };
        Rgb {
            r: channel(0.0),
            g: channel(8.0),
            b: channel(4.0),
        }
    }
}

/// 32-bit string hash: `hash = code + (hash << 5) - hash` over UTF-16 code
/// units, wrapping on overflow.
pub fn name_hash(text: &str) -> i32 {
    text.encode_utf16().fold(0i32, |hash, unit| {
        (unit as i32).wrapping_add(hash.wrapping_shl(5).wrapping_sub(hash))
    })
}

pub fn hsl_for_hash(hash: i32) -> Hsl {
    Hsl {
        h: (hash % 360).unsigned_abs() as f64,
        s: 65.0 + ((hash >> 8) % 20).unsigned_abs() as f64,
        l: 45.0 + ((hash >> 16) % 10).unsigned_abs() as f64,
    }
}

/// Stable color of a metric, identical across runs for identical names.
pub fn metric_color(name: &str) -> Rgb {
    hsl_for_hash(name_hash(name)).to_rgb()
}

/// Colors of the dashboard metrics, computed once per view.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ColorPalette {
    colors: BTreeMap<MetricName, Rgb>,
}

impl ColorPalette {
    pub fn for_metrics<'a>(metrics: impl IntoIterator<Item = &'a MetricName>) -> Self {
        let colors = metrics
            .into_iter()
            .map(|metric| (metric.clone(), metric_color(metric.as_str())))
            .collect();
        Self { colors }
    }

    /// Palette color, derived on the fly for metrics outside the palette.
    pub fn color_for(&self, metric: &MetricName) -> Rgb {
        self.colors
            .get(metric)
            .copied()
            .unwrap_or_else(|| metric_color(metric.as_str()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MetricName, &Rgb)> {
        self.colors.iter()
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

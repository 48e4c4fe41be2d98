//! Named color palettes, gradient resampling, and continuous colormaps.
//!
//! All lookups are pure: identical `(name, count)` pairs always yield identical
//! colors.

use serde::{Deserialize, Serialize};

/// 8-bit RGB color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb8 {
    pub const BLACK: Rgb8 = Rgb8::new(0, 0, 0);
    pub const WHITE: Rgb8 = Rgb8::new(255, 255, 255);
    /// CSS `steelblue`, the single-histogram fallback.
    pub const STEELBLUE: Rgb8 = Rgb8::new(70, 130, 180);
    pub const RED: Rgb8 = Rgb8::new(255, 0, 0);
    pub const GREEN: Rgb8 = Rgb8::new(0, 128, 0);
    pub const LIGHT_BLUE: Rgb8 = Rgb8::new(173, 216, 230);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RRGGBB`, `RRGGBB`, or `#RGB` (case-insensitive).
    pub fn from_hex(s: &str) -> Option<Self> {
        let h = s.trim().trim_start_matches('#');
        let expanded: String = match h.len() {
            3 => h.chars().flat_map(|c| [c, c]).collect(),
            6 => h.to_string(),
            _ => return None,
        };
        let v = u32::from_str_radix(&expanded, 16).ok()?;
        Some(Self::new((v >> 16) as u8, (v >> 8) as u8, v as u8))
    }

    /// Lowercase `#rrggbb`.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    fn to_unit(self) -> [f64; 3] {
        [
            self.r as f64 / 255.0,
            self.g as f64 / 255.0,
            self.b as f64 / 255.0,
        ]
    }

    /// Round-half-even per channel.
    fn from_unit(c: [f64; 3]) -> Self {
        let q = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round_ties_even() as u8;
        Self::new(q(c[0]), q(c[1]), q(c[2]))
    }
}

type Named = (&'static str, &'static [&'static str]);

const COLORBLIND_SAFE: &[Named] = &[
    ("default", &["#0173B2", "#DE8F05", "#029E73", "#CC78BC", "#ECE133", "#56B4E9", "#F0E442"]),
    ("tol", &["#332288", "#117733", "#44AA99", "#88CCEE", "#DDCC77", "#CC6677", "#AA4499", "#882255"]),
    ("okabe_ito", &["#E69F00", "#56B4E9", "#009E73", "#F0E442", "#0072B2", "#D55E00", "#CC79A7"]),
];

const JOURNAL: &[Named] = &[
    ("nature", &["#E64B35", "#4DBBD5", "#00A087", "#3C5488", "#F39B7F", "#8491B4", "#91D1C2", "#DC0000"]),
    ("science", &["#1F77B4", "#FF7F0E", "#2CA02C", "#D62728", "#9467BD", "#8C564B", "#E377C2", "#7F7F7F"]),
    ("ieee", &["#000000", "#0000FF", "#FF0000", "#00FF00", "#FF00FF", "#00FFFF", "#FFFF00", "#808080"]),
];

const CATEGORICAL: &[Named] = &[
    ("set1", &["#E41A1C", "#377EB8", "#4DAF4A", "#984EA3", "#FF7F00", "#FFFF33", "#A65628", "#F781BF"]),
    ("set2", &["#66C2A5", "#FC8D62", "#8DA0CB", "#E78AC3", "#A6D854", "#FFD92F", "#E5C494", "#B3B3B3"]),
    ("set3", &["#8DD3C7", "#FFFFB3", "#BEBADA", "#FB8072", "#80B1D3", "#FDB462", "#B3DE69", "#FCCDE5"]),
    ("tab10", &["#1F77B4", "#FF7F0E", "#2CA02C", "#D62728", "#9467BD", "#8C564B", "#E377C2", "#7F7F7F", "#BCBD22", "#17BECF"]),
];

const SEQUENTIAL: &[Named] = &[
    ("blues", &["#f7fbff", "#deebf7", "#c6dbef", "#9ecae1", "#6baed6", "#4292c6", "#2171b5", "#08519c"]),
    ("greens", &["#f7fcf5", "#e5f5e0", "#c7e9c0", "#a1d99b", "#74c476", "#41ab5d", "#238b45", "#006d2c"]),
    ("reds", &["#fff5f0", "#fee0d2", "#fcbba1", "#fc9272", "#fb6a4a", "#ef3b2c", "#cb181d", "#a50f15"]),
];

const DIVERGING: &[Named] = &[
    ("rdbu", &["#67001f", "#b2182b", "#d6604d", "#f4a582", "#fddbc7", "#d1e5f0", "#92c5de", "#4393c3", "#2166ac", "#053061"]),
    ("rdylgn", &["#a50026", "#d73027", "#f46d43", "#fdae61", "#fee08b", "#d9ef8b", "#a6d96a", "#66bd63", "#1a9850", "#006837"]),
];

const HEATMAP: &[Named] = &[
    ("diverging_rb", &["#053061", "#2166ac", "#4393c3", "#92c5de", "#d1e5f0", "#f7f7f7", "#fddbc7", "#f4a582", "#d6604d", "#b2182b", "#67001f"]),
    ("diverging_bg", &["#762a83", "#9970ab", "#c2a5cf", "#e7d4e8", "#f7f7f7", "#d9f0d3", "#a6dba0", "#5aae61", "#1b7837"]),
    ("sequential_heat", &["#ffffcc", "#ffeda0", "#fed976", "#feb24c", "#fd8d3c", "#fc4e2a", "#e31a1c", "#bd0026", "#800026"]),
    ("sequential_cool", &["#f7fcf0", "#e0f3db", "#ccebc5", "#a8ddb5", "#7bccc4", "#4eb3d3", "#2b8cbe", "#0868ac", "#084081"]),
    ("viridis", &["#440154", "#482878", "#3e4989", "#31688e", "#26828e", "#1f9e89", "#35b779", "#6ece58", "#b5de2b", "#fde725"]),
    ("plasma", &["#0d0887", "#46039f", "#7201a8", "#9c179e", "#bd3786", "#d8576b", "#ed7953", "#fb9f3a", "#fdca26", "#f0f921"]),
    ("temperature", &["#313695", "#4575b4", "#74add1", "#abd9e9", "#e0f3f8", "#fee090", "#fdae61", "#f46d43", "#d73027", "#a50026"]),
    ("earth", &["#1a3620", "#2d5016", "#4a7c1e", "#73af48", "#a2d489", "#c8e4b5", "#e7f5de", "#faf0d4", "#e8c58b", "#d19c4c", "#a57328"]),
];

const GROUPS: &[(&str, &[Named])] = &[
    ("Colorblind Safe", COLORBLIND_SAFE),
    ("Scientific Journals", JOURNAL),
    ("Categorical", CATEGORICAL),
    ("Sequential", SEQUENTIAL),
    ("Diverging", DIVERGING),
    ("Heatmap Colors", HEATMAP),
];

/// Palette used when a name is unknown.
pub const DEFAULT_PALETTE: &str = "default";

/// Resolution of the gradient built from palette anchors.
const GRADIENT_SIZE: usize = 256;

fn lookup(name: &str) -> Option<&'static [&'static str]> {
    GROUPS
        .iter()
        .flat_map(|(_, group)| group.iter())
        .find(|(n, _)| *n == name)
        .map(|(_, colors)| *colors)
}

/// Raw stored list for a palette name, if known.
pub fn palette_colors(name: &str) -> Option<&'static [&'static str]> {
    lookup(name)
}

/// Palette names grouped for display, in a stable order.
pub fn palette_groups() -> Vec<(&'static str, Vec<&'static str>)> {
    GROUPS
        .iter()
        .map(|(g, pals)| (*g, pals.iter().map(|(n, _)| *n).collect()))
        .collect()
}

/// Resolve a palette name to `count` hex colors.
///
/// Without a count (or when it equals the native size) the stored list is
/// returned unmodified. Otherwise a continuous gradient through the anchors is
/// sampled at `count` evenly spaced positions. Unknown names fall back to
/// [`DEFAULT_PALETTE`].
pub fn get_palette(name: &str, count: Option<usize>) -> Vec<String> {
    let stored = lookup(name).unwrap_or_else(|| {
        log::debug!("unknown palette `{name}`, using `{DEFAULT_PALETTE}`");
        lookup(DEFAULT_PALETTE).unwrap_or(&[])
    });
    match count {
        Some(n) if n > 0 && n != stored.len() => {
            let anchors: Vec<Rgb8> = stored.iter().filter_map(|h| Rgb8::from_hex(h)).collect();
            let lut = gradient_lut(&anchors);
            (0..n)
                .map(|i| {
                    let t = if n == 1 { 0.0 } else { i as f64 / (n - 1) as f64 };
                    lut[lut_index(t, lut.len())].to_hex()
                })
                .collect()
        }
        _ => stored.iter().map(|s| s.to_string()).collect(),
    }
}

/// Parse a list of hex strings, skipping malformed entries.
pub fn parse_colors<S: AsRef<str>>(colors: &[S]) -> Vec<Rgb8> {
    colors
        .iter()
        .filter_map(|c| {
            let parsed = Rgb8::from_hex(c.as_ref());
            if parsed.is_none() {
                log::debug!("ignoring malformed color `{}`", c.as_ref());
            }
            parsed
        })
        .collect()
}

/// Pick `n` colors from a listed palette at evenly spaced positions,
/// without interpolation (e.g. tab10 over 3 series → entries 0, 5, 9).
pub fn sample_listed(name: &str, n: usize) -> Vec<Rgb8> {
    let colors = parse_colors(lookup(name).unwrap_or(&[]));
    if colors.is_empty() {
        return vec![Rgb8::BLACK; n];
    }
    (0..n)
        .map(|i| {
            let t = if n <= 1 { 0.0 } else { i as f64 / (n - 1) as f64 };
            colors[lut_index(t, colors.len())]
        })
        .collect()
}

/// Series colors: the configured palette cycled, or `fallback` sampled evenly.
pub fn series_colors(configured: &[String], fallback: &str, n: usize) -> Vec<Rgb8> {
    let parsed = parse_colors(configured);
    if parsed.is_empty() {
        sample_listed(fallback, n)
    } else {
        (0..n).map(|i| parsed[i % parsed.len()]).collect()
    }
}

fn lut_index(t: f64, len: usize) -> usize {
    ((t * len as f64).floor() as usize).min(len.saturating_sub(1))
}

fn gradient_lut(anchors: &[Rgb8]) -> Vec<Rgb8> {
    match anchors {
        [] => vec![Rgb8::BLACK; GRADIENT_SIZE],
        [only] => vec![*only; GRADIENT_SIZE],
        _ => (0..GRADIENT_SIZE)
            .map(|i| Rgb8::from_unit(interpolate(anchors, i as f64 / (GRADIENT_SIZE - 1) as f64)))
            .collect(),
    }
}

/// Linear interpolation across anchors spaced evenly on [0, 1].
fn interpolate(anchors: &[Rgb8], t: f64) -> [f64; 3] {
    let segments = (anchors.len() - 1) as f64;
    let pos = t.clamp(0.0, 1.0) * segments;
    let lo = (pos.floor() as usize).min(anchors.len() - 2);
    let frac = pos - lo as f64;
    let a = anchors[lo].to_unit();
    let b = anchors[lo + 1].to_unit();
    [
        a[0] + (b[0] - a[0]) * frac,
        a[1] + (b[1] - a[1]) * frac,
        a[2] + (b[2] - a[2]) * frac,
    ]
}

/// Continuous colormap built from a palette's anchors.
///
/// Names ending in `_r` are reversed. A few common colormap names map onto the
/// stored palettes (`RdBu` → `rdbu`, `coolwarm` → `diverging_rb`, …).
#[derive(Clone, Debug, PartialEq)]
pub struct Colormap {
    pub name: String,
    anchors: Vec<Rgb8>,
}

impl Colormap {
    pub fn named(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();
        let (base, reversed) = match lower.strip_suffix("_r") {
            Some(b) => (b.to_string(), true),
            None => (lower.clone(), false),
        };
        let base = match base.as_str() {
            "coolwarm" | "bwr" => "diverging_rb",
            "ylorrd" | "hot" => "sequential_heat",
            "gnbu" => "sequential_cool",
            "rdylbu" => "temperature",
            other => other,
        };
        let mut anchors = parse_colors(lookup(base).unwrap_or_else(|| {
            log::debug!("unknown colormap `{name}`, using viridis");
            lookup("viridis").unwrap_or(&[])
        }));
        if reversed {
            anchors.reverse();
        }
        Self {
            name: name.to_string(),
            anchors,
        }
    }

    /// Color at `t` in [0, 1] (clamped).
    pub fn at(&self, t: f64) -> Rgb8 {
        match self.anchors.as_slice() {
            [] => Rgb8::BLACK,
            [only] => *only,
            anchors => Rgb8::from_unit(interpolate(anchors, if t.is_nan() { 0.0 } else { t })),
        }
    }

    /// Color for `value` normalized into `[vmin, vmax]`.
    pub fn map(&self, value: f64, vmin: f64, vmax: f64) -> Rgb8 {
        let span = vmax - vmin;
        let t = if span.abs() < f64::EPSILON {
            0.5
        } else {
            (value - vmin) / span
        };
        self.at(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_roundtrip_is_lowercase() {
        let c = Rgb8::from_hex("#0173B2").unwrap();
        assert_eq!(c, Rgb8::new(0x01, 0x73, 0xb2));
        assert_eq!(c.to_hex(), "#0173b2");
        assert_eq!(Rgb8::from_hex("#fff"), Some(Rgb8::WHITE));
        assert_eq!(Rgb8::from_hex("nope"), None);
    }

    #[test]
    fn listed_sampling_hits_both_ends() {
        let picks = sample_listed("tab10", 3);
        assert_eq!(picks[0], Rgb8::from_hex("#1F77B4").unwrap());
        assert_eq!(picks[2], Rgb8::from_hex("#17BECF").unwrap());
    }

    #[test]
    fn reversed_colormap_swaps_ends() {
        let fwd = Colormap::named("viridis");
        let rev = Colormap::named("viridis_r");
        assert_eq!(fwd.at(0.0), rev.at(1.0));
        assert_eq!(fwd.at(1.0), Rgb8::from_hex("#fde725").unwrap());
    }
}

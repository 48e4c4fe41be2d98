//! Color conversion, axis ranges, locale-aware tick labels, label-area sizing.

use chrono::DateTime;
use num_format::{Locale, ToFormattedString};
use plotters::style::{RGBAColor, RGBColor};

use crate::palette::Rgb8;

use super::text::block_size_px;

pub fn rgb(c: Rgb8) -> RGBColor {
    RGBColor(c.r, c.g, c.b)
}

pub fn rgba(c: Rgb8, alpha: f64) -> RGBAColor {
    RGBAColor(c.r, c.g, c.b, alpha.clamp(0.0, 1.0))
}

/// Map a user-provided locale tag to a `num_format::Locale` and its decimal separator.
///
/// Supported tags (case-insensitive): `en`, `us`, `en_US`, `de`, `de_DE`, `german`,
/// `fr`, `es`, `it`, `pt`, `nl`. Anything else is English.
pub fn map_locale(tag: &str) -> (&'static Locale, char) {
    match tag.to_lowercase().replace('-', "_").as_str() {
        "de" | "de_de" | "german" => (&Locale::de, ','),
        "fr" | "fr_fr" => (&Locale::fr, ','),
        "es" | "es_es" => (&Locale::es, ','),
        "it" | "it_it" => (&Locale::it, ','),
        "pt" | "pt_pt" | "pt_br" => (&Locale::pt, ','),
        "nl" | "nl_nl" => (&Locale::nl, ','),
        _ => (&Locale::en, '.'),
    }
}

/// View range with `pad` of the span added on both sides. Degenerate spans
/// widen to ±0.5 (or ±5% of the value) so plotters always gets an interval.
pub fn padded_range(lo: f64, hi: f64, pad: f64) -> (f64, f64) {
    if !(lo.is_finite() && hi.is_finite()) {
        return (0.0, 1.0);
    }
    let span = hi - lo;
    if span.abs() < f64::EPSILON {
        let half = if lo == 0.0 { 0.5 } else { lo.abs() * 0.05 };
        return (lo - half, hi + half);
    }
    (lo - span * pad, hi + span * pad)
}

/// Label formatter for one axis, fixed once the range is known.
#[derive(Debug, Clone, Copy)]
pub struct TickFormat {
    decimals: usize,
    locale: &'static Locale,
    decimal_sep: char,
}

impl TickFormat {
    /// Enough decimals to tell `ticks` evenly spaced labels over `lo..hi` apart.
    pub fn for_range(lo: f64, hi: f64, ticks: usize, locale_tag: &str) -> Self {
        let step = (hi - lo).abs() / ticks.max(1) as f64;
        let decimals = if step > 0.0 && step.is_finite() {
            (-step.log10().floor()).clamp(0.0, 6.0) as usize
        } else {
            0
        };
        let (locale, decimal_sep) = map_locale(locale_tag);
        Self {
            decimals,
            locale,
            decimal_sep,
        }
    }

    /// `12345.6` → `12,345.6` (en) / `12.345,6` (de).
    pub fn format(&self, v: f64) -> String {
        let fixed = format!("{:.*}", self.decimals, v.abs());
        let (int_part, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
        let int: u64 = int_part.parse().unwrap_or(0);
        let mut out = String::new();
        if v < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0') {
            out.push('-');
        }
        out.push_str(&int.to_formatted_string(self.locale));
        if !frac.is_empty() {
            out.push(self.decimal_sep);
            out.push_str(frac);
        }
        out
    }
}

/// Epoch-second tick label; coarser formats for wider spans.
pub fn format_datetime_tick(v: f64, span_secs: f64) -> String {
    const DAY: f64 = 86_400.0;
    let fmt = if span_secs < 2.0 * DAY {
        "%m-%d %H:%M"
    } else if span_secs < 5.0 * 365.0 * DAY {
        "%Y-%m-%d"
    } else {
        "%Y"
    };
    DateTime::from_timestamp(v.round() as i64, 0)
        .map(|d| d.format(fmt).to_string())
        .unwrap_or_default()
}

/// Width of the left label area: widest tick label plus room for tick marks
/// and the rotated axis title.
pub fn compute_left_label_area_px<I, S>(labels: I, font_px: u32, has_title: bool) -> u32
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let widest = labels
        .into_iter()
        .map(|l| block_size_px(l.as_ref(), font_px).0)
        .max()
        .unwrap_or(0);
    let title = if has_title { font_px * 2 } else { 0 };
    (widest + font_px + title).clamp(font_px * 2, font_px * 24)
}

/// Height of the bottom label area for labels spanning `lines` lines.
pub fn compute_bottom_label_area_px(lines: usize, font_px: u32, has_title: bool) -> u32 {
    let ticks = lines.max(1) as u32 * (font_px + font_px / 4);
    let title = if has_title { font_px * 2 } else { 0 };
    ticks + font_px + title
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_labels_follow_locale() {
        let en = TickFormat::for_range(0.0, 20_000.0, 10, "en");
        assert_eq!(en.format(12_000.0), "12,000");
        let de = TickFormat::for_range(0.0, 1.0, 10, "de");
        assert_eq!(de.format(0.5), "0,5");
        assert_eq!(de.format(-0.04), "0,0");
    }

    #[test]
    fn degenerate_ranges_widen() {
        assert_eq!(padded_range(0.0, 0.0, 0.05), (-0.5, 0.5));
        assert_eq!(padded_range(0.0, 10.0, 0.05), (-0.5, 10.5));
    }

    #[test]
    fn datetime_ticks() {
        assert_eq!(format_datetime_tick(0.0, 30.0 * 86_400.0), "1970-01-01");
    }
}

//! Legend layout and drawing: inside the plot at a `LegendLoc`, or in a
//! separate panel to the right of, above, or below the plot.

use std::ops::Range;

use anyhow::Result;
use plotters::backend::DrawingBackend;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::FontFamily;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use super::marker::{Marker, dash_pattern, dash_segments};
use super::text::{estimate_text_width_px, wrap_text_to_width};
use super::util::rgba;
use crate::config::LegendLoc;
use crate::figure::{LegendEntry, LegendGlyph};

/// Spacing derived from the legend font size. The estimator and the
/// drawing code must use the same values.
#[derive(Debug, Clone, Copy)]
pub struct LegendMetrics {
    pub font_px: u32,
    line_h: i32,
    row_gap: i32,
    pad: i32,
    glyph_w: i32,
    glyph_gap: i32,
    trailing_gap: i32,
    marker_r: i32,
    stroke: u32,
}

impl LegendMetrics {
    pub fn new(font_px: u32) -> Self {
        let f = font_px.max(4) as i32;
        Self {
            font_px: f as u32,
            line_h: f + f / 6 + 1,
            row_gap: (f / 4).max(2),
            pad: (f / 2).max(4),
            glyph_w: f * 2,
            glyph_gap: (f * 2 / 3).max(4),
            trailing_gap: f,
            marker_r: (f / 3).max(2),
            stroke: (f / 8).max(1) as u32,
        }
    }

    /// Horizontal space around the text of one entry.
    fn chrome(&self) -> i32 {
        self.glyph_w + self.glyph_gap + self.trailing_gap
    }

    fn min_slot(&self) -> i32 {
        self.font_px as i32 * 4
    }

    fn label_style(&self) -> TextStyle<'static> {
        TextStyle::from((FontFamily::SansSerif, self.font_px)).pos(Pos::new(HPos::Left, VPos::Center))
    }
}

// ---------------------------------------------------------------------------
// Top/bottom band: table layout
// ---------------------------------------------------------------------------

/// Rows of entry indices plus shared column offsets and text caps, so entries
/// line up like a table across rows.
struct BandLayout {
    rows: Vec<Vec<usize>>,
    col_x: Vec<i32>,
    text_cap: Vec<i32>,
}

/// Greedy row packing, then per-column widths from the longest single-line
/// label. When those do not fit the band, columns fall back to uniform slots
/// and labels wrap.
fn band_layout(labels: &[&str], start_x: i32, total_w: i32, m: &LegendMetrics) -> BandLayout {
    let usable = total_w - m.pad;
    let per_item_cap = (((usable - start_x) as f32) * 0.35).max(m.min_slot() as f32 * 2.0) as i32;
    let packed_w = |label: &str, cap: i32| -> i32 {
        let widest = wrap_text_to_width(label, m.font_px, cap.max(m.min_slot()) as u32)
            .iter()
            .map(|l| estimate_text_width_px(l, m.font_px) as i32)
            .max()
            .unwrap_or(0);
        m.chrome() + widest
    };

    let mut rows: Vec<Vec<usize>> = Vec::new();
    let mut cur: Vec<usize> = Vec::new();
    let mut x = start_x;
    for (i, label) in labels.iter().enumerate() {
        let cap_now = ((usable - x).max(m.min_slot()) - m.chrome()).min(per_item_cap);
        let mut w = packed_w(label, cap_now);
        if x + w > usable && !cur.is_empty() {
            rows.push(std::mem::take(&mut cur));
            x = start_x;
            w = packed_w(label, ((usable - start_x) - m.chrome()).min(per_item_cap));
        }
        x += w;
        cur.push(i);
    }
    if !cur.is_empty() {
        rows.push(cur);
    }

    let k = rows.iter().map(Vec::len).max().unwrap_or(1).max(1);
    let mut col_w = vec![m.min_slot(); k];
    for row in &rows {
        for (ci, &i) in row.iter().enumerate() {
            let w = m.chrome() + estimate_text_width_px(labels[i], m.font_px) as i32;
            col_w[ci] = col_w[ci].max(w);
        }
    }
    if start_x + col_w.iter().sum::<i32>() > usable {
        let uniform = ((usable - start_x) / k as i32).max(m.min_slot());
        col_w = vec![uniform; k];
    }

    let mut col_x = Vec::with_capacity(k);
    let mut acc = start_x;
    for w in &col_w {
        col_x.push(acc);
        acc += w;
    }
    let text_cap = col_w.iter().map(|w| (w - m.chrome()).max(m.min_slot())).collect();
    BandLayout { rows, col_x, text_cap }
}

/// Height the top/bottom band needs for `labels`, in pixels.
pub fn estimate_band_height_px(labels: &[&str], start_x: i32, total_w: i32, m: &LegendMetrics) -> i32 {
    let layout = band_layout(labels, start_x, total_w, m);
    let mut height = m.pad * 2;
    for (ri, row) in layout.rows.iter().enumerate() {
        let row_h = row
            .iter()
            .enumerate()
            .map(|(ci, &i)| {
                wrap_text_to_width(labels[i], m.font_px, layout.text_cap[ci] as u32).len() as i32 * m.line_h
            })
            .max()
            .unwrap_or(m.line_h);
        height += row_h;
        if ri + 1 < layout.rows.len() {
            height += m.row_gap;
        }
    }
    height
}

// ---------------------------------------------------------------------------
// External panel
// ---------------------------------------------------------------------------

/// Draw the legend in its own drawing area. `OutsideRight` is a single
/// column; `OutsideTop`/`OutsideBottom` use the table layout with the first
/// column aligned to the plot's x axis.
pub fn draw_legend_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    entries: &[LegendEntry],
    placement: LegendLoc,
    axis_x_start_px: i32,
    m: &LegendMetrics,
) -> Result<()> {
    let (w_u32, _) = area.dim_in_pixel();
    let w = w_u32 as i32;
    let style = m.label_style();

    match placement {
        LegendLoc::OutsideRight => {
            let text_x = m.pad + m.glyph_w + m.glyph_gap;
            let max_text_w = (w - text_x - m.pad).max(m.min_slot()) as u32;
            let mut y = m.pad * 2;
            for entry in entries {
                let lines = wrap_text_to_width(&entry.label, m.font_px, max_text_w);
                let block_h = lines.len().max(1) as i32 * m.line_h;
                draw_glyph(area, m.pad, y + block_h / 2, entry, m)?;
                for (i, line) in lines.iter().enumerate() {
                    let cy = y + i as i32 * m.line_h + m.line_h / 2;
                    area.draw(&Text::new(line.as_str(), (text_x, cy), style.clone()))
                        .map_err(|e| anyhow::anyhow!("{:?}", e))?;
                }
                y += block_h + m.row_gap;
            }
        }
        LegendLoc::OutsideTop | LegendLoc::OutsideBottom => {
            let labels: Vec<&str> = entries.iter().map(|e| e.label.as_str()).collect();
            let layout = band_layout(&labels, axis_x_start_px, w, m);
            let mut y_top = m.pad;
            for row in &layout.rows {
                let wrapped: Vec<Vec<String>> = row
                    .iter()
                    .enumerate()
                    .map(|(ci, &i)| wrap_text_to_width(labels[i], m.font_px, layout.text_cap[ci] as u32))
                    .collect();
                let row_h = wrapped
                    .iter()
                    .map(|l| l.len().max(1) as i32 * m.line_h)
                    .max()
                    .unwrap_or(m.line_h);
                let y_center = y_top + row_h / 2;
                for (ci, &i) in row.iter().enumerate() {
                    let x = layout.col_x[ci];
                    draw_glyph(area, x, y_center, &entries[i], m)?;
                    let lines = &wrapped[ci];
                    let top = y_center - lines.len().max(1) as i32 * m.line_h / 2;
                    let text_x = x + m.glyph_w + m.glyph_gap;
                    for (li, line) in lines.iter().enumerate() {
                        let cy = top + li as i32 * m.line_h + m.line_h / 2;
                        area.draw(&Text::new(line.as_str(), (text_x, cy), style.clone()))
                            .map_err(|e| anyhow::anyhow!("{:?}", e))?;
                    }
                }
                y_top += row_h + m.row_gap;
            }
        }
        _ => log::debug!("legend panel requested for inside location {placement}"),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Inside the plot
// ---------------------------------------------------------------------------

/// Pixel size `(w, h)` of the framed inside legend.
pub fn inside_legend_size(entries: &[LegendEntry], m: &LegendMetrics) -> (i32, i32) {
    let widest = entries
        .iter()
        .map(|e| estimate_text_width_px(&e.label, m.font_px) as i32)
        .max()
        .unwrap_or(0);
    let n = entries.len() as i32;
    let w = m.pad * 2 + m.glyph_w + m.glyph_gap + widest;
    let h = m.pad * 2 + n * m.line_h + (n - 1).max(0) * m.row_gap;
    (w, h)
}

/// Candidates tried by `best`, in preference order.
const BEST_CANDIDATES: [LegendLoc; 9] = [
    LegendLoc::UpperRight,
    LegendLoc::UpperLeft,
    LegendLoc::LowerLeft,
    LegendLoc::LowerRight,
    LegendLoc::CenterRight,
    LegendLoc::CenterLeft,
    LegendLoc::LowerCenter,
    LegendLoc::UpperCenter,
    LegendLoc::Center,
];

fn anchor(loc: LegendLoc, size: (i32, i32), plot: &(Range<i32>, Range<i32>), inset: i32) -> (i32, i32) {
    let (xr, yr) = plot;
    let left = xr.start + inset;
    let right = xr.end - inset - size.0;
    let hcenter = (xr.start + xr.end - size.0) / 2;
    let top = yr.start + inset;
    let bottom = yr.end - inset - size.1;
    let vcenter = (yr.start + yr.end - size.1) / 2;
    match loc {
        LegendLoc::UpperLeft => (left, top),
        LegendLoc::LowerLeft => (left, bottom),
        LegendLoc::LowerRight => (right, bottom),
        LegendLoc::Right | LegendLoc::CenterRight => (right, vcenter),
        LegendLoc::CenterLeft => (left, vcenter),
        LegendLoc::LowerCenter => (hcenter, bottom),
        LegendLoc::UpperCenter => (hcenter, top),
        LegendLoc::Center => (hcenter, vcenter),
        _ => (right, top),
    }
}

/// Top-left corner for the legend. `Best` picks the candidate covering the
/// fewest data points; ties go to the earlier candidate.
pub fn place_inside(
    loc: LegendLoc,
    size: (i32, i32),
    plot: &(Range<i32>, Range<i32>),
    points: &[(i32, i32)],
    m: &LegendMetrics,
) -> (i32, i32) {
    if loc != LegendLoc::Best {
        return anchor(loc, size, plot, m.pad);
    }
    BEST_CANDIDATES
        .iter()
        .map(|&c| {
            let (x, y) = anchor(c, size, plot, m.pad);
            let covered = points
                .iter()
                .filter(|(px, py)| *px >= x && *px <= x + size.0 && *py >= y && *py <= y + size.1)
                .count();
            ((x, y), covered)
        })
        .min_by_key(|(_, covered)| *covered)
        .map(|(origin, _)| origin)
        .unwrap_or_else(|| anchor(LegendLoc::UpperRight, size, plot, m.pad))
}

/// Framed legend at `origin` on the full-canvas area.
pub fn draw_inside_legend<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    entries: &[LegendEntry],
    origin: (i32, i32),
    m: &LegendMetrics,
) -> Result<()> {
    let (w, h) = inside_legend_size(entries, m);
    let (x, y) = origin;
    root.draw(&Rectangle::new([(x, y), (x + w, y + h)], WHITE.mix(0.85).filled()))
        .map_err(|e| anyhow::anyhow!("{:?}", e))?;
    root.draw(&Rectangle::new([(x, y), (x + w, y + h)], BLACK.mix(0.4).stroke_width(1)))
        .map_err(|e| anyhow::anyhow!("{:?}", e))?;
    let style = m.label_style();
    let text_x = x + m.pad + m.glyph_w + m.glyph_gap;
    for (i, entry) in entries.iter().enumerate() {
        let cy = y + m.pad + i as i32 * (m.line_h + m.row_gap) + m.line_h / 2;
        draw_glyph(root, x + m.pad, cy, entry, m)?;
        root.draw(&Text::new(entry.label.as_str(), (text_x, cy), style.clone()))
            .map_err(|e| anyhow::anyhow!("{:?}", e))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Glyphs
// ---------------------------------------------------------------------------

/// Swatch for one entry, `glyph_w` wide starting at `x0`, centered on `y`.
fn draw_glyph<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    x0: i32,
    y: i32,
    entry: &LegendEntry,
    m: &LegendMetrics,
) -> Result<()> {
    let color = rgba(entry.color, entry.alpha);
    let mid = x0 + m.glyph_w / 2;
    match entry.glyph {
        LegendGlyph::Patch => {
            let half_h = m.line_h * 3 / 10;
            area.draw(&Rectangle::new(
                [(x0, y - half_h), (x0 + m.glyph_w, y + half_h)],
                color.filled(),
            ))
            .map_err(|e| anyhow::anyhow!("{:?}", e))?;
        }
        LegendGlyph::Line { style, marker } => {
            let stroke = color.stroke_width(m.stroke);
            let (from, to) = ((x0, y), (x0 + m.glyph_w, y));
            match dash_pattern(style, m.stroke) {
                None => {
                    area.draw(&PathElement::new(vec![from, to], stroke))
                        .map_err(|e| anyhow::anyhow!("{:?}", e))?;
                }
                Some((dash, gap)) => {
                    for seg in dash_segments(from, to, dash, gap) {
                        area.draw(&PathElement::new(seg.to_vec(), stroke))
                            .map_err(|e| anyhow::anyhow!("{:?}", e))?;
                    }
                }
            }
            if let Some(shape) = marker {
                area.draw(&Marker::new((mid, y), m.marker_r, color.filled(), shape))
                    .map_err(|e| anyhow::anyhow!("{:?}", e))?;
            }
        }
        LegendGlyph::Marker(shape) => {
            area.draw(&Marker::new((mid, y), m.marker_r, color.filled(), shape))
                .map_err(|e| anyhow::anyhow!("{:?}", e))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::Rgb8;

    fn entry(label: &str) -> LegendEntry {
        LegendEntry {
            label: label.into(),
            color: Rgb8::BLACK,
            alpha: 1.0,
            glyph: LegendGlyph::Patch,
        }
    }

    #[test]
    fn band_grows_with_rows() {
        let m = LegendMetrics::new(14);
        let one = estimate_band_height_px(&["a"], 50, 800, &m);
        let many: Vec<String> = (0..40).map(|i| format!("series number {i}")).collect();
        let refs: Vec<&str> = many.iter().map(String::as_str).collect();
        assert!(estimate_band_height_px(&refs, 50, 800, &m) > one);
    }

    #[test]
    fn best_avoids_crowded_corner() {
        let m = LegendMetrics::new(10);
        let plot = (0..400, 0..300);
        let size = inside_legend_size(&[entry("abc")], &m);
        let upper_right = anchor(LegendLoc::UpperRight, size, &plot, m.pad);
        let crowd: Vec<(i32, i32)> = (0..20).map(|i| (upper_right.0 + 2 + i, upper_right.1 + 2)).collect();
        let chosen = place_inside(LegendLoc::Best, size, &plot, &crowd, &m);
        assert_eq!(chosen, anchor(LegendLoc::UpperLeft, size, &plot, m.pad));
    }
}

//! Marker glyphs and line dash styles on top of plotters elements.

use plotters::element::{Drawable, PointCollection};
use plotters::prelude::*;
use plotters_backend::{BackendCoord, DrawingErrorKind};

use crate::figure::{LineStyle, MarkerShape};

/// Marker glyph of half-size `size` pixels anchored at `at` (any coordinate system).
#[derive(Debug, Clone, Copy)]
pub struct Marker<C> {
    at: C,
    size: i32,
    style: ShapeStyle,
    shape: MarkerShape,
}

impl<C> Marker<C> {
    pub fn new(at: C, size: i32, style: ShapeStyle, shape: MarkerShape) -> Self {
        Self { at, size, style, shape }
    }
}

impl<'a, C> PointCollection<'a, C> for &'a Marker<C> {
    type Point = &'a C;
    type IntoIter = std::iter::Once<&'a C>;

    fn point_iter(self) -> Self::IntoIter {
        std::iter::once(&self.at)
    }
}

impl<C, DB: DrawingBackend> Drawable<DB> for Marker<C> {
    fn draw<I: Iterator<Item = BackendCoord>>(
        &self,
        mut points: I,
        backend: &mut DB,
        _: (u32, u32),
    ) -> Result<(), DrawingErrorKind<DB::ErrorType>> {
        let Some((x, y)) = points.next() else {
            return Ok(());
        };
        let s = self.size.max(1);
        let fill = self.style.filled();
        let stroke = ShapeStyle {
            filled: false,
            stroke_width: (s / 3).max(1) as u32,
            ..self.style
        };
        match self.shape {
            MarkerShape::Circle => backend.draw_circle((x, y), s as u32, &fill, true),
            MarkerShape::Square => backend.draw_rect((x - s, y - s), (x + s, y + s), &fill, true),
            MarkerShape::Triangle => backend.fill_polygon(vec![(x, y - s), (x - s, y + s), (x + s, y + s)], &fill),
            MarkerShape::Diamond => {
                backend.fill_polygon(vec![(x, y - s), (x - s, y), (x, y + s), (x + s, y)], &fill)
            }
            MarkerShape::Cross => {
                backend.draw_path(vec![(x - s, y), (x + s, y)], &stroke)?;
                backend.draw_path(vec![(x, y - s), (x, y + s)], &stroke)
            }
            MarkerShape::X => {
                backend.draw_path(vec![(x - s, y - s), (x + s, y + s)], &stroke)?;
                backend.draw_path(vec![(x - s, y + s), (x + s, y - s)], &stroke)
            }
        }
    }
}

/// `(dash, gap)` in pixels for a stroke of `width` pixels; `None` for solid.
pub fn dash_pattern(style: LineStyle, width: u32) -> Option<(u32, u32)> {
    let w = width.max(1);
    match style {
        LineStyle::Solid => None,
        LineStyle::Dashed => Some((w * 4, w * 2)),
        LineStyle::Dotted => Some((w, w * 2)),
        LineStyle::DashDot => Some((w * 6, w * 3)),
    }
}

/// Pixel segments of a dashed path between two backend points.
pub fn dash_segments(from: (i32, i32), to: (i32, i32), dash: u32, gap: u32) -> Vec<[(i32, i32); 2]> {
    let (dx, dy) = ((to.0 - from.0) as f64, (to.1 - from.1) as f64);
    let len = dx.hypot(dy);
    if len < 1.0 {
        return Vec::new();
    }
    let (ux, uy) = (dx / len, dy / len);
    let at = |d: f64| ((from.0 as f64 + ux * d).round() as i32, (from.1 as f64 + uy * d).round() as i32);
    let mut out = Vec::new();
    let mut d = 0.0;
    while d < len {
        let end = (d + dash as f64).min(len);
        out.push([at(d), at(end)]);
        d = end + gap as f64;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markers_draw_at_mapped_positions() {
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, (40, 40)).into_drawing_area();
            for (i, shape) in [MarkerShape::Circle, MarkerShape::Diamond, MarkerShape::X].into_iter().enumerate() {
                let at = (10 + 10 * i as i32, 20);
                root.draw(&Marker::new(at, 3, RED.filled(), shape)).unwrap();
            }
            root.present().unwrap();
        }
        assert!(svg.contains("<circle"));
        assert!(svg.contains("<polygon"));
        assert!(svg.contains("<polyline"));
    }

    #[test]
    fn dashes_cover_the_path_with_gaps() {
        let segs = dash_segments((0, 0), (20, 0), 4, 2);
        assert_eq!(segs.first(), Some(&[(0, 0), (4, 0)]));
        assert_eq!(segs.len(), 4);
        assert_eq!(segs.last(), Some(&[(18, 0), (20, 0)]));
        assert_eq!(dash_pattern(LineStyle::Solid, 2), None);
    }
}

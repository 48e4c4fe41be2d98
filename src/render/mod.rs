//! Draws an [`Artifact`] onto any plotters backend.
//!
//! Element geometry lives in data coordinates; everything plotters cannot
//! express through its mesh (categorical tick labels, heatmap cell text,
//! annotations, the inside legend) is drawn on the root area in pixels after
//! mapping through the chart's coordinate system. Sizes given in points are
//! converted with `dpi / 72`.

pub mod legend;
pub mod marker;
pub mod text;
pub mod util;

use std::fmt::Debug;
use std::sync::Once;

use anyhow::{Result, anyhow};
use plotters::chart::DualCoordChartContext;
use plotters::coord::Shift;
use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;
use plotters::style::FontFamily;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::config::LegendLoc;
use crate::figure::{
    Artifact, Axes, Axis, AxisKind, BarElement, BoxElement, Colorbar, Element, HeatmapElement, HistogramElement,
    LineElement, LineStyle, MarkerShape, Orientation, RefLineElement, ScatterElement,
};
use crate::palette::Rgb8;

use legend::{LegendMetrics, draw_inside_legend, draw_legend_panel, estimate_band_height_px, inside_legend_size, place_inside};
use marker::{Marker, dash_pattern, dash_segments};
use text::block_size_px;
use util::{
    TickFormat, compute_bottom_label_area_px, compute_left_label_area_px, format_datetime_tick, padded_range, rgb, rgba,
};

/// Fraction of the data span added on each side of a derived view range.
const AXIS_PAD: f64 = 0.05;
const TICK_COUNT: usize = 6;
const COLORBAR_TICKS: usize = 5;

static INIT_FONTS: Once = Once::new();

/// Bundled text face, shared with the PDF converter.
pub(crate) const FONT_DATA: &[u8] = include_bytes!("../../assets/DejaVuSans.ttf");
pub(crate) const FONT_FAMILY: &str = "DejaVu Sans";

/// `ab_glyph` does not discover system fonts, so a bundled face is
/// registered as "sans-serif" once per process.
fn ensure_fonts_registered() {
    INIT_FONTS.call_once(|| {
        let registered = plotters::style::register_font(
            "sans-serif",
            plotters::style::FontStyle::Normal,
            FONT_DATA,
        );
        if registered.is_err() {
            log::warn!("bundled font could not be registered; text will not render");
        }
    });
}

type Coord = Cartesian2d<RangedCoordf64, RangedCoordf64>;
type Chart<'a, DB> = DualCoordChartContext<'a, DB, Coord, Coord>;

fn backend_err<E: Debug>(e: E) -> anyhow::Error {
    anyhow!("{:?}", e)
}

#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub dpi: u32,
    /// Fill for the whole canvas; `None` leaves the backend as is.
    pub background: Option<RGBColor>,
}

/// Point-to-pixel conversion for one render.
#[derive(Debug, Clone, Copy)]
struct Scale(f64);

impl Scale {
    fn px(self, points: f64) -> u32 {
        (points * self.0).round().max(1.0) as u32
    }

    fn pxi(self, points: f64) -> i32 {
        self.px(points) as i32
    }
}

/// View ranges for the shared x axis and both y axes.
#[derive(Debug, Clone, Copy)]
struct View {
    x: (f64, f64),
    y: (f64, f64),
    y2: (f64, f64),
}

impl View {
    fn of(axes: &Axes) -> Self {
        let pad = if axes.heatmap().is_some() { 0.0 } else { AXIS_PAD };
        let primary = axes.data_bounds(false);
        let secondary = axes.data_bounds(true);

        let mut x_data = primary.map(|b| b.x).filter(|(lo, hi)| lo <= hi);
        if let Some((lo, hi)) = secondary.map(|b| b.x).filter(|(lo, hi)| lo <= hi) {
            x_data = Some(x_data.map_or((lo, hi), |(a, b)| (a.min(lo), b.max(hi))));
        }
        let vertical_bars = axes.bars().any(|b| b.orientation == Orientation::Vertical);
        let horizontal_bars = axes.bars().any(|b| b.orientation == Orientation::Horizontal);
        let sticky_y = vertical_bars || axes.histograms().next().is_some();

        let x = axis_view(axes.x.limits, x_data, pad, horizontal_bars);
        let y = axis_view(axes.y.limits, primary.map(|b| b.y), pad, sticky_y);
        let y2 = if axes.has_secondary() {
            let limits = axes.y2.as_ref().and_then(|a| a.limits);
            axis_view(limits, secondary.map(|b| b.y), pad, false)
        } else {
            y
        };
        Self { x, y, y2 }
    }

    /// Secondary-axis value expressed on the primary y scale.
    fn y2_to_primary(&self, v: f64) -> f64 {
        let (a, b) = self.y2;
        let (c, d) = self.y;
        c + (v - a) / (b - a) * (d - c)
    }
}

/// Explicit limits win; otherwise the padded data extent. Bars and
/// histograms keep zero as a hard edge when all data sits on one side.
fn axis_view(limits: Option<(f64, f64)>, data: Option<(f64, f64)>, pad: f64, sticky_zero: bool) -> (f64, f64) {
    if let Some((lo, hi)) = limits {
        if lo.is_finite() && hi.is_finite() && lo != hi {
            return (lo, hi);
        }
        return padded_range(lo, hi, 0.0);
    }
    let Some((lo, hi)) = data.filter(|(lo, hi)| lo <= hi) else {
        return (0.0, 1.0);
    };
    let (plo, phi) = padded_range(lo, hi, pad);
    match (sticky_zero, lo >= 0.0, hi <= 0.0) {
        (true, true, _) if hi > 0.0 => (0.0, phi),
        (true, _, true) if lo < 0.0 => (plo, 0.0),
        _ => (plo, phi),
    }
}

/// Tick label formatter for a non-categorical axis.
fn tick_formatter(axis: &Axis, range: (f64, f64), locale: &str) -> Box<dyn Fn(&f64) -> String> {
    match &axis.kind {
        AxisKind::Datetime => {
            let span = (range.1 - range.0).abs();
            Box::new(move |v: &f64| format_datetime_tick(*v, span))
        }
        AxisKind::Categorical(_) => Box::new(|_: &f64| String::new()),
        AxisKind::Linear => {
            let fmt = TickFormat::for_range(range.0, range.1, TICK_COUNT, locale);
            Box::new(move |v: &f64| fmt.format(*v))
        }
    }
}

/// Strings the y axis will show, for sizing its label area.
fn sample_tick_labels(axis: &Axis, range: (f64, f64), locale: &str) -> Vec<String> {
    match &axis.kind {
        AxisKind::Categorical(ticks) => ticks.iter().map(|(_, l)| l.clone()).collect(),
        _ => {
            let f = tick_formatter(axis, range, locale);
            [range.0, (range.0 + range.1) / 2.0, range.1].iter().map(|v| f(v)).collect()
        }
    }
}

/// Draw `artifact` on `root`, which must cover the whole backend.
pub fn draw_artifact<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    artifact: &Artifact,
    opts: &RenderOptions,
) -> Result<()> {
    ensure_fonts_registered();
    let axes = &artifact.axes;
    let scale = Scale(opts.dpi.max(1) as f64 / 72.0);

    if let Some(bg) = opts.background {
        root.fill(&bg).map_err(backend_err)?;
    }

    let label_px = scale.px(axes.font_size);
    let tick_px = scale.px((axes.font_size - 1.0).max(1.0));
    let view = View::of(axes);

    // Colorbar takes a strip on the right of the canvas.
    let (root_w, _) = root.dim_in_pixel();
    let (main_area, colorbar_area) = match &axes.colorbar {
        Some(_) => {
            let strip = ((root_w as f64) * 0.16).round().max(40.0) as u32;
            let (main, bar) = root.split_horizontally(root_w.saturating_sub(strip).max(1));
            (main, Some(bar))
        }
        None => (root.clone(), None),
    };

    let y_labels = sample_tick_labels(&axes.y, view.y, &axes.locale);
    let left_px = compute_left_label_area_px(&y_labels, tick_px, !axes.y.label.is_empty());
    let x_lines = match &axes.x.kind {
        AxisKind::Categorical(ticks) => ticks.iter().map(|(_, l)| block_size_px(l, tick_px).1).max().unwrap_or(1),
        _ => 1,
    };
    let bottom_px = compute_bottom_label_area_px(x_lines, tick_px, !axes.x.label.is_empty());
    let margin_px = scale.px(6.0);

    // Outside legends get their own panel.
    let legend = axes.legend.as_ref().filter(|l| !l.entries.is_empty());
    let metrics = legend.map(|l| LegendMetrics::new(scale.px(l.font_size)));
    let (plot_area, legend_panel) = match (legend, metrics) {
        (Some(l), Some(m)) if l.loc.is_outside() => {
            let (w, h) = main_area.dim_in_pixel();
            let labels: Vec<&str> = l.entries.iter().map(|e| e.label.as_str()).collect();
            let axis_x_start_px = (margin_px + left_px) as i32;
            match l.loc {
                LegendLoc::OutsideRight => {
                    let (plot, panel) = main_area.split_horizontally((80).percent_width());
                    (plot, Some((panel, l, m, 0)))
                }
                LegendLoc::OutsideTop => {
                    let band = estimate_band_height_px(&labels, axis_x_start_px, w as i32, &m).max(1) as u32;
                    let (panel, plot) = main_area.split_vertically(band.min(h / 2));
                    (plot, Some((panel, l, m, axis_x_start_px)))
                }
                _ => {
                    let band = estimate_band_height_px(&labels, axis_x_start_px, w as i32, &m).max(1) as u32;
                    let (plot, panel) = main_area.split_vertically(h.saturating_sub(band).max(h / 2));
                    (plot, Some((panel, l, m, axis_x_start_px)))
                }
            }
        }
        _ => (main_area, None),
    };

    let mut builder = ChartBuilder::on(&plot_area);
    builder
        .margin(margin_px)
        .set_label_area_size(LabelAreaPosition::Left, left_px)
        .set_label_area_size(LabelAreaPosition::Bottom, bottom_px);
    if let Some(title) = &axes.title {
        builder.caption(&title.text, (FontFamily::SansSerif, scale.px(title.font_size)));
    }
    if axes.has_secondary() {
        let y2_axis = axes.y2.clone().unwrap_or_default();
        let y2_labels = sample_tick_labels(&y2_axis, view.y2, &axes.locale);
        let right_px = compute_left_label_area_px(&y2_labels, tick_px, !y2_axis.label.is_empty());
        builder.set_label_area_size(LabelAreaPosition::Right, right_px);
    }
    let mut chart = builder
        .build_cartesian_2d(view.x.0..view.x.1, view.y.0..view.y.1)
        .map_err(backend_err)?
        .set_secondary_coord(view.x.0..view.x.1, view.y2.0..view.y2.1);

    if axes.theme.panel != artifact.figure.facecolor {
        chart.plotting_area().fill(&rgb(axes.theme.panel)).map_err(backend_err)?;
    }
    draw_mesh(&mut chart, axes, &view, scale, label_px, tick_px)?;

    let mut occupied: Vec<(i32, i32)> = Vec::new();
    for element in &axes.elements {
        match element {
            Element::Line(l) => draw_line(&mut chart, root, l, &view, scale, &mut occupied)?,
            Element::Area(a) => {
                let mut outline: Vec<(f64, f64)> = a.points.iter().map(|&(x, lo, _)| (x, lo)).collect();
                outline.extend(a.points.iter().rev().map(|&(x, _, hi)| (x, hi)));
                outline.retain(|(x, y)| x.is_finite() && y.is_finite());
                chart
                    .draw_series(std::iter::once(Polygon::new(outline, rgba(a.color, a.alpha).filled())))
                    .map_err(backend_err)?;
            }
            Element::Bars(b) => draw_bars(&mut chart, b, &mut occupied)?,
            Element::Scatter(s) => draw_scatter(&mut chart, s, scale, &mut occupied)?,
            Element::Box(b) => draw_box(&mut chart, b, scale)?,
            Element::Histogram(h) => draw_histogram(&mut chart, h, scale, &mut occupied)?,
            Element::Heatmap(h) => draw_heatmap(&mut chart, root, h, tick_px)?,
            Element::RefLine(r) => draw_ref_line(&chart, root, r, &view, scale)?,
        }
    }

    draw_categorical_ticks(&chart, root, axes, &view, scale, tick_px)?;
    draw_annotations(&chart, root, axes, scale)?;

    if let (Some(cb), Some(area)) = (&axes.colorbar, &colorbar_area) {
        let plot_rows = chart.plotting_area().get_pixel_range().1;
        draw_colorbar(area, cb, (plot_rows.start, plot_rows.end), &axes.locale, scale, tick_px, label_px)?;
    }

    match (legend, metrics, legend_panel) {
        (_, _, Some((panel, l, m, axis_x_start_px))) => {
            draw_legend_panel(&panel, &l.entries, l.loc, axis_x_start_px, &m)?;
        }
        (Some(l), Some(m), None) => {
            let plot_px = chart.plotting_area().get_pixel_range();
            let size = inside_legend_size(&l.entries, &m);
            let origin = place_inside(l.loc, size, &plot_px, &occupied, &m);
            draw_inside_legend(root, &l.entries, origin, &m)?;
        }
        _ => {}
    }
    Ok(())
}

fn draw_mesh<DB: DrawingBackend>(
    chart: &mut Chart<'_, DB>,
    axes: &Axes,
    view: &View,
    scale: Scale,
    label_px: u32,
    tick_px: u32,
) -> Result<()> {
    let x_fmt = tick_formatter(&axes.x, view.x, &axes.locale);
    let y_fmt = tick_formatter(&axes.y, view.y, &axes.locale);
    let grid = axes.grid.filter(|_| axes.heatmap().is_none());
    let x_categorical = matches!(axes.x.kind, AxisKind::Categorical(_));
    let y_categorical = matches!(axes.y.kind, AxisKind::Categorical(_));

    let mut mesh = chart.configure_mesh();
    mesh.x_labels(TICK_COUNT)
        .y_labels(TICK_COUNT)
        .x_label_formatter(x_fmt.as_ref())
        .y_label_formatter(y_fmt.as_ref())
        .label_style((FontFamily::SansSerif, tick_px))
        .axis_desc_style((FontFamily::SansSerif, label_px))
        .axis_style(rgb(axes.theme.spine).stroke_width(scale.px(0.8)))
        .set_all_tick_mark_size(scale.pxi(3.5));
    if !axes.x.label.is_empty() {
        mesh.x_desc(axes.x.label.as_str());
    }
    if !axes.y.label.is_empty() {
        mesh.y_desc(axes.y.label.as_str());
    }
    match grid {
        Some(g) => {
            mesh.bold_line_style(rgb(g.color).mix(g.alpha).stroke_width(scale.px(g.width)))
                .light_line_style(WHITE.mix(0.0).stroke_width(0));
        }
        None => {
            mesh.disable_mesh();
        }
    }
    if x_categorical {
        mesh.disable_x_mesh().set_tick_mark_size(LabelAreaPosition::Bottom, 0);
    }
    if y_categorical {
        mesh.disable_y_mesh().set_tick_mark_size(LabelAreaPosition::Left, 0);
    }
    mesh.draw().map_err(backend_err)?;

    if axes.has_secondary() {
        let y2_axis = axes.y2.clone().unwrap_or_default();
        let y2_fmt = tick_formatter(&y2_axis, view.y2, &axes.locale);
        let mut secondary = chart.configure_secondary_axes();
        secondary
            .y_labels(TICK_COUNT)
            .y_label_formatter(y2_fmt.as_ref())
            .label_style((FontFamily::SansSerif, tick_px))
            .axis_desc_style((FontFamily::SansSerif, label_px));
        if !y2_axis.label.is_empty() {
            secondary.y_desc(y2_axis.label.as_str());
        }
        secondary.draw().map_err(backend_err)?;
    }
    Ok(())
}

/// Maximal runs of finite points; gaps split a line.
fn finite_runs(points: &[(f64, f64)]) -> Vec<Vec<(f64, f64)>> {
    let mut runs = Vec::new();
    let mut cur = Vec::new();
    for &(x, y) in points {
        if x.is_finite() && y.is_finite() {
            cur.push((x, y));
        } else if !cur.is_empty() {
            runs.push(std::mem::take(&mut cur));
        }
    }
    if !cur.is_empty() {
        runs.push(cur);
    }
    runs
}

/// Stroke a pixel-space polyline on `root`, dashed when `style` asks for it.
fn stroke_pixels<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    pixels: &[(i32, i32)],
    color: RGBAColor,
    width: u32,
    style: LineStyle,
) -> Result<()> {
    let stroke = color.stroke_width(width);
    match dash_pattern(style, width) {
        None => {
            root.draw(&PathElement::new(pixels.to_vec(), stroke)).map_err(backend_err)?;
        }
        Some((dash, gap)) => {
            for pair in pixels.windows(2) {
                for seg in dash_segments(pair[0], pair[1], dash, gap) {
                    root.draw(&PathElement::new(seg.to_vec(), stroke)).map_err(backend_err)?;
                }
            }
        }
    }
    Ok(())
}

fn draw_line<DB: DrawingBackend>(
    chart: &mut Chart<'_, DB>,
    root: &DrawingArea<DB, Shift>,
    line: &LineElement,
    view: &View,
    scale: Scale,
    occupied: &mut Vec<(i32, i32)>,
) -> Result<()> {
    let color = rgba(line.color, line.alpha);
    let width = scale.px(line.width);
    let to_px = |(x, y): (f64, f64)| {
        let y = if line.secondary { view.y2_to_primary(y) } else { y };
        chart.backend_coord(&(x, y))
    };
    let runs = finite_runs(&line.points);
    let pixel_runs: Vec<Vec<(i32, i32)>> = runs.iter().map(|r| r.iter().copied().map(to_px).collect()).collect();
    occupied.extend(pixel_runs.iter().flatten().copied());

    for (run, pixels) in runs.iter().zip(&pixel_runs) {
        if line.style == LineStyle::Solid {
            let series = LineSeries::new(run.iter().copied(), color.stroke_width(width));
            if line.secondary {
                chart.draw_secondary_series(series).map_err(backend_err)?;
            } else {
                chart.draw_series(series).map_err(backend_err)?;
            }
        } else {
            stroke_pixels(root, pixels, color, width, line.style)?;
        }
    }

    if let Some(shape) = line.marker {
        let r = (scale.pxi(line.marker_size) / 2).max(1);
        let markers = runs
            .iter()
            .flatten()
            .map(|&p| Marker::new(p, r, color.filled(), shape));
        if line.secondary {
            chart.draw_secondary_series(markers).map_err(backend_err)?;
        } else {
            chart.draw_series(markers).map_err(backend_err)?;
        }
    }
    Ok(())
}

fn draw_bars<DB: DrawingBackend>(
    chart: &mut Chart<'_, DB>,
    bars: &BarElement,
    occupied: &mut Vec<(i32, i32)>,
) -> Result<()> {
    let fill = rgba(bars.color, bars.alpha).filled();
    let rects: Vec<[(f64, f64); 2]> = bars
        .bars
        .iter()
        .filter(|b| b.base.is_finite() && b.top.is_finite())
        .map(|b| {
            let (c0, c1) = (b.center - b.width / 2.0, b.center + b.width / 2.0);
            match bars.orientation {
                Orientation::Vertical => [(c0, b.base), (c1, b.top)],
                Orientation::Horizontal => [(b.base, c0), (b.top, c1)],
            }
        })
        .collect();
    for [a, b] in &rects {
        occupied.push(chart.backend_coord(&((a.0 + b.0) / 2.0, b.1)));
        occupied.push(chart.backend_coord(&(b.0, (a.1 + b.1) / 2.0)));
    }
    chart
        .draw_series(rects.into_iter().map(|r| Rectangle::new(r, fill)))
        .map_err(backend_err)?;
    Ok(())
}

fn draw_scatter<DB: DrawingBackend>(
    chart: &mut Chart<'_, DB>,
    scatter: &ScatterElement,
    scale: Scale,
    occupied: &mut Vec<(i32, i32)>,
) -> Result<()> {
    let points: Vec<_> = scatter
        .points
        .iter()
        .filter(|p| p.x.is_finite() && p.y.is_finite())
        .collect();
    occupied.extend(points.iter().map(|p| chart.backend_coord(&(p.x, p.y))));
    chart
        .draw_series(points.iter().map(|p| {
            // Marker size is an area in pt²; the glyph takes a half-width in px.
            let r = ((p.size.max(0.0).sqrt() / 2.0) * scale.0).round().max(1.0) as i32;
            Marker::new((p.x, p.y), r, rgba(p.color, scatter.alpha).filled(), scatter.marker)
        }))
        .map_err(backend_err)?;
    Ok(())
}

fn draw_box<DB: DrawingBackend>(chart: &mut Chart<'_, DB>, b: &BoxElement, scale: Scale) -> Result<()> {
    let Some(s) = &b.stats else {
        return Ok(());
    };
    let at = |c: f64, v: f64| match b.orientation {
        Orientation::Vertical => (c, v),
        Orientation::Horizontal => (v, c),
    };
    let half = b.width / 2.0;
    let (c0, c1, mid) = (b.position - half, b.position + half, b.position);
    let edge = BLACK.stroke_width(scale.px(1.0));
    let median_style = rgb(Rgb8::RED).stroke_width(scale.px(1.5));
    let fill = rgba(b.color, b.alpha).filled();

    let (median_from, median_to) = if b.notch {
        let (n0, n1) = s.notch;
        let inset = half * 0.5;
        let outline = vec![
            at(c0, s.q1),
            at(c1, s.q1),
            at(c1, n0),
            at(mid + inset, s.median),
            at(c1, n1),
            at(c1, s.q3),
            at(c0, s.q3),
            at(c0, n1),
            at(mid - inset, s.median),
            at(c0, n0),
        ];
        let mut closed = outline.clone();
        closed.push(outline[0]);
        chart.draw_series(std::iter::once(Polygon::new(outline, fill))).map_err(backend_err)?;
        chart.draw_series(std::iter::once(PathElement::new(closed, edge))).map_err(backend_err)?;
        (at(mid - inset, s.median), at(mid + inset, s.median))
    } else {
        let rect = [at(c0, s.q1), at(c1, s.q3)];
        chart.draw_series(std::iter::once(Rectangle::new(rect, fill))).map_err(backend_err)?;
        chart.draw_series(std::iter::once(Rectangle::new(rect, edge))).map_err(backend_err)?;
        (at(c0, s.median), at(c1, s.median))
    };

    let cap = half * 0.5;
    let strokes = [
        vec![at(mid, s.q1), at(mid, s.whisker_low)],
        vec![at(mid, s.q3), at(mid, s.whisker_high)],
        vec![at(mid - cap, s.whisker_low), at(mid + cap, s.whisker_low)],
        vec![at(mid - cap, s.whisker_high), at(mid + cap, s.whisker_high)],
    ];
    chart
        .draw_series(strokes.into_iter().map(|p| PathElement::new(p, edge)))
        .map_err(backend_err)?;
    chart
        .draw_series(std::iter::once(PathElement::new(vec![median_from, median_to], median_style)))
        .map_err(backend_err)?;

    let r = scale.pxi(3.0);
    if b.show_outliers {
        let flier = rgba(Rgb8::RED, 0.5).filled();
        chart
            .draw_series(s.fliers.iter().map(|&v| Circle::new(at(mid, v), r, flier)))
            .map_err(backend_err)?;
    }
    if b.show_mean && s.mean.is_finite() {
        chart
            .draw_series(std::iter::once(Marker::new(
                at(mid, s.mean),
                r,
                rgb(Rgb8::GREEN).filled(),
                MarkerShape::Triangle,
            )))
            .map_err(backend_err)?;
    }
    Ok(())
}

fn draw_histogram<DB: DrawingBackend>(
    chart: &mut Chart<'_, DB>,
    h: &HistogramElement,
    scale: Scale,
    occupied: &mut Vec<(i32, i32)>,
) -> Result<()> {
    let rects: Vec<[(f64, f64); 2]> = h
        .edges
        .windows(2)
        .zip(&h.heights)
        .filter(|(_, height)| height.is_finite() && **height != 0.0)
        .map(|(e, &height)| [(e[0], 0.0), (e[1], height)])
        .collect();
    occupied.extend(rects.iter().map(|[a, b]| chart.backend_coord(&((a.0 + b.0) / 2.0, b.1))));
    let fill = rgba(h.color, h.alpha).filled();
    let edge = BLACK.mix(0.6).stroke_width(scale.px(0.5));
    chart
        .draw_series(rects.iter().map(|&r| Rectangle::new(r, fill)))
        .map_err(backend_err)?;
    chart
        .draw_series(rects.iter().map(|&r| Rectangle::new(r, edge)))
        .map_err(backend_err)?;
    Ok(())
}

fn draw_heatmap<DB: DrawingBackend>(
    chart: &mut Chart<'_, DB>,
    root: &DrawingArea<DB, Shift>,
    h: &HeatmapElement,
    tick_px: u32,
) -> Result<()> {
    let rows = h.rows();
    let cells = h.values.iter().enumerate().flat_map(|(i, row)| {
        row.iter().enumerate().filter(|(_, v)| v.is_finite()).map(move |(j, &v)| {
            let (cx, cy) = (j as f64, (rows - 1 - i) as f64);
            Rectangle::new(
                [(cx - 0.5, cy - 0.5), (cx + 0.5, cy + 0.5)],
                rgb(h.cmap.map(v, h.vmin, h.vmax)).filled(),
            )
        })
    });
    chart.draw_series(cells).map_err(backend_err)?;

    let Some(labels) = &h.cell_labels else {
        return Ok(());
    };
    for (i, row) in labels.iter().enumerate() {
        for (j, cell) in row.iter().enumerate().filter(|(_, c)| !c.text.is_empty()) {
            let pos = chart.backend_coord(&(j as f64, (rows - 1 - i) as f64));
            let color = rgb(cell.color);
            let style = TextStyle::from((FontFamily::SansSerif, tick_px))
                .color(&color)
                .pos(Pos::new(HPos::Center, VPos::Center));
            root.draw(&Text::new(cell.text.as_str(), pos, style)).map_err(backend_err)?;
        }
    }
    Ok(())
}

fn draw_ref_line<DB: DrawingBackend>(
    chart: &Chart<'_, DB>,
    root: &DrawingArea<DB, Shift>,
    r: &RefLineElement,
    view: &View,
    scale: Scale,
) -> Result<()> {
    if !r.at.is_finite() {
        return Ok(());
    }
    let (from, to) = match r.orientation {
        Orientation::Vertical => ((r.at, view.y.0), (r.at, view.y.1)),
        Orientation::Horizontal => ((view.x.0, r.at), (view.x.1, r.at)),
    };
    let pixels = [chart.backend_coord(&from), chart.backend_coord(&to)];
    stroke_pixels(root, &pixels, rgba(r.color, r.alpha), scale.px(r.width), r.style)
}

/// Category names at their fixed positions. Multi-line labels stack.
fn draw_categorical_ticks<DB: DrawingBackend>(
    chart: &Chart<'_, DB>,
    root: &DrawingArea<DB, Shift>,
    axes: &Axes,
    view: &View,
    scale: Scale,
    tick_px: u32,
) -> Result<()> {
    let tick_len = scale.pxi(3.5);
    let line_h = (tick_px + tick_px / 4) as i32;
    let tick = BLACK.stroke_width(scale.px(0.8));

    if let AxisKind::Categorical(ticks) = &axes.x.kind {
        let style = TextStyle::from((FontFamily::SansSerif, tick_px)).pos(Pos::new(HPos::Center, VPos::Top));
        for (pos, label) in ticks.iter().filter(|(p, _)| p.is_finite()) {
            let (x, y) = chart.backend_coord(&(*pos, view.y.0));
            root.draw(&PathElement::new(vec![(x, y), (x, y + tick_len)], tick)).map_err(backend_err)?;
            for (i, line) in label.lines().enumerate() {
                let ty = y + tick_len + 2 + i as i32 * line_h;
                root.draw(&Text::new(line, (x, ty), style.clone())).map_err(backend_err)?;
            }
        }
    }
    if let AxisKind::Categorical(ticks) = &axes.y.kind {
        let style = TextStyle::from((FontFamily::SansSerif, tick_px)).pos(Pos::new(HPos::Right, VPos::Center));
        for (pos, label) in ticks.iter().filter(|(p, _)| p.is_finite()) {
            let (x, y) = chart.backend_coord(&(view.x.0, *pos));
            root.draw(&PathElement::new(vec![(x - tick_len, y), (x, y)], tick)).map_err(backend_err)?;
            let n = label.lines().count().max(1) as i32;
            let top = y - (n - 1) * line_h / 2;
            for (i, line) in label.lines().enumerate() {
                let ty = top + i as i32 * line_h;
                root.draw(&Text::new(line, (x - tick_len - 2, ty), style.clone())).map_err(backend_err)?;
            }
        }
    }
    Ok(())
}

/// Text at `xytext`, with an arrow pointing at `xy` when requested.
fn draw_annotations<DB: DrawingBackend>(
    chart: &Chart<'_, DB>,
    root: &DrawingArea<DB, Shift>,
    axes: &Axes,
    scale: Scale,
) -> Result<()> {
    for ann in &axes.annotations {
        let target = chart.backend_coord(&ann.xy);
        let text_at = chart.backend_coord(&ann.xytext);
        if ann.arrow && target != text_at {
            let stroke = BLACK.stroke_width(scale.px(0.8));
            root.draw(&PathElement::new(vec![text_at, target], stroke)).map_err(backend_err)?;
            let angle = ((target.1 - text_at.1) as f64).atan2((target.0 - text_at.0) as f64);
            let head = scale.0 * 5.0;
            let wing = |da: f64| {
                (
                    target.0 - (head * (angle + da).cos()).round() as i32,
                    target.1 - (head * (angle + da).sin()).round() as i32,
                )
            };
            root.draw(&Polygon::new(vec![target, wing(0.4), wing(-0.4)], BLACK.filled()))
                .map_err(backend_err)?;
        }
        let style = TextStyle::from((FontFamily::SansSerif, scale.px(ann.font_size)))
            .pos(Pos::new(HPos::Center, if ann.arrow { VPos::Bottom } else { VPos::Center }));
        root.draw(&Text::new(ann.text.as_str(), text_at, style)).map_err(backend_err)?;
    }
    Ok(())
}

/// Vertical gradient strip with ticks and a rotated label, spanning the
/// plot's pixel rows `y_span`.
fn draw_colorbar<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    cb: &Colorbar,
    y_span: (i32, i32),
    locale: &str,
    scale: Scale,
    tick_px: u32,
    label_px: u32,
) -> Result<()> {
    let y_off = area.get_base_pixel().1;
    let (top, bottom) = (y_span.0 - y_off, y_span.1 - y_off);
    if bottom <= top {
        return Ok(());
    }
    let x0 = scale.pxi(4.0);
    let bar_w = scale.pxi(8.0);
    let height = (bottom - top) as f64;
    for y in top..bottom {
        let t = 1.0 - (y - top) as f64 / height;
        area.draw(&Rectangle::new([(x0, y), (x0 + bar_w, y + 1)], rgb(cb.cmap.at(t)).filled()))
            .map_err(backend_err)?;
    }
    area.draw(&Rectangle::new([(x0, top), (x0 + bar_w, bottom)], BLACK.stroke_width(1)))
        .map_err(backend_err)?;

    let fmt = TickFormat::for_range(cb.vmin, cb.vmax, COLORBAR_TICKS - 1, locale);
    let style = TextStyle::from((FontFamily::SansSerif, tick_px)).pos(Pos::new(HPos::Left, VPos::Center));
    let tick_len = scale.pxi(3.0);
    for k in 0..COLORBAR_TICKS {
        let t = k as f64 / (COLORBAR_TICKS - 1) as f64;
        let v = cb.vmin + t * (cb.vmax - cb.vmin);
        let y = bottom - (t * height).round() as i32;
        area.draw(&PathElement::new(vec![(x0 + bar_w, y), (x0 + bar_w + tick_len, y)], BLACK.stroke_width(1)))
            .map_err(backend_err)?;
        area.draw(&Text::new(fmt.format(v), (x0 + bar_w + tick_len + 2, y), style.clone()))
            .map_err(backend_err)?;
    }

    if !cb.label.is_empty() {
        let (w, _) = area.dim_in_pixel();
        let label_style = TextStyle::from((FontFamily::SansSerif, label_px))
            .transform(FontTransform::Rotate90)
            .pos(Pos::new(HPos::Center, VPos::Center));
        let x = w as i32 - label_px as i32;
        area.draw(&Text::new(cb.label.as_str(), (x, (top + bottom) / 2), label_style))
            .map_err(backend_err)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bars_keep_zero_as_edge() {
        assert_eq!(axis_view(None, Some((0.0, 10.0)), 0.05, true), (0.0, 10.5));
        assert_eq!(axis_view(None, Some((-10.0, -2.0)), 0.05, true), (-10.4, 0.0));
        assert_eq!(axis_view(None, Some((2.0, 4.0)), 0.05, false), (1.9, 4.1));
        assert_eq!(axis_view(Some((0.0, 3.0)), Some((2.0, 4.0)), 0.05, false), (0.0, 3.0));
        assert_eq!(axis_view(None, None, 0.05, false), (0.0, 1.0));
    }

    #[test]
    fn nan_splits_lines() {
        let runs = finite_runs(&[(0.0, 1.0), (1.0, f64::NAN), (2.0, 3.0), (3.0, 4.0)]);
        assert_eq!(runs, vec![vec![(0.0, 1.0)], vec![(2.0, 3.0), (3.0, 4.0)]]);
    }

    #[test]
    fn secondary_values_map_onto_primary_scale() {
        let view = View {
            x: (0.0, 1.0),
            y: (0.0, 10.0),
            y2: (0.0, 1.0),
        };
        assert_eq!(view.y2_to_primary(0.5), 5.0);
    }
}

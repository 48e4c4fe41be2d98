//! Writes a rendered [`Artifact`] to disk.
//!
//! Raster output is drawn into an in-memory RGB buffer and encoded with
//! `image`; SVG is drawn into a string. PDF is the SVG document converted
//! with `svg2pdf`. Transparent PNGs are rendered twice, on white and on
//! black, and the alpha channel is recovered from the difference.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use image::{ImageFormat, RgbImage, RgbaImage};
use plotters::prelude::*;
use plotters_bitmap::BitMapBackend;
use plotters_svg::SVGBackend;
use svg2pdf::usvg;

use crate::config::{DEFAULT_DPI, DEFAULT_EXPORT_DIR};
use crate::error::ExportError;
use crate::figure::Artifact;
use crate::render::{FONT_DATA, FONT_FAMILY, RenderOptions, draw_artifact};

/// SVG coordinates are in CSS pixels, which are points at 72 dpi.
const SVG_DPI: u32 = 72;

/// Upper bound on raster output, width × height.
pub const MAX_PIXELS: u64 = 1 << 28;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Png,
    Pdf,
    Svg,
    Eps,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 4] = [ExportFormat::Png, ExportFormat::Pdf, ExportFormat::Svg, ExportFormat::Eps];

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Svg => "svg",
            ExportFormat::Eps => "eps",
        }
    }

    /// Resolution used when the caller has no preference; `None` for vector output.
    pub fn default_dpi(self) -> Option<u32> {
        match self {
            ExportFormat::Svg | ExportFormat::Pdf => None,
            _ => Some(DEFAULT_DPI),
        }
    }

    pub fn is_supported(self) -> bool {
        !matches!(self, ExportFormat::Eps)
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
            "png" => Ok(ExportFormat::Png),
            "pdf" => Ok(ExportFormat::Pdf),
            "svg" => Ok(ExportFormat::Svg),
            "eps" => Ok(ExportFormat::Eps),
            other => Err(ExportError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Writes artifacts into one directory as `<stem>.<ext>`.
#[derive(Debug, Clone)]
pub struct Exporter {
    dir: PathBuf,
}

impl Default for Exporter {
    fn default() -> Self {
        Self::new(DEFAULT_EXPORT_DIR)
    }
}

impl Exporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Render `artifact` and write it; returns the written path. The
    /// directory is created if missing. `dpi` is ignored for SVG and PDF.
    pub fn export(
        &self,
        artifact: &Artifact,
        stem: &str,
        format: ExportFormat,
        dpi: u32,
        transparent: bool,
    ) -> Result<PathBuf, ExportError> {
        let stem = stem.trim();
        if stem.is_empty() {
            return Err(ExportError::EmptyStem);
        }
        if !format.is_supported() {
            return Err(ExportError::UnsupportedFormat(format.to_string()));
        }
        if format == ExportFormat::Png {
            check_raster_size(artifact, dpi)?;
        }
        fs::create_dir_all(&self.dir).map_err(|source| ExportError::Io {
            path: self.dir.clone(),
            source,
        })?;
        let path = self.dir.join(format!("{stem}.{}", format.extension()));
        let write = |bytes: &[u8]| {
            fs::write(&path, bytes).map_err(|source| ExportError::Io {
                path: path.clone(),
                source,
            })
        };

        match format {
            ExportFormat::Svg => write(render_svg(artifact, transparent)?.as_bytes())?,
            ExportFormat::Pdf => write(&render_pdf(artifact, transparent)?)?,
            _ => {
                let dpi = dpi.max(1);
                if transparent {
                    render_png_rgba(artifact, dpi)?.save_with_format(&path, ImageFormat::Png)?;
                } else {
                    render_png_rgb(artifact, dpi)?.save_with_format(&path, ImageFormat::Png)?;
                }
            }
        }
        log::info!("exported {} ({} dpi) to {}", format, dpi, path.display());
        Ok(path)
    }
}

/// Rejects resolutions whose raster would exceed [`MAX_PIXELS`].
fn check_raster_size(artifact: &Artifact, dpi: u32) -> Result<(u32, u32), ExportError> {
    let (w, h) = artifact.figure.pixel_size(dpi.max(1));
    match u64::from(w).checked_mul(u64::from(h)) {
        Some(n) if n <= MAX_PIXELS => Ok((w, h)),
        _ => Err(ExportError::TooLarge { width: w, height: h, dpi }),
    }
}

fn render_rgb_buffer(artifact: &Artifact, dpi: u32, background: RGBColor) -> Result<(u32, u32, Vec<u8>), ExportError> {
    let (w, h) = check_raster_size(artifact, dpi)?;
    let mut buf = vec![0u8; (w as usize) * (h as usize) * 3];
    {
        let root = BitMapBackend::with_buffer(&mut buf, (w, h)).into_drawing_area();
        let opts = RenderOptions {
            dpi,
            background: Some(background),
        };
        draw_artifact(&root, artifact, &opts).map_err(ExportError::Render)?;
        root.present()
            .map_err(|e| ExportError::Render(anyhow::anyhow!("{:?}", e)))?;
    }
    Ok((w, h, buf))
}

fn to_image<I>(w: u32, h: u32, buf: Vec<u8>, build: impl FnOnce(u32, u32, Vec<u8>) -> Option<I>) -> Result<I, ExportError> {
    build(w, h, buf).ok_or_else(|| ExportError::Render(anyhow::anyhow!("pixel buffer does not match {w}x{h}")))
}

/// Opaque PNG on the figure's face color.
pub fn render_png_rgb(artifact: &Artifact, dpi: u32) -> Result<RgbImage, ExportError> {
    let face = artifact.figure.facecolor;
    let (w, h, buf) = render_rgb_buffer(artifact, dpi, RGBColor(face.r, face.g, face.b))?;
    to_image(w, h, buf, RgbImage::from_raw)
}

/// PNG with an alpha channel: pixels untouched by drawing come out fully
/// transparent, blended pixels keep their partial coverage.
pub fn render_png_rgba(artifact: &Artifact, dpi: u32) -> Result<RgbaImage, ExportError> {
    let (w, h, on_white) = render_rgb_buffer(artifact, dpi, WHITE)?;
    let (_, _, on_black) = render_rgb_buffer(artifact, dpi, BLACK)?;
    let rgba = recover_alpha(&on_white, &on_black);
    to_image(w, h, rgba, RgbaImage::from_raw)
}

/// `white = a·c + (1-a)·255` and `black = a·c`, so `a = 1 - (white - black)/255`.
fn recover_alpha(on_white: &[u8], on_black: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(on_white.len() / 3 * 4);
    for (w, b) in on_white.chunks_exact(3).zip(on_black.chunks_exact(3)) {
        let diff: u32 = (0..3).map(|i| u32::from(w[i].saturating_sub(b[i]))).sum();
        let alpha = 255u32.saturating_sub(diff / 3);
        if alpha == 0 {
            out.extend_from_slice(&[0, 0, 0, 0]);
            continue;
        }
        for &c in b {
            out.push(((u32::from(c) * 255 + alpha / 2) / alpha).min(255) as u8);
        }
        out.push(alpha as u8);
    }
    out
}

/// SVG document text; the face color fill is skipped when `transparent`.
pub fn render_svg(artifact: &Artifact, transparent: bool) -> Result<String, ExportError> {
    let (w, h) = artifact.figure.pixel_size(SVG_DPI);
    let face = artifact.figure.facecolor;
    let mut out = String::new();
    {
        let root = SVGBackend::with_string(&mut out, (w, h)).into_drawing_area();
        let opts = RenderOptions {
            dpi: SVG_DPI,
            background: (!transparent).then_some(RGBColor(face.r, face.g, face.b)),
        };
        draw_artifact(&root, artifact, &opts).map_err(ExportError::Render)?;
        root.present()
            .map_err(|e| ExportError::Render(anyhow::anyhow!("{:?}", e)))?;
    }
    Ok(out)
}

/// PDF bytes converted from [`render_svg`]; one page the size of the figure.
pub fn render_pdf(artifact: &Artifact, transparent: bool) -> Result<Vec<u8>, ExportError> {
    let svg = render_svg(artifact, transparent)?;
    let mut opts = usvg::Options::default();
    let fonts = opts.fontdb_mut();
    fonts.load_font_data(FONT_DATA.to_vec());
    fonts.set_sans_serif_family(FONT_FAMILY);
    let tree = usvg::Tree::from_str(&svg, &opts)
        .map_err(|e| ExportError::Render(anyhow::anyhow!("svg parse: {e}")))?;
    svg2pdf::to_pdf(&tree, svg2pdf::ConversionOptions::default(), svg2pdf::PageOptions::default())
        .map_err(|e| ExportError::Render(anyhow::anyhow!("pdf conversion: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alpha_recovery() {
        // untouched, opaque red, half-covered black
        let white = [255, 255, 255, 255, 0, 0, 128, 128, 128];
        let black = [0, 0, 0, 255, 0, 0, 0, 0, 0];
        let rgba = recover_alpha(&white, &black);
        assert_eq!(&rgba[0..4], &[0, 0, 0, 0]);
        assert_eq!(&rgba[4..8], &[255, 0, 0, 255]);
        assert_eq!(rgba[11], 127);
    }

    #[test]
    fn format_names() {
        assert_eq!(".SVG".parse::<ExportFormat>().ok(), Some(ExportFormat::Svg));
        assert!("tiff".parse::<ExportFormat>().is_err());
        assert_eq!(ExportFormat::Svg.default_dpi(), None);
        assert_eq!(ExportFormat::Png.default_dpi(), Some(300));
        assert!(ExportFormat::Pdf.is_supported());
        assert!(!ExportFormat::Eps.is_supported());
    }
}

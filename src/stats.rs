//! Statistics used by the chart families: summaries, quantiles, correlation,
//! regression, kernel density, and histogram binning.

use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;

/// Summary statistics for one numeric column.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Summary {
    pub column: String,
    pub count: usize,
    pub missing: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub median: Option<f64>,
}

/// Compute summaries for every numeric column, in column order.
pub fn column_summary(data: &Dataset) -> Vec<Summary> {
    let mut out = Vec::new();
    for name in data.numeric_column_names() {
        let Some(cells) = data.numeric_values(name) else {
            continue;
        };
        let missing = cells.iter().filter(|c| c.is_none()).count();
        let mut vals: Vec<f64> = cells.into_iter().flatten().collect();
        vals.sort_by(f64::total_cmp);
        let count = vals.len();
        out.push(Summary {
            column: name.to_string(),
            count,
            missing,
            min: vals.first().cloned(),
            max: vals.last().cloned(),
            mean: mean(&vals),
            median: median(&vals),
        });
    }
    out
}

pub fn mean(vals: &[f64]) -> Option<f64> {
    if vals.is_empty() {
        None
    } else {
        Some(vals.iter().sum::<f64>() / vals.len() as f64)
    }
}

pub fn median(vals: &[f64]) -> Option<f64> {
    quantile(vals, 0.5)
}

/// Linear-interpolated quantile (`q` in [0, 1]); input need not be sorted.
pub fn quantile(vals: &[f64], q: f64) -> Option<f64> {
    if vals.is_empty() {
        return None;
    }
    let mut sorted = vals.to_vec();
    sorted.sort_by(f64::total_cmp);
    Some(quantile_sorted(&sorted, q))
}

/// Linear-interpolated quantile over an already sorted, non-empty slice.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Sample variance (ddof = 1).
pub fn variance(vals: &[f64]) -> Option<f64> {
    if vals.len() < 2 {
        return None;
    }
    let m = mean(vals)?;
    Some(vals.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (vals.len() - 1) as f64)
}

/// Pearson correlation over rows where both cells are present.
/// `None` when fewer than two complete rows or either side is constant.
pub fn pearson(a: &[Option<f64>], b: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = a
        .iter()
        .zip(b)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect();
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let mx = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let my = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        sxy += (x - mx) * (y - my);
        sxx += (x - mx).powi(2);
        syy += (y - my).powi(2);
    }
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some((sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0))
}

/// Ordinary least squares fit `y = slope·x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    pub r: f64,
    pub n: usize,
    pub x_mean: f64,
    /// Σ(x − x̄)²
    pub sxx: f64,
    /// Residual standard error √(SSE / (n − 2)); NaN when n < 3.
    pub residual_se: f64,
}

impl LinearFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }

    pub fn r_squared(&self) -> f64 {
        self.r * self.r
    }

    /// Half width of the 95% confidence band of the mean response at `x`.
    pub fn confidence_margin(&self, x: f64) -> f64 {
        if self.n < 3 {
            return 0.0;
        }
        let se = self.residual_se
            * (1.0 / self.n as f64 + (x - self.x_mean).powi(2) / self.sxx).sqrt();
        t_quantile_975(self.n - 2) * se
    }
}

pub fn linregress(points: &[(f64, f64)]) -> Option<LinearFit> {
    if points.len() < 2 {
        return None;
    }
    let n = points.len() as f64;
    let x_mean = points.iter().map(|p| p.0).sum::<f64>() / n;
    let y_mean = points.iter().map(|p| p.1).sum::<f64>() / n;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in points {
        sxy += (x - x_mean) * (y - y_mean);
        sxx += (x - x_mean).powi(2);
        syy += (y - y_mean).powi(2);
    }
    if sxx == 0.0 {
        return None;
    }
    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;
    let r = if syy == 0.0 { 0.0 } else { sxy / (sxx * syy).sqrt() };
    let sse: f64 = points
        .iter()
        .map(|(x, y)| (y - (slope * x + intercept)).powi(2))
        .sum();
    let residual_se = if points.len() > 2 {
        (sse / (n - 2.0)).sqrt()
    } else {
        f64::NAN
    };
    Some(LinearFit {
        slope,
        intercept,
        r,
        n: points.len(),
        x_mean,
        sxx,
        residual_se,
    })
}

/// 97.5% quantile of Student's t with `df` degrees of freedom.
///
/// Exact for df 1 and 2, Cornish-Fisher expansion around the normal quantile
/// otherwise (error below 5e-3 at df = 3, shrinking quickly).
pub fn t_quantile_975(df: usize) -> f64 {
    const Z: f64 = 1.959_963_984_540_054;
    match df {
        0 => f64::NAN,
        1 => (std::f64::consts::PI * 0.475).tan(),
        2 => 0.95 / (2.0 * 0.975 * 0.025f64).sqrt(),
        _ => {
            let v = df as f64;
            let z3 = Z.powi(3);
            let z5 = Z.powi(5);
            let z7 = Z.powi(7);
            let z9 = Z.powi(9);
            Z + (z3 + Z) / (4.0 * v)
                + (5.0 * z5 + 16.0 * z3 + 3.0 * Z) / (96.0 * v.powi(2))
                + (3.0 * z7 + 19.0 * z5 + 17.0 * z3 - 15.0 * Z) / (384.0 * v.powi(3))
                + (79.0 * z9 + 776.0 * z7 + 1482.0 * z5 - 1920.0 * z3 - 945.0 * Z)
                    / (92160.0 * v.powi(4))
        }
    }
}

/// Gaussian kernel density estimate with Scott's bandwidth, evaluated at `xs`.
pub fn gaussian_kde(samples: &[f64], xs: &[f64]) -> Option<Vec<f64>> {
    let var = variance(samples)?;
    if var <= 0.0 {
        return None;
    }
    let n = samples.len() as f64;
    let bw = var.sqrt() * n.powf(-0.2);
    let norm = 1.0 / (n * bw * (2.0 * std::f64::consts::PI).sqrt());
    Some(
        xs.iter()
            .map(|x| {
                samples
                    .iter()
                    .map(|s| (-0.5 * ((x - s) / bw).powi(2)).exp())
                    .sum::<f64>()
                    * norm
            })
            .collect(),
    )
}

/// LOESS smoother: local linear fit with tricube weights over the nearest
/// `span · n` neighbors of each x. Returns fitted values in input order.
pub fn loess(xs: &[f64], ys: &[f64], span: f64) -> Vec<f64> {
    let n = xs.len().min(ys.len());
    if n < 3 {
        return ys[..n].to_vec();
    }
    let k = ((span.clamp(0.0, 1.0) * n as f64).ceil() as usize).clamp(2, n);
    let mut out = Vec::with_capacity(n);
    let mut dist = vec![0.0; n];
    for i in 0..n {
        let x0 = xs[i];
        for j in 0..n {
            dist[j] = (xs[j] - x0).abs();
        }
        let mut sorted = dist.clone();
        sorted.sort_by(f64::total_cmp);
        let h = sorted[k - 1].max(f64::EPSILON);
        let (mut sw, mut swx, mut swy, mut swxx, mut swxy) = (0.0, 0.0, 0.0, 0.0, 0.0);
        for j in 0..n {
            let u = dist[j] / h;
            if u >= 1.0 {
                continue;
            }
            let w = (1.0 - u.powi(3)).powi(3);
            sw += w;
            swx += w * xs[j];
            swy += w * ys[j];
            swxx += w * xs[j] * xs[j];
            swxy += w * xs[j] * ys[j];
        }
        if sw <= 0.0 {
            out.push(ys[i]);
            continue;
        }
        let denom = sw * swxx - swx * swx;
        if denom.abs() < 1e-12 {
            out.push(swy / sw);
        } else {
            let slope = (sw * swxy - swx * swy) / denom;
            let intercept = (swy - slope * swx) / sw;
            out.push(intercept + slope * x0);
        }
    }
    out
}

/// `n` evenly spaced values over `[start, end]`.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => (0..n)
            .map(|i| {
                if i == n - 1 {
                    end
                } else {
                    start + (end - start) * i as f64 / (n - 1) as f64
                }
            })
            .collect(),
    }
}

/// `bins + 1` equal-width edges covering the finite data; a degenerate range
/// is widened by ±0.5. `None` without finite values.
pub fn bin_edges(vals: &[f64], bins: usize) -> Option<Vec<f64>> {
    let finite = || vals.iter().copied().filter(|v| v.is_finite());
    if bins == 0 || finite().next().is_none() {
        return None;
    }
    let lo = finite().fold(f64::INFINITY, f64::min);
    let hi = finite().fold(f64::NEG_INFINITY, f64::max);
    let (lo, hi) = if (hi - lo).abs() < f64::EPSILON {
        (lo - 0.5, hi + 0.5)
    } else {
        (lo, hi)
    };
    Some(linspace(lo, hi, bins + 1))
}

/// Count values per bin; the last bin is closed on the right. Values outside are ignored.
pub fn histogram_counts(vals: &[f64], edges: &[f64]) -> Vec<f64> {
    let bins = edges.len().saturating_sub(1);
    let mut counts = vec![0.0; bins];
    if bins == 0 {
        return counts;
    }
    let (lo, hi) = (edges[0], edges[bins]);
    for &v in vals {
        if !v.is_finite() || v < lo || v > hi {
            continue;
        }
        // partition_point gives the first edge strictly greater than v
        let idx = edges.partition_point(|e| *e <= v).saturating_sub(1).min(bins - 1);
        counts[idx] += 1.0;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantiles_interpolate_linearly() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&v, 0.5), Some(2.5));
        assert_eq!(quantile(&v, 0.25), Some(1.75));
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn t_quantiles_match_tables() {
        assert!((t_quantile_975(1) - 12.706).abs() < 1e-3);
        assert!((t_quantile_975(2) - 4.303).abs() < 1e-3);
        assert!((t_quantile_975(3) - 3.182).abs() < 5e-3);
        assert!((t_quantile_975(10) - 2.228).abs() < 1e-3);
        assert!((t_quantile_975(100) - 1.984).abs() < 1e-3);
    }

    #[test]
    fn last_bin_is_closed() {
        let vals = [0.0, 0.5, 1.0];
        let edges = bin_edges(&vals, 2).unwrap();
        assert_eq!(histogram_counts(&vals, &edges), vec![1.0, 2.0]);
    }

    #[test]
    fn bins_ignore_non_finite_values() {
        let vals = [1.0, 2.0, f64::INFINITY, f64::NAN];
        let edges = bin_edges(&vals, 2).unwrap();
        assert_eq!(edges, vec![1.0, 1.5, 2.0]);
        assert_eq!(histogram_counts(&vals, &edges), vec![1.0, 1.0]);
        assert_eq!(bin_edges(&[f64::INFINITY, f64::NEG_INFINITY], 4), None);
    }

    #[test]
    fn loess_keeps_straight_lines() {
        let xs: Vec<f64> = (0..20).map(f64::from).collect();
        let ys: Vec<f64> = xs.iter().map(|x| 3.0 * x - 1.0).collect();
        for (fit, y) in loess(&xs, &ys, 0.3).iter().zip(&ys) {
            assert!((fit - y).abs() < 1e-9);
        }
    }

    #[test]
    fn perfect_line_fits_exactly() {
        let pts: Vec<(f64, f64)> = (0..5).map(|i| (i as f64, 2.0 * i as f64 + 1.0)).collect();
        let fit = linregress(&pts).unwrap();
        assert!((fit.slope - 2.0).abs() < 1e-12);
        assert!((fit.intercept - 1.0).abs() < 1e-12);
        assert!((fit.r_squared() - 1.0).abs() < 1e-12);
    }
}

//! Deterministic demo datasets, one shape per plot family.

use chrono::{Duration, NaiveDate};

use crate::dataset::{Column, Dataset};
use crate::error::DatasetError;

const SEED: u64 = 0x5EED_2024;

/// Linear congruential generator; the same seed always yields the same data.
struct SimpleRng {
    state: u64,
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        Self {
            state: seed ^ 0x9E37_79B9_7F4A_7C15,
        }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        self.state
    }

    /// Uniform in `[0, 1)`.
    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    /// Standard normal via Box-Muller.
    fn normal(&mut self) -> f64 {
        let u1 = self.next_f64().max(f64::MIN_POSITIVE);
        let u2 = self.next_f64();
        (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
    }

    fn choose<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[(self.next_u64() >> 33) as usize % items.len()]
    }
}

fn random_walk(rng: &mut SimpleRng, n: usize) -> Vec<f64> {
    rng_values(rng, n, SimpleRng::normal)
        .into_iter()
        .scan(0.0, |acc, step| {
            *acc += step;
            Some(*acc)
        })
        .collect()
}

fn rng_values(rng: &mut SimpleRng, n: usize, f: fn(&mut SimpleRng) -> f64) -> Vec<f64> {
    (0..n).map(|_| f(rng)).collect()
}

/// Sample data shaped for `plot_type` (an id like `temporal.line` or a bare
/// name like `bar`). Bar data always has ten categories; other shapes have
/// `n` rows.
pub fn sample_dataset(plot_type: &str, n: usize) -> Result<Dataset, DatasetError> {
    let mut rng = SimpleRng::new(SEED);
    let kind = plot_type.to_ascii_lowercase();

    let columns = if kind.contains("line") || kind.contains("temporal") {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap_or_default();
        let dates = (0..n).map(|i| Some(start + Duration::days(i as i64))).collect();
        vec![
            Column::datetime("x", dates),
            Column::from_f64("y1", random_walk(&mut rng, n)),
            Column::from_f64("y2", random_walk(&mut rng, n)),
            Column::from_f64("y3", random_walk(&mut rng, n)),
        ]
    } else if kind.contains("scatter") {
        let x = rng_values(&mut rng, n, SimpleRng::normal);
        let y = rng_values(&mut rng, n, SimpleRng::normal);
        let size: Vec<f64> = (0..n).map(|_| rng.uniform(10.0, 100.0)).collect();
        let category: Vec<&str> = (0..n).map(|_| rng.choose(&["A", "B", "C"])).collect();
        vec![
            Column::from_f64("x", x),
            Column::from_f64("y", y),
            Column::from_f64("size", size),
            Column::from_strs("category", category),
        ]
    } else if kind.contains("bar") || kind.contains("categorical") {
        let categories: Vec<String> = (0..10).map(|i| format!("Category {i}")).collect();
        let mut values = || (0..10).map(|_| rng.uniform(10.0, 100.0)).collect::<Vec<_>>();
        let (v1, v2, v3) = (values(), values(), values());
        vec![
            Column::from_strs("category", categories),
            Column::from_f64("value1", v1),
            Column::from_f64("value2", v2),
            Column::from_f64("value3", v3),
        ]
    } else if kind.contains("histogram") {
        let values: Vec<f64> = (0..n).map(|_| rng.normal() * 10.0 + 50.0).collect();
        let group: Vec<&str> = (0..n).map(|_| rng.choose(&["Group A", "Group B"])).collect();
        vec![Column::from_f64("values", values), Column::from_strs("group", group)]
    } else {
        vec![
            Column::from_f64("x", (0..n).map(|i| i as f64)),
            Column::from_f64("y", rng_values(&mut rng, n, SimpleRng::normal)),
        ]
    };
    log::debug!("sample data for `{plot_type}`: {} column(s)", columns.len());
    Dataset::from_columns(columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::ColumnKind;

    #[test]
    fn samples_are_deterministic() {
        let a = sample_dataset("statistical.scatter", 50).unwrap();
        let b = sample_dataset("statistical.scatter", 50).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.row_count(), 50);
    }

    #[test]
    fn shapes_follow_plot_type() {
        let line = sample_dataset("temporal.line", 10).unwrap();
        assert_eq!(line.kind("x"), Some(ColumnKind::Datetime));
        let bar = sample_dataset("bar", 3).unwrap();
        assert_eq!(bar.row_count(), 10);
        let hist = sample_dataset("statistical.histogram", 20).unwrap();
        assert_eq!(hist.column_names(), ["values", "group"]);
    }
}

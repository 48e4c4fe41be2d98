//! Catalog of chart families keyed by `"<category>.<name>"`.
//!
//! Built-in families come from a static table; [`PlotRegistry::discover`]
//! registers them and can run any number of times without duplicating
//! entries. The process-wide instance is built once behind a `OnceLock`.

use std::sync::OnceLock;

use ahash::AHashMap;
use serde::Serialize;

use crate::config::PlotConfig;
use crate::dataset::Dataset;
use crate::plotter::{ChartType, ParamKind, Plotter};

/// Built-in families and the ids they are registered under.
const BUILTINS: &[(&str, &str, ChartType)] = &[
    ("temporal", "line", ChartType::Line),
    ("categorical", "bar", ChartType::Bar),
    ("statistical", "scatter", ChartType::Scatter),
    ("statistical", "histogram", ChartType::Histogram),
    ("statistical", "boxplot", ChartType::Box),
    ("statistical", "heatmap", ChartType::Heatmap),
];

/// An id that was already bound to a different family when discovery ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collision {
    pub id: String,
    pub existing: ChartType,
    pub rejected: ChartType,
}

/// Outcome of one [`PlotRegistry::discover`] run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryReport {
    pub registered: Vec<String>,
    /// Already present with the same family.
    pub skipped: Vec<String>,
    pub collisions: Vec<Collision>,
}

/// Descriptor as seen through the registry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlotInfo {
    pub id: String,
    pub name: String,
    pub category: String,
    pub description: String,
    pub required_columns: usize,
    pub supports_multiple_series: bool,
    pub required_params: Vec<(String, ParamKind)>,
    pub optional_params: Vec<(String, ParamKind)>,
}

#[derive(Debug, Clone, Default)]
pub struct PlotRegistry {
    plots: AHashMap<String, ChartType>,
    /// Insertion order of registrations, for stable listings.
    order: Vec<String>,
    categories: Vec<(String, Vec<String>)>,
}

static GLOBAL: OnceLock<PlotRegistry> = OnceLock::new();

impl PlotRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.discover();
        registry
    }

    /// Shared registry with the built-in families, created on first use.
    pub fn global() -> &'static PlotRegistry {
        GLOBAL.get_or_init(Self::with_builtins)
    }

    /// Register every built-in family whose id is still free.
    pub fn discover(&mut self) -> DiscoveryReport {
        let mut report = DiscoveryReport::default();
        for &(category, name, chart) in BUILTINS {
            let id = make_id(category, name);
            match self.plots.get(&id) {
                Some(&existing) if existing == chart => report.skipped.push(id),
                Some(&existing) => {
                    log::warn!(
                        "plot id `{id}` is bound to {}; not rebinding to {}",
                        existing.type_name(),
                        chart.type_name()
                    );
                    report.collisions.push(Collision {
                        id,
                        existing,
                        rejected: chart,
                    });
                }
                None => {
                    self.insert(category, id.clone(), chart);
                    report.registered.push(id);
                }
            }
        }
        log::debug!(
            "plot discovery: {} registered, {} already present, {} collision(s)",
            report.registered.len(),
            report.skipped.len(),
            report.collisions.len()
        );
        report
    }

    /// Register `chart` under `category` and return its id. `name` defaults to
    /// the lowercased type name without its `plotter` suffix. An existing
    /// binding for the same id is replaced.
    pub fn register(&mut self, category: &str, name: Option<&str>, chart: ChartType) -> String {
        let name = name.map(str::to_string).unwrap_or_else(|| default_name(chart.type_name()));
        let category = category.to_lowercase();
        let id = make_id(&category, &name);
        if self.plots.contains_key(&id) {
            self.plots.insert(id.clone(), chart);
        } else {
            self.insert(&category, id.clone(), chart);
        }
        id
    }

    fn insert(&mut self, category: &str, id: String, chart: ChartType) {
        self.plots.insert(id.clone(), chart);
        self.order.push(id.clone());
        match self.categories.iter_mut().find(|(c, _)| c == category) {
            Some((_, ids)) => ids.push(id),
            None => self.categories.push((category.to_string(), vec![id])),
        }
    }

    pub fn categories(&self) -> Vec<&str> {
        self.categories.iter().map(|(c, _)| c.as_str()).collect()
    }

    pub fn plots_in_category(&self, category: &str) -> &[String] {
        self.categories
            .iter()
            .find(|(c, _)| c == category)
            .map(|(_, ids)| ids.as_slice())
            .unwrap_or(&[])
    }

    /// Category `id` was registered under.
    pub fn category_of(&self, id: &str) -> Option<&str> {
        self.categories
            .iter()
            .find(|(_, ids)| ids.iter().any(|i| i == id))
            .map(|(c, _)| c.as_str())
    }

    pub fn all_plots(&self) -> Vec<(&str, ChartType)> {
        self.order
            .iter()
            .filter_map(|id| self.plots.get(id).map(|&c| (id.as_str(), c)))
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<ChartType> {
        self.plots.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.plots.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.plots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plots.is_empty()
    }

    /// Fresh plotter for `id` bound to `data` and `config`; `None` for unknown ids.
    pub fn create_plot<'a>(&self, id: &str, data: &'a Dataset, config: &'a PlotConfig) -> Option<Plotter<'a>> {
        let chart = self.get(id)?;
        Some(Plotter::new(data, config, chart.instantiate()))
    }

    pub fn plot_info(&self, id: &str) -> Option<PlotInfo> {
        let chart = self.get(id)?;
        let d = chart.descriptor();
        let category = self.category_of(id).unwrap_or(d.category);
        let params = |list: &[(&str, ParamKind)]| -> Vec<(String, ParamKind)> {
            list.iter().map(|(k, v)| (k.to_string(), *v)).collect()
        };
        Some(PlotInfo {
            id: id.to_string(),
            name: d.name.to_string(),
            category: category.to_string(),
            description: d.description.to_string(),
            required_columns: d.required_columns,
            supports_multiple_series: d.supports_multiple_series,
            required_params: params(d.required_params),
            optional_params: params(d.optional_params),
        })
    }
}

fn make_id(category: &str, name: &str) -> String {
    format!("{category}.{name}").to_lowercase()
}

/// `LinePlotter` → `line`, `BoxPlotter` → `box`.
fn default_name(type_name: &str) -> String {
    let lower = type_name.to_lowercase();
    lower.strip_suffix("plotter").unwrap_or(&lower).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_names_strip_suffix() {
        assert_eq!(default_name("LinePlotter"), "line");
        assert_eq!(default_name("BoxPlotter"), "box");
        assert_eq!(default_name("Custom"), "custom");
    }

    #[test]
    fn categories_keep_insertion_order() {
        let r = PlotRegistry::with_builtins();
        assert_eq!(r.categories(), ["temporal", "categorical", "statistical"]);
        assert_eq!(r.plots_in_category("statistical").len(), 4);
        assert!(r.plots_in_category("nope").is_empty());
    }

    #[test]
    fn info_reports_the_registered_category() {
        let mut r = PlotRegistry::new();
        let id = r.register("lab.results", Some("trend"), ChartType::Line);
        assert_eq!(id, "lab.results.trend");
        assert_eq!(r.categories(), ["lab.results"]);
        assert_eq!(r.category_of(&id), Some("lab.results"));
        assert_eq!(r.plot_info(&id).map(|i| i.category), Some("lab.results".to_string()));
    }
}

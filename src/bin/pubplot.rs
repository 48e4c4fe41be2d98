use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use pubplot::{ExportFormat, Exporter, Params, PlotConfig, PlotRegistry, StylePreset};
use pubplot::{palette, sample, stats, storage};

#[derive(Parser, Debug)]
#[command(
    name = "pubplot",
    version,
    about = "Turn CSV/JSON data into publication-quality charts"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List plot categories and the ids registered under them.
    List,
    /// Print a plot type's descriptor as JSON.
    Info {
        /// Plot id, e.g. statistical.scatter
        id: String,
    },
    /// List the named color palettes.
    Palettes,
    /// Write a sample dataset shaped for a plot type.
    Sample(SampleArgs),
    /// Print column types and summary statistics for a data file.
    Describe {
        /// CSV or JSON file
        #[arg(short, long)]
        data: PathBuf,
    },
    /// Render a chart from a data file.
    Plot(PlotArgs),
}

#[derive(Args, Debug)]
struct SampleArgs {
    /// Plot id or name (line, bar, scatter, histogram, ...)
    plot_type: String,
    /// Number of rows (bar samples always have ten categories).
    #[arg(long, default_value_t = 100)]
    rows: usize,
    /// Output file (.csv or .json).
    #[arg(long)]
    out: PathBuf,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum OutFormat {
    Png,
    Svg,
    Pdf,
}

impl From<OutFormat> for ExportFormat {
    fn from(f: OutFormat) -> Self {
        match f {
            OutFormat::Png => ExportFormat::Png,
            OutFormat::Svg => ExportFormat::Svg,
            OutFormat::Pdf => ExportFormat::Pdf,
        }
    }
}

#[derive(Args, Debug)]
struct PlotArgs {
    /// CSV or JSON file
    #[arg(short, long)]
    data: PathBuf,
    /// Plot id, e.g. temporal.line (see `pubplot list`)
    #[arg(short, long)]
    plot: String,
    /// Column/option parameter as key=value; lists are comma-separated. Repeatable.
    #[arg(long = "param", value_name = "KEY=VALUE")]
    params: Vec<String>,
    /// JSON file with a saved PlotConfig.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Journal style preset (ieee, nature, science, minimal).
    #[arg(long)]
    preset: Option<String>,
    /// Named color palette.
    #[arg(long)]
    palette: Option<String>,
    /// Theme (default, classic, ggplot, whitegrid, bmh).
    #[arg(long)]
    style: Option<String>,
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    xlabel: Option<String>,
    #[arg(long)]
    ylabel: Option<String>,
    #[arg(long, value_enum, default_value = "png")]
    format: OutFormat,
    /// Raster resolution; defaults to the configuration's dpi.
    #[arg(long)]
    dpi: Option<u32>,
    /// Leave the figure background transparent.
    #[arg(long, default_value_t = false)]
    transparent: bool,
    #[arg(long, default_value = pubplot::config::DEFAULT_EXPORT_DIR)]
    out_dir: PathBuf,
    /// File stem; defaults to the plot id with dots replaced.
    #[arg(long)]
    name: Option<String>,
}

fn fmt_opt(v: Option<f64>) -> String {
    match v {
        Some(x) if x.is_finite() => {
            let s = format!("{:.4}", x);
            s.trim_end_matches('0').trim_end_matches('.').to_string()
        }
        _ => "NA".to_string(),
    }
}

fn parse_pair(s: &str) -> Result<(&str, &str)> {
    s.split_once('=')
        .map(|(k, v)| (k.trim(), v.trim()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| anyhow::anyhow!("invalid --param `{s}`, expected KEY=VALUE"))
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.cmd {
        Command::List => cmd_list(),
        Command::Info { id } => cmd_info(&id),
        Command::Palettes => cmd_palettes(),
        Command::Sample(args) => cmd_sample(args),
        Command::Describe { data } => cmd_describe(&data),
        Command::Plot(args) => cmd_plot(args),
    }
}

fn cmd_list() -> Result<()> {
    let registry = PlotRegistry::global();
    for category in registry.categories() {
        println!("{category}");
        for id in registry.plots_in_category(category) {
            let name = registry.plot_info(id).map(|i| i.name).unwrap_or_default();
            println!("  {id:<24} {name}");
        }
    }
    Ok(())
}

fn cmd_info(id: &str) -> Result<()> {
    let info = PlotRegistry::global()
        .plot_info(id)
        .ok_or_else(|| anyhow::anyhow!("unknown plot type: {id}"))?;
    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}

fn cmd_palettes() -> Result<()> {
    for (group, names) in palette::palette_groups() {
        println!("{group}: {}", names.join(", "));
    }
    Ok(())
}

fn cmd_sample(args: SampleArgs) -> Result<()> {
    let data = sample::sample_dataset(&args.plot_type, args.rows)?;
    let ext = args
        .out
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("csv")
        .to_ascii_lowercase();
    match ext.as_str() {
        "csv" => storage::save_csv(&data, &args.out)?,
        "json" => storage::save_json(&data, &args.out)?,
        other => anyhow::bail!("unsupported format: {}", other),
    }
    eprintln!("Saved {} rows to {}", data.row_count(), args.out.display());
    Ok(())
}

fn cmd_describe(path: &Path) -> Result<()> {
    let data = storage::load_file(path).with_context(|| format!("loading {}", path.display()))?;
    println!("{} rows, {} columns", data.row_count(), data.column_count());
    for info in data.column_info() {
        println!(
            "{:<20} {:<12} unique={} nulls={}",
            info.name,
            format!("{:?}", info.dtype).to_lowercase(),
            info.nunique,
            info.null_count
        );
    }
    let summaries = stats::column_summary(&data);
    if !summaries.is_empty() {
        println!();
    }
    for s in summaries {
        println!(
            "{}  count={} missing={}  min={} max={} mean={} median={}",
            s.column,
            s.count,
            s.missing,
            fmt_opt(s.min),
            fmt_opt(s.max),
            fmt_opt(s.mean),
            fmt_opt(s.median)
        );
    }
    Ok(())
}

fn cmd_plot(args: PlotArgs) -> Result<()> {
    let data = storage::load_file(&args.data).with_context(|| format!("loading {}", args.data.display()))?;

    let mut config = match &args.config {
        Some(p) => PlotConfig::from_json_file(p)?,
        None => PlotConfig::default(),
    };
    if let Some(preset) = &args.preset {
        let preset: StylePreset = preset.parse().map_err(anyhow::Error::msg)?;
        config.apply_preset(preset);
    }
    if let Some(name) = &args.palette {
        if palette::palette_colors(name).is_none() {
            anyhow::bail!("unknown palette: {name}");
        }
        config.use_palette(name, None);
    }
    if let Some(style) = args.style {
        if pubplot::figure::Theme::named(&style).is_none() {
            anyhow::bail!("unknown style: {style}");
        }
        config.style = style;
    }
    if let Some(t) = args.title {
        config.title = t;
    }
    if let Some(x) = args.xlabel {
        config.xlabel = x;
    }
    if let Some(y) = args.ylabel {
        config.ylabel = y;
    }

    let registry = PlotRegistry::global();
    let mut plotter = registry
        .create_plot(&args.plot, &data, &config)
        .ok_or_else(|| anyhow::anyhow!("unknown plot type: {} (see `pubplot list`)", args.plot))?;

    let pairs = args.params.iter().map(|p| parse_pair(p)).collect::<Result<Vec<_>>>()?;
    let schema: Vec<_> = plotter
        .required_params()
        .iter()
        .chain(plotter.optional_params())
        .copied()
        .collect();
    let params = Params::from_pairs(pairs, &schema).map_err(anyhow::Error::msg)?;
    // Without column params the chart picks its own defaults.
    if plotter.required_params().iter().any(|(k, _)| params.contains(k)) {
        plotter.set_columns(&params)?;
    }
    plotter.set_options(&params)?;
    let artifact = plotter.plot()?;

    let format = ExportFormat::from(args.format);
    let stem = args.name.unwrap_or_else(|| args.plot.replace('.', "_"));
    let dpi = args.dpi.unwrap_or(config.dpi);
    let path = Exporter::new(&args.out_dir).export(&artifact, &stem, format, dpi, args.transparent)?;
    eprintln!("Wrote plot to {}", path.display());
    Ok(())
}

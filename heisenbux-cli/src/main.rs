//! Heisenbux CLI — fetch a ticker's daily prices, cache them, chart the close.
//!
//! Usage: `heisenbux <TICKER> [--no-show-plot] [--force-download] [--config <PATH>]`
//!
//! Data is cached under `cache/<TICKER>.csv` and charts are written to
//! `graphs/<TICKER>_plot.png`, both relative to the working directory unless a
//! config file says otherwise.

use anyhow::Result;
use clap::Parser;
use heisenbux_chart::{ChartRenderer, PlottersRenderer};
use heisenbux_core::data::{TickerDataStore, YahooProvider};
use heisenbux_core::HeisenbuxConfig;
use log::debug;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(
    name = "heisenbux",
    version,
    about = "Fetch daily price data for a stock ticker, cache it as CSV and chart the close"
)]
struct Cli {
    /// The stock ticker symbol (e.g. AAPL, GOOGL).
    ticker: String,

    /// Render the closing-price chart (default).
    #[arg(long, overrides_with = "no_show_plot")]
    show_plot: bool,

    /// Skip the chart.
    #[arg(long, overrides_with = "show_plot")]
    no_show_plot: bool,

    /// Download fresh data even if a cached copy exists.
    #[arg(long, overrides_with = "no_force_download")]
    force_download: bool,

    /// Use cached data when present (default).
    #[arg(long, overrides_with = "force_download")]
    no_force_download: bool,

    /// TOML file overriding cache/graphs directories, lookback and chart style.
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Cli {
    fn show_plot(&self) -> bool {
        !self.no_show_plot
    }

    fn force_download(&self) -> bool {
        self.force_download
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_target(false)
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();
    debug!("Command line input recorded: {cli:?}");

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => HeisenbuxConfig::from_file(path)?,
        None => HeisenbuxConfig::default(),
    };

    let provider = YahooProvider::new()?;
    let store = TickerDataStore::new(&provider, &config);
    let renderer = PlottersRenderer::new(&config);

    execute(cli, &store, &renderer)
}

/// Fetch (or load) the series, then chart it unless the plot is disabled.
fn execute(cli: &Cli, store: &TickerDataStore<'_>, renderer: &dyn ChartRenderer) -> Result<()> {
    let series = store.fetch(&cli.ticker, cli.force_download())?;
    debug!(
        "{} bars for {} ({} to {})",
        series.len(),
        cli.ticker,
        series.first().date,
        series.last().date
    );

    if cli.show_plot() {
        renderer.render(&series, &cli.ticker)?;
    }

    Ok(())
}

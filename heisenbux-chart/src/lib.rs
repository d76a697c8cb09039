//! Heisenbux Chart — closing-price line chart for a price series.
//!
//! The renderer is a pure consumer of `PriceSeries`: it never feeds anything
//! back into the store.
//!
//! Text is rasterised with plotters' pure-Rust `ab_glyph` backend from a font
//! embedded in the binary, so no system font lookup happens at runtime.

use chrono::{Duration, NaiveDate};
use heisenbux_core::{ChartConfig, HeisenbuxConfig, PriceSeries};
use log::info;
use plotters::prelude::*;
use plotters::style::register_font;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;

pub const PLOT_SUFFIX: &str = "_plot.png";

const FONT_FAMILY: &str = "sans-serif";
const FONT_BYTES: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");

/// Register the embedded font under `FONT_FAMILY`. Runs once per process.
fn register_fonts() -> Result<(), String> {
    static REGISTERED: OnceLock<Result<(), String>> = OnceLock::new();
    REGISTERED
        .get_or_init(|| {
            register_font(FONT_FAMILY, FontStyle::Normal, FONT_BYTES)
                .map_err(|_| "invalid embedded font".to_string())
        })
        .clone()
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to create chart directory {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to draw chart {}: {message}", path.display())]
    Draw { path: PathBuf, message: String },
}

/// Something that turns a price series into a chart file.
pub trait ChartRenderer {
    /// Render `series` for `ticker` and return the path written.
    fn render(&self, series: &PriceSeries, ticker: &str) -> Result<PathBuf, RenderError>;
}

/// PNG line chart of closing prices, drawn with plotters.
#[derive(Debug, Clone)]
pub struct PlottersRenderer {
    graphs_dir: PathBuf,
    chart: ChartConfig,
}

impl PlottersRenderer {
    pub fn new(config: &HeisenbuxConfig) -> Self {
        Self {
            graphs_dir: config.graphs_dir.clone(),
            chart: config.chart.clone(),
        }
    }

    /// `{graphs_dir}/{TICKER}_plot.png`
    pub fn plot_path(&self, ticker: &str) -> PathBuf {
        self.graphs_dir
            .join(format!("{}{PLOT_SUFFIX}", ticker.to_uppercase()))
    }

    fn draw(&self, series: &PriceSeries, ticker: &str, path: &Path) -> Result<(), String> {
        register_fonts()?;

        let root = BitMapBackend::new(path, self.chart.pixel_size()).into_drawing_area();
        root.fill(&WHITE).map_err(|e| e.to_string())?;

        let (x_range, y_range) = axis_ranges(series);
        let title = self.chart.title(ticker);

        let mut chart = ChartBuilder::on(&root)
            .caption(&title, (FONT_FAMILY, 24))
            .margin(20)
            .x_label_area_size(90)
            .y_label_area_size(70)
            .build_cartesian_2d(x_range, y_range)
            .map_err(|e| e.to_string())?;

        let label_font = if self.chart.rotate_x_labels {
            (FONT_FAMILY, 12).into_font().transform(FontTransform::Rotate90)
        } else {
            (FONT_FAMILY, 12).into_font()
        };

        chart
            .configure_mesh()
            .x_desc(&self.chart.x_axis_label)
            .y_desc(&self.chart.y_axis_label)
            .x_labels(12)
            .x_label_formatter(&|d: &NaiveDate| d.format("%Y-%m-%d").to_string())
            .x_label_style(label_font)
            .y_label_formatter(&|p: &f64| format!("{p:.2}"))
            .draw()
            .map_err(|e| e.to_string())?;

        chart
            .draw_series(LineSeries::new(series.closes(), BLUE.stroke_width(2)))
            .map_err(|e| e.to_string())?
            .label(&self.chart.series_label)
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE.stroke_width(2)));

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(WHITE.mix(0.8))
            .border_style(&BLACK)
            .label_font((FONT_FAMILY, 14))
            .draw()
            .map_err(|e| e.to_string())?;

        root.present().map_err(|e| e.to_string())?;
        Ok(())
    }
}

impl ChartRenderer for PlottersRenderer {
    fn render(&self, series: &PriceSeries, ticker: &str) -> Result<PathBuf, RenderError> {
        fs::create_dir_all(&self.graphs_dir).map_err(|source| RenderError::Io {
            path: self.graphs_dir.clone(),
            source,
        })?;

        let path = self.plot_path(ticker);
        self.draw(series, ticker, &path)
            .map_err(|message| RenderError::Draw {
                path: path.clone(),
                message,
            })?;

        info!("Plot saved to {}", path.display());
        Ok(path)
    }
}

/// Date and price ranges with a little headroom so the line never sits on
/// the frame. A single-bar series still gets a non-empty range on both axes.
fn axis_ranges(series: &PriceSeries) -> (std::ops::Range<NaiveDate>, std::ops::Range<f64>) {
    let (first, mut last) = series.date_range();
    if last == first {
        last = first + Duration::days(1);
    }

    let (lo, hi) = series
        .closes()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (_, c)| {
            (lo.min(c), hi.max(c))
        });
    let pad = if hi > lo { (hi - lo) * 0.05 } else { lo.abs().max(1.0) * 0.05 };

    (first..last, (lo - pad)..(hi + pad))
}

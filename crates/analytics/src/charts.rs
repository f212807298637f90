//! SVG sentiment charts rendered through embedded tera templates.
//!
//! Line and stacked-bar charts plot per-month counts of each sentiment. Pie and
//! simple-bar charts plot the totals for the whole range.

use std::f64::consts::{FRAC_PI_2, PI};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use reviewlens_core::config::OutputConfig;
use reviewlens_core::domain::{DateRange, ReviewCollection, Sentiment, SentimentCounts};
use reviewlens_core::errors::DomainError;
use serde::Serialize;
use tera::{Context, Tera};

pub const INVALID_CHART_TYPE_MESSAGE: &str =
    "Invalid chart type specified. Please choose from 'pie', 'line', 'stacked_bar', or 'simple_bar'.";

const WIDTH: f64 = 800.0;
const HEIGHT: f64 = 480.0;
const PLOT_LEFT: f64 = 70.0;
const PLOT_RIGHT: f64 = 650.0;
const PLOT_TOP: f64 = 70.0;
const PLOT_BOTTOM: f64 = 390.0;
const Y_TICKS: usize = 5;
const MAX_X_LABELS: usize = 12;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChartKind {
    Line,
    Pie,
    StackedBar,
    SimpleBar,
}

impl ChartKind {
    pub const ALL: [ChartKind; 4] =
        [ChartKind::Line, ChartKind::Pie, ChartKind::StackedBar, ChartKind::SimpleBar];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Line => "line",
            Self::Pie => "pie",
            Self::StackedBar => "stacked_bar",
            Self::SimpleBar => "simple_bar",
        }
    }

    fn title(&self) -> &'static str {
        match self {
            Self::Line => "Sentiment Trends Over Time (Line Chart)",
            Self::Pie => "Overall Sentiment Distribution",
            Self::StackedBar => "Sentiment Trends Over Time (Stacked Bar Chart)",
            Self::SimpleBar => "Total Sentiment Count",
        }
    }

    fn template(&self) -> &'static str {
        match self {
            Self::Line => "line.svg",
            Self::Pie => "pie.svg",
            Self::StackedBar | Self::SimpleBar => "bars.svg",
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartKind {
    type Err = DomainError;

    /// Accepts `line`, `pie`, `stacked_bar`, `simple_bar` with spaces or
    /// hyphens in place of underscores and an optional `chart` suffix.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        let normalized = normalized.strip_suffix("_chart").unwrap_or(&normalized);
        match normalized {
            "line" => Ok(Self::Line),
            "pie" => Ok(Self::Pie),
            "stacked_bar" => Ok(Self::StackedBar),
            "simple_bar" => Ok(Self::SimpleBar),
            _ => Err(DomainError::InvalidInput(INVALID_CHART_TYPE_MESSAGE.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ChartError {
    #[error("chart template error: {0}")]
    Template(String),
    #[error("could not write chart `{path}`: {source}")]
    Io { path: PathBuf, source: std::io::Error },
}

pub struct ChartRenderer {
    tera: Tera,
    output_dir: PathBuf,
    file_names: [String; 4],
}

impl ChartRenderer {
    pub fn new(output: &OutputConfig) -> Result<Self, ChartError> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![".svg"]);
        tera.add_raw_templates(vec![
            ("base.svg", include_str!("../../../templates/charts/base.svg.tera")),
            ("line.svg", include_str!("../../../templates/charts/line.svg.tera")),
            ("bars.svg", include_str!("../../../templates/charts/bars.svg.tera")),
            ("pie.svg", include_str!("../../../templates/charts/pie.svg.tera")),
        ])
        .map_err(|error| ChartError::Template(error.to_string()))?;

        Ok(Self {
            tera,
            output_dir: output.directory.clone(),
            file_names: [
                output.line_chart.clone(),
                output.pie_chart.clone(),
                output.stacked_bar_chart.clone(),
                output.simple_bar_chart.clone(),
            ],
        })
    }

    /// Where `render` writes charts of `kind`.
    pub fn default_path(&self, kind: ChartKind) -> PathBuf {
        let index = match kind {
            ChartKind::Line => 0,
            ChartKind::Pie => 1,
            ChartKind::StackedBar => 2,
            ChartKind::SimpleBar => 3,
        };
        self.output_dir.join(&self.file_names[index])
    }

    pub async fn render(
        &self,
        kind: ChartKind,
        reviews: &ReviewCollection,
        range: DateRange,
    ) -> Result<PathBuf, ChartError> {
        let path = self.default_path(kind);
        self.render_to(kind, reviews, range, &path).await
    }

    pub async fn render_to(
        &self,
        kind: ChartKind,
        reviews: &ReviewCollection,
        range: DateRange,
        path: &Path,
    ) -> Result<PathBuf, ChartError> {
        let svg = self.render_svg(kind, reviews, range)?;

        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| ChartError::Io { path: parent.to_path_buf(), source })?;
        }
        tokio::fs::write(path, svg)
            .await
            .map_err(|source| ChartError::Io { path: path.to_path_buf(), source })?;

        tracing::info!(
            event_name = "chart.rendered",
            kind = %kind,
            reviews = reviews.len(),
            path = %path.display(),
            "chart written"
        );
        Ok(path.to_path_buf())
    }

    pub fn render_svg(
        &self,
        kind: ChartKind,
        reviews: &ReviewCollection,
        range: DateRange,
    ) -> Result<String, ChartError> {
        let view = ChartView::build(kind, reviews, range);
        let context = Context::from_serialize(&view)
            .map_err(|error| ChartError::Template(error.to_string()))?;
        self.tera
            .render(kind.template(), &context)
            .map_err(|error| ChartError::Template(error.to_string()))
    }
}

fn color(sentiment: Sentiment) -> &'static str {
    match sentiment {
        Sentiment::Positive => "#2e7d32",
        Sentiment::Negative => "#c62828",
        Sentiment::Neutral => "#9e9e9e",
    }
}

fn px(value: f64) -> String {
    format!("{value:.1}")
}

#[derive(Debug, Serialize)]
struct ChartView {
    title: &'static str,
    subtitle: String,
    width: String,
    height: String,
    center_x: String,
    center_y: String,
    empty: bool,
    axes: bool,
    plot: PlotArea,
    x_title: &'static str,
    x_title_y: String,
    y_title: &'static str,
    y_ticks: Vec<Tick>,
    x_ticks: Vec<Tick>,
    legend: Vec<LegendEntry>,
    series: Vec<Series>,
    bars: Vec<Bar>,
    slices: Vec<Slice>,
}

#[derive(Debug, Serialize)]
struct PlotArea {
    left: String,
    right: String,
    top: String,
    bottom: String,
    mid_x: String,
    mid_y: String,
}

#[derive(Debug, Serialize)]
struct Tick {
    x: String,
    y: String,
    label: String,
}

#[derive(Debug, Serialize)]
struct LegendEntry {
    label: &'static str,
    color: &'static str,
    x: String,
    y: String,
    text_x: String,
    text_y: String,
}

#[derive(Debug, Serialize)]
struct Series {
    color: &'static str,
    points: String,
    markers: Vec<Point>,
}

#[derive(Debug, Serialize)]
struct Point {
    x: String,
    y: String,
}

#[derive(Debug, Serialize)]
struct Bar {
    x: String,
    y: String,
    width: String,
    height: String,
    color: &'static str,
    label: String,
    label_x: String,
    label_y: String,
}

#[derive(Debug, Serialize)]
struct Slice {
    path: String,
    color: &'static str,
    label: String,
    label_x: String,
    label_y: String,
}

/// Vertical scale with `Y_TICKS` evenly spaced integer steps.
struct YScale {
    top_value: usize,
    step: usize,
}

impl YScale {
    fn for_max(max_value: usize) -> Self {
        let step = max_value.max(1).div_ceil(Y_TICKS).max(1);
        Self { top_value: step * Y_TICKS, step }
    }

    fn y(&self, value: usize) -> f64 {
        PLOT_BOTTOM - (value as f64 / self.top_value as f64) * (PLOT_BOTTOM - PLOT_TOP)
    }

    fn ticks(&self) -> Vec<Tick> {
        (0..=Y_TICKS)
            .map(|index| {
                let value = index * self.step;
                Tick { x: px(PLOT_LEFT - 8.0), y: px(self.y(value)), label: value.to_string() }
            })
            .collect()
    }
}

impl ChartView {
    fn build(kind: ChartKind, reviews: &ReviewCollection, range: DateRange) -> Self {
        let (x_title, axes) = match kind {
            ChartKind::Line | ChartKind::StackedBar => ("Month", true),
            ChartKind::SimpleBar => ("Sentiment", true),
            ChartKind::Pie => ("", false),
        };

        let mut view = Self {
            title: kind.title(),
            subtitle: range.to_string(),
            width: px(WIDTH),
            height: px(HEIGHT),
            center_x: px(WIDTH / 2.0),
            center_y: px(HEIGHT / 2.0),
            empty: reviews.is_empty(),
            axes,
            plot: PlotArea {
                left: px(PLOT_LEFT),
                right: px(PLOT_RIGHT),
                top: px(PLOT_TOP),
                bottom: px(PLOT_BOTTOM),
                mid_x: px((PLOT_LEFT + PLOT_RIGHT) / 2.0),
                mid_y: px((PLOT_TOP + PLOT_BOTTOM) / 2.0),
            },
            x_title,
            x_title_y: px(HEIGHT - 12.0),
            y_title: "Number of Reviews",
            y_ticks: Vec::new(),
            x_ticks: Vec::new(),
            legend: legend(),
            series: Vec::new(),
            bars: Vec::new(),
            slices: Vec::new(),
        };

        match kind {
            ChartKind::Line => view.fill_line(reviews),
            ChartKind::StackedBar => view.fill_stacked_bars(reviews),
            ChartKind::SimpleBar => view.fill_simple_bars(&reviews.sentiment_counts()),
            ChartKind::Pie => view.fill_pie(&reviews.sentiment_counts()),
        }
        view
    }

    fn fill_line(&mut self, reviews: &ReviewCollection) {
        let months = reviews.monthly_counts().into_iter().collect::<Vec<_>>();
        let max = months
            .iter()
            .flat_map(|(_, counts)| Sentiment::ALL.map(|sentiment| counts.get(sentiment)))
            .max()
            .unwrap_or(0);
        let scale = YScale::for_max(max);
        self.y_ticks = scale.ticks();

        let slot = slot_width(months.len());
        self.x_ticks = month_ticks(months.iter().map(|(month, _)| *month), slot);

        if months.is_empty() {
            return;
        }
        for sentiment in Sentiment::ALL {
            let markers = months
                .iter()
                .enumerate()
                .map(|(index, (_, counts))| Point {
                    x: px(slot_center(index, slot)),
                    y: px(scale.y(counts.get(sentiment))),
                })
                .collect::<Vec<_>>();
            let points = markers
                .iter()
                .map(|point| format!("{},{}", point.x, point.y))
                .collect::<Vec<_>>()
                .join(" ");
            self.series.push(Series { color: color(sentiment), points, markers });
        }
    }

    fn fill_stacked_bars(&mut self, reviews: &ReviewCollection) {
        let months = reviews.monthly_counts().into_iter().collect::<Vec<_>>();
        let max = months.iter().map(|(_, counts)| counts.total()).max().unwrap_or(0);
        let scale = YScale::for_max(max);
        self.y_ticks = scale.ticks();

        let slot = slot_width(months.len());
        self.x_ticks = month_ticks(months.iter().map(|(month, _)| *month), slot);

        for (index, (_, counts)) in months.iter().enumerate() {
            let x = PLOT_LEFT + slot * index as f64 + slot * 0.2;
            let mut running = 0;
            for sentiment in Sentiment::ALL {
                let count = counts.get(sentiment);
                if count == 0 {
                    continue;
                }
                let bottom = scale.y(running);
                running += count;
                let top = scale.y(running);
                self.bars.push(Bar {
                    x: px(x),
                    y: px(top),
                    width: px(slot * 0.6),
                    height: px(bottom - top),
                    color: color(sentiment),
                    label: String::new(),
                    label_x: String::new(),
                    label_y: String::new(),
                });
            }
        }
    }

    fn fill_simple_bars(&mut self, counts: &SentimentCounts) {
        let max = Sentiment::ALL.iter().map(|sentiment| counts.get(*sentiment)).max().unwrap_or(0);
        let scale = YScale::for_max(max);
        self.y_ticks = scale.ticks();

        let slot = slot_width(Sentiment::ALL.len());
        for (index, sentiment) in Sentiment::ALL.into_iter().enumerate() {
            let count = counts.get(sentiment);
            let top = scale.y(count);
            let center = slot_center(index, slot);
            self.x_ticks.push(Tick {
                x: px(center),
                y: px(PLOT_BOTTOM + 18.0),
                label: sentiment.as_str().to_string(),
            });
            self.bars.push(Bar {
                x: px(center - slot * 0.3),
                y: px(top),
                width: px(slot * 0.6),
                height: px(PLOT_BOTTOM - top),
                color: color(sentiment),
                label: count.to_string(),
                label_x: px(center),
                label_y: px(top - 6.0),
            });
        }
    }

    fn fill_pie(&mut self, counts: &SentimentCounts) {
        let total = counts.total();
        if total == 0 {
            return;
        }

        let (cx, cy, radius) = (WIDTH / 2.0 - 60.0, HEIGHT / 2.0 + 20.0, 160.0);
        let mut start = -FRAC_PI_2;
        for sentiment in Sentiment::ALL {
            let count = counts.get(sentiment);
            if count == 0 {
                continue;
            }
            let sweep = count as f64 / total as f64 * 2.0 * PI;
            let end = start + sweep;
            let path = if count == total {
                format!(
                    "M {} {} A {r} {r} 0 1 1 {} {} A {r} {r} 0 1 1 {} {} Z",
                    px(cx - radius),
                    px(cy),
                    px(cx + radius),
                    px(cy),
                    px(cx - radius),
                    px(cy),
                    r = px(radius),
                )
            } else {
                let large_arc = u8::from(sweep > PI);
                format!(
                    "M {} {} L {} {} A {r} {r} 0 {large_arc} 1 {} {} Z",
                    px(cx),
                    px(cy),
                    px(cx + radius * start.cos()),
                    px(cy + radius * start.sin()),
                    px(cx + radius * end.cos()),
                    px(cy + radius * end.sin()),
                    r = px(radius),
                )
            };
            let middle = start + sweep / 2.0;
            let label_radius = if count == total { 0.0 } else { radius * 0.62 };
            self.slices.push(Slice {
                path,
                color: color(sentiment),
                label: format!("{:.1}%", counts.percentage(sentiment)),
                label_x: px(cx + label_radius * middle.cos()),
                label_y: px(cy + label_radius * middle.sin()),
            });
            start = end;
        }
    }
}

fn legend() -> Vec<LegendEntry> {
    let x = PLOT_RIGHT + 30.0;
    Sentiment::ALL
        .into_iter()
        .enumerate()
        .map(|(index, sentiment)| {
            let y = PLOT_TOP + index as f64 * 24.0;
            LegendEntry {
                label: sentiment.as_str(),
                color: color(sentiment),
                x: px(x),
                y: px(y),
                text_x: px(x + 18.0),
                text_y: px(y + 10.0),
            }
        })
        .collect()
}

fn slot_width(slots: usize) -> f64 {
    (PLOT_RIGHT - PLOT_LEFT) / slots.max(1) as f64
}

fn slot_center(index: usize, slot: f64) -> f64 {
    PLOT_LEFT + slot * (index as f64 + 0.5)
}

fn month_ticks(months: impl Iterator<Item = chrono::NaiveDate>, slot: f64) -> Vec<Tick> {
    let months = months.collect::<Vec<_>>();
    let every = months.len().div_ceil(MAX_X_LABELS).max(1);
    months
        .iter()
        .enumerate()
        .filter(|(index, _)| index % every == 0)
        .map(|(index, month)| Tick {
            x: px(slot_center(index, slot)),
            y: px(PLOT_BOTTOM + 14.0),
            label: month.format("%b %Y").to_string(),
        })
        .collect()
}

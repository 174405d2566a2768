//! SVG comparison plots for confirmed regressions
//!
//! Overlays the normalized regression day (red) on the normalized reference day
//! (blue) across the metric's bucket labels.

use chrono::NaiveDate;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::regression::{normalize, Regression};

const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 30.0;
const MARGIN_TOP: f64 = 50.0;
const MARGIN_BOTTOM: f64 = 100.0;
const PLOT_HEIGHT: f64 = 400.0;
const MIN_PLOT_WIDTH: f64 = 600.0;
const BUCKET_SPACING: f64 = 25.0;

/// Errors that can occur rendering or writing a plot
#[derive(Error, Debug)]
pub enum PlotError {
    #[error("Nothing to plot for {0}: histogram has no buckets")]
    Empty(String),

    #[error("Failed to write plot {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// A regression/reference overlay ready to render
#[derive(Debug, Clone)]
pub struct ComparisonPlot {
    pub metric: String,
    pub date: NaiveDate,
    pub labels: Vec<String>,
    pub regression: Vec<f64>,
    pub reference: Vec<f64>,
}

impl ComparisonPlot {
    pub fn from_regression(regression: &Regression) -> Self {
        let len = regression.pair.regression.counts.len();
        let labels = (0..len)
            .map(|i| match regression.buckets.get(i) {
                Some(serde_json::Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => i.to_string(),
            })
            .collect();

        Self {
            metric: regression.metric.clone(),
            date: regression.date,
            labels,
            regression: normalize(&regression.pair.regression.counts),
            reference: normalize(&regression.pair.reference.counts),
        }
    }

    /// `plot-<metric>-<DD-MM-YYYY>.svg`
    pub fn file_name(&self) -> String {
        format!("plot-{}-{}.svg", self.metric, self.date.format("%d-%m-%Y"))
    }

    fn escape_xml(text: &str) -> String {
        text.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
            .replace('\'', "&#39;")
    }

    fn plot_width(&self) -> f64 {
        (self.labels.len() as f64 * BUCKET_SPACING).max(MIN_PLOT_WIDTH)
    }

    fn x(&self, i: usize) -> f64 {
        let n = self.labels.len();
        if n <= 1 {
            return MARGIN_LEFT + self.plot_width() / 2.0;
        }
        MARGIN_LEFT + self.plot_width() * i as f64 / (n - 1) as f64
    }

    fn y(value: f64, y_max: f64) -> f64 {
        MARGIN_TOP + PLOT_HEIGHT * (1.0 - value / y_max)
    }

    fn polyline(&self, values: &[f64], y_max: f64, color: &str) -> String {
        let points: Vec<String> = values
            .iter()
            .enumerate()
            .map(|(i, &v)| format!("{:.1},{:.1}", self.x(i), Self::y(v, y_max)))
            .collect();
        format!(
            r#"<polyline fill="none" stroke="{}" stroke-width="2" points="{}"/>"#,
            color,
            points.join(" ")
        )
    }

    /// Render the complete SVG document
    pub fn to_svg(&self) -> String {
        let plot_width = self.plot_width();
        let width = MARGIN_LEFT + plot_width + MARGIN_RIGHT;
        let height = MARGIN_TOP + PLOT_HEIGHT + MARGIN_BOTTOM;
        let y_max = self
            .regression
            .iter()
            .chain(&self.reference)
            .fold(0.0_f64, |acc, &v| acc.max(v));
        let y_max = if y_max > 0.0 { y_max } else { 1.0 };
        let bottom = MARGIN_TOP + PLOT_HEIGHT;

        let mut svg = String::new();
        let _ = writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{:.0}" height="{:.0}" font-family="sans-serif" font-size="12">"#,
            width, height
        );
        svg.push_str(r#"<rect width="100%" height="100%" fill="white"/>"#);
        svg.push('\n');
        let _ = writeln!(
            svg,
            r#"<text x="{:.1}" y="25" text-anchor="middle" font-size="16">{}</text>"#,
            width / 2.0,
            Self::escape_xml(&self.metric)
        );

        // Axes
        let _ = writeln!(
            svg,
            r#"<line x1="{l:.1}" y1="{t:.1}" x2="{l:.1}" y2="{b:.1}" stroke="black"/><line x1="{l:.1}" y1="{b:.1}" x2="{r:.1}" y2="{b:.1}" stroke="black"/>"#,
            l = MARGIN_LEFT,
            t = MARGIN_TOP,
            b = bottom,
            r = MARGIN_LEFT + plot_width
        );
        let _ = writeln!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" text-anchor="middle">Bin</text>"#,
            MARGIN_LEFT + plot_width / 2.0,
            height - 10.0
        );
        let _ = writeln!(
            svg,
            r#"<text x="20" y="{:.1}" text-anchor="middle" transform="rotate(-90 20 {:.1})">Normalized Weight</text>"#,
            MARGIN_TOP + PLOT_HEIGHT / 2.0,
            MARGIN_TOP + PLOT_HEIGHT / 2.0
        );
        for fraction in [0.0, 0.5, 1.0] {
            let _ = writeln!(
                svg,
                r#"<text x="{:.1}" y="{:.1}" text-anchor="end">{:.3}</text>"#,
                MARGIN_LEFT - 5.0,
                Self::y(y_max * fraction, y_max) + 4.0,
                y_max * fraction
            );
        }

        // Bucket labels, rotated
        for (i, label) in self.labels.iter().enumerate() {
            let x = self.x(i);
            let y = bottom + 15.0;
            let _ = writeln!(
                svg,
                r#"<text x="{x:.1}" y="{y:.1}" text-anchor="end" transform="rotate(-45 {x:.1} {y:.1})">{}</text>"#,
                Self::escape_xml(label)
            );
        }

        let _ = writeln!(svg, "{}", self.polyline(&self.reference, y_max, "blue"));
        let _ = writeln!(svg, "{}", self.polyline(&self.regression, y_max, "red"));

        // Legend
        let legend_x = MARGIN_LEFT + plot_width - 120.0;
        for (row, (name, color)) in [("Regression", "red"), ("Reference", "blue")]
            .iter()
            .enumerate()
        {
            let y = MARGIN_TOP + 15.0 + row as f64 * 18.0;
            let _ = writeln!(
                svg,
                r#"<line x1="{:.1}" y1="{y:.1}" x2="{:.1}" y2="{y:.1}" stroke="{color}" stroke-width="2"/><text x="{:.1}" y="{:.1}">{name}</text>"#,
                legend_x,
                legend_x + 25.0,
                legend_x + 32.0,
                y + 4.0
            );
        }

        svg.push_str("</svg>\n");
        svg
    }

    /// Write the SVG into `dir`, returning the file path
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, PlotError> {
        if self.labels.is_empty() {
            return Err(PlotError::Empty(self.metric.clone()));
        }

        let path = dir.join(self.file_name());
        let io_error = |source: std::io::Error| PlotError::Io {
            path: path.display().to_string(),
            source,
        };

        std::fs::create_dir_all(dir).map_err(io_error)?;
        std::fs::write(&path, self.to_svg()).map_err(io_error)?;
        Ok(path)
    }
}

/// Render and save the comparison plot for one regression
pub fn plot_regression(regression: &Regression, dir: &Path) -> Result<PathBuf, PlotError> {
    ComparisonPlot::from_regression(regression).write_to(dir)
}

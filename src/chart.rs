use std::{
    collections::BTreeMap,
    ops::Range,
    path::{Path, PathBuf},
};

use log::debug;
use plotters::{
    coord::ranged1d::SegmentValue,
    style::{
        colors::colormaps::{ColorMap, ViridisRGB},
        RGBColor,
    },
};

use crate::{
    error::{Artifact, ExportError},
    DerivedRecord, ReportYear,
};

#[cfg(feature = "chart")]
pub use bitmap::PlottersBackend;

const MILLION: f64 = 1_000_000.;

/// Local-currency total profit per technology, largest first.
#[derive(Debug, Clone, PartialEq)]
pub struct TechnologyTotals(Vec<(String, f64)>);

impl TechnologyTotals {
    pub fn from_records(records: &[DerivedRecord]) -> Self {
        let mut sums: BTreeMap<String, f64> = BTreeMap::new();
        for r in records {
            *sums.entry(r.base.technology.clone()).or_insert(0.) += r.total_profit_local;
        }
        let mut totals: Vec<(String, f64)> = sums.into_iter().collect();
        // stable sort keeps the name order of the map for equal totals
        totals.sort_by(|(_, a), (_, b)| b.total_cmp(a));
        Self(totals)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(t, v)| (t.as_str(), *v))
    }

    pub fn get(&self, technology: &str) -> Option<f64> {
        self.iter().find(|(t, _)| *t == technology).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub category: String,
    /// Height in millions of local currency.
    pub value: f64,
    pub color: (u8, u8, u8),
    pub annotation: String,
}

/// Everything a backend needs to draw the technology chart.
#[derive(Debug, Clone, PartialEq)]
pub struct BarChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub bars: Vec<Bar>,
}

impl BarChart {
    pub fn technology_profit(records: &[DerivedRecord], year: ReportYear, currency: &str) -> Self {
        let totals = TechnologyTotals::from_records(records);
        let n = totals.len();
        let bars = totals
            .iter()
            .enumerate()
            .map(|(i, (technology, total))| {
                let value = total / MILLION;
                let t = if n > 1 { i as f64 / (n - 1) as f64 } else { 0. };
                Bar {
                    category: technology.to_string(),
                    value,
                    color: viridis(t),
                    annotation: format!("{value:.1}M"),
                }
            })
            .collect();
        Self {
            title: format!("Total profit by key technology, {year}"),
            x_label: "Key technology".to_string(),
            y_label: format!("Total profit (million {currency})"),
            bars,
        }
    }

    /// Discrete x range for the bars. Every integer of the inclusive range
    /// owns one segment once the range is segmented, so `0..n - 1` gives
    /// exactly one slot per bar. A lone bar gets `0..1` since a zero-width
    /// range has no scale.
    pub fn category_range(&self) -> Range<u32> {
        let n = self.bars.len() as u32;
        0..n.saturating_sub(1).max(1)
    }

    /// Tick label for an x position: the full category name at the centre of
    /// its bar's segment, nothing elsewhere.
    pub fn category_label(&self, v: &SegmentValue<u32>) -> String {
        match v {
            SegmentValue::CenterOf(i) => self
                .bars
                .get(*i as usize)
                .map(|b| b.category.clone())
                .unwrap_or_default(),
            _ => String::new(),
        }
    }

    /// Left and right edge of bar `i`. The last bar closes on the end of the
    /// axis.
    pub fn bar_span(&self, i: u32) -> (SegmentValue<u32>, SegmentValue<u32>) {
        let right = if (i as usize) + 1 < self.bars.len() {
            SegmentValue::Exact(i + 1)
        } else {
            SegmentValue::Last
        };
        (SegmentValue::Exact(i), right)
    }
}

/// Samples the viridis color map; `t` is clamped to [0, 1].
pub fn viridis(t: f64) -> (u8, u8, u8) {
    let t = if t.is_nan() { 0. } else { t.clamp(0., 1.) };
    let RGBColor(r, g, b) = ViridisRGB.get_color(t as f32);
    (r, g, b)
}

/// Something that can turn a [`BarChart`] into an image file.
pub trait ChartBackend {
    fn name(&self) -> &'static str;
    fn draw(&self, chart: &BarChart, path: &Path) -> Result<(), ExportError>;
}

/// Stand-in used when the crate is built without the `chart` feature.
#[derive(Debug, Default, Clone, Copy)]
pub struct MissingBackend;

impl ChartBackend for MissingBackend {
    fn name(&self) -> &'static str {
        "none"
    }

    fn draw(&self, _chart: &BarChart, _path: &Path) -> Result<(), ExportError> {
        Err(ExportError::DependencyMissing {
            artifact: Artifact::Chart,
            dependency: "plotters",
        })
    }
}

pub fn default_backend() -> Box<dyn ChartBackend> {
    #[cfg(feature = "chart")]
    {
        Box::new(PlottersBackend)
    }
    #[cfg(not(feature = "chart"))]
    {
        Box::new(MissingBackend)
    }
}

/// Builds the technology chart for `records` and hands it to `backend`.
/// Returns the path of the written image.
pub fn render_chart(
    records: &[DerivedRecord],
    year: ReportYear,
    currency: &str,
    path: &Path,
    backend: &dyn ChartBackend,
) -> Result<PathBuf, ExportError> {
    let chart = BarChart::technology_profit(records, year, currency);
    if chart.bars.is_empty() {
        return Err(ExportError::RenderFailure {
            artifact: Artifact::Chart,
            reason: format!("no {year} records to plot"),
        });
    }
    debug!(
        "drawing {} bars with the {} backend to {}",
        chart.bars.len(),
        backend.name(),
        path.display()
    );
    backend.draw(&chart, path)?;
    Ok(path.to_path_buf())
}

#[cfg(feature = "chart")]
mod bitmap {
    use std::{fmt::Display, fs::File, path::Path};

    use log::warn;
    use plotters::{
        prelude::*,
        style::{
            text_anchor::{HPos, Pos, VPos},
            FontTransform,
        },
    };

    use super::{BarChart, ChartBackend};
    use crate::error::{Artifact, ExportError};

    const SIZE: (u32, u32) = (1200, 700);

    /// PNG output through `plotters`' bitmap backend.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct PlottersBackend;

    impl ChartBackend for PlottersBackend {
        fn name(&self) -> &'static str {
            "plotters"
        }

        fn draw(&self, chart: &BarChart, path: &Path) -> Result<(), ExportError> {
            File::create(path).map_err(|source| ExportError::IoFailure {
                artifact: Artifact::Chart,
                path: path.to_path_buf(),
                source,
            })?;
            draw_png(chart, path).map_err(|reason| {
                // leave no half-drawn image behind
                if let Err(e) = std::fs::remove_file(path) {
                    warn!("could not remove partial chart {}: {e}", path.display());
                }
                ExportError::RenderFailure {
                    artifact: Artifact::Chart,
                    reason,
                }
            })
        }
    }

    fn failed<E: Display>(err: E) -> String {
        err.to_string()
    }

    fn draw_png(chart: &BarChart, path: &Path) -> Result<(), String> {
        let top = chart.bars.iter().map(|b| b.value).fold(0., f64::max);
        let y_max = if top > 0. { top * 1.15 } else { 1. };
        let category_label = |v: &SegmentValue<u32>| chart.category_label(v);
        let value_label = |v: &f64| format!("{v:.0}");

        let root = BitMapBackend::new(path, SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(failed)?;

        let mut ctx = ChartBuilder::on(&root)
            .caption(&chart.title, ("sans-serif", 28))
            .margin(20)
            .x_label_area_size(200)
            .y_label_area_size(80)
            .build_cartesian_2d(chart.category_range().into_segmented(), 0f64..y_max)
            .map_err(failed)?;

        // rotated text hangs down from its tick instead of straddling the axis
        ctx.configure_mesh()
            .disable_x_mesh()
            .bold_line_style(BLACK.mix(0.25))
            .light_line_style(WHITE)
            .x_desc(chart.x_label.as_str())
            .y_desc(chart.y_label.as_str())
            .axis_desc_style(("sans-serif", 18))
            .x_labels(chart.bars.len())
            .x_label_formatter(&category_label)
            .x_label_style(
                TextStyle::from(
                    ("sans-serif", 14)
                        .into_font()
                        .transform(FontTransform::Rotate90),
                )
                .pos(Pos::new(HPos::Left, VPos::Center)),
            )
            .y_label_formatter(&value_label)
            .draw()
            .map_err(failed)?;

        ctx.draw_series(chart.bars.iter().zip(0u32..).map(|(bar, i)| {
            let (r, g, b) = bar.color;
            let (left, right) = chart.bar_span(i);
            let mut rect = Rectangle::new(
                [(left, 0.), (right, bar.value)],
                RGBColor(r, g, b).filled(),
            );
            rect.set_margin(0, 0, 12, 12);
            rect
        }))
        .map_err(failed)?;

        let annotation = TextStyle::from(("sans-serif", 16).into_font())
            .color(&BLACK)
            .pos(Pos::new(HPos::Center, VPos::Bottom));
        ctx.draw_series(chart.bars.iter().zip(0u32..).map(|(bar, i)| {
            Text::new(
                bar.annotation.clone(),
                (SegmentValue::CenterOf(i), bar.value),
                annotation.clone(),
            )
        }))
        .map_err(failed)?;

        root.present().map_err(failed)?;
        Ok(())
    }
}

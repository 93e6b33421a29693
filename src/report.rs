//! Console rendering of the per-year report: banner, a markdown preview of
//! the enriched records and the pivot summary.

use std::io::{self, Write};

use tabled::{builder::Builder, settings::Style};

use crate::{pivot::PivotSummary, DerivedRecord, ReportConfig, ReportYear, RunSummary};

pub const PREVIEW_ROWS: usize = 5;

const RULE: &str =
    "==================================================================================";
const THIN_RULE: &str =
    "----------------------------------------------------------------------------------";

fn amount(v: f64) -> String {
    format!("{v:.2}")
}

pub fn banner(config: &ReportConfig, year: ReportYear) -> String {
    format!(
        "Report: {year} | Date: {} | Rate (USD/{}): {}",
        config.report_date, config.local_currency, config.exchange_rate
    )
}

/// First [`PREVIEW_ROWS`] records as a markdown table.
pub fn preview_table(records: &[DerivedRecord], currency: &str) -> String {
    let mut builder = Builder::default();
    builder.push_record([
        "Start date".to_string(),
        "Quarter".to_string(),
        "Client".to_string(),
        "Key technology".to_string(),
        "Profit/unit".to_string(),
        format!("Profit/unit ({currency})"),
        "Units sold (k)".to_string(),
        "Total profit (k)".to_string(),
        format!("Total profit {currency} (k)"),
    ]);
    for r in records.iter().take(PREVIEW_ROWS) {
        builder.push_record([
            r.start.to_string(),
            r.quarter.label().to_string(),
            r.base.client.clone(),
            r.base.technology.clone(),
            amount(r.base.unit_profit),
            amount(r.unit_profit_local),
            amount(r.base.units_sold),
            amount(r.total_profit),
            amount(r.total_profit_local),
        ]);
    }
    builder.build().with(Style::markdown()).to_string()
}

pub fn pivot_table(pivot: &PivotSummary) -> String {
    let mut builder = Builder::default();
    builder.push_record(
        ["Quarter".to_string(), "Key technology".to_string()]
            .into_iter()
            .chain(pivot.clients().iter().cloned()),
    );
    for ((quarter, technology), cells) in pivot.rows() {
        builder.push_record(
            [quarter.label().to_string(), technology.clone()]
                .into_iter()
                .chain(cells.iter().map(|v| amount(*v))),
        );
    }
    builder.build().with(Style::markdown()).to_string()
}

pub fn write_year_report<W: Write>(
    out: &mut W,
    config: &ReportConfig,
    year: ReportYear,
    records: &[DerivedRecord],
    pivot: &PivotSummary,
) -> io::Result<()> {
    writeln!(out, "{RULE}")?;
    writeln!(out, "{}", banner(config, year))?;
    writeln!(out, "{RULE}")?;
    writeln!(
        out,
        "\n--- PROJECT DATA (first {} rows) ---",
        PREVIEW_ROWS.min(records.len())
    )?;
    writeln!(out, "{}", preview_table(records, &config.local_currency))?;
    writeln!(out, "\n--- PIVOT TABLE (total profit by technology) ---")?;
    writeln!(
        out,
        "Rows: Quarter, Key technology | Columns: Client | Values: sum of total profit {} (k)",
        config.local_currency
    )?;
    writeln!(out, "{THIN_RULE}")?;
    writeln!(out, "{}", pivot_table(pivot))?;
    writeln!(out)
}

pub fn write_run_summary<W: Write>(out: &mut W, summary: &RunSummary) -> io::Result<()> {
    match &summary.chart {
        Ok(path) => writeln!(out, "[chart] created '{}'", path.display())?,
        Err(e) => writeln!(out, "[chart] not created: {e}")?,
    }
    writeln!(out, "{THIN_RULE}")?;
    match &summary.workbook {
        Ok(path) => {
            writeln!(out, "SUCCESS: created workbook '{}'.", path.display())?;
            if let Ok(chart) = &summary.chart {
                writeln!(out, "Chart '{}' was created as well.", chart.display())?;
            }
        }
        Err(e) => writeln!(out, "Workbook export failed: {e}")?,
    }
    writeln!(out, "{THIN_RULE}")
}

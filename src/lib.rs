use std::{fmt, io::Write, path::PathBuf};

use anyhow::{ensure, Context, Error};
use log::{info, warn};
use time::{
    format_description::BorrowedFormatItem,
    macros::{date, format_description},
    Date, Month,
};

pub mod chart;
pub mod dataset;
pub mod error;
pub mod export;
pub mod pivot;
pub mod report;

use chart::ChartBackend;
use error::ExportError;
use pivot::PivotSummary;

pub type Result<T> = std::result::Result<T, Error>;

const REPORT_DATE: Date = date!(2025 - 11 - 11);
const EXCHANGE_RATE: f64 = 40.5;
const LOCAL_CURRENCY: &str = "UAH";
const CHART_FILE_NAME: &str = "automotive_profit_2024.png";
const WORKBOOK_FILE_NAME: &str = "automotive_models_report.xlsx";

static START_DATE_FMT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// Reporting years with a project table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReportYear {
    Y2024,
    Y2025,
}

impl ReportYear {
    pub const ALL: [ReportYear; 2] = [ReportYear::Y2024, ReportYear::Y2025];

    pub fn value(self) -> i32 {
        match self {
            ReportYear::Y2024 => 2024,
            ReportYear::Y2025 => 2025,
        }
    }
}

impl TryFrom<i32> for ReportYear {
    type Error = Error;

    fn try_from(year: i32) -> Result<Self> {
        match year {
            2024 => Ok(ReportYear::Y2024),
            2025 => Ok(ReportYear::Y2025),
            _ => Err(Error::msg(format!(
                "unsupported report year {year} (expected 2024 or 2025)"
            ))),
        }
    }
}

impl fmt::Display for ReportYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// Calendar quarter of a project's start date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Quarter {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl Quarter {
    pub fn from_month(month: Month) -> Self {
        use Month::*;
        match month {
            January | February | March => Quarter::Q1,
            April | May | June => Quarter::Q2,
            July | August | September => Quarter::Q3,
            October | November | December => Quarter::Q4,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Quarter::Q1 => "Quarter 1",
            Quarter::Q2 => "Quarter 2",
            Quarter::Q3 => "Quarter 3",
            Quarter::Q4 => "Quarter 4",
        }
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Settings shared by every stage of a run.
#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub report_date: Date,
    /// Local currency units per unit of the profit currency.
    pub exchange_rate: f64,
    pub local_currency: String,
    /// Year whose records feed the chart.
    pub chart_year: ReportYear,
    pub chart_path: PathBuf,
    pub workbook_path: PathBuf,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            report_date: REPORT_DATE,
            exchange_rate: EXCHANGE_RATE,
            local_currency: LOCAL_CURRENCY.to_string(),
            chart_year: ReportYear::Y2024,
            chart_path: PathBuf::from(CHART_FILE_NAME),
            workbook_path: PathBuf::from(WORKBOOK_FILE_NAME),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectRecord {
    pub project: String,
    pub client: String,
    pub region: String,
    /// ISO `YYYY-MM-DD`, parsed when fields are derived.
    pub start_date: String,
    pub technology: String,
    pub profit_unit: String,
    pub unit_profit: f64,
    /// Thousands of units.
    pub units_sold: f64,
    pub year: ReportYear,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DerivedRecord {
    pub base: ProjectRecord,
    pub start: Date,
    pub quarter: Quarter,
    pub unit_profit_local: f64,
    pub total_profit: f64,
    pub total_profit_local: f64,
}

impl DerivedRecord {
    pub fn derive(base: &ProjectRecord, exchange_rate: f64) -> Result<Self> {
        let start = Date::parse(&base.start_date, &START_DATE_FMT).with_context(|| {
            format!(
                "invalid start date {:?} for project {:?}",
                base.start_date, base.project
            )
        })?;
        let unit_profit_local = base.unit_profit * exchange_rate;
        Ok(Self {
            base: base.clone(),
            start,
            quarter: Quarter::from_month(start.month()),
            unit_profit_local,
            total_profit: base.units_sold * base.unit_profit,
            total_profit_local: base.units_sold * unit_profit_local,
        })
    }
}

/// Attaches the derived fields to every record. Any bad record fails the
/// whole batch.
pub fn derive_fields(records: &[ProjectRecord], exchange_rate: f64) -> Result<Vec<DerivedRecord>> {
    ensure!(
        exchange_rate.is_finite() && exchange_rate > 0.,
        "exchange rate must be a positive number, got {exchange_rate}"
    );
    records
        .iter()
        .map(|r| DerivedRecord::derive(r, exchange_rate))
        .collect()
}

/// Enriched records of one reporting year, i.e. one workbook sheet.
#[derive(Debug, Clone)]
pub struct YearTable {
    pub year: ReportYear,
    pub records: Vec<DerivedRecord>,
}

/// Outcome of each best-effort export of a run.
#[derive(Debug)]
pub struct RunSummary {
    pub chart: std::result::Result<PathBuf, ExportError>,
    pub workbook: std::result::Result<PathBuf, ExportError>,
}

impl RunSummary {
    pub fn is_complete(&self) -> bool {
        self.chart.is_ok() && self.workbook.is_ok()
    }
}

/// Builds and derives every year, prints the console report to `out`, then
/// attempts the chart and the workbook. Derivation errors abort the run;
/// export errors are logged and returned in the summary.
pub fn run<W: Write>(
    config: &ReportConfig,
    chart_backend: &dyn ChartBackend,
    out: &mut W,
) -> Result<RunSummary> {
    let mut tables = Vec::with_capacity(ReportYear::ALL.len());
    for year in ReportYear::ALL {
        let records = derive_fields(&dataset::project_data(year)?, config.exchange_rate)
            .with_context(|| format!("failed to derive {year} fields"))?;
        let pivot = PivotSummary::build(&records);
        info!(
            "{year}: {} records, {} pivot rows",
            records.len(),
            pivot.len()
        );
        report::write_year_report(out, config, year, &records, &pivot)?;
        tables.push(YearTable { year, records });
    }

    let chart_records = tables
        .iter()
        .find(|t| t.year == config.chart_year)
        .map(|t| t.records.as_slice())
        .unwrap_or_default();
    let chart = chart::render_chart(
        chart_records,
        config.chart_year,
        &config.local_currency,
        &config.chart_path,
        chart_backend,
    );
    if let Err(e) = &chart {
        warn!("{e}");
    }

    let workbook = export::export_workbook(&tables, config);
    if let Err(e) = &workbook {
        warn!("{e}");
    }

    let summary = RunSummary { chart, workbook };
    report::write_run_summary(out, &summary)?;
    Ok(summary)
}

use anyhow::Context;
use serde::Deserialize;

use crate::{ProjectRecord, ReportYear, Result};

static PROJECTS_2024: &str = include_str!("../data/projects_2024.csv");
static PROJECTS_2025: &str = include_str!("../data/projects_2025.csv");

/// Row layout of the embedded project tables.
#[derive(Debug, Deserialize)]
struct ProjectRow {
    project: String,
    client: String,
    region: String,
    start_date: String,
    technology: String,
    profit_unit: String,
    unit_profit: f64,
    units_sold: f64,
}

impl ProjectRow {
    fn into_record(self, year: ReportYear) -> ProjectRecord {
        ProjectRecord {
            project: self.project,
            client: self.client,
            region: self.region,
            start_date: self.start_date,
            technology: self.technology,
            profit_unit: self.profit_unit,
            unit_profit: self.unit_profit,
            units_sold: self.units_sold,
            year,
        }
    }
}

/// Returns the fixed project table for `year`, in source order, with the
/// year stamped on every record.
pub fn project_data(year: ReportYear) -> Result<Vec<ProjectRecord>> {
    let source = match year {
        ReportYear::Y2024 => PROJECTS_2024,
        ReportYear::Y2025 => PROJECTS_2025,
    };
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(source.as_bytes());
    rdr.deserialize()
        .map(|row| -> Result<ProjectRecord> {
            let row: ProjectRow = row.with_context(|| format!("malformed {year} project table"))?;
            Ok(row.into_record(year))
        })
        .collect()
}

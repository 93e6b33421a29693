use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{debug, info, warn};

use crate::{
    error::{Artifact, ExportError},
    ReportConfig, ReportYear, YearTable,
};

/// Zero-based row of the table header; the rows above hold the annotations.
pub const HEADER_ROW: u32 = 3;

pub fn sheet_name(year: ReportYear) -> String {
    format!("{year}_Models")
}

/// Report date, exchange rate and data year, one per line, as written to
/// cells A1..A3 of each sheet.
pub fn sheet_annotations(config: &ReportConfig, year: ReportYear) -> [String; 3] {
    [
        format!("Report date: {}", config.report_date),
        format!(
            "Exchange rate (USD/{}): {}",
            config.local_currency, config.exchange_rate
        ),
        format!("Data year: {year}"),
    ]
}

/// Header row of the enriched table.
pub fn column_names(currency: &str) -> Vec<String> {
    vec![
        "Project".to_string(),
        "Client".to_string(),
        "Region".to_string(),
        "Start date".to_string(),
        "Key technology".to_string(),
        "Profit unit".to_string(),
        "Profit/unit".to_string(),
        "Units sold (k)".to_string(),
        "Year".to_string(),
        "Quarter".to_string(),
        format!("Profit/unit ({currency})"),
        "Total profit (k)".to_string(),
        format!("Total profit {currency} (k)"),
    ]
}

/// Writes one sheet per year into the configured workbook. The file only
/// appears once every sheet has been assembled and written out.
pub fn export_workbook(tables: &[YearTable], config: &ReportConfig) -> Result<PathBuf, ExportError> {
    if tables.is_empty() {
        return Err(ExportError::RenderFailure {
            artifact: Artifact::Workbook,
            reason: "no sheets to write".to_string(),
        });
    }
    let bytes = xlsx::build(tables, config)?;
    debug!("workbook assembled ({} bytes)", bytes.len());
    commit(&config.workbook_path, &bytes)?;
    info!(
        "workbook with {} sheets written to {}",
        tables.len(),
        config.workbook_path.display()
    );
    Ok(config.workbook_path.clone())
}

fn commit(path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    let part = path.with_extension("xlsx.part");
    fs::write(&part, bytes)
        .and_then(|()| fs::rename(&part, path))
        .map_err(|source| {
            if let Err(e) = fs::remove_file(&part).or_else(|e| match e.kind() {
                std::io::ErrorKind::NotFound => Ok(()),
                _ => Err(e),
            }) {
                warn!("could not remove partial workbook {}: {e}", part.display());
            }
            ExportError::IoFailure {
                artifact: Artifact::Workbook,
                path: path.to_path_buf(),
                source,
            }
        })
}

#[cfg(feature = "xlsx")]
mod xlsx {
    use rust_xlsxwriter::{Format, FormatBorder, Workbook, XlsxError};

    use super::{column_names, sheet_annotations, sheet_name, HEADER_ROW};
    use crate::{
        error::{Artifact, ExportError},
        ReportConfig, YearTable,
    };

    pub(super) fn build(tables: &[YearTable], config: &ReportConfig) -> Result<Vec<u8>, ExportError> {
        write_sheets(tables, config).map_err(|e| ExportError::RenderFailure {
            artifact: Artifact::Workbook,
            reason: e.to_string(),
        })
    }

    fn write_sheets(tables: &[YearTable], config: &ReportConfig) -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();
        let header = Format::new().set_bold().set_border_bottom(FormatBorder::Thin);
        let amount = Format::new().set_num_format("#,##0.00");
        let names = column_names(&config.local_currency);

        for table in tables {
            let sheet = workbook.add_worksheet();
            sheet.set_name(sheet_name(table.year))?;
            for (row, line) in (0u32..).zip(sheet_annotations(config, table.year)) {
                sheet.write_string(row, 0, line)?;
            }
            for (col, name) in (0u16..).zip(&names) {
                sheet.write_string_with_format(HEADER_ROW, col, name, &header)?;
            }
            for (row, r) in (HEADER_ROW + 1..).zip(&table.records) {
                sheet.write_string(row, 0, &r.base.project)?;
                sheet.write_string(row, 1, &r.base.client)?;
                sheet.write_string(row, 2, &r.base.region)?;
                sheet.write_string(row, 3, r.start.to_string())?;
                sheet.write_string(row, 4, &r.base.technology)?;
                sheet.write_string(row, 5, &r.base.profit_unit)?;
                sheet.write_number(row, 6, r.base.unit_profit)?;
                sheet.write_number(row, 7, r.base.units_sold)?;
                sheet.write_number(row, 8, r.base.year.value())?;
                sheet.write_string(row, 9, r.quarter.label())?;
                sheet.write_number_with_format(row, 10, r.unit_profit_local, &amount)?;
                sheet.write_number_with_format(row, 11, r.total_profit, &amount)?;
                sheet.write_number_with_format(row, 12, r.total_profit_local, &amount)?;
            }
            sheet.autofit();
        }

        workbook.save_to_buffer()
    }
}

#[cfg(not(feature = "xlsx"))]
mod xlsx {
    use crate::{
        error::{Artifact, ExportError},
        ReportConfig, YearTable,
    };

    pub(super) fn build(_tables: &[YearTable], _config: &ReportConfig) -> Result<Vec<u8>, ExportError> {
        Err(ExportError::DependencyMissing {
            artifact: Artifact::Workbook,
            dependency: "rust_xlsxwriter",
        })
    }
}

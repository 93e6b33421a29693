//! End-to-end runs of the report pipeline against a temporary output
//! directory, reading the exported workbook back with calamine.

use std::{cell::RefCell, path::Path};

use automotive_profit_report::{
    chart::{BarChart, ChartBackend, MissingBackend},
    error::{Artifact, ExportError},
    export::HEADER_ROW,
    run, ReportConfig, ReportYear,
};
use calamine::{open_workbook, Data, Reader, Xlsx};

fn config_in(dir: &Path) -> ReportConfig {
    ReportConfig {
        chart_path: dir.join("chart.png"),
        workbook_path: dir.join("report.xlsx"),
        ..ReportConfig::default()
    }
}

/// Keeps the chart it was asked to draw and writes a placeholder file.
#[derive(Default)]
struct RecordingBackend {
    drawn: RefCell<Option<BarChart>>,
}

impl ChartBackend for RecordingBackend {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn draw(&self, chart: &BarChart, path: &Path) -> Result<(), ExportError> {
        std::fs::write(path, b"png").map_err(|source| ExportError::IoFailure {
            artifact: Artifact::Chart,
            path: path.to_path_buf(),
            source,
        })?;
        *self.drawn.borrow_mut() = Some(chart.clone());
        Ok(())
    }
}

#[test]
fn missing_chart_dependency_still_exports_workbook() {
    let tmp = tempfile::tempdir().unwrap();
    let config = config_in(tmp.path());
    let mut out = Vec::new();

    let summary = run(&config, &MissingBackend, &mut out).unwrap();

    let err = summary.chart.as_ref().unwrap_err();
    assert!(err.is_dependency_missing());
    assert!(!config.chart_path.exists());
    assert_eq!(summary.workbook.as_ref().unwrap(), &config.workbook_path);
    assert!(config.workbook_path.exists());
    assert!(!summary.is_complete());

    let stdout = String::from_utf8(out).unwrap();
    assert!(stdout.contains("[chart] not created"));
    assert!(stdout.contains("plotters"));
    assert!(stdout.contains("SUCCESS: created workbook"));
}

#[test]
fn chart_gets_2024_technology_totals() {
    let tmp = tempfile::tempdir().unwrap();
    let config = config_in(tmp.path());
    let backend = RecordingBackend::default();

    let summary = run(&config, &backend, &mut Vec::new()).unwrap();

    assert!(summary.is_complete());
    assert_eq!(summary.chart.as_ref().unwrap(), &config.chart_path);
    let chart = backend.drawn.borrow().clone().unwrap();
    assert_eq!(chart.title, "Total profit by key technology, 2024");
    assert_eq!(chart.bars.len(), 5);
    assert_eq!(chart.bars[0].category, "THS hybrid system");
    assert!(chart
        .bars
        .windows(2)
        .all(|w| w[0].value >= w[1].value));
}

#[test]
fn console_report_covers_both_years() {
    let tmp = tempfile::tempdir().unwrap();
    let mut out = Vec::new();
    run(&config_in(tmp.path()), &MissingBackend, &mut out).unwrap();
    let stdout = String::from_utf8(out).unwrap();

    assert!(stdout.contains("Report: 2024 | Date: 2025-11-11 | Rate (USD/UAH): 40.5"));
    assert!(stdout.contains("Report: 2025 | Date: 2025-11-11 | Rate (USD/UAH): 40.5"));
    assert!(stdout
        .lines()
        .any(|l| l.starts_with("| Quarter 3 ") && l.contains("Honda Sensing system")));
    assert!(stdout.contains("Rotary EV range extender"));
}

#[test]
fn workbook_sheets_hold_annotations_and_table() {
    let tmp = tempfile::tempdir().unwrap();
    let config = config_in(tmp.path());
    run(&config, &MissingBackend, &mut Vec::new()).unwrap();

    let mut workbook: Xlsx<_> = open_workbook(&config.workbook_path).unwrap();
    assert_eq!(workbook.sheet_names(), ["2024_Models", "2025_Models"]);

    for year in ReportYear::ALL {
        let range = workbook
            .worksheet_range(&format!("{year}_Models"))
            .unwrap();
        assert_eq!(
            range.get_value((0, 0)),
            Some(&Data::String("Report date: 2025-11-11".to_string()))
        );
        assert_eq!(
            range.get_value((1, 0)),
            Some(&Data::String("Exchange rate (USD/UAH): 40.5".to_string()))
        );
        assert_eq!(
            range.get_value((2, 0)),
            Some(&Data::String(format!("Data year: {year}")))
        );
        assert_eq!(
            range.get_value((HEADER_ROW, 0)),
            Some(&Data::String("Project".to_string()))
        );
        assert_eq!(
            range.get_value((HEADER_ROW, 12)),
            Some(&Data::String("Total profit UAH (k)".to_string()))
        );
        assert_eq!(range.height() as u32, HEADER_ROW + 1 + 6);
        assert_eq!(
            range.get_value((HEADER_ROW + 1, 8)),
            Some(&Data::Float(year.value() as f64))
        );
    }

    let range = workbook.worksheet_range("2024_Models").unwrap();
    let first = HEADER_ROW + 1;
    assert_eq!(
        range.get_value((first, 0)),
        Some(&Data::String("Sedan A (Hybrid)".to_string()))
    );
    assert_eq!(
        range.get_value((first, 9)),
        Some(&Data::String("Quarter 1".to_string()))
    );
    assert_eq!(range.get_value((first, 10)), Some(&Data::Float(101_250.)));
    assert_eq!(range.get_value((first, 11)), Some(&Data::Float(1_250_000.)));
    assert_eq!(range.get_value((first, 12)), Some(&Data::Float(50_625_000.)));
}

#[test]
fn unwritable_workbook_is_reported_not_fatal() {
    let tmp = tempfile::tempdir().unwrap();
    let config = ReportConfig {
        workbook_path: tmp.path().join("missing-dir").join("report.xlsx"),
        ..config_in(tmp.path())
    };

    let summary = run(&config, &RecordingBackend::default(), &mut Vec::new()).unwrap();

    assert!(summary.chart.is_ok());
    assert!(matches!(
        summary.workbook,
        Err(ExportError::IoFailure {
            artifact: Artifact::Workbook,
            ..
        })
    ));
    assert!(!config.workbook_path.exists());
}

#[cfg(feature = "chart")]
#[test]
fn plotters_backend_writes_png_or_reports_failure() {
    use automotive_profit_report::chart::PlottersBackend;

    let tmp = tempfile::tempdir().unwrap();
    let config = config_in(tmp.path());
    let summary = run(&config, &PlottersBackend, &mut Vec::new()).unwrap();

    // font availability depends on the host, so either outcome is valid
    match summary.chart {
        Ok(path) => {
            let bytes = std::fs::read(path).unwrap();
            assert!(bytes.starts_with(b"\x89PNG"));
            // IHDR width and height
            assert_eq!(bytes[16..20], 1200u32.to_be_bytes());
            assert_eq!(bytes[20..24], 700u32.to_be_bytes());
        }
        Err(e) => {
            assert!(matches!(e, ExportError::RenderFailure { .. }));
            assert!(!config.chart_path.exists());
        }
    }
}

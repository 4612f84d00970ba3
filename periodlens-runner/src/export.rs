//! Reporting and export: CSV, JSON, and Markdown artifact generation.
//!
//! Provides three export formats for generated reports:
//! - **CSV**: one file per sheet, plus the summary table when there is one
//! - **JSON**: the full report with schema versioning
//! - **Markdown**: a human-readable preview
//!
//! Ratio cells are percent numbers. Undefined ratios export as an empty CSV
//! cell and as JSON `null`.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use periodlens_core::domain::PeriodDataset;
use periodlens_core::engine::{Cell, Report, SummaryTable};

use crate::fingerprint::dataset_fingerprint;
use crate::workbook::Workbook;

/// Version of the JSON report and manifest layout.
pub const SCHEMA_VERSION: u32 = 1;

// ─── JSON export ────────────────────────────────────────────────────

#[derive(Serialize)]
struct VersionedReport<'a> {
    schema_version: u32,
    #[serde(flatten)]
    report: &'a Report,
}

/// Serialize a `Report` to pretty JSON.
pub fn export_json(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(&VersionedReport {
        schema_version: SCHEMA_VERSION,
        report,
    })
    .context("failed to serialize report to JSON")
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export one report as CSV: header row, then one line per row.
pub fn export_csv(report: &Report) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(&report.columns)?;
    for row in &report.rows {
        wtr.write_record(row.iter().map(format_cell))?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export a summary table as CSV with label, value and unit columns.
pub fn export_summary_csv(summary: &SummaryTable) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["label", "value", "unit"])?;
    for e in &summary.entries {
        wtr.write_record([e.label.as_str(), &format_number(e.value), e.unit.as_str()])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

fn format_cell(cell: &Cell) -> String {
    match cell {
        Cell::Text(s) => s.clone(),
        Cell::Number(v) => format_number(*v),
        Cell::Undefined => String::new(),
    }
}

/// Whole numbers without decimals, everything else to two places.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

// ─── Workbook bundle ────────────────────────────────────────────────

/// One sheet's entry in `manifest.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetEntry {
    pub sheet_name: String,
    pub title: String,
    pub file: String,
    #[serde(default)]
    pub summary_file: Option<String>,
    pub rows: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkbookManifest {
    pub schema_version: u32,
    pub workbook: String,
    pub generated_at: chrono::DateTime<chrono::Utc>,
    pub dataset_hash: String,
    pub periods: Vec<String>,
    pub sheets: Vec<SheetEntry>,
}

/// Save a workbook under `output_dir`.
///
/// Creates a directory named `{workbook}_{timestamp}/` containing:
/// - `NN_{sheet}.csv` for every sheet, in order
/// - `NN_{sheet}_summary.csv` for sheets with a summary
/// - `report.md`: Markdown preview of all sheets
/// - `manifest.json`: sheet list and dataset fingerprint
///
/// Returns the path to the created directory.
pub fn save_workbook(workbook: &Workbook, periods: &[PeriodDataset], output_dir: &Path) -> Result<PathBuf> {
    let dirname = format!(
        "{}_{}",
        workbook.name,
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create output dir: {}", run_dir.display()))?;

    let mut sheets = Vec::with_capacity(workbook.reports.len());
    let mut markdown = String::new();

    for (i, report) in workbook.reports.iter().enumerate() {
        let stem = format!("{:02}_{}", i + 1, file_stem(&report.sheet_name));

        let file = format!("{stem}.csv");
        std::fs::write(run_dir.join(&file), export_csv(report)?)
            .with_context(|| format!("failed to write {file}"))?;

        let summary_file = match &report.summary {
            Some(summary) => {
                let name = format!("{stem}_summary.csv");
                std::fs::write(run_dir.join(&name), export_summary_csv(summary)?)
                    .with_context(|| format!("failed to write {name}"))?;
                Some(name)
            }
            None => None,
        };

        markdown.push_str(&generate_markdown(report));
        sheets.push(SheetEntry {
            sheet_name: report.sheet_name.clone(),
            title: report.title.clone(),
            file,
            summary_file,
            rows: report.len(),
        });
    }

    std::fs::write(run_dir.join("report.md"), &markdown).context("failed to write report.md")?;

    let manifest = WorkbookManifest {
        schema_version: SCHEMA_VERSION,
        workbook: workbook.name.clone(),
        generated_at: chrono::Utc::now(),
        dataset_hash: dataset_fingerprint(periods),
        periods: periods.iter().map(|p| p.label().to_string()).collect(),
        sheets,
    };
    let json = serde_json::to_string_pretty(&manifest).context("failed to serialize workbook manifest")?;
    std::fs::write(run_dir.join("manifest.json"), json).context("failed to write manifest.json")?;

    log::info!("saved workbook '{}' to {}", workbook.name, run_dir.display());
    Ok(run_dir)
}

/// Load `manifest.json` from a saved workbook directory.
///
/// Rejects unknown schema versions.
pub fn load_manifest(dir: &Path) -> Result<WorkbookManifest> {
    let path = dir.join("manifest.json");
    let json = std::fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))?;
    let manifest: WorkbookManifest = serde_json::from_str(&json).context("failed to parse workbook manifest")?;
    if manifest.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            manifest.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(manifest)
}

fn file_stem(sheet_name: &str) -> String {
    sheet_name
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

// ─── Markdown preview ───────────────────────────────────────────────

/// Generate a Markdown preview of one report.
pub fn generate_markdown(report: &Report) -> String {
    let mut md = String::with_capacity(1024 + report.rows.len() * 64);

    md.push_str(&format!("# {}\n\n", report.title));
    if !report.context.latest_date.is_empty() {
        md.push_str(&format!("Latest shipment: {}\n\n", report.context.latest_date));
    }

    if report.is_empty() {
        md.push_str("_No rows._\n\n");
    } else {
        md.push_str(&format!("| {} |\n", report.columns.join(" | ")));
        md.push_str(&format!("|{}\n", " --- |".repeat(report.columns.len())));
        for row in &report.rows {
            let cells: Vec<String> = row
                .iter()
                .map(|c| match c {
                    Cell::Undefined => "-".to_string(),
                    other => format_cell(other).replace('|', "\\|"),
                })
                .collect();
            md.push_str(&format!("| {} |\n", cells.join(" | ")));
        }
        md.push('\n');
    }

    if let Some(summary) = &report.summary {
        md.push_str("## Summary\n\n");
        md.push_str("| Item | Value |\n");
        md.push_str("| --- | ---: |\n");
        for e in &summary.entries {
            md.push_str(&format!("| {} | {}{} |\n", e.label, format_number(e.value), e.unit));
        }
        md.push('\n');
    }

    md
}

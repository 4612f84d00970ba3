//! Report assembly: turns a comparison table into a titled, ordered, renderable report.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::active_days::date_span;
use super::compare::{Cell, ComparisonTable};
use super::latest::LatestAttributes;
use super::ratio::{round_to, RATIO_DECIMALS};
use super::EngineError;
use crate::domain::TransactionRecord;

/// Date strings shown alongside a report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportContext {
    /// e.g. `"10.01-07"`; empty when there were no records.
    pub date_range: String,
    /// Latest shipment date, e.g. `"10月07日"`.
    pub latest_date: String,
}

impl ReportContext {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a TransactionRecord>) -> Self {
        match date_span(records) {
            Some((start, end)) => Self {
                date_range: describe_date_range(start, end),
                latest_date: end.format("%m月%d日").to_string(),
            },
            None => Self::default(),
        }
    }
}

/// `"7日"` for a single day, `"10.01-07"` within a month, `"09.28-10.03"` across months.
pub fn describe_date_range(start: NaiveDate, end: NaiveDate) -> String {
    if start == end {
        format!("{}日", start.day())
    } else if start.year() == end.year() && start.month() == end.month() {
        format!("{:02}.{:02}-{:02}", start.month(), start.day(), end.day())
    } else {
        format!(
            "{:02}.{:02}-{:02}.{:02}",
            start.month(),
            start.day(),
            end.month(),
            end.day()
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stat", rename_all = "snake_case")]
pub enum SummaryStat {
    RowCount,
    /// Rows with a value above 0 in `column`.
    PositiveCount { column: String },
    Total { column: String },
    /// Mean of the defined cells of `column`.
    Mean { column: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryItem {
    pub label: String,
    #[serde(default)]
    pub unit: String,
    #[serde(flatten)]
    pub stat: SummaryStat,
}

impl SummaryItem {
    pub fn new(label: impl Into<String>, unit: impl Into<String>, stat: SummaryStat) -> Self {
        Self {
            label: label.into(),
            unit: unit.into(),
            stat,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryEntry {
    pub label: String,
    pub value: f64,
    pub unit: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SummaryTable {
    pub entries: Vec<SummaryEntry>,
}

impl SummaryTable {
    pub fn get(&self, label: &str) -> Option<f64> {
        self.entries.iter().find(|e| e.label == label).map(|e| e.value)
    }
}

/// A finished report: one logical table plus optional summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub sheet_name: String,
    pub title: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
    pub summary: Option<SummaryTable>,
    pub context: ReportContext,
}

impl Report {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell of `column` in row `row`, if both exist.
    pub fn cell(&self, row: usize, column: &str) -> Option<&Cell> {
        let col = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(col))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Builds a `Report` from a `ComparisonTable`.
///
/// Column order: row fields, attribute columns, then the table's metric columns.
pub struct ReportAssembler {
    sheet_name: String,
    attributes: Vec<(String, LatestAttributes)>,
    sort: Option<(String, SortOrder)>,
    summary: Vec<SummaryItem>,
    context: ReportContext,
}

impl ReportAssembler {
    pub fn new(sheet_name: impl Into<String>) -> Self {
        Self {
            sheet_name: sheet_name.into(),
            attributes: Vec::new(),
            sort: None,
            summary: Vec::new(),
            context: ReportContext::default(),
        }
    }

    pub fn attribute(mut self, column: impl Into<String>, values: LatestAttributes) -> Self {
        self.attributes.push((column.into(), values));
        self
    }

    pub fn sort_by(mut self, column: impl Into<String>, order: SortOrder) -> Self {
        self.sort = Some((column.into(), order));
        self
    }

    pub fn summary(mut self, items: Vec<SummaryItem>) -> Self {
        self.summary = items;
        self
    }

    pub fn context(mut self, context: ReportContext) -> Self {
        self.context = context;
        self
    }

    pub fn assemble(self, table: &ComparisonTable) -> Result<Report, EngineError> {
        let mut columns: Vec<String> = table
            .row_dims
            .iter()
            .map(|d| d.source_header().to_string())
            .collect();
        columns.extend(self.attributes.iter().map(|(name, _)| name.clone()));
        columns.extend(table.columns.iter().map(|c| c.name.clone()));

        let mut rows: Vec<Vec<Cell>> = table
            .rows
            .iter()
            .map(|row| {
                let mut cells: Vec<Cell> = row.key.parts().iter().cloned().map(Cell::Text).collect();
                for (_, values) in &self.attributes {
                    cells.push(Cell::Text(values.get(&row.key).unwrap_or_default().to_string()));
                }
                cells.extend(row.cells.iter().cloned());
                cells
            })
            .collect();

        if let Some((column, order)) = &self.sort {
            let idx = position(&columns, column)?;
            rows.sort_by(|a, b| compare_cells(&a[idx], &b[idx], *order));
        }

        let summary = if self.summary.is_empty() {
            None
        } else {
            let mut entries = Vec::with_capacity(self.summary.len());
            for item in &self.summary {
                entries.push(SummaryEntry {
                    label: item.label.clone(),
                    value: summarize(&columns, &rows, &item.stat)?,
                    unit: item.unit.clone(),
                });
            }
            Some(SummaryTable { entries })
        };

        let title = if self.context.date_range.is_empty() {
            self.sheet_name.clone()
        } else {
            format!("{} (shipped {})", self.sheet_name, self.context.date_range)
        };

        log::debug!("assembled '{}': {} rows x {} columns", self.sheet_name, rows.len(), columns.len());

        Ok(Report {
            sheet_name: self.sheet_name,
            title,
            columns,
            rows,
            summary,
            context: self.context,
        })
    }
}

fn position(columns: &[String], name: &str) -> Result<usize, EngineError> {
    columns
        .iter()
        .position(|c| c == name)
        .ok_or_else(|| EngineError::UnknownColumn(name.to_string()))
}

/// Numbers by `order`; cells without a number always sort last.
fn compare_cells(a: &Cell, b: &Cell, order: SortOrder) -> Ordering {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => {
            let ord = x.partial_cmp(&y).unwrap_or(Ordering::Equal);
            match order {
                SortOrder::Ascending => ord,
                SortOrder::Descending => ord.reverse(),
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn summarize(columns: &[String], rows: &[Vec<Cell>], stat: &SummaryStat) -> Result<f64, EngineError> {
    let numbers = |column: &str| -> Result<Vec<f64>, EngineError> {
        let idx = position(columns, column)?;
        Ok(rows.iter().filter_map(|r| r[idx].as_f64()).collect())
    };
    Ok(match stat {
        SummaryStat::RowCount => rows.len() as f64,
        SummaryStat::PositiveCount { column } => numbers(column)?.iter().filter(|v| **v > 0.0).count() as f64,
        SummaryStat::Total { column } => numbers(column)?.iter().sum(),
        SummaryStat::Mean { column } => {
            let values = numbers(column)?;
            if values.is_empty() {
                0.0
            } else {
                round_to(values.iter().sum::<f64>() / values.len() as f64, RATIO_DECIMALS)
            }
        }
    })
}

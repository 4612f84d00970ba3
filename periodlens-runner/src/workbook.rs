//! Workbook generation: load the period extracts once, then build every sheet
//! in parallel over the shared datasets.

use rayon::prelude::*;
use std::path::PathBuf;

use periodlens_core::data::DatasetLoader;
use periodlens_core::domain::{PeriodDataset, PeriodLabel};
use periodlens_core::engine::Report;

use crate::config::ReportBook;
use crate::error::ReportError;
use crate::pipeline::build_report;

/// One input extract and the label its period gets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodSource {
    pub label: PeriodLabel,
    pub path: PathBuf,
}

impl PeriodSource {
    pub fn new(label: impl Into<PeriodLabel>, path: impl Into<PathBuf>) -> Self {
        Self {
            label: label.into(),
            path: path.into(),
        }
    }
}

/// The generated sheets of one report book, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct Workbook {
    pub name: String,
    pub reports: Vec<Report>,
}

/// Load every period extract, validating the columns the book requires.
pub fn load_periods(book: &ReportBook, sources: &[PeriodSource]) -> Result<Vec<PeriodDataset>, ReportError> {
    let loader = DatasetLoader::new(book.required_dimensions()?);
    sources
        .par_iter()
        .map(|src| {
            loader.load(src.label.clone(), &src.path).map_err(|source| ReportError::Load {
                period: src.label.clone(),
                source,
            })
        })
        .collect()
}

/// Build every sheet of `book`. Any failing sheet fails the whole workbook.
pub fn build_workbook(book: &ReportBook, periods: &[PeriodDataset]) -> Result<Workbook, ReportError> {
    book.validate()?;
    let reports = book
        .reports
        .par_iter()
        .map(|def| build_report(def, periods))
        .collect::<Result<Vec<_>, _>>()?;

    log::info!("workbook '{}': {} sheets built", book.name, reports.len());
    Ok(Workbook {
        name: book.name.clone(),
        reports,
    })
}

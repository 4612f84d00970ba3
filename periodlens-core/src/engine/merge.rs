//! Period merger: concatenates period datasets and stable-sorts them newest first.

use std::collections::BTreeSet;

use super::EngineError;
use crate::domain::{Dimension, PeriodDataset, PeriodLabel, TransactionRecord};

/// Records from one or more periods, newest first.
///
/// Records with equal timestamps keep their input order (periods in the order
/// supplied, rows in file order). The latest-attribute resolver relies on that
/// tie-break.
#[derive(Debug, Clone)]
pub struct MergedDataset {
    records: Vec<TransactionRecord>,
    periods: Vec<PeriodLabel>,
    columns: BTreeSet<Dimension>,
}

impl MergedDataset {
    pub fn records(&self) -> &[TransactionRecord] {
        &self.records
    }

    /// Period labels in input order, including periods left empty after filtering.
    pub fn periods(&self) -> &[PeriodLabel] {
        &self.periods
    }

    /// Dimension columns present in every merged dataset.
    pub fn columns(&self) -> &BTreeSet<Dimension> {
        &self.columns
    }

    /// Records of one period, still newest first.
    pub fn period_records<'a>(
        &'a self,
        label: &'a PeriodLabel,
    ) -> impl Iterator<Item = &'a TransactionRecord> + 'a {
        self.records.iter().filter(move |r| &r.period == label)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Merge period datasets into one time-descending dataset.
///
/// Rows whose `primary` dimension is blank after trimming are dropped. Fails if
/// a period label repeats or if any dataset lacks `primary` or one of `required`.
pub fn merge(
    datasets: &[PeriodDataset],
    primary: Dimension,
    required: &[Dimension],
) -> Result<MergedDataset, EngineError> {
    let mut seen = BTreeSet::new();
    for ds in datasets {
        if !seen.insert(ds.label().clone()) {
            return Err(EngineError::DuplicatePeriod(ds.label().to_string()));
        }
        for dim in std::iter::once(&primary).chain(required) {
            if !ds.has_column(*dim) {
                return Err(EngineError::InputValidation {
                    dataset: ds.label().to_string(),
                    reason: format!("missing required column '{}'", dim.source_header()),
                });
            }
        }
    }

    let total: usize = datasets.iter().map(|d| d.len()).sum();
    let mut records = Vec::with_capacity(total);
    for ds in datasets {
        let before = records.len();
        records.extend(ds.records().iter().filter(|r| !r.is_blank(primary)).cloned());
        let kept = records.len() - before;
        if kept < ds.len() {
            log::debug!(
                "period '{}': dropped {} rows with blank {}",
                ds.label(),
                ds.len() - kept,
                primary
            );
        }
    }

    // `sort_by` is stable, so equal timestamps keep concatenation order.
    records.sort_by(|a, b| b.shipped_at.cmp(&a.shipped_at));

    let columns = datasets
        .iter()
        .map(|d| d.columns().clone())
        .reduce(|acc, c| acc.intersection(&c).copied().collect())
        .unwrap_or_default();

    log::info!(
        "merged {} periods: {} of {} rows kept",
        datasets.len(),
        records.len(),
        total
    );

    Ok(MergedDataset {
        records,
        periods: datasets.iter().map(|d| d.label().clone()).collect(),
        columns,
    })
}

//! Periods: labeled time windows and the datasets loaded for them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use super::{Dimension, TransactionRecord};

/// Human-readable label of a comparison window (e.g. "this month", "10.01-15").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeriodLabel(pub String);

impl PeriodLabel {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeriodLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PeriodLabel {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for PeriodLabel {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Position of a period within a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodRole {
    /// The primary window every other period is compared against.
    Current,
    Comparison,
    ExtraComparison,
}

impl PeriodRole {
    /// Role of the period at `index` in an ordered period list.
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(PeriodRole::Current),
            1 => Some(PeriodRole::Comparison),
            2 => Some(PeriodRole::ExtraComparison),
            _ => None,
        }
    }
}

/// An immutable, ordered collection of records that share one period label.
///
/// Cloning is cheap: the records sit behind an `Arc` so that concurrent
/// report builders can share one loaded dataset.
#[derive(Debug, Clone)]
pub struct PeriodDataset {
    label: PeriodLabel,
    records: Arc<[TransactionRecord]>,
    columns: BTreeSet<Dimension>,
}

impl PeriodDataset {
    /// Build a dataset. Every record is re-tagged with `label`.
    ///
    /// `columns` lists the dimension columns that were present in the source.
    pub fn new(
        label: impl Into<PeriodLabel>,
        records: Vec<TransactionRecord>,
        columns: BTreeSet<Dimension>,
    ) -> Self {
        let label = label.into();
        let records: Vec<TransactionRecord> = records
            .into_iter()
            .map(|mut r| {
                r.period = label.clone();
                r
            })
            .collect();
        Self {
            label,
            records: records.into(),
            columns,
        }
    }

    /// Build a dataset that claims every dimension column. Handy for in-memory data.
    pub fn with_all_columns(label: impl Into<PeriodLabel>, records: Vec<TransactionRecord>) -> Self {
        Self::new(label, records, Dimension::ALL.into_iter().collect())
    }

    pub fn label(&self) -> &PeriodLabel {
        &self.label
    }

    pub fn records(&self) -> &[TransactionRecord] {
        &self.records
    }

    pub fn columns(&self) -> &BTreeSet<Dimension> {
        &self.columns
    }

    pub fn has_column(&self, dim: Dimension) -> bool {
        self.columns.contains(&dim)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

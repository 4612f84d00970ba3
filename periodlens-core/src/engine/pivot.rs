//! Pivot engine: filtered group-by over records, optionally spread across a column axis.
//!
//! Cells that no record contributes to are absent from the table and read as 0.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::domain::{Dimension, GroupKey, TransactionRecord};

/// Values per group key for one metric in one period.
pub type KeyedValues = BTreeMap<GroupKey, f64>;

/// Column name used when a pivot has no column axis.
pub const TOTAL_COLUMN: &str = "total";

const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggFn {
    Sum,
    CountDistinct,
}

/// The record field an aggregation reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueField {
    Amount,
    ShipDate,
    Dimension(Dimension),
}

/// What spreads a pivot into columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnAxis {
    ShipDate,
    Period,
    Dimension(Dimension),
}

/// Keep (or, when `negate`, drop) records whose `dimension` value is in `values`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub dimension: Dimension,
    pub values: BTreeSet<String>,
    #[serde(default)]
    pub negate: bool,
}

impl Filter {
    pub fn include(dimension: Dimension, values: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            dimension,
            values: values.into_iter().map(Into::into).collect(),
            negate: false,
        }
    }

    pub fn exclude(dimension: Dimension, values: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            negate: true,
            ..Self::include(dimension, values)
        }
    }

    pub fn matches(&self, record: &TransactionRecord) -> bool {
        self.values.contains(record.dimension(self.dimension)) != self.negate
    }
}

/// Full description of one pivot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotSpec {
    pub rows: Vec<Dimension>,
    #[serde(default)]
    pub column: Option<ColumnAxis>,
    pub value: ValueField,
    pub agg: AggFn,
    #[serde(default)]
    pub filters: Vec<Filter>,
}

impl PivotSpec {
    pub fn new(rows: Vec<Dimension>, value: ValueField, agg: AggFn) -> Self {
        Self {
            rows,
            column: None,
            value,
            agg,
            filters: Vec::new(),
        }
    }

    pub fn with_column(mut self, axis: ColumnAxis) -> Self {
        self.column = Some(axis);
        self
    }

    pub fn with_filters(mut self, filters: Vec<Filter>) -> Self {
        self.filters = filters;
        self
    }
}

/// Result of a pivot.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotTable {
    pub row_dims: Vec<Dimension>,
    /// Column names in ascending order; `[TOTAL_COLUMN]` without a column axis.
    pub columns: Vec<String>,
    pub cells: BTreeMap<GroupKey, BTreeMap<String, f64>>,
    spread: bool,
}

impl PivotTable {
    /// Cell value; absent cells read as 0.
    pub fn get(&self, key: &GroupKey, column: &str) -> f64 {
        self.cells
            .get(key)
            .and_then(|row| row.get(column))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn keys(&self) -> impl Iterator<Item = &GroupKey> {
        self.cells.keys()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Row-wise sum across every column.
    pub fn totals(&self) -> KeyedValues {
        self.cells
            .iter()
            .map(|(k, row)| (k.clone(), row.values().sum()))
            .collect()
    }

    /// Row-wise mean across the column axis, absent cells counting as 0.
    ///
    /// `None` when the pivot has no column axis.
    pub fn row_means(&self) -> Option<KeyedValues> {
        if !self.spread || self.columns.is_empty() {
            return None;
        }
        let width = self.columns.len() as f64;
        Some(
            self.cells
                .iter()
                .map(|(k, row)| (k.clone(), row.values().sum::<f64>() / width))
                .collect(),
        )
    }

    /// Per-key values: the row mean for a spread pivot, the single column otherwise.
    pub fn collapse(&self) -> KeyedValues {
        self.row_means().unwrap_or_else(|| self.totals())
    }
}

/// Drop filters whose dimension the dataset does not carry, with a warning.
pub fn usable_filters<'a>(filters: &'a [Filter], available: &BTreeSet<Dimension>) -> Vec<&'a Filter> {
    filters
        .iter()
        .filter(|f| {
            let ok = available.contains(&f.dimension);
            if !ok {
                log::warn!(
                    "filter on '{}' skipped: column not present in dataset",
                    f.dimension.source_header()
                );
            }
            ok
        })
        .collect()
}

/// Records passing every usable filter, in input order.
pub fn filter_records<'a>(
    records: impl IntoIterator<Item = &'a TransactionRecord>,
    filters: &[Filter],
    available: &BTreeSet<Dimension>,
) -> Vec<&'a TransactionRecord> {
    let filters = usable_filters(filters, available);
    records
        .into_iter()
        .filter(|r| filters.iter().all(|f| f.matches(r)))
        .collect()
}

/// Records with a non-blank value in every one of `dims`, in input order.
pub fn drop_blank<'a>(
    records: impl IntoIterator<Item = &'a TransactionRecord>,
    dims: &[Dimension],
) -> Vec<&'a TransactionRecord> {
    let mut dropped = 0usize;
    let kept: Vec<_> = records
        .into_iter()
        .filter(|r| {
            let ok = dims.iter().all(|d| !r.is_blank(*d));
            if !ok {
                dropped += 1;
            }
            ok
        })
        .collect();
    if dropped > 0 {
        log::debug!("dropped {dropped} records blank in a key dimension");
    }
    kept
}

/// Group `records` by `spec.rows` (and the column axis), aggregating `spec.value`.
///
/// `available` lists the dimension columns the source dataset carries; filters
/// on any other dimension are skipped.
pub fn aggregate<'a>(
    records: impl IntoIterator<Item = &'a TransactionRecord>,
    spec: &PivotSpec,
    available: &BTreeSet<Dimension>,
) -> PivotTable {
    let kept = filter_records(records, &spec.filters, available);

    let mut sums: BTreeMap<GroupKey, BTreeMap<String, f64>> = BTreeMap::new();
    let mut distinct: BTreeMap<GroupKey, BTreeMap<String, BTreeSet<String>>> = BTreeMap::new();
    let mut columns = BTreeSet::new();
    for record in kept.iter().copied() {
        let key = GroupKey::from_record(record, &spec.rows);
        let column = column_value(record, spec.column);
        columns.insert(column.clone());

        match spec.agg {
            AggFn::Sum => {
                *sums.entry(key).or_default().entry(column).or_insert(0.0) += numeric_value(record, spec.value);
            }
            AggFn::CountDistinct => {
                distinct
                    .entry(key)
                    .or_default()
                    .entry(column)
                    .or_default()
                    .insert(text_value(record, spec.value));
            }
        }
    }

    let cells = match spec.agg {
        AggFn::Sum => sums,
        AggFn::CountDistinct => distinct
            .into_iter()
            .map(|(k, row)| {
                let row = row.into_iter().map(|(c, set)| (c, set.len() as f64)).collect();
                (k, row)
            })
            .collect(),
    };

    log::debug!(
        "pivot over {:?}: {} records -> {} rows x {} columns",
        spec.rows,
        kept.len(),
        cells.len(),
        columns.len()
    );

    PivotTable {
        row_dims: spec.rows.clone(),
        columns: columns.into_iter().collect(),
        cells,
        spread: spec.column.is_some(),
    }
}

fn column_value(record: &TransactionRecord, axis: Option<ColumnAxis>) -> String {
    match axis {
        None => TOTAL_COLUMN.to_string(),
        Some(ColumnAxis::ShipDate) => record.ship_date().format(DATE_KEY_FORMAT).to_string(),
        Some(ColumnAxis::Period) => record.period.to_string(),
        Some(ColumnAxis::Dimension(d)) => record.dimension(d).to_string(),
    }
}

fn numeric_value(record: &TransactionRecord, field: ValueField) -> f64 {
    match field {
        ValueField::Amount => record.amount,
        // Summing a categorical field counts its rows.
        ValueField::ShipDate | ValueField::Dimension(_) => 1.0,
    }
}

fn text_value(record: &TransactionRecord, field: ValueField) -> String {
    match field {
        ValueField::Amount => record.amount.to_string(),
        ValueField::ShipDate => record.ship_date().format(DATE_KEY_FORMAT).to_string(),
        ValueField::Dimension(d) => record.dimension(d).to_string(),
    }
}

//! Multi-period comparator.
//!
//! Takes per-period metric tables and produces one row per group key seen in
//! any period, with value, diff-vs-current and ratio-vs-current columns for
//! every comparison period. The first period is always the current one.

use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};

use super::pivot::KeyedValues;
use super::ratio::{compute_diff, compute_ratio, normalize, Ratio, ZeroBaselinePolicy};
use super::EngineError;
use crate::domain::{Dimension, GroupKey, PeriodLabel, PeriodRole};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Normalization {
    #[default]
    None,
    /// Divide by the period's active-day count before comparing.
    PerActiveDay,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricSpec {
    pub name: String,
    #[serde(default)]
    pub normalization: Normalization,
}

impl MetricSpec {
    pub fn raw(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            normalization: Normalization::None,
        }
    }

    pub fn per_active_day(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            normalization: Normalization::PerActiveDay,
        }
    }
}

/// Everything the comparator needs from one period.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodAggregates {
    pub label: PeriodLabel,
    pub active_days: usize,
    pub metrics: BTreeMap<String, KeyedValues>,
}

impl PeriodAggregates {
    pub fn new(label: impl Into<PeriodLabel>, active_days: usize) -> Self {
        Self {
            label: label.into(),
            active_days,
            metrics: BTreeMap::new(),
        }
    }

    pub fn with_metric(mut self, name: impl Into<String>, values: KeyedValues) -> Self {
        self.metrics.insert(name.into(), values);
        self
    }

    /// Raw value of `metric` for `key`; 0 when absent.
    pub fn raw(&self, metric: &str, key: &GroupKey) -> f64 {
        self.metrics
            .get(metric)
            .and_then(|t| t.get(key))
            .copied()
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Value,
    Diff,
    Ratio,
}

/// One metric column of a comparison table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub metric: String,
    pub metric_index: usize,
    pub period: PeriodLabel,
    pub role: PeriodRole,
    pub kind: ColumnKind,
}

impl ColumnSpec {
    fn new(metric_index: usize, metric: &str, period: &PeriodLabel, role: PeriodRole, kind: ColumnKind) -> Self {
        let name = match kind {
            ColumnKind::Value => format!("{metric} ({period})"),
            ColumnKind::Diff => format!("{metric} diff vs {period}"),
            ColumnKind::Ratio => format!("{metric} ratio vs {period} (%)"),
        };
        Self {
            name,
            metric: metric.to_string(),
            metric_index,
            period: period.clone(),
            role,
            kind,
        }
    }

    fn canonical_rank(&self) -> (usize, PeriodRole, ColumnKind) {
        (self.metric_index, self.role, self.kind)
    }
}

/// A single output cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    /// A ratio over a zero baseline under `ZeroBaselinePolicy::Undefined`.
    Undefined,
}

impl Cell {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<Ratio> for Cell {
    fn from(r: Ratio) -> Self {
        match r {
            Ratio::Percent(v) => Cell::Number(v),
            Ratio::Undefined => Cell::Undefined,
        }
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Cell::Text(s) => serializer.serialize_str(s),
            Cell::Number(v) => serializer.serialize_f64(*v),
            Cell::Undefined => serializer.serialize_none(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRow {
    pub key: GroupKey,
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonTable {
    pub row_dims: Vec<Dimension>,
    pub periods: Vec<PeriodLabel>,
    pub columns: Vec<ColumnSpec>,
    pub rows: Vec<ComparisonRow>,
}

impl ComparisonTable {
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Index of the `kind` column of `metric` for the period in `role`.
    pub fn find(&self, metric: &str, role: PeriodRole, kind: ColumnKind) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.metric == metric && c.role == role && c.kind == kind)
    }

    pub fn row(&self, key: &GroupKey) -> Option<&ComparisonRow> {
        self.rows
            .binary_search_by(|r| r.key.cmp(key))
            .ok()
            .map(|i| &self.rows[i])
    }

    /// True if any column belongs to `period`.
    pub fn references_period(&self, period: &PeriodLabel) -> bool {
        self.columns.iter().any(|c| &c.period == period)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Order columns per metric: current value, then value, diff and ratio for
    /// each comparison period. Works from any permutation of the columns.
    pub fn reorder_canonical(&mut self) {
        let mut order: Vec<usize> = (0..self.columns.len()).collect();
        order.sort_by_key(|&i| self.columns[i].canonical_rank());
        if order.iter().enumerate().all(|(pos, &i)| pos == i) {
            return;
        }

        self.columns = order.iter().map(|&i| self.columns[i].clone()).collect();
        for row in &mut self.rows {
            row.cells = order.iter().map(|&i| row.cells[i].clone()).collect();
        }
    }
}

/// Compare 2 or 3 periods over the union of their group keys.
pub fn compare(
    periods: &[PeriodAggregates],
    metrics: &[MetricSpec],
    row_dims: &[Dimension],
    policy: ZeroBaselinePolicy,
) -> Result<ComparisonTable, EngineError> {
    if !(2..=3).contains(&periods.len()) {
        return Err(EngineError::PeriodCount(periods.len()));
    }
    let mut labels = BTreeSet::new();
    for p in periods {
        if !labels.insert(&p.label) {
            return Err(EngineError::DuplicatePeriod(p.label.to_string()));
        }
    }
    let mut names = BTreeSet::new();
    for m in metrics {
        if !names.insert(m.name.as_str()) {
            return Err(EngineError::DuplicateMetric(m.name.clone()));
        }
    }

    let mut keys = BTreeSet::new();
    for p in periods {
        for m in metrics {
            let Some(table) = p.metrics.get(&m.name) else {
                continue;
            };
            for key in table.keys() {
                if key.len() != row_dims.len() {
                    return Err(EngineError::KeyArity {
                        key: key.to_string(),
                        expected: row_dims.len(),
                        actual: key.len(),
                    });
                }
                keys.insert(key);
            }
        }
    }

    let roles: Vec<PeriodRole> = (0..periods.len())
        .filter_map(PeriodRole::from_index)
        .collect();

    // Generation order: every value column, then diff/ratio per comparison period.
    let mut columns = Vec::new();
    for (mi, m) in metrics.iter().enumerate() {
        for (p, role) in periods.iter().zip(&roles) {
            columns.push(ColumnSpec::new(mi, &m.name, &p.label, *role, ColumnKind::Value));
        }
    }
    for (p, role) in periods.iter().zip(&roles).skip(1) {
        for (mi, m) in metrics.iter().enumerate() {
            columns.push(ColumnSpec::new(mi, &m.name, &p.label, *role, ColumnKind::Diff));
            columns.push(ColumnSpec::new(mi, &m.name, &p.label, *role, ColumnKind::Ratio));
        }
    }

    let rows: Vec<ComparisonRow> = keys
        .into_iter()
        .map(|key| {
            let values: Vec<Vec<f64>> = metrics
                .iter()
                .map(|m| {
                    periods
                        .iter()
                        .map(|p| {
                            let raw = p.raw(&m.name, key);
                            match m.normalization {
                                Normalization::None => raw,
                                Normalization::PerActiveDay => normalize(raw, p.active_days),
                            }
                        })
                        .collect()
                })
                .collect();

            let cells = columns
                .iter()
                .map(|col| {
                    let pi = periods
                        .iter()
                        .position(|p| p.label == col.period)
                        .unwrap_or(0);
                    let current = values[col.metric_index][0];
                    let this = values[col.metric_index][pi];
                    match col.kind {
                        ColumnKind::Value => Cell::Number(this),
                        ColumnKind::Diff => Cell::Number(compute_diff(current, this)),
                        ColumnKind::Ratio => compute_ratio(current, this, policy).into(),
                    }
                })
                .collect();

            ComparisonRow {
                key: key.clone(),
                cells,
            }
        })
        .collect();

    log::info!(
        "compared {} periods: {} rows x {} metric columns",
        periods.len(),
        rows.len(),
        columns.len()
    );

    let mut table = ComparisonTable {
        row_dims: row_dims.to_vec(),
        periods: periods.iter().map(|p| p.label.clone()).collect(),
        columns,
        rows,
    };
    table.reorder_canonical();
    Ok(table)
}

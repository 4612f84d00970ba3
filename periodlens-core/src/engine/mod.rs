//! Comparative aggregation engine.
//!
//! Merge → {active days, pivot, latest attribute} → ratio/diff → compare → assemble.
//! Every function here is pure and synchronous; nothing touches disk.

pub mod active_days;
pub mod assemble;
pub mod compare;
pub mod error;
pub mod latest;
pub mod merge;
pub mod pivot;
pub mod ratio;
pub mod rollup;

pub use active_days::{active_days_by_period, count_active_days, date_span};
pub use assemble::{
    describe_date_range, Report, ReportAssembler, ReportContext, SortOrder, SummaryEntry, SummaryItem,
    SummaryStat, SummaryTable,
};
pub use compare::{
    compare, Cell, ColumnKind, ColumnSpec, ComparisonRow, ComparisonTable, MetricSpec, Normalization,
    PeriodAggregates,
};
pub use error::{Component, EngineError};
pub use latest::{resolve_latest, LatestAttributes};
pub use merge::{merge, MergedDataset};
pub use pivot::{aggregate, drop_blank, filter_records, AggFn, ColumnAxis, Filter, KeyedValues, PivotSpec, PivotTable, ValueField, TOTAL_COLUMN};
pub use ratio::{compute_diff, compute_ratio, normalize, round_to, Ratio, ZeroBaselinePolicy, RATIO_DECIMALS};
pub use rollup::{rollup, RollupSpec};

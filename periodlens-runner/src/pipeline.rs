//! Report pipelines: one engine run per sheet, shaped by its `ReportKind`.
//!
//! `periods` is ordered current, comparison, then the optional extra comparison.

use std::collections::BTreeMap;

use periodlens_core::domain::{Dimension, PeriodDataset, PeriodRole};
use periodlens_core::engine::{
    active_days_by_period, aggregate, compare, drop_blank, filter_records, merge, resolve_latest,
    round_to, AggFn, ColumnAxis, ColumnKind, Component, ComparisonTable, EngineError, Filter,
    KeyedValues, MetricSpec, PeriodAggregates, PivotSpec, PivotTable, Report, ReportAssembler,
    ReportContext, RollupSpec, SortOrder, SummaryItem, SummaryStat, ValueField, ZeroBaselinePolicy,
    RATIO_DECIMALS,
};

use crate::config::{CustomerRatioSettings, ReportDefinition, ReportKind};
use crate::error::ReportError;

/// Daily-mean distinct customers.
pub const DAILY_ACTIVE: &str = "daily_active";
/// Daily-mean amount.
pub const AMOUNT: &str = "amount";
/// Distinct shipment dates per customer.
pub const ACTIVE_DAYS: &str = "active_days";

/// Zero-baseline policy of each report kind.
pub fn zero_baseline_policy(kind: &ReportKind) -> ZeroBaselinePolicy {
    match kind {
        ReportKind::WindowComparison => ZeroBaselinePolicy::Undefined,
        ReportKind::CustomerRatio(_) => ZeroBaselinePolicy::Zero,
    }
}

/// Build one sheet from already-loaded periods.
pub fn build_report(def: &ReportDefinition, periods: &[PeriodDataset]) -> Result<Report, ReportError> {
    log::info!("building sheet '{}' over {} periods", def.sheet_name, periods.len());
    match &def.kind {
        ReportKind::WindowComparison => window_comparison(def, periods),
        ReportKind::CustomerRatio(settings) => customer_ratio(def, settings, periods),
    }
}

fn window_comparison(def: &ReportDefinition, periods: &[PeriodDataset]) -> Result<Report, ReportError> {
    let sheet = def.sheet_name.as_str();
    let rows = def.row_dimensions()?;
    let required: Vec<Dimension> = def.required_dimensions()?.into_iter().collect();
    let filters = def.resolved_filters();

    // A record blank in any grouping field or in the customer it counts is skipped.
    let mut key_dims = rows.clone();
    if !key_dims.contains(&Dimension::Customer) {
        key_dims.push(Dimension::Customer);
    }

    let mut context = ReportContext::default();
    let mut aggregates = Vec::with_capacity(periods.len());

    for (index, ds) in periods.iter().enumerate() {
        let label = ds.label();
        let merged = merge(std::slice::from_ref(ds), rows[0], &required)
            .map_err(ReportError::stage(sheet, Component::Merger, Some(label)))?;
        let kept = drop_blank(filter_records(merged.records(), &filters, merged.columns()), &key_dims);

        if index == 0 {
            context = ReportContext::from_records(kept.iter().copied());
        }

        let daily_active = PivotSpec::new(
            rows.clone(),
            ValueField::Dimension(Dimension::Customer),
            AggFn::CountDistinct,
        )
        .with_column(ColumnAxis::ShipDate);
        let amount = PivotSpec::new(rows.clone(), ValueField::Amount, AggFn::Sum).with_column(ColumnAxis::ShipDate);

        // Daily means need no active-day normalization.
        aggregates.push(
            PeriodAggregates::new(label.clone(), 0)
                .with_metric(
                    DAILY_ACTIVE,
                    daily_mean(&aggregate(kept.iter().copied(), &daily_active, merged.columns())),
                )
                .with_metric(
                    AMOUNT,
                    daily_mean(&aggregate(kept.iter().copied(), &amount, merged.columns())),
                ),
        );
    }

    let metrics = [MetricSpec::raw(DAILY_ACTIVE), MetricSpec::raw(AMOUNT)];
    let table = compare(&aggregates, &metrics, &rows, zero_baseline_policy(&def.kind))
        .map_err(ReportError::stage(sheet, Component::Comparator, None))?;

    ReportAssembler::new(sheet)
        .context(context)
        .assemble(&table)
        .map_err(ReportError::stage(sheet, Component::Assembler, None))
}

/// Row mean of a ship-date pivot, rounded before any diff or ratio is taken.
fn daily_mean(table: &PivotTable) -> KeyedValues {
    table
        .collapse()
        .into_iter()
        .map(|(key, value)| (key, round_to(value, RATIO_DECIMALS)))
        .collect()
}

fn customer_ratio(
    def: &ReportDefinition,
    settings: &CustomerRatioSettings,
    periods: &[PeriodDataset],
) -> Result<Report, ReportError> {
    let sheet = def.sheet_name.as_str();
    let rows = def.row_dimensions()?;
    let required: Vec<Dimension> = def.required_dimensions()?.into_iter().collect();
    let attribute = def.attribute()?.unwrap_or(Dimension::Salesperson);
    let filters = def.resolved_filters();

    let merged = merge(periods, rows[0], &required)
        .map_err(ReportError::stage(sheet, Component::Merger, None))?;
    let latest = resolve_latest(&merged, &rows, attribute);
    let day_counts = active_days_by_period(&merged);
    let rollup = RollupSpec::new(settings.rollup_name.clone(), settings.categories.iter().cloned());

    let mut aggregates = Vec::with_capacity(merged.periods().len());
    for label in merged.periods() {
        let kept = filter_records(merged.period_records(label), &filters, merged.columns());

        let mut metrics = BTreeMap::new();
        let active = PivotSpec::new(rows.clone(), ValueField::ShipDate, AggFn::CountDistinct);
        metrics.insert(
            ACTIVE_DAYS.to_string(),
            aggregate(kept.iter().copied(), &active, merged.columns()).totals(),
        );
        for category in &settings.categories {
            let sales = PivotSpec::new(rows.clone(), ValueField::Amount, AggFn::Sum)
                .with_filters(vec![Filter::include(Dimension::Category, [category.clone()])]);
            metrics.insert(
                category.clone(),
                aggregate(kept.iter().copied(), &sales, merged.columns()).totals(),
            );
        }
        rollup
            .apply(&mut metrics)
            .map_err(ReportError::stage(sheet, Component::Rollup, Some(label)))?;

        aggregates.push(PeriodAggregates {
            label: label.clone(),
            active_days: day_counts.get(label).copied().unwrap_or(0),
            metrics,
        });
    }

    let mut metrics = vec![MetricSpec::per_active_day(ACTIVE_DAYS)];
    metrics.extend(settings.categories.iter().map(MetricSpec::per_active_day));
    metrics.push(MetricSpec::per_active_day(settings.rollup_name.clone()));

    let table = compare(&aggregates, &metrics, &rows, zero_baseline_policy(&def.kind))
        .map_err(ReportError::stage(sheet, Component::Comparator, None))?;

    let column = |metric: &str, role: PeriodRole, kind: ColumnKind| {
        column_name(&table, metric, role, kind).map_err(ReportError::stage(sheet, Component::Assembler, None))
    };

    let current_total = column(&settings.rollup_name, PeriodRole::Current, ColumnKind::Value)?;
    let mut summary = vec![SummaryItem::new("customers", "", SummaryStat::RowCount)];
    for (label, role) in merged.periods().iter().zip([PeriodRole::Current, PeriodRole::Comparison]) {
        summary.push(SummaryItem::new(
            format!("active customers ({label})"),
            "",
            SummaryStat::PositiveCount {
                column: column(ACTIVE_DAYS, role, ColumnKind::Value)?,
            },
        ));
    }
    for (label, role) in merged.periods().iter().zip([PeriodRole::Current, PeriodRole::Comparison]) {
        summary.push(SummaryItem::new(
            format!("{} per active day ({label})", settings.rollup_name),
            "",
            SummaryStat::Total {
                column: column(&settings.rollup_name, role, ColumnKind::Value)?,
            },
        ));
    }
    summary.push(SummaryItem::new(
        format!("mean {} ratio", settings.rollup_name),
        "%",
        SummaryStat::Mean {
            column: column(&settings.rollup_name, PeriodRole::Comparison, ColumnKind::Ratio)?,
        },
    ));
    summary.push(SummaryItem::new(
        "mean active-days ratio",
        "%",
        SummaryStat::Mean {
            column: column(ACTIVE_DAYS, PeriodRole::Comparison, ColumnKind::Ratio)?,
        },
    ));

    let context = merged
        .periods()
        .first()
        .map(|current| ReportContext::from_records(merged.period_records(current)))
        .unwrap_or_default();

    ReportAssembler::new(sheet)
        .attribute(attribute.source_header(), latest)
        .sort_by(current_total, SortOrder::Descending)
        .summary(summary)
        .context(context)
        .assemble(&table)
        .map_err(ReportError::stage(sheet, Component::Assembler, None))
}

fn column_name(table: &ComparisonTable, metric: &str, role: PeriodRole, kind: ColumnKind) -> Result<String, EngineError> {
    table
        .find(metric, role, kind)
        .map(|i| table.columns[i].name.clone())
        .ok_or_else(|| EngineError::UnknownColumn(format!("{metric} ({role:?} {kind:?})")))
}

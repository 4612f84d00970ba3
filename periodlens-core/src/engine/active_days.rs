//! Active-day counting: distinct calendar dates with at least one shipment.

use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

use super::merge::MergedDataset;
use crate::domain::{PeriodLabel, TransactionRecord};

/// Distinct calendar dates among the records of `period`.
///
/// Returns 0 for an empty period. Never divide by the result directly; use
/// `ratio::normalize`.
pub fn count_active_days<'a>(
    records: impl IntoIterator<Item = &'a TransactionRecord>,
    period: &PeriodLabel,
) -> usize {
    records
        .into_iter()
        .filter(|r| &r.period == period)
        .map(|r| r.ship_date())
        .collect::<BTreeSet<NaiveDate>>()
        .len()
}

/// Active-day count for every period of a merged dataset, in one pass.
pub fn active_days_by_period(merged: &MergedDataset) -> BTreeMap<PeriodLabel, usize> {
    let mut dates: BTreeMap<&PeriodLabel, BTreeSet<NaiveDate>> =
        merged.periods().iter().map(|p| (p, BTreeSet::new())).collect();
    for r in merged.records() {
        if let Some(set) = dates.get_mut(&r.period) {
            set.insert(r.ship_date());
        }
    }
    let counts: BTreeMap<PeriodLabel, usize> = dates
        .into_iter()
        .map(|(p, set)| (p.clone(), set.len()))
        .collect();
    for (period, days) in &counts {
        log::info!("period '{period}': {days} active days");
    }
    counts
}

/// First and last shipment date among `records`.
pub fn date_span<'a>(
    records: impl IntoIterator<Item = &'a TransactionRecord>,
) -> Option<(NaiveDate, NaiveDate)> {
    records.into_iter().fold(None, |span, r| {
        let d = r.ship_date();
        Some(match span {
            None => (d, d),
            Some((lo, hi)) => (lo.min(d), hi.max(d)),
        })
    })
}

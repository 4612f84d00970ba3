//! TransactionRecord: one shipped order line from an extract.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::{Dimension, PeriodLabel};

/// A single shipment line, tagged with the period it was loaded for.
///
/// Records are created once by the loader and never mutated afterwards.
/// Dimension columns missing from the source extract hold empty strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub customer: String,
    pub salesperson: String,
    pub region: String,
    pub category: String,
    pub route: String,
    pub shipped_at: NaiveDateTime,
    pub amount: f64,
    pub period: PeriodLabel,
}

impl TransactionRecord {
    /// Value of the given dimension for this record.
    pub fn dimension(&self, dim: Dimension) -> &str {
        match dim {
            Dimension::Customer => &self.customer,
            Dimension::Salesperson => &self.salesperson,
            Dimension::Region => &self.region,
            Dimension::Category => &self.category,
            Dimension::Route => &self.route,
        }
    }

    /// Calendar date of the shipment.
    pub fn ship_date(&self) -> NaiveDate {
        self.shipped_at.date()
    }

    /// True when the given dimension is blank after trimming.
    pub fn is_blank(&self, dim: Dimension) -> bool {
        self.dimension(dim).trim().is_empty()
    }
}

/// Builder-style constructor used by tests and benches.
///
/// Only customer, timestamp, amount and period are mandatory; everything else
/// defaults to an empty string.
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    record: TransactionRecord,
}

impl RecordBuilder {
    pub fn new(
        period: impl Into<PeriodLabel>,
        customer: impl Into<String>,
        shipped_at: NaiveDateTime,
        amount: f64,
    ) -> Self {
        Self {
            record: TransactionRecord {
                customer: customer.into(),
                salesperson: String::new(),
                region: String::new(),
                category: String::new(),
                route: String::new(),
                shipped_at,
                amount,
                period: period.into(),
            },
        }
    }

    pub fn salesperson(mut self, value: impl Into<String>) -> Self {
        self.record.salesperson = value.into();
        self
    }

    pub fn region(mut self, value: impl Into<String>) -> Self {
        self.record.region = value.into();
        self
    }

    pub fn category(mut self, value: impl Into<String>) -> Self {
        self.record.category = value.into();
        self
    }

    pub fn route(mut self, value: impl Into<String>) -> Self {
        self.record.route = value.into();
        self
    }

    pub fn build(self) -> TransactionRecord {
        self.record
    }
}

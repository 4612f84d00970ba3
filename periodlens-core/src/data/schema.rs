//! Header resolution and required-column validation for extracts.

use polars::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

use crate::domain::Dimension;

/// Headers accepted for the shipment timestamp column.
pub const SHIPPED_AT_HEADERS: [&str; 2] = ["发货时间", "shipped_at"];

/// Headers accepted for the amount column.
pub const AMOUNT_HEADERS: [&str; 2] = ["实际金额", "amount"];

/// Expected shape of a transaction extract.
///
/// The shipment timestamp and amount columns are always required. Dimension
/// columns are required only when the report declares them necessary; the
/// others are picked up when present.
#[derive(Debug, Clone, Default)]
pub struct ExtractSchema {
    required: BTreeSet<Dimension>,
}

/// Actual column names found in a DataFrame for each canonical field.
#[derive(Debug, Clone)]
pub struct ResolvedColumns {
    pub shipped_at: String,
    pub amount: String,
    pub dimensions: BTreeMap<Dimension, String>,
}

impl ResolvedColumns {
    /// Dimensions present in the source.
    pub fn available(&self) -> BTreeSet<Dimension> {
        self.dimensions.keys().copied().collect()
    }
}

impl ExtractSchema {
    pub fn new(required: impl IntoIterator<Item = Dimension>) -> Self {
        Self {
            required: required.into_iter().collect(),
        }
    }

    /// Map canonical fields to the DataFrame's column names.
    ///
    /// Header names are compared after trimming; English aliases ignore ASCII case.
    pub fn resolve(&self, df: &DataFrame) -> Result<ResolvedColumns, SchemaError> {
        let names: Vec<String> = df
            .get_column_names()
            .into_iter()
            .map(|n| n.to_string())
            .collect();

        let shipped_at = find_column(&names, &SHIPPED_AT_HEADERS)
            .ok_or_else(|| SchemaError::MissingColumn(SHIPPED_AT_HEADERS[0].to_string()))?;
        let amount = find_column(&names, &AMOUNT_HEADERS)
            .ok_or_else(|| SchemaError::MissingColumn(AMOUNT_HEADERS[0].to_string()))?;

        let mut dimensions = BTreeMap::new();
        for dim in Dimension::ALL {
            if let Some(name) = find_column(&names, &[dim.source_header(), dim.name()]) {
                dimensions.insert(dim, name);
            } else if self.required.contains(&dim) {
                return Err(SchemaError::MissingColumn(dim.source_header().to_string()));
            }
        }

        Ok(ResolvedColumns {
            shipped_at,
            amount,
            dimensions,
        })
    }
}

fn find_column(names: &[String], headers: &[&str]) -> Option<String> {
    names
        .iter()
        .find(|name| {
            let trimmed = name.trim();
            headers
                .iter()
                .any(|h| trimmed == *h || trimmed.eq_ignore_ascii_case(h))
        })
        .cloned()
}

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Missing required column: {0}")]
    MissingColumn(String),
}

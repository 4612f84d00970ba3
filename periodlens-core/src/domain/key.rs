//! GroupKey: the tuple of dimension values identifying one output row.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Dimension, TransactionRecord};

/// Ordered dimension values, e.g. `["R1", "Vegetables"]` for a route+category row.
///
/// Ordering is lexicographic over the parts, which gives comparison tables a
/// deterministic row order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupKey(pub Vec<String>);

impl GroupKey {
    /// Project a record onto the given dimensions.
    pub fn from_record(record: &TransactionRecord, dims: &[Dimension]) -> Self {
        Self(dims.iter().map(|d| record.dimension(*d).to_string()).collect())
    }

    pub fn single(value: impl Into<String>) -> Self {
        Self(vec![value.into()])
    }

    pub fn parts(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(" / "))
    }
}

impl<S: Into<String>> FromIterator<S> for GroupKey {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

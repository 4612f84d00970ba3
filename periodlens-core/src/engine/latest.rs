//! Latest-attribute resolution: each key's attribute from its newest record.

use std::collections::BTreeMap;

use super::merge::MergedDataset;
use crate::domain::{Dimension, GroupKey};

/// The most recent value of one attribute per group key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LatestAttributes {
    values: BTreeMap<GroupKey, String>,
}

impl LatestAttributes {
    pub fn get(&self, key: &GroupKey) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Value of `attribute` on the newest record of each key.
///
/// `merged` is already newest-first with a stable tie-break, so the first
/// record seen for a key wins.
pub fn resolve_latest(merged: &MergedDataset, key_dims: &[Dimension], attribute: Dimension) -> LatestAttributes {
    let mut values = BTreeMap::new();
    for record in merged.records() {
        values
            .entry(GroupKey::from_record(record, key_dims))
            .or_insert_with(|| record.dimension(attribute).to_string());
    }
    log::debug!("resolved latest {} for {} keys", attribute, values.len());
    LatestAttributes { values }
}

//! Derived roll-up metrics: static sums over already-aggregated category tables.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::pivot::KeyedValues;
use super::EngineError;

/// A derived metric that sums several materialized metrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollupSpec {
    pub name: String,
    pub members: Vec<String>,
}

impl RollupSpec {
    pub fn new(name: impl Into<String>, members: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            name: name.into(),
            members: members.into_iter().map(Into::into).collect(),
        }
    }

    /// Compute the roll-up from `metrics` and insert it under `self.name`.
    pub fn apply(&self, metrics: &mut BTreeMap<String, KeyedValues>) -> Result<(), EngineError> {
        let mut parts = Vec::with_capacity(self.members.len());
        for member in &self.members {
            let table = metrics.get(member).ok_or_else(|| EngineError::UnknownRollupMember {
                rollup: self.name.clone(),
                member: member.clone(),
            })?;
            parts.push(table);
        }
        let total = rollup(parts);
        metrics.insert(self.name.clone(), total);
        Ok(())
    }
}

/// Sum tables over the union of their keys.
pub fn rollup<'a>(parts: impl IntoIterator<Item = &'a KeyedValues>) -> KeyedValues {
    let mut total = KeyedValues::new();
    for part in parts {
        for (key, value) in part {
            *total.entry(key.clone()).or_insert(0.0) += value;
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::GroupKey;

    fn keyed(pairs: &[(&str, f64)]) -> KeyedValues {
        pairs.iter().map(|(k, v)| (GroupKey::single(*k), *v)).collect()
    }

    #[test]
    fn sums_over_union() {
        let veg = keyed(&[("A", 10.0), ("B", 5.0)]);
        let meat = keyed(&[("B", 7.0), ("C", 1.0)]);
        let total = rollup([&veg, &meat]);

        assert_eq!(total, keyed(&[("A", 10.0), ("B", 12.0), ("C", 1.0)]));
    }

    #[test]
    fn apply_inserts_rollup() {
        let mut metrics = BTreeMap::new();
        metrics.insert("veg".to_string(), keyed(&[("A", 1.0)]));
        metrics.insert("tofu".to_string(), keyed(&[("A", 2.0)]));

        RollupSpec::new("fresh", ["veg", "tofu"]).apply(&mut metrics).unwrap();
        assert_eq!(metrics["fresh"], keyed(&[("A", 3.0)]));
    }

    #[test]
    fn unknown_member_is_an_error() {
        let mut metrics = BTreeMap::new();
        let err = RollupSpec::new("fresh", ["veg"]).apply(&mut metrics).unwrap_err();
        assert_eq!(
            err,
            EngineError::UnknownRollupMember {
                rollup: "fresh".into(),
                member: "veg".into()
            }
        );
    }
}

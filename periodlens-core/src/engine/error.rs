//! Engine errors and the component names used to attribute them.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors raised by the aggregation engine.
///
/// Zero denominators are not errors; see `ratio::ZeroBaselinePolicy`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("dataset '{dataset}' failed validation: {reason}")]
    InputValidation { dataset: String, reason: String },

    #[error("comparison needs 2 or 3 periods, got {0}")]
    PeriodCount(usize),

    #[error("period '{0}' supplied more than once")]
    DuplicatePeriod(String),

    #[error("metric '{0}' declared more than once")]
    DuplicateMetric(String),

    #[error("group key {key} has {actual} parts, expected {expected}")]
    KeyArity {
        key: String,
        expected: usize,
        actual: usize,
    },

    #[error("roll-up '{rollup}' references unknown metric '{member}'")]
    UnknownRollupMember { rollup: String, member: String },

    #[error("unknown column '{0}'")]
    UnknownColumn(String),
}

/// Pipeline stage, used to say where a report failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    Loader,
    Merger,
    ActiveDayCounter,
    Pivot,
    LatestAttribute,
    Rollup,
    Comparator,
    Assembler,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Component::Loader => "loader",
            Component::Merger => "period merger",
            Component::ActiveDayCounter => "active-day counter",
            Component::Pivot => "pivot engine",
            Component::LatestAttribute => "latest-attribute resolver",
            Component::Rollup => "roll-up",
            Component::Comparator => "multi-period comparator",
            Component::Assembler => "report assembler",
        };
        f.write_str(name)
    }
}

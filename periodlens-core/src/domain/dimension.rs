//! Dimensions: the categorical columns a report can group or filter on.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A categorical column of a transaction extract.
///
/// The set is closed: configuration refers to dimensions by their snake_case
/// name, and an unknown name never reaches the engine as a `Dimension`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Customer,
    Salesperson,
    Region,
    Category,
    Route,
}

impl Dimension {
    pub const ALL: [Dimension; 5] = [
        Dimension::Customer,
        Dimension::Salesperson,
        Dimension::Region,
        Dimension::Category,
        Dimension::Route,
    ];

    /// Canonical snake_case name, as used in configuration.
    pub fn name(&self) -> &'static str {
        match self {
            Dimension::Customer => "customer",
            Dimension::Salesperson => "salesperson",
            Dimension::Region => "region",
            Dimension::Category => "category",
            Dimension::Route => "route",
        }
    }

    /// Column header used by the upstream business system's extracts.
    pub fn source_header(&self) -> &'static str {
        match self {
            Dimension::Customer => "客户名称",
            Dimension::Salesperson => "业务员",
            Dimension::Region => "区域",
            Dimension::Category => "一级分类",
            Dimension::Route => "线路名称",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("unknown dimension '{0}'")]
pub struct UnknownDimension(pub String);

impl FromStr for Dimension {
    type Err = UnknownDimension;

    /// Accepts the snake_case name or the source header, ignoring surrounding whitespace
    /// and ASCII case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Dimension::ALL
            .into_iter()
            .find(|d| d.name().eq_ignore_ascii_case(trimmed) || d.source_header() == trimmed)
            .ok_or_else(|| UnknownDimension(trimmed.to_string()))
    }
}

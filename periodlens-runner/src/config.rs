//! Declarative report definitions, loaded from TOML.
//!
//! A `ReportBook` is one workbook: an ordered list of sheets, each a
//! `ReportDefinition` naming its row fields, filters and report kind.

use periodlens_core::domain::Dimension;
use periodlens_core::engine::Filter;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// Category filter applied by the default salesperson-vegetables sheet.
pub const VEGETABLES: &str = "新鲜蔬菜";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("parse report TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("serialize report book: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("sheet '{sheet}': unknown row field '{name}'")]
    UnknownDimension { sheet: String, name: String },

    #[error("sheet '{sheet}': unknown attribute '{name}'")]
    UnknownAttribute { sheet: String, name: String },

    #[error("sheet '{0}': no row fields")]
    EmptyRowFields(String),

    #[error("sheet '{0}': customer ratio report needs at least one category")]
    NoCategories(String),

    #[error("duplicate sheet name '{0}'")]
    DuplicateSheet(String),

    #[error("report book '{0}' has no sheets")]
    NoReports(String),
}

/// A filter as written in configuration: dimension by name, values, and
/// whether the match is reversed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOption {
    pub key: String,
    pub values: Vec<String>,
    #[serde(default)]
    pub reverse: bool,
}

impl FilterOption {
    /// Typed filter, or `None` (with a warning) when `key` names no known dimension.
    pub fn resolve(&self) -> Option<Filter> {
        match self.key.parse::<Dimension>() {
            Ok(dimension) => Some(Filter {
                dimension,
                values: self.values.iter().cloned().collect(),
                negate: self.reverse,
            }),
            Err(e) => {
                log::warn!("filter skipped: {e}");
                None
            }
        }
    }
}

/// Settings of the per-customer fresh-food ratio report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRatioSettings {
    /// Categories compared one by one and summed into the roll-up.
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,
    #[serde(default = "default_rollup_name")]
    pub rollup_name: String,
    /// Attribute resolved from each customer's most recent record.
    #[serde(default = "default_attribute")]
    pub attribute: String,
}

impl Default for CustomerRatioSettings {
    fn default() -> Self {
        Self {
            categories: default_categories(),
            rollup_name: default_rollup_name(),
            attribute: default_attribute(),
        }
    }
}

fn default_categories() -> Vec<String> {
    vec!["新鲜蔬菜".into(), "鲜肉类".into(), "豆制品".into()]
}

fn default_rollup_name() -> String {
    "生鲜".into()
}

fn default_attribute() -> String {
    Dimension::Salesperson.name().into()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReportKind {
    /// Daily-mean distinct customers and amount across 2 or 3 windows.
    #[default]
    WindowComparison,
    /// Per-active-day category sales per customer, month over month.
    CustomerRatio(CustomerRatioSettings),
}

/// One sheet of a workbook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportDefinition {
    pub sheet_name: String,
    /// Dimension names (`"customer"`, `"route"`, ... or the source headers).
    #[serde(default)]
    pub row_fields: Vec<String>,
    #[serde(default)]
    pub filters: Vec<FilterOption>,
    #[serde(default)]
    pub kind: ReportKind,
}

impl ReportDefinition {
    pub fn window(sheet_name: &str, row_fields: &[Dimension]) -> Self {
        Self {
            sheet_name: sheet_name.to_string(),
            row_fields: row_fields.iter().map(|d| d.name().to_string()).collect(),
            filters: Vec::new(),
            kind: ReportKind::WindowComparison,
        }
    }

    pub fn with_filter(mut self, key: Dimension, values: &[&str], reverse: bool) -> Self {
        self.filters.push(FilterOption {
            key: key.name().to_string(),
            values: values.iter().map(|v| v.to_string()).collect(),
            reverse,
        });
        self
    }

    /// Typed row fields. Unknown names are an error, unlike unknown filters.
    pub fn row_dimensions(&self) -> Result<Vec<Dimension>, ConfigError> {
        if self.row_fields.is_empty() {
            return Err(ConfigError::EmptyRowFields(self.sheet_name.clone()));
        }
        self.row_fields
            .iter()
            .map(|name| {
                name.parse::<Dimension>().map_err(|_| ConfigError::UnknownDimension {
                    sheet: self.sheet_name.clone(),
                    name: name.clone(),
                })
            })
            .collect()
    }

    /// Filters whose key names a known dimension.
    pub fn resolved_filters(&self) -> Vec<Filter> {
        self.filters.iter().filter_map(FilterOption::resolve).collect()
    }

    /// Attribute dimension of a customer ratio report.
    pub fn attribute(&self) -> Result<Option<Dimension>, ConfigError> {
        match &self.kind {
            ReportKind::WindowComparison => Ok(None),
            ReportKind::CustomerRatio(settings) => settings
                .attribute
                .parse::<Dimension>()
                .map(Some)
                .map_err(|_| ConfigError::UnknownAttribute {
                    sheet: self.sheet_name.clone(),
                    name: settings.attribute.clone(),
                }),
        }
    }

    /// Dimension columns every input extract must carry for this sheet.
    pub fn required_dimensions(&self) -> Result<BTreeSet<Dimension>, ConfigError> {
        let mut dims: BTreeSet<Dimension> = self.row_dimensions()?.into_iter().collect();
        match &self.kind {
            // Daily actives count distinct customers.
            ReportKind::WindowComparison => {
                dims.insert(Dimension::Customer);
            }
            ReportKind::CustomerRatio(settings) => {
                if settings.categories.is_empty() {
                    return Err(ConfigError::NoCategories(self.sheet_name.clone()));
                }
                dims.insert(Dimension::Category);
            }
        }
        dims.extend(self.attribute()?);
        Ok(dims)
    }
}

/// An ordered set of sheets generated together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportBook {
    pub name: String,
    #[serde(rename = "report", default)]
    pub reports: Vec<ReportDefinition>,
}

impl ReportBook {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let book: Self = toml::from_str(content)?;
        book.validate()?;
        Ok(book)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check every sheet's row fields and that sheet names are unique.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reports.is_empty() {
            return Err(ConfigError::NoReports(self.name.clone()));
        }
        let mut names = BTreeSet::new();
        for def in &self.reports {
            if !names.insert(def.sheet_name.as_str()) {
                return Err(ConfigError::DuplicateSheet(def.sheet_name.clone()));
            }
            def.required_dimensions()?;
        }
        Ok(())
    }

    /// Union of the dimension columns required by every sheet.
    pub fn required_dimensions(&self) -> Result<BTreeSet<Dimension>, ConfigError> {
        let mut dims = BTreeSet::new();
        for def in &self.reports {
            dims.extend(def.required_dimensions()?);
        }
        Ok(dims)
    }

    /// The five-sheet daily comparison workbook.
    pub fn default_daily() -> Self {
        Self {
            name: "daily".into(),
            reports: vec![
                ReportDefinition::window("品类数据", &[Dimension::Category]),
                ReportDefinition::window("业务数据", &[Dimension::Salesperson]),
                ReportDefinition::window("业务蔬菜数据", &[Dimension::Salesperson]).with_filter(
                    Dimension::Category,
                    &[VEGETABLES],
                    false,
                ),
                ReportDefinition::window("线路数据", &[Dimension::Route]),
                ReportDefinition::window("线路品类", &[Dimension::Route, Dimension::Category]),
            ],
        }
    }

    /// The single-sheet customer fresh-food ratio workbook.
    pub fn default_customer_ratio() -> Self {
        Self {
            name: "customer_ratio".into(),
            reports: vec![ReportDefinition {
                sheet_name: "客户生鲜环比".into(),
                row_fields: vec![Dimension::Customer.name().into()],
                filters: Vec::new(),
                kind: ReportKind::CustomerRatio(CustomerRatioSettings::default()),
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_daily_has_five_sheets() {
        let book = ReportBook::default_daily();
        assert_eq!(book.reports.len(), 5);
        book.validate().unwrap();

        let veg = &book.reports[2];
        let filters = veg.resolved_filters();
        assert_eq!(filters.len(), 1);
        assert_eq!(filters[0].dimension, Dimension::Category);
        assert!(!filters[0].negate);

        assert_eq!(
            book.reports[4].row_dimensions().unwrap(),
            vec![Dimension::Route, Dimension::Category]
        );
    }

    #[test]
    fn toml_roundtrip() {
        for book in [ReportBook::default_daily(), ReportBook::default_customer_ratio()] {
            let toml_str = book.to_toml().unwrap();
            let parsed = ReportBook::from_toml(&toml_str).unwrap();
            assert_eq!(book, parsed);
        }
    }

    #[test]
    fn parses_hand_written_toml() {
        let book = ReportBook::from_toml(
            r#"
            name = "custom"

            [[report]]
            sheet_name = "regions"
            row_fields = ["区域"]

            [[report.filters]]
            key = "category"
            values = ["干货"]
            reverse = true

            [[report]]
            sheet_name = "ratio"
            row_fields = ["customer"]
            [report.kind]
            type = "customer_ratio"
            categories = ["鲜肉类"]
            "#,
        )
        .unwrap();

        assert_eq!(book.reports[0].row_dimensions().unwrap(), vec![Dimension::Region]);
        assert!(book.reports[0].resolved_filters()[0].negate);
        match &book.reports[1].kind {
            ReportKind::CustomerRatio(s) => {
                assert_eq!(s.categories, vec!["鲜肉类"]);
                assert_eq!(s.rollup_name, "生鲜");
                assert_eq!(s.attribute, "salesperson");
            }
            other => panic!("unexpected kind {other:?}"),
        }

        let required = book.required_dimensions().unwrap();
        assert!(required.contains(&Dimension::Salesperson));
        assert!(required.contains(&Dimension::Category));
        assert!(!required.contains(&Dimension::Route));
    }

    #[test]
    fn unknown_row_field_is_an_error() {
        let def = ReportDefinition {
            sheet_name: "s".into(),
            row_fields: vec!["warehouse".into()],
            filters: Vec::new(),
            kind: ReportKind::WindowComparison,
        };
        assert!(matches!(
            def.row_dimensions(),
            Err(ConfigError::UnknownDimension { ref name, .. }) if name == "warehouse"
        ));
    }

    #[test]
    fn unknown_filter_key_is_skipped() {
        let mut def = ReportDefinition::window("s", &[Dimension::Route]);
        def.filters.push(FilterOption {
            key: "warehouse".into(),
            values: vec!["W1".into()],
            reverse: false,
        });
        assert!(def.resolved_filters().is_empty());
    }

    #[test]
    fn duplicate_sheets_and_empty_books_are_rejected() {
        let mut book = ReportBook::default_daily();
        book.reports.push(ReportDefinition::window("品类数据", &[Dimension::Category]));
        assert!(matches!(book.validate(), Err(ConfigError::DuplicateSheet(_))));

        let empty = ReportBook {
            name: "empty".into(),
            reports: Vec::new(),
        };
        assert!(matches!(empty.validate(), Err(ConfigError::NoReports(_))));
    }

    #[test]
    fn from_file_reports_missing_path() {
        let err = ReportBook::from_file(Path::new("/nonexistent/book.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}

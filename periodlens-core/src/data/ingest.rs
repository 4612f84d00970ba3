//! Extract ingestion: CSV and Parquet files into typed period datasets.
//!
//! Amounts lose their thousands separators and fall back to 0. Rows with an
//! empty shipment time are dropped; an unparseable one is an error.

use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;
use std::path::Path;

use crate::data::schema::{ExtractSchema, SchemaError};
use crate::domain::{Dimension, PeriodDataset, PeriodLabel, TransactionRecord};

const DATETIME_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M",
];

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

/// Loads period extracts (CSV or Parquet) into validated `PeriodDataset`s.
pub struct DatasetLoader {
    schema: ExtractSchema,
}

impl DatasetLoader {
    /// A loader that rejects extracts missing any of `required`.
    pub fn new(required: impl IntoIterator<Item = Dimension>) -> Self {
        Self {
            schema: ExtractSchema::new(required),
        }
    }

    /// Load one extract, choosing the reader from the file extension.
    pub fn load(&self, label: impl Into<PeriodLabel>, path: &Path) -> Result<PeriodDataset, DataError> {
        let source = path.display().to_string();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        let df = match extension.as_str() {
            "csv" => read_csv(path),
            "parquet" => read_parquet(path),
            _ => {
                return Err(DataError::UnsupportedFormat {
                    dataset: source,
                    extension,
                })
            }
        }
        .map_err(|e| DataError::IngestFailed {
            dataset: source.clone(),
            reason: e.to_string(),
        })?;

        log::info!("read {} rows from {}", df.height(), source);
        self.from_dataframe(label, &df, &source)
    }

    /// Convert an already-read DataFrame into a dataset.
    ///
    /// `source` names the dataset in errors. Rows with an empty shipment time
    /// are dropped; a non-empty one that cannot be parsed is rejected.
    pub fn from_dataframe(
        &self,
        label: impl Into<PeriodLabel>,
        df: &DataFrame,
        source: &str,
    ) -> Result<PeriodDataset, DataError> {
        let label = label.into();
        let columns = self.schema.resolve(df).map_err(|e| DataError::Schema {
            dataset: source.to_string(),
            source: e,
        })?;

        let polars_err = |e: PolarsError| DataError::IngestFailed {
            dataset: source.to_string(),
            reason: e.to_string(),
        };

        let shipped = string_values(df, &columns.shipped_at).map_err(polars_err)?;
        let amounts = string_values(df, &columns.amount).map_err(polars_err)?;

        let mut dims: Vec<(Dimension, Vec<Option<String>>)> = Vec::new();
        for (dim, name) in &columns.dimensions {
            dims.push((*dim, string_values(df, name).map_err(polars_err)?));
        }

        let mut records = Vec::with_capacity(df.height());
        let mut dropped = 0usize;

        for (row, raw_ts) in shipped.iter().enumerate() {
            let raw_ts = match raw_ts.as_deref().map(str::trim) {
                Some(s) if !s.is_empty() => s,
                _ => {
                    dropped += 1;
                    continue;
                }
            };
            let shipped_at = parse_timestamp(raw_ts).ok_or_else(|| DataError::InvalidTimestamp {
                dataset: source.to_string(),
                row,
                value: raw_ts.to_string(),
            })?;

            let mut record = TransactionRecord {
                customer: String::new(),
                salesperson: String::new(),
                region: String::new(),
                category: String::new(),
                route: String::new(),
                shipped_at,
                amount: amounts[row].as_deref().map(parse_amount).unwrap_or(0.0),
                period: label.clone(),
            };
            for (dim, values) in &dims {
                let value = values[row].clone().unwrap_or_default();
                match dim {
                    Dimension::Customer => record.customer = value,
                    Dimension::Salesperson => record.salesperson = value,
                    Dimension::Region => record.region = value,
                    Dimension::Category => record.category = value,
                    Dimension::Route => record.route = value,
                }
            }
            records.push(record);
        }

        if dropped > 0 {
            log::warn!("{source}: dropped {dropped} rows without a shipment time");
        }
        log::debug!("{source}: loaded {} records for period '{label}'", records.len());

        Ok(PeriodDataset::new(label, records, columns.available()))
    }
}

/// Read a CSV extract with every column as a string; typing happens during conversion.
pub fn read_csv(path: &Path) -> PolarsResult<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()
}

/// Read a Parquet extract.
pub fn read_parquet(path: &Path) -> PolarsResult<DataFrame> {
    let file = std::fs::File::open(path)?;
    ParquetReader::new(file).finish()
}

fn string_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<String>>> {
    let column = df.column(name)?.cast(&DataType::String)?;
    let ca = column.str()?;
    Ok(ca.into_iter().map(|v| v.map(str::to_string)).collect())
}

/// Parse an amount, tolerating thousands separators. Anything else becomes 0.
pub fn parse_amount(raw: &str) -> f64 {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// Parse a shipment timestamp. Date-only values are taken as midnight.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("dataset '{dataset}' failed validation: {source}")]
    Schema {
        dataset: String,
        source: SchemaError,
    },

    #[error("dataset '{dataset}': unparseable shipment time '{value}' at row {row}")]
    InvalidTimestamp {
        dataset: String,
        row: usize,
        value: String,
    },

    #[error("dataset '{dataset}': unsupported file extension '{extension}'")]
    UnsupportedFormat { dataset: String, extension: String },

    #[error("Ingest failed for '{dataset}': {reason}")]
    IngestFailed { dataset: String, reason: String },
}

impl DataError {
    /// Name of the dataset the error refers to.
    pub fn dataset(&self) -> &str {
        match self {
            DataError::Schema { dataset, .. }
            | DataError::InvalidTimestamp { dataset, .. }
            | DataError::UnsupportedFormat { dataset, .. }
            | DataError::IngestFailed { dataset, .. } => dataset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract() -> DataFrame {
        df!(
            "客户名称" => &["Acme", "Bolt", "Acme"],
            "业务员" => &["Lin", "Zhou", "Wu"],
            "发货时间" => &["2024-10-01 08:00:00", "", "2024-10-02"],
            "实际金额" => &["1,200.50", "30", "n/a"],
            "一级分类" => &["新鲜蔬菜", "鲜肉类", "豆制品"],
        )
        .unwrap()
    }

    #[test]
    fn converts_rows_and_coerces_amounts() {
        let loader = DatasetLoader::new([Dimension::Customer, Dimension::Category]);
        let ds = loader.from_dataframe("this month", &extract(), "fixture").unwrap();

        // Bolt has no shipment time and is dropped.
        assert_eq!(ds.len(), 2);
        let first = &ds.records()[0];
        assert_eq!(first.customer, "Acme");
        assert_eq!(first.salesperson, "Lin");
        assert_eq!(first.amount, 1200.5);
        assert_eq!(ds.records()[1].amount, 0.0);
        assert_eq!(ds.records()[1].shipped_at.to_string(), "2024-10-02 00:00:00");
        assert!(!ds.has_column(Dimension::Route));
        assert_eq!(ds.records()[1].route, "");
    }

    #[test]
    fn missing_required_column_names_dataset() {
        let loader = DatasetLoader::new([Dimension::Route]);
        let err = loader.from_dataframe("this month", &extract(), "orders.csv").unwrap_err();

        assert_eq!(err.dataset(), "orders.csv");
        assert!(err.to_string().contains("线路名称"));
    }

    #[test]
    fn garbage_timestamp_is_rejected() {
        let df = df!(
            "客户名称" => &["Acme"],
            "发货时间" => &["yesterday"],
            "实际金额" => &["1"],
        )
        .unwrap();

        let err = DatasetLoader::new([]).from_dataframe("p", &df, "x.csv").unwrap_err();
        assert!(matches!(err, DataError::InvalidTimestamp { row: 0, .. }));
    }

    #[test]
    fn numeric_columns_are_accepted() {
        let df = df!(
            "customer" => &["Acme"],
            "shipped_at" => &["2024-10-01T08:30:00"],
            "amount" => &[99.5],
        )
        .unwrap();

        let ds = DatasetLoader::new([Dimension::Customer])
            .from_dataframe("p", &df, "mem")
            .unwrap();
        assert_eq!(ds.records()[0].amount, 99.5);
    }

    #[test]
    fn parse_helpers() {
        assert_eq!(parse_amount(" 12 "), 12.0);
        assert_eq!(parse_amount(""), 0.0);
        assert_eq!(parse_amount("NaN"), 0.0);
        assert!(parse_timestamp("2024/10/01 17:05:00").is_some());
        assert!(parse_timestamp("2024-10-01 17:05:00.000").is_some());
        assert!(parse_timestamp("01.10.2024").is_none());
    }

    #[test]
    fn load_rejects_unknown_extension() {
        let err = DatasetLoader::new([])
            .load("p", Path::new("orders.xlsx"))
            .unwrap_err();
        assert!(matches!(err, DataError::UnsupportedFormat { .. }));
    }

    #[test]
    fn load_reads_csv_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orders.csv");
        std::fs::write(
            &path,
            "客户名称,业务员,发货时间,实际金额,一级分类\n\
             Acme,Lin,2024-10-01 08:00:00,100,新鲜蔬菜\n\
             Bolt,Zhou,2024-10-02 09:00:00,abc,鲜肉类\n",
        )
        .unwrap();

        let ds = DatasetLoader::new([Dimension::Customer, Dimension::Category])
            .load("this month", &path)
            .unwrap();

        assert_eq!(ds.len(), 2);
        assert_eq!(ds.records()[0].amount, 100.0);
        assert_eq!(ds.records()[1].amount, 0.0);
        assert_eq!(ds.records()[1].category, "鲜肉类");
    }
}

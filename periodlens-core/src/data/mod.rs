//! Dataset loading: extract reading, column normalization, required-column validation

pub mod ingest;
pub mod schema;

pub use ingest::{parse_amount, parse_timestamp, read_csv, read_parquet, DataError, DatasetLoader};
pub use schema::{ExtractSchema, ResolvedColumns, SchemaError};

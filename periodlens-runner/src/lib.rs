//! PeriodLens Runner: report books, per-kind pipelines, workbook export.
//!
//! This crate builds on `periodlens-core` to provide:
//! - TOML report definitions with the stock daily and customer-ratio books
//! - Window comparison and customer ratio pipelines
//! - Parallel workbook generation over shared period datasets
//! - CSV, JSON and Markdown export with a fingerprinted manifest

pub mod config;
pub mod error;
pub mod export;
pub mod fingerprint;
pub mod pipeline;
pub mod workbook;

pub use config::{
    ConfigError, CustomerRatioSettings, FilterOption, ReportBook, ReportDefinition, ReportKind,
};
pub use error::ReportError;
pub use export::{
    export_csv, export_json, export_summary_csv, generate_markdown, load_manifest, save_workbook,
    WorkbookManifest, SCHEMA_VERSION,
};
pub use fingerprint::dataset_fingerprint;
pub use pipeline::{build_report, zero_baseline_policy};
pub use workbook::{build_workbook, load_periods, PeriodSource, Workbook};

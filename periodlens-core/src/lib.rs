//! PeriodLens Core: domain types, dataset loading and the comparative aggregation engine.
//!
//! This crate contains:
//! - Domain types (records, periods, dimensions, group keys)
//! - The extract loader (CSV / Parquet via polars)
//! - Period merge, active-day counting and pivoting
//! - Latest-attribute resolution
//! - Diff/ratio calculation and the multi-period comparator
//! - Report assembly

pub mod data;
pub mod domain;
pub mod engine;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: everything shared across report workers is Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<domain::TransactionRecord>();
        require_sync::<domain::TransactionRecord>();
        require_send::<domain::PeriodDataset>();
        require_sync::<domain::PeriodDataset>();
        require_send::<domain::GroupKey>();
        require_sync::<domain::GroupKey>();

        // Engine types
        require_send::<engine::MergedDataset>();
        require_sync::<engine::MergedDataset>();
        require_send::<engine::PivotTable>();
        require_sync::<engine::PivotTable>();
        require_send::<engine::ComparisonTable>();
        require_sync::<engine::ComparisonTable>();
        require_send::<engine::Report>();
        require_sync::<engine::Report>();
        require_send::<engine::EngineError>();
        require_sync::<engine::EngineError>();

        // Loader
        require_send::<data::DatasetLoader>();
        require_sync::<data::DatasetLoader>();
        require_send::<data::DataError>();
        require_sync::<data::DataError>();
    }

    #[test]
    fn send_sync_check_compiles() {
        assert_send_sync();
    }
}

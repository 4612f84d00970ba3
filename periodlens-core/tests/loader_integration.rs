//! Integration tests for the extract loader: CSV and Parquet from disk.

use polars::prelude::*;
use std::path::Path;

use periodlens_core::data::{DataError, DatasetLoader};
use periodlens_core::domain::Dimension;
use periodlens_core::engine::{count_active_days, merge};

const ORDERS_CSV: &str = "\
 客户名称 ,业务员,发货时间,实际金额,一级分类,线路名称
Acme,Lin,2024-10-01 08:00:00,\"1,000.00\",新鲜蔬菜,R1
Acme,Lin,2024-10-01 15:30:00,250,鲜肉类,R1
Bolt,Zhou,2024-10-02 09:10:00,oops,豆制品,R2
,Wu,2024-10-02 10:00:00,99,新鲜蔬菜,R2
Crane,Wu,,12,新鲜蔬菜,R3
";

fn write(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    path
}

#[test]
fn csv_extract_loads_and_feeds_the_engine() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "this_month.csv", ORDERS_CSV);

    let loader = DatasetLoader::new([Dimension::Customer, Dimension::Category, Dimension::Route]);
    let ds = loader.load("this month", &path).unwrap();

    // Crane has no shipment time; the blank customer survives loading.
    assert_eq!(ds.len(), 4);
    assert_eq!(ds.records()[0].amount, 1000.0);
    assert_eq!(ds.records()[2].amount, 0.0);
    assert!(ds.has_column(Dimension::Salesperson));
    assert!(!ds.has_column(Dimension::Region));

    let merged = merge(&[ds], Dimension::Customer, &[Dimension::Category]).unwrap();
    assert_eq!(merged.len(), 3);
    assert_eq!(merged.records()[0].customer, "Bolt");
    assert_eq!(count_active_days(merged.records(), &"this month".into()), 2);
}

#[test]
fn english_headers_are_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        dir.path(),
        "orders.csv",
        "customer,salesperson,shipped_at,amount\nAcme,Lin,2024-10-01T08:00:00,5\n",
    );

    let ds = DatasetLoader::new([Dimension::Customer, Dimension::Salesperson])
        .load("p", &path)
        .unwrap();
    assert_eq!(ds.records()[0].salesperson, "Lin");
}

#[test]
fn missing_declared_column_is_rejected_before_the_engine() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        dir.path(),
        "orders.csv",
        "客户名称,发货时间,实际金额\nAcme,2024-10-01,5\n",
    );

    let err = DatasetLoader::new([Dimension::Route]).load("p", &path).unwrap_err();
    assert!(matches!(err, DataError::Schema { .. }));
    assert!(err.dataset().ends_with("orders.csv"));
}

#[test]
fn parquet_extract_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("orders.parquet");

    let mut df = df!(
        "客户名称" => &["Acme", "Bolt"],
        "发货时间" => &["2024-10-01 08:00:00", "2024-10-03 08:00:00"],
        "实际金额" => &[10.5, 20.0],
    )
    .unwrap();
    let file = std::fs::File::create(&path).unwrap();
    ParquetWriter::new(file).finish(&mut df).unwrap();

    let ds = DatasetLoader::new([Dimension::Customer]).load("p", &path).unwrap();
    assert_eq!(ds.len(), 2);
    assert_eq!(ds.records()[1].amount, 20.0);
}

#[test]
fn missing_file_reports_ingest_failure() {
    let err = DatasetLoader::new([])
        .load("p", Path::new("/nonexistent/orders.csv"))
        .unwrap_err();
    assert!(matches!(err, DataError::IngestFailed { .. }));
}

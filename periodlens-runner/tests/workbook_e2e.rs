//! End-to-end: extracts on disk -> loaded periods -> workbook -> saved bundle.

use std::path::{Path, PathBuf};

use periodlens_runner::{
    build_workbook, dataset_fingerprint, load_manifest, load_periods, save_workbook, PeriodSource,
    ReportBook, ReportError,
};

const CURRENT_CSV: &str = "\
客户名称,业务员,发货时间,实际金额,一级分类,线路名称
A,Lin,2024-10-02 09:00:00,100,新鲜蔬菜,R1
A,Lin,2024-10-03 09:00:00,60,鲜肉类,R1
B,Zhou,2024-10-03 10:00:00,300,鲜肉类,R2
";

const COMPARE_CSV: &str = "\
客户名称,业务员,发货时间,实际金额,一级分类,线路名称
A,Wu,2024-09-02 09:00:00,50,新鲜蔬菜,R1
C,Wu,2024-09-03 09:00:00,20,豆制品,R3
";

fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    path
}

fn sources(dir: &Path) -> Vec<PeriodSource> {
    vec![
        PeriodSource::new("current", write(dir, "current.csv", CURRENT_CSV)),
        PeriodSource::new("compare", write(dir, "compare.csv", COMPARE_CSV)),
    ]
}

#[test]
fn daily_workbook_from_csv_extracts() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempfile::tempdir().unwrap();
    let book = ReportBook::default_daily();

    let periods = load_periods(&book, &sources(dir.path())).unwrap();
    assert_eq!(periods[0].label().as_str(), "current");
    assert_eq!(periods[0].len(), 3);

    let workbook = build_workbook(&book, &periods).unwrap();
    assert_eq!(workbook.reports.len(), 5);

    let routes = &workbook.reports[3];
    assert_eq!(routes.sheet_name, "线路数据");
    assert_eq!(routes.title, "线路数据 (shipped 10.02-03)");
    assert_eq!(routes.columns[0], "线路名称");
    assert_eq!(routes.len(), 3);

    let out = tempfile::tempdir().unwrap();
    let run_dir = save_workbook(&workbook, &periods, out.path()).unwrap();

    let manifest = load_manifest(&run_dir).unwrap();
    assert_eq!(manifest.workbook, "daily");
    assert_eq!(manifest.periods, vec!["current", "compare"]);
    assert_eq!(manifest.dataset_hash, dataset_fingerprint(&periods));
    assert_eq!(manifest.sheets.len(), 5);
    assert!(manifest.sheets.iter().all(|s| s.summary_file.is_none()));

    let csv = std::fs::read_to_string(run_dir.join(&manifest.sheets[3].file)).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert!(lines[0].starts_with("线路名称,"));
    assert!(lines[0].ends_with("amount ratio vs compare (%)"));
    // R2 shipped nothing in the comparison window: its ratio cells are empty.
    let r2 = lines.iter().find(|l| l.starts_with("R2,")).unwrap();
    assert!(r2.ends_with(','));
}

#[test]
fn customer_ratio_workbook_has_summary() {
    let dir = tempfile::tempdir().unwrap();
    let book = ReportBook::default_customer_ratio();

    let periods = load_periods(&book, &sources(dir.path())).unwrap();
    let workbook = build_workbook(&book, &periods).unwrap();
    let report = &workbook.reports[0];

    assert_eq!(report.len(), 3);
    let summary = report.summary.as_ref().unwrap();
    assert_eq!(summary.get("customers"), Some(3.0));
    assert_eq!(summary.get("active customers (current)"), Some(2.0));

    let out = tempfile::tempdir().unwrap();
    let run_dir = save_workbook(&workbook, &periods, out.path()).unwrap();
    let manifest = load_manifest(&run_dir).unwrap();
    let summary_file = manifest.sheets[0].summary_file.as_ref().unwrap();
    let csv = std::fs::read_to_string(run_dir.join(summary_file)).unwrap();
    assert!(csv.starts_with("label,value,unit\ncustomers,3,\n"));
}

#[test]
fn report_book_from_toml_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("book.toml");
    std::fs::write(&path, ReportBook::default_daily().to_toml().unwrap()).unwrap();

    let book = ReportBook::from_file(&path).unwrap();
    assert_eq!(book, ReportBook::default_daily());
}

#[test]
fn missing_required_column_fails_loading() {
    let dir = tempfile::tempdir().unwrap();
    let no_route = "客户名称,业务员,发货时间,实际金额,一级分类\nA,Lin,2024-10-02 09:00:00,1,新鲜蔬菜\n";
    let sources = vec![
        PeriodSource::new("current", write(dir.path(), "current.csv", no_route)),
        PeriodSource::new("compare", write(dir.path(), "compare.csv", COMPARE_CSV)),
    ];

    let err = load_periods(&ReportBook::default_daily(), &sources).unwrap_err();
    assert!(matches!(err, ReportError::Load { ref period, .. } if period.as_str() == "current"));
    assert!(err.to_string().contains("线路名称"));
}

//! PeriodLens CLI: generate comparison workbooks from period extracts.
//!
//! Commands:
//! - `daily`: window comparison workbook over 2 or 3 extracts
//! - `customer-ratio`: per-customer fresh-food ratio, this month vs last month
//! - `init-config`: write a stock report book as TOML for editing

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

use periodlens_runner::{
    build_workbook, export_json, load_periods, save_workbook, PeriodSource, ReportBook, Workbook,
};

#[derive(Parser)]
#[command(
    name = "periodlens",
    about = "PeriodLens CLI: period-over-period sales comparison reports"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Daily window comparison: current vs compare, plus an optional extra window.
    Daily {
        /// Extract for the current window (CSV or Parquet).
        #[arg(long)]
        current: PathBuf,

        /// Extract for the comparison window.
        #[arg(long)]
        compare: PathBuf,

        /// Extract for an extra comparison window.
        #[arg(long)]
        extra: Option<PathBuf>,

        /// Report book TOML. Defaults to the five stock daily sheets.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Labels for the periods, in current, compare, extra order.
        #[arg(long, value_delimiter = ',', default_value = "current,compare,extra")]
        labels: Vec<String>,

        /// Output directory for the workbook bundle.
        #[arg(long, default_value = "reports")]
        output_dir: PathBuf,

        /// Also print every sheet as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Customer fresh-food ratio: this month vs last month.
    CustomerRatio {
        /// Extract for this month.
        #[arg(long)]
        current: PathBuf,

        /// Extract for last month.
        #[arg(long)]
        compare: PathBuf,

        /// Report book TOML. Defaults to the stock customer ratio sheet.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output directory for the workbook bundle.
        #[arg(long, default_value = "reports")]
        output_dir: PathBuf,

        /// Also print the sheet as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Write a stock report book as TOML.
    InitConfig {
        #[arg(long, value_enum, default_value_t = BookKind::Daily)]
        kind: BookKind,

        /// Destination file.
        #[arg(long)]
        output: PathBuf,

        /// Overwrite an existing file.
        #[arg(long, default_value_t = false)]
        force: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum BookKind {
    Daily,
    CustomerRatio,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Daily {
            current,
            compare,
            extra,
            config,
            labels,
            output_dir,
            json,
        } => {
            let mut paths = vec![current, compare];
            paths.extend(extra);
            let book = load_book(config.as_deref(), ReportBook::default_daily)?;
            let sources = period_sources(&labels, paths)?;
            run_book(&book, &sources, &output_dir, json)
        }
        Commands::CustomerRatio {
            current,
            compare,
            config,
            output_dir,
            json,
        } => {
            let book = load_book(config.as_deref(), ReportBook::default_customer_ratio)?;
            let sources = vec![
                PeriodSource::new("this month", current),
                PeriodSource::new("last month", compare),
            ];
            run_book(&book, &sources, &output_dir, json)
        }
        Commands::InitConfig {
            kind,
            output,
            force,
        } => run_init_config(kind, &output, force),
    }
}

fn load_book(path: Option<&Path>, default: fn() -> ReportBook) -> Result<ReportBook> {
    match path {
        Some(path) => ReportBook::from_file(path)
            .with_context(|| format!("failed to load report book {}", path.display())),
        None => Ok(default()),
    }
}

fn period_sources(labels: &[String], paths: Vec<PathBuf>) -> Result<Vec<PeriodSource>> {
    if labels.len() < paths.len() {
        bail!(
            "{} extracts given but only {} labels: {}",
            paths.len(),
            labels.len(),
            labels.join(",")
        );
    }
    Ok(labels
        .iter()
        .zip(paths)
        .map(|(label, path)| PeriodSource::new(label.as_str(), path))
        .collect())
}

fn run_book(book: &ReportBook, sources: &[PeriodSource], output_dir: &Path, json: bool) -> Result<()> {
    let periods = load_periods(book, sources)?;
    let workbook = build_workbook(book, &periods)?;

    print_summary(&workbook);
    if json {
        for report in &workbook.reports {
            println!("{}", export_json(report)?);
        }
    }

    let run_dir = save_workbook(&workbook, &periods, output_dir)?;
    println!("Workbook saved to: {}", run_dir.display());
    Ok(())
}

fn run_init_config(kind: BookKind, output: &Path, force: bool) -> Result<()> {
    if output.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", output.display());
    }
    let book = match kind {
        BookKind::Daily => ReportBook::default_daily(),
        BookKind::CustomerRatio => ReportBook::default_customer_ratio(),
    };
    std::fs::write(output, book.to_toml()?)
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!("Report book written to: {}", output.display());
    Ok(())
}

fn print_summary(workbook: &Workbook) {
    println!();
    println!("=== {} ===", workbook.name);
    for report in &workbook.reports {
        println!("{:<24} {:>6} rows  {}", report.sheet_name, report.len(), report.title);
        if let Some(summary) = &report.summary {
            for e in &summary.entries {
                println!("    {:<32} {:>12.2}{}", e.label, e.value, e.unit);
            }
        }
    }
    println!();
}

//! Batch processing command for a folder of invoice PDFs.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use dealsheet_core::batch::expand_pattern;
use dealsheet_core::sink::{delimited, table_rows, write_status_log, write_table, OutputFormat};
use dealsheet_core::{discover_inputs, BatchRunner, DealInvoiceParser, ParseOutcome};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input directory or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output table (.xlsx for a workbook, anything else for CSV)
    #[arg(short, long)]
    output: PathBuf,

    /// Status log path (default: <output stem>.status.csv)
    #[arg(long)]
    log: Option<PathBuf>,

    /// Number of parallel workers (default: from config)
    #[arg(short = 'j', long)]
    jobs: Option<usize>,

    /// Also write a CSV copy of an XLSX table
    #[arg(long)]
    also_csv: bool,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = super::config::load(config_path)?;

    let files = collect_inputs(&args.input, config.batch.recursive)?;
    if files.is_empty() {
        anyhow::bail!("No PDF files found for input: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    let progress = ProgressBar::new(files.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let workers = args.jobs.unwrap_or_else(|| config.batch.effective_workers());
    let parser = Arc::new(DealInvoiceParser::from_config(&config));
    let tick = progress.clone();
    let runner = BatchRunner::new(parser, workers).with_progress(move |_| tick.inc(1));

    let outcomes = runner.run(files).await;
    progress.finish_and_clear();

    if let Some(parent) = args.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let rows = write_table(&args.output, &outcomes)?;
    println!(
        "{} Wrote {} rows to {}",
        style("✓").green(),
        rows,
        args.output.display()
    );

    if args.also_csv && OutputFormat::from_path(&args.output) == OutputFormat::Xlsx {
        let csv_path = args.output.with_extension("csv");
        delimited::write_csv(&csv_path, &table_rows(&outcomes))?;
        println!("{} CSV copy written to {}", style("✓").green(), csv_path.display());
    }

    let log_path = args.log.clone().unwrap_or_else(|| default_log_path(&args.output));
    write_status_log(&log_path, &outcomes)?;
    debug!("Wrote status log to {}", log_path.display());

    print_summary(&outcomes, &log_path, start);

    Ok(())
}

/// A directory is enumerated; anything else is a glob pattern.
fn collect_inputs(input: &str, recursive: bool) -> anyhow::Result<Vec<PathBuf>> {
    let path = Path::new(input);
    let files = if path.is_dir() {
        discover_inputs(path, recursive)?
    } else {
        expand_pattern(input)?
            .into_iter()
            .filter(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
            })
            .collect()
    };
    Ok(files)
}

fn default_log_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("invoices");
    output.with_file_name(format!("{}.status.csv", stem))
}

fn print_summary(outcomes: &[ParseOutcome], log_path: &Path, start: Instant) {
    let failed: Vec<_> = outcomes.iter().filter(|o| !o.is_success()).collect();
    let successful = outcomes.len() - failed.len();
    let with_notes = outcomes
        .iter()
        .filter(|o| o.is_success() && !o.note().is_empty())
        .count();

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        outcomes.len(),
        start.elapsed()
    );
    println!(
        "   {} successful ({} with warnings), {} failed",
        style(successful).green(),
        style(with_notes).yellow(),
        style(failed.len()).red()
    );
    println!("   Status log: {}", log_path.display());

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for outcome in &failed {
            println!("  - {}: {}", outcome.source_file(), outcome.note());
        }
    }
}

//! Process command - extract data from a single invoice file.

use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use tracing::{debug, info, warn};

use dealsheet_core::invoice::rules::format_amount;
use dealsheet_core::sink::{delimited, table_rows};
use dealsheet_core::{DealInvoiceParser, InvoiceParser, ParseOutcome, ParsedInvoice};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input PDF file
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV table rows
    Csv,
    /// Plain text summary
    Text,
}

/// Parse one document, turning a panic in a backend into a failure outcome.
fn parse_guarded(parser: &dyn InvoiceParser, source_file: &str, data: &[u8]) -> ParseOutcome {
    panic::catch_unwind(AssertUnwindSafe(|| parser.parse(source_file, data))).unwrap_or_else(
        |payload| {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            warn!("{}: parser panicked: {}", source_file, message);
            ParseOutcome::failure(source_file, format!("parser panicked: {}", message))
        },
    )
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = super::config::load(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let data = fs::read(&args.input)?;
    let parser = DealInvoiceParser::from_config(&config);
    let outcome = parse_guarded(&parser, &args.input.display().to_string(), &data);

    let parsed = match &outcome {
        ParseOutcome::Success(parsed) => parsed,
        ParseOutcome::Failure(failure) => {
            anyhow::bail!("Failed to parse {}: {}", failure.source_file, failure.reason)
        }
    };

    for diagnostic in &parsed.diagnostics {
        eprintln!("{} {}", style("!").yellow(), diagnostic);
    }

    let output = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(parsed)?,
        OutputFormat::Csv => {
            let mut buffer = Vec::new();
            delimited::write_rows(&mut buffer, &table_rows(std::slice::from_ref(&outcome)))?;
            String::from_utf8(buffer)?
        }
        OutputFormat::Text => format_invoice_text(parsed),
    };

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output.trim_end());
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

fn format_invoice_text(parsed: &ParsedInvoice) -> String {
    let invoice = &parsed.invoice;
    let amount = |value: Option<_>| value.map(format_amount).unwrap_or_else(|| "-".to_string());
    let text = |value: Option<&str>| value.unwrap_or("-").to_string();

    let mut output = String::new();

    output.push_str(&format!("Invoice: {}\n", text(invoice.invoice_id.as_deref())));
    output.push_str(&format!("Status: {}\n", text(invoice.status.map(|s| s.as_str()))));
    output.push_str(&format!(
        "Date: {}\n",
        invoice.date.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string())
    ));
    output.push_str(&format!("Payment: {}\n", text(invoice.payment_type.as_deref())));
    if let Some(tax_id) = &invoice.tax_id {
        output.push_str(&format!("Tax ID: {}\n", tax_id));
    }
    output.push('\n');

    output.push_str("Line items:\n");
    for item in &parsed.line_items {
        output.push_str(&format!("  {}", item.product_name));
        if let Some(plan) = &item.deal_plan {
            output.push_str(&format!(" ({})", plan));
        }
        output.push_str(&format!(
            "\n    subtotal {}  discount {}  total {}\n",
            amount(item.subtotal),
            amount(item.plan_discount),
            amount(item.total)
        ));
    }
    output.push('\n');

    output.push_str("Summary:\n");
    output.push_str(&format!("  Subtotal:   {}\n", amount(invoice.subtotal)));
    output.push_str(&format!("  Discount:   {}\n", amount(invoice.plan_discount_total)));
    output.push_str(&format!("  Tax:        {}\n", amount(invoice.tax)));
    output.push_str(&format!("  Total paid: {}\n", amount(invoice.total_paid)));

    output.push_str(&format!("\nText backend: {}\n", parsed.backend));

    output
}

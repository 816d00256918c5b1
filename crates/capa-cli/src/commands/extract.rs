//! Extract command - pull the record out of a single DANFE PDF.

use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use capa_core::models::invoice::{ExtractedRecord, Field};
use capa_core::DanfeExtractor;

use super::{extension_of, load_config};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Input DANFE PDF
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: RecordFormat,

    /// List fields that could not be resolved
    #[arg(long)]
    show_unresolved: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum RecordFormat {
    /// JSON record
    Json,
    /// Plain text summary
    Text,
}

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }
    if extension_of(&args.input) != "pdf" {
        anyhow::bail!("Unsupported file format: {}", args.input.display());
    }

    info!("Extracting {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.set_message("Reading DANFE...");

    let extractor = DanfeExtractor::with_config(&config);
    let record = extractor.extract_pdf(&args.input);
    pb.finish_and_clear();
    let record = record?;

    let output = format_record(&record, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if args.show_unresolved {
        let unresolved = record.unresolved_fields();
        if unresolved.is_empty() {
            eprintln!("{} All fields resolved", style("ℹ").blue());
        } else {
            eprintln!("{}", style("Unresolved fields:").yellow());
            for field in unresolved {
                eprintln!("  - {}", field);
            }
        }
    }

    debug!("Total extraction time: {:?}", start.elapsed());

    Ok(())
}

fn format_record(record: &ExtractedRecord, format: RecordFormat) -> anyhow::Result<String> {
    match format {
        RecordFormat::Json => Ok(serde_json::to_string_pretty(record)?),
        RecordFormat::Text => format_text(record),
    }
}

fn format_text(record: &ExtractedRecord) -> anyhow::Result<String> {
    let mut output = String::new();

    for field in Field::ALL {
        writeln!(output, "{:<24}{}", format!("{}:", field), record.get(*field))?;
    }

    if !record.produtos.is_empty() {
        output.push_str("\nProducts:\n");
        for item in &record.produtos {
            writeln!(
                output,
                "  {} {} ({} {}) {} / {}",
                item.codigo,
                item.descricao,
                item.quantidade,
                item.unidade,
                item.valor_unitario,
                item.valor_total
            )?;
        }
    }

    if let Some(info) = &record.informacoes_complementares {
        output.push_str("\nComplementary information:\n");
        for line in info.lines() {
            writeln!(output, "  {}", line)?;
        }
    }

    Ok(output)
}

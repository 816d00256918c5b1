//! Batch command - cover sheets for many DANFE PDFs.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, warn};

use capa_core::models::invoice::ExtractedRecord;
use capa_core::{render_batch, DanfeExtractor, OutputFormat};

use super::render::DocumentFormat;
use super::{extension_of, load_config};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern of DANFE PDFs, e.g. "notas/*.pdf"
    #[arg(required = true)]
    input: String,

    /// Output directory (default: from config)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Document format (default: from config)
    #[arg(short, long, value_enum)]
    format: Option<DocumentFormat>,

    /// Volume label printed on every sheet (default: from config)
    #[arg(long)]
    volume: Option<String>,

    /// Also write summary.csv to the output directory
    #[arg(long)]
    summary: bool,

    /// Exit successfully even when some files fail
    #[arg(long)]
    continue_on_error: bool,
}

/// Outcome for a single input file.
struct FileResult {
    path: PathBuf,
    record: Option<ExtractedRecord>,
    output: Option<PathBuf>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| extension_of(p) == "pdf")
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    let format: OutputFormat = args.format.map(Into::into).unwrap_or(config.render.format);
    let volume = args.volume.clone().unwrap_or_else(|| config.render.volume_number.clone());
    let output_dir = args.output_dir.clone().unwrap_or_else(|| config.render.output_dir.clone());
    fs::create_dir_all(&output_dir)?;

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let extractor = DanfeExtractor::with_config(&config);
    let mut results = Vec::with_capacity(files.len());

    for path in files {
        let file_start = Instant::now();
        let extracted = extractor.extract_pdf(&path);
        let processing_time_ms = file_start.elapsed().as_millis() as u64;

        // A broken file never stops the run; the flag only decides the exit status
        let (record, error) = match extracted {
            Ok(record) => (Some(record), None),
            Err(e) => {
                warn!("Failed to process {}: {}", path.display(), e);
                (None, Some(e.to_string()))
            }
        };

        results.push(FileResult {
            path,
            record,
            output: None,
            error,
            processing_time_ms,
        });

        pb.inc(1);
    }

    pb.finish_and_clear();

    // Render every extracted record; failures are attached to their file
    let extracted: Vec<usize> = (0..results.len())
        .filter(|&i| results[i].record.is_some())
        .collect();
    let records: Vec<ExtractedRecord> = extracted
        .iter()
        .filter_map(|&i| results[i].record.clone())
        .collect();

    let renderer = format.renderer();
    let outcome = render_batch(renderer.as_ref(), &records, &volume);

    for failure in &outcome.failures {
        results[extracted[failure.index]].error = Some(failure.reason.clone());
    }

    let rendered = extracted
        .iter()
        .enumerate()
        .filter(|(position, _)| !outcome.failures.iter().any(|f| f.index == *position))
        .map(|(_, &i)| i);

    let mut used_names = HashSet::new();
    for (i, document) in rendered.zip(&outcome.documents) {
        let file_name = unique_file_name(&document.file_name, &mut used_names);
        if file_name != document.file_name {
            warn!(
                "{} would overwrite another cover sheet, writing {} instead",
                document.file_name, file_name
            );
        }

        let output_path = output_dir.join(&file_name);
        fs::write(&output_path, &document.bytes)?;
        debug!("Wrote {}", output_path.display());
        results[i].output = Some(output_path);
    }

    if args.summary {
        let summary_path = output_dir.join("summary.csv");
        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let failed: Vec<&FileResult> = results.iter().filter(|r| r.error.is_some()).collect();

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} rendered, {} failed",
        style(outcome.documents.len()).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }

        if !args.continue_on_error {
            anyhow::bail!("{} of {} files failed", failed.len(), results.len());
        }
    }

    Ok(())
}

/// `name`, or `name` with `_2`, `_3`, ... before the extension when an
/// earlier document of this run already took it.
fn unique_file_name(name: &str, used: &mut HashSet<String>) -> String {
    if used.insert(name.to_string()) {
        return name.to_string();
    }

    let (stem, extension) = match name.rsplit_once('.') {
        Some((stem, extension)) => (stem, format!(".{}", extension)),
        None => (name, String::new()),
    };

    let mut n = 2;
    loop {
        let candidate = format!("{}_{}{}", stem, n, extension);
        if used.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

fn write_summary(path: &Path, results: &[FileResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "numero_nfe",
        "loja",
        "brand",
        "valor_total",
        "output",
        "processing_time_ms",
        "error",
    ])?;

    for result in results {
        let filename = result.path.file_name().and_then(|s| s.to_str()).unwrap_or("");
        let status = if result.error.is_some() { "failed" } else { "success" };
        let output = result
            .output
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        let time = result.processing_time_ms.to_string();
        let (numero_nfe, loja, brand, valor_total) = match &result.record {
            Some(r) => (
                r.numero_nfe.as_str(),
                r.loja.as_str(),
                r.brand.as_str(),
                r.valor_total.as_str(),
            ),
            None => ("", "", "", ""),
        };

        wtr.write_record([
            filename,
            status,
            numero_nfe,
            loja,
            brand,
            valor_total,
            output.as_str(),
            time.as_str(),
            result.error.as_deref().unwrap_or(""),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

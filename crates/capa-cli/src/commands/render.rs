//! Render command - produce one cover sheet.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use console::style;
use tracing::{debug, info};

use capa_core::models::invoice::ExtractedRecord;
use capa_core::render::output_file_name;
use capa_core::{DanfeExtractor, OutputFormat};

use super::{extension_of, load_config};

/// Arguments for the render command.
#[derive(Args)]
pub struct RenderArgs {
    /// DANFE PDF, or a record previously written by `capa extract`
    #[arg(required = true)]
    input: PathBuf,

    /// Document format (default: from config)
    #[arg(short, long, value_enum)]
    format: Option<DocumentFormat>,

    /// Volume label printed on the sheet, e.g. 1/3 (default: from config)
    #[arg(long)]
    volume: Option<String>,

    /// Override a field before rendering (repeatable), e.g. --set loja=7042
    #[arg(long = "set", value_name = "KEY=VALUE")]
    overrides: Vec<String>,

    /// Output directory (default: from config)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum DocumentFormat {
    /// Fixed-layout PDF
    Pdf,
    /// Word document
    Docx,
}

impl From<DocumentFormat> for OutputFormat {
    fn from(format: DocumentFormat) -> Self {
        match format {
            DocumentFormat::Pdf => OutputFormat::Pdf,
            DocumentFormat::Docx => OutputFormat::Docx,
        }
    }
}

pub async fn run(args: RenderArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let mut record = match extension_of(&args.input).as_str() {
        "pdf" => DanfeExtractor::with_config(&config).extract_pdf(&args.input)?,
        "json" => {
            let data = fs::read_to_string(&args.input)?;
            let mut record: ExtractedRecord = serde_json::from_str(&data)?;
            record.fill_sentinels();
            record
        }
        other => anyhow::bail!("Unsupported file format: {}", other),
    };

    for assignment in &args.overrides {
        let field = record.apply_override(assignment)?;
        debug!("Overrode {} = {}", field, record.get(field));
    }

    let format: OutputFormat = args.format.map(Into::into).unwrap_or(config.render.format);
    let volume = args.volume.unwrap_or(config.render.volume_number);
    let output_dir = args.output_dir.unwrap_or(config.render.output_dir);

    info!("Rendering {} cover sheet for NF-e {}", format, record.numero_nfe);
    let bytes = format.renderer().try_render(&record, &volume)?;

    fs::create_dir_all(&output_dir)?;
    let output_path = output_dir.join(output_file_name(&record, format));
    fs::write(&output_path, &bytes)?;

    println!(
        "{} Cover sheet written to {}",
        style("✓").green(),
        output_path.display()
    );

    Ok(())
}

//! Cover sheet rendering.
//!
//! Both renderers draw the same [`CoverSheet`] so a record produces the same
//! text in either format. Rendering is deterministic: equal input yields
//! byte-identical output.

mod batch;
mod docx;
mod layout;
mod pdf;

pub use batch::{render_batch, BatchFailure, BatchOutcome};
pub use docx::DocxRenderer;
pub use layout::{access_key_excerpt, CoverSheet};
pub use pdf::PdfRenderer;

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::error;

use crate::error::RenderError;
use crate::models::invoice::ExtractedRecord;

/// Result type for rendering operations.
pub type Result<T> = std::result::Result<T, RenderError>;

/// Output document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Pdf,
    Docx,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Pdf => "pdf",
            OutputFormat::Docx => "docx",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Pdf => "application/pdf",
            OutputFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }

    /// Renderer producing this format.
    pub fn renderer(&self) -> Box<dyn Renderer> {
        match self {
            OutputFormat::Pdf => Box::new(PdfRenderer::new()),
            OutputFormat::Docx => Box::new(DocxRenderer::new()),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// A rendered cover sheet ready to be saved or sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Trait for cover sheet renderers.
pub trait Renderer {
    /// Format this renderer produces.
    fn format(&self) -> OutputFormat;

    /// Render `record`, reporting why rendering failed.
    fn try_render(&self, record: &ExtractedRecord, volume: &str) -> Result<Vec<u8>>;

    /// Render `record`, logging any failure and returning `None`.
    fn render(&self, record: &ExtractedRecord, volume: &str) -> Option<Vec<u8>> {
        match self.try_render(record, volume) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                error!(
                    "Failed to render {} cover sheet for NF-e {}: {}",
                    self.format(),
                    record.numero_nfe,
                    e
                );
                None
            }
        }
    }

    /// Render `record` together with its file name and MIME type.
    fn render_document(&self, record: &ExtractedRecord, volume: &str) -> Option<RenderedDocument> {
        let format = self.format();
        self.render(record, volume).map(|bytes| RenderedDocument {
            file_name: output_file_name(record, format),
            mime_type: format.mime_type(),
            bytes,
        })
    }
}

/// `Capa_Frete_NF{numero_nfe}_Loja{loja}.{ext}`, as a single path component.
pub fn output_file_name(record: &ExtractedRecord, format: OutputFormat) -> String {
    format!(
        "Capa_Frete_NF{}_Loja{}.{}",
        sanitize_component(&record.numero_nfe),
        sanitize_component(&record.loja),
        format.extension()
    )
}

fn sanitize_component(value: &str) -> String {
    value.replace(['/', '\\'], "_")
}

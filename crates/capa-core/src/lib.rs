//! Core library for DANFE freight receipt cover sheets.
//!
//! This crate provides:
//! - PDF processing (per-page text extraction, scoped upload spooling)
//! - NF-e/DANFE field extraction (invoice identity, parties, line items)
//! - Brazilian currency and date normalization
//! - Cover sheet rendering to PDF (fixed layout) and DOCX (flow layout)

pub mod error;
pub mod models;
pub mod pdf;
pub mod invoice;
pub mod render;

pub use error::{CapaError, ExtractionError, PdfError, RenderError, Result};
pub use models::invoice::{Brand, ExtractedRecord, Field, LineItem, Party, NOT_AVAILABLE};
pub use models::config::CapaConfig;
pub use pdf::{PdfExtractor, PdfProcessor, UploadSpool};
pub use invoice::{DanfeExtractor, InvoiceExtractor, SourceText};
pub use render::{
    render_batch, BatchOutcome, DocxRenderer, OutputFormat, PdfRenderer, RenderedDocument,
    Renderer,
};

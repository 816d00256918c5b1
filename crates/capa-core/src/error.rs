//! Error types for the capa-core library.

use thiserror::Error;

/// Main error type for the capa library.
#[derive(Error, Debug)]
pub enum CapaError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// Invoice extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Cover sheet rendering error.
    #[error("render error: {0}")]
    Render(#[from] RenderError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,
}

/// Errors related to invoice field extraction.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// No page of the document yielded any text.
    #[error("no invoice data found")]
    NoData,

    /// A field override named a field the record does not have.
    #[error("unknown field: {0}")]
    UnknownField(String),
}

/// Errors raised while producing a cover sheet document.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Building or serializing the PDF failed.
    #[error("PDF output failed: {0}")]
    Pdf(String),

    /// Writing the word-processing document failed.
    #[error("document output failed: {0}")]
    Document(String),
}

/// Result type for the capa library.
pub type Result<T> = std::result::Result<T, CapaError>;

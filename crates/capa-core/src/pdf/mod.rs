//! PDF processing module.

mod extractor;
mod spool;

pub use extractor::PdfExtractor;
pub use spool::UploadSpool;

use crate::error::PdfError;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Trait for PDF processing implementations.
pub trait PdfProcessor {
    /// Load a PDF from bytes.
    fn load(&mut self, data: &[u8]) -> Result<()>;

    /// Get the number of pages in the PDF.
    fn page_count(&self) -> u32;

    /// Extract text of each page, in page order.
    fn extract_pages(&self) -> Result<Vec<String>>;
}

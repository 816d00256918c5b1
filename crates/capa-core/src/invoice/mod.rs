//! DANFE field extraction module.

mod basic;
mod complementary;
mod extractor;
mod items;
mod normalize;
mod party;
pub mod rules;

pub use basic::{BasicInfo, BasicInfoExtractor};
pub use complementary::extract_complementary_info;
pub use extractor::DanfeExtractor;
pub use items::{extract_line_items, parse_row, ScanState, ScannedLine, TableScan};
pub use normalize::{normalize_pages, SourceText};
pub use party::{PartyInfo, PartyInfoExtractor};

use crate::error::ExtractionError;
use crate::models::invoice::ExtractedRecord;

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Trait for invoice record extractors.
pub trait InvoiceExtractor {
    /// Extract a record from per-page text.
    ///
    /// Fails with [`ExtractionError::NoData`] only when no page holds text.
    fn extract(&self, pages: &[String]) -> Result<ExtractedRecord>;

    /// Extract a record from plain text. Unresolved fields hold the sentinel.
    fn extract_from_text(&self, text: &str) -> ExtractedRecord;
}

//! Rendering many records in one pass.

use tracing::{info, warn};

use super::{output_file_name, RenderedDocument, Renderer};
use crate::models::invoice::ExtractedRecord;

/// A record that could not be rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFailure {
    /// Position of the record in the input.
    pub index: usize,
    pub numero_nfe: String,
    pub reason: String,
}

/// Result of [`render_batch`].
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Rendered documents, in input order.
    pub documents: Vec<RenderedDocument>,
    pub failures: Vec<BatchFailure>,
}

impl BatchOutcome {
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Render every record with the same volume label.
///
/// A failing record is logged and skipped; the rest still render.
pub fn render_batch(
    renderer: &dyn Renderer,
    records: &[ExtractedRecord],
    volume: &str,
) -> BatchOutcome {
    let format = renderer.format();
    let mut outcome = BatchOutcome::default();

    for (index, record) in records.iter().enumerate() {
        match renderer.try_render(record, volume) {
            Ok(bytes) => outcome.documents.push(RenderedDocument {
                file_name: output_file_name(record, format),
                mime_type: format.mime_type(),
                bytes,
            }),
            Err(e) => {
                warn!("Skipping NF-e {} (record {}): {}", record.numero_nfe, index, e);
                outcome.failures.push(BatchFailure {
                    index,
                    numero_nfe: record.numero_nfe.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    info!(
        "Rendered {} of {} cover sheets as {}",
        outcome.documents.len(),
        records.len(),
        format
    );

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RenderError;
    use crate::render::{OutputFormat, PdfRenderer};
    use pretty_assertions::assert_eq;

    /// Fails for one invoice number, echoes the number otherwise.
    struct PickyRenderer {
        reject: &'static str,
    }

    impl Renderer for PickyRenderer {
        fn format(&self) -> OutputFormat {
            OutputFormat::Pdf
        }

        fn try_render(&self, record: &ExtractedRecord, _volume: &str) -> super::super::Result<Vec<u8>> {
            if record.numero_nfe == self.reject {
                Err(RenderError::Pdf("broken font".to_string()))
            } else {
                Ok(record.numero_nfe.clone().into_bytes())
            }
        }
    }

    fn records(numbers: &[&str]) -> Vec<ExtractedRecord> {
        numbers
            .iter()
            .map(|n| {
                let mut record = ExtractedRecord::new();
                record.numero_nfe = n.to_string();
                record
            })
            .collect()
    }

    #[test]
    fn test_failure_does_not_abort_batch() {
        let renderer = PickyRenderer { reject: "002" };
        let outcome = render_batch(&renderer, &records(&["001", "002", "003"]), "1/1");

        let rendered: Vec<&[u8]> = outcome.documents.iter().map(|d| d.bytes.as_slice()).collect();
        assert_eq!(rendered, vec![b"001".as_slice(), b"003".as_slice()]);
        assert_eq!(outcome.failure_count(), 1);
        assert_eq!(outcome.failures[0].index, 1);
        assert_eq!(outcome.failures[0].numero_nfe, "002");
        assert!(outcome.failures[0].reason.contains("broken font"));
    }

    #[test]
    fn test_file_names_follow_records() {
        let outcome = render_batch(&PdfRenderer::new(), &records(&["10", "11"]), "1/1");

        assert!(outcome.is_complete());
        assert_eq!(outcome.documents[0].file_name, "Capa_Frete_NF10_LojaN_A.pdf");
        assert_eq!(outcome.documents[1].file_name, "Capa_Frete_NF11_LojaN_A.pdf");
    }

    #[test]
    fn test_empty_batch() {
        let outcome = render_batch(&PdfRenderer::new(), &[], "1/1");
        assert!(outcome.documents.is_empty());
        assert!(outcome.is_complete());
    }
}

//! DANFE extractor combining the field extractors.

use std::path::Path;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::error::{CapaError, ExtractionError};
use crate::models::config::{CapaConfig, PdfConfig};
use crate::models::invoice::{ExtractedRecord, NOT_AVAILABLE};
use crate::pdf::{PdfExtractor, PdfProcessor, UploadSpool};

use super::basic::BasicInfoExtractor;
use super::complementary::extract_complementary_info;
use super::items::extract_line_items;
use super::normalize::SourceText;
use super::party::PartyInfoExtractor;
use super::{InvoiceExtractor, Result};

/// Extracts an [`ExtractedRecord`] from DANFE text or PDF files.
pub struct DanfeExtractor {
    basic: BasicInfoExtractor,
    parties: PartyInfoExtractor,
    pdf: PdfConfig,
}

impl DanfeExtractor {
    /// Create an extractor with default tables and rules.
    pub fn new() -> Self {
        Self::with_config(&CapaConfig::default())
    }

    pub fn with_config(config: &CapaConfig) -> Self {
        let extraction = &config.extraction;

        Self {
            basic: BasicInfoExtractor::new(&extraction.tables),
            parties: PartyInfoExtractor::from_config(
                extraction.tables.clone(),
                &extraction.party_rules,
            ),
            pdf: config.pdf.clone(),
        }
    }

    /// Run every field extractor over prepared text.
    pub fn extract_source(&self, source: &SourceText) -> ExtractedRecord {
        let start = Instant::now();
        let text = source.normalized.as_str();
        let lines = || source.lines.iter().map(String::as_str);

        info!("Extracting DANFE fields from {} characters of text", text.len());

        let mut record = ExtractedRecord::new();
        self.basic.extract(text).apply_to(&mut record);
        self.parties.extract(text).apply_to(&mut record);
        record.produtos = extract_line_items(lines());
        record.informacoes_complementares = extract_complementary_info(lines());
        record.fill_sentinels();

        if record.numero_nfe == NOT_AVAILABLE {
            warn!("Could not extract NF-e number");
        }

        debug!(
            "Extracted NF-e {} ({} items, {} unresolved fields) in {} ms",
            record.numero_nfe,
            record.produtos.len(),
            record.unresolved_fields().len(),
            start.elapsed().as_millis()
        );

        record
    }

    /// Extract from a PDF file.
    pub fn extract_pdf(&self, path: &Path) -> crate::Result<ExtractedRecord> {
        let pdf = PdfExtractor::open(path, &self.pdf)?;
        self.extract_loaded(&pdf)
    }

    /// Extract from uploaded PDF bytes.
    ///
    /// The bytes go through a temporary file that is removed before this
    /// returns, on success and on error alike.
    pub fn extract_upload(&self, bytes: &[u8]) -> crate::Result<ExtractedRecord> {
        let spool = UploadSpool::write_in(self.pdf.spool_dir.as_deref(), bytes)?;
        self.extract_pdf(spool.path())
    }

    fn extract_loaded(&self, pdf: &impl PdfProcessor) -> crate::Result<ExtractedRecord> {
        let pages = pdf.extract_pages()?;
        debug!("Read text from {} of {} pages", pages.len(), pdf.page_count());

        self.extract(&pages).map_err(CapaError::from)
    }
}

impl Default for DanfeExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl InvoiceExtractor for DanfeExtractor {
    fn extract(&self, pages: &[String]) -> Result<ExtractedRecord> {
        let source = SourceText::from_pages(pages).ok_or(ExtractionError::NoData)?;
        Ok(self.extract_source(&source))
    }

    fn extract_from_text(&self, text: &str) -> ExtractedRecord {
        self.extract_source(&SourceText::from_text(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::invoice::Field;
    use pretty_assertions::assert_eq;

    const DANFE_PAGE: &str = "\
DANFE
DOCUMENTO AUXILIAR DA NOTA FISCAL ELETRÔNICA
NF-e Nº 000123 SÉRIE 1
CHAVE DE ACESSO
2325 0106 6262 5300 0151 5500 1000 0001 2310 0000 1234
NATUREZA DA OPERAÇÃO
TRANSFERENCIA DE ATIVO FIXO
EMPREENDIMENTOS PAGUE MENOS S.A.
AV DEZESSETE DE AGOSTO, 2745 RECIFE PARNAMIRIM 52.060-590
CNPJ 06.626.253/0001-51 INSCRIÇÃO ESTADUAL 028687175
DESTINATÁRIO / REMETENTE
IMIFARMA PROD FARMACEUTICOS E COSM 004.899.316/0042-10 15/01/2025
RUA R AFONSO PENA 579, LOJA, 0 CENTRO CODO MA 65.400-000 INSCRIÇÃO 123510724
VALOR TOTAL DA NOTA 2374,30
DADOS DO(S) PRODUTO(S)
CÓDIGO DESCRIÇÃO NCM CST CFOP UN QTD V.UNIT V.TOTAL
999999001 NOTEBOOK 84713012 000 6552 UN 1 2374,3000 2374,30 2374,30 284,92 12,00% 0,00%
DADOS ADICIONAIS
INFORMAÇÕES COMPLEMENTARES
TRANSFERENCIA ENTRE LOJAS
RESERVADO AO FISCO
";

    #[test]
    fn test_extract_full_document() {
        let record = DanfeExtractor::new()
            .extract(&[DANFE_PAGE.to_string()])
            .unwrap();

        assert_eq!(record.numero_nfe, "000123");
        assert_eq!(record.serie, "1");
        assert_eq!(record.chave_acesso, "23250106626253000151550010000001231000001234");
        assert_eq!(record.data_emissao, "15/01/2025");
        assert_eq!(record.valor_total, "2.374,30");
        assert_eq!(record.natureza_operacao, "TRANSFERENCIA DE ATIVO FIXO");
        assert_eq!(record.remetente_cnpj, "06.626.253/0001-51");
        assert_eq!(record.destinatario_cnpj, "004.899.316/0042-10");
        assert_eq!(record.brand, "extrafarma");
        assert_eq!(record.loja, "7042");

        assert_eq!(record.produtos.len(), 1);
        assert_eq!(record.produtos[0].codigo, "999999001");
        assert_eq!(
            record.informacoes_complementares.as_deref(),
            Some("TRANSFERENCIA ENTRE LOJAS")
        );
    }

    #[test]
    fn test_blank_pages_are_no_data() {
        let result = DanfeExtractor::new().extract(&["".to_string(), "  ".to_string()]);
        assert!(matches!(result, Err(ExtractionError::NoData)));
    }

    #[test]
    fn test_every_field_populated_for_any_text() {
        let extractor = DanfeExtractor::new();
        for text in ["", "lorem ipsum", "NF-e Nº", "CNPJ 12.345.678/9999-00"] {
            let record = extractor.extract_from_text(text);
            for field in Field::ALL {
                assert!(!record.get(*field).is_empty(), "{field} empty for {text:?}");
            }
        }

        let record = extractor.extract_from_text("");
        assert_eq!(record.unresolved_fields().len(), Field::ALL.len());
        assert_eq!(record.brand, NOT_AVAILABLE);
    }

    #[test]
    fn test_upload_of_garbage_is_pdf_error() {
        let result = DanfeExtractor::new().extract_upload(b"not a pdf");
        assert!(matches!(result, Err(CapaError::Pdf(_))));
    }

    fn spooled_files(dir: &Path) -> usize {
        std::fs::read_dir(dir)
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().starts_with("capa-upload-"))
            .count()
    }

    fn spooling_extractor(dir: &Path) -> DanfeExtractor {
        let mut config = CapaConfig::default();
        config.pdf.spool_dir = Some(dir.to_path_buf());
        DanfeExtractor::with_config(&config)
    }

    #[test]
    fn test_upload_spool_removed_after_failure() {
        let dir = tempfile::tempdir().unwrap();
        let extractor = spooling_extractor(dir.path());
        assert_eq!(spooled_files(dir.path()), 0);

        assert!(extractor.extract_upload(b"not a pdf").is_err());
        assert_eq!(spooled_files(dir.path()), 0);
    }

    #[test]
    fn test_upload_spool_removed_after_success() {
        use crate::render::{PdfRenderer, Renderer};

        let mut source = ExtractedRecord::new();
        source.numero_nfe = "000123".to_string();
        let pdf = PdfRenderer::new().try_render(&source, "1/1").unwrap();

        let dir = tempfile::tempdir().unwrap();
        let result = spooling_extractor(dir.path()).extract_upload(&pdf);

        assert!(result.is_ok());
        assert_eq!(spooled_files(dir.path()), 0);
    }
}

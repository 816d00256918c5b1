//! Cover sheet content shared by every output format.

use crate::models::invoice::ExtractedRecord;

pub const TITLE: &str = "CAPA DE RECEBIMENTO DE FRETE";
pub const SUPPORT_TAG: &str = "SUPORTE TECNICO";
pub const FRAGILE: &str = "FRÁGIL";
pub const SIGNATURE: &str =
    "ASSINATURA DO RECEBEDOR: ___________________________________________________";

const ACCESS_KEY_VISIBLE_CHARS: usize = 20;

/// Text of a cover sheet, grouped by the region it is printed in.
///
/// Sentinel values are printed as they are.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverSheet {
    /// `LOJA {loja}`, printed large under the title.
    pub store: String,
    /// Recipient block, label line first.
    pub recipient: Vec<String>,
    /// Sender block, label line first.
    pub sender: Vec<String>,
    /// `NF-e Nº {numero}`.
    pub invoice: String,
    /// `SÉRIE: {serie}`.
    pub series: String,
    /// `VOLUME: {volume}`.
    pub volume: String,
    /// `CHAVE: {first 20 chars}...`.
    pub access_key: String,
}

impl CoverSheet {
    pub fn build(record: &ExtractedRecord, volume: &str) -> Self {
        let r = record;

        Self {
            store: format!("LOJA {}", r.loja),
            recipient: vec![
                "DESTINATÁRIO:".to_string(),
                r.destinatario_nome.clone(),
                format!("{} - {}", r.destinatario_endereco, r.destinatario_bairro),
                format!(
                    "{} – {} – CEP.: {}",
                    r.destinatario_municipio, r.destinatario_uf, r.destinatario_cep
                ),
                format!("CNPJ: {} – I.E: {}", r.destinatario_cnpj, r.destinatario_ie),
            ],
            sender: vec![
                "REMETENTE:".to_string(),
                r.remetente_nome.clone(),
                format!(
                    "{} - {} - {} – {}",
                    r.remetente_endereco, r.remetente_bairro, r.remetente_municipio, r.remetente_uf
                ),
                format!(
                    "CEP: {} CNPJ: {} – I.E.: {}",
                    r.remetente_cep, r.remetente_cnpj, r.remetente_ie
                ),
            ],
            invoice: format!("NF-e Nº {}", r.numero_nfe),
            series: format!("SÉRIE: {}", r.serie),
            volume: format!("VOLUME: {}", volume),
            access_key: format!("CHAVE: {}", access_key_excerpt(&r.chave_acesso)),
        }
    }
}

/// First 20 characters of the access key followed by `...`.
pub fn access_key_excerpt(key: &str) -> String {
    let visible: String = key.chars().take(ACCESS_KEY_VISIBLE_CHARS).collect();
    format!("{}...", visible)
}

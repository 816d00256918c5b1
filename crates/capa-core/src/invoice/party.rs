//! Sender and recipient blocks, brand and store number.

use regex::Regex;
use tracing::{debug, warn};

use crate::models::invoice::{or_sentinel, Brand, ExtractedRecord, Party, NOT_AVAILABLE};

use super::rules::patterns::{RECIPIENT_IE, SENDER_AVENUE, SENDER_IE};
use super::rules::tables::{first_contained, first_locality, LookupTables};
use super::rules::{
    classify_brand, resolve_parties, store_number, CepExtractor, CnpjExtractor, DocumentOrder,
    FieldExtractor, PartyRule, PartyRuleConfig,
};

/// Both parties plus the values derived from the recipient CNPJ.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartyInfo {
    pub sender: Party,
    pub recipient: Party,
    pub brand: Option<Brand>,
    pub loja: Option<String>,
}

impl PartyInfo {
    pub fn apply_to(self, record: &mut ExtractedRecord) {
        record.set_sender(self.sender);
        record.set_recipient(self.recipient);
        record.brand = or_sentinel(self.brand.map(|b| b.as_str().to_string()));
        record.loja = or_sentinel(self.loja);
    }
}

/// Resolves party fields from normalized text using the lookup tables.
pub struct PartyInfoExtractor {
    tables: LookupTables,
    rules: Vec<Box<dyn PartyRule>>,
    sender_names: Vec<Regex>,
}

impl PartyInfoExtractor {
    /// Extractor with the given tables and the document-order party rule.
    pub fn new(tables: LookupTables) -> Self {
        Self::with_rules(tables, vec![Box::new(DocumentOrder)])
    }

    pub fn with_rules(tables: LookupTables, rules: Vec<Box<dyn PartyRule>>) -> Self {
        let sender_names = tables
            .sender_names
            .iter()
            .filter_map(|name| match Regex::new(&format!("(?i){}", regex::escape(name))) {
                Ok(re) => Some(re),
                Err(e) => {
                    warn!("Skipping sender name {:?}: {}", name, e);
                    None
                }
            })
            .collect();

        let rules = if rules.is_empty() {
            vec![Box::new(DocumentOrder) as Box<dyn PartyRule>]
        } else {
            rules
        };

        Self {
            tables,
            rules,
            sender_names,
        }
    }

    /// Build from configured rule descriptions.
    pub fn from_config(tables: LookupTables, rules: &[PartyRuleConfig]) -> Self {
        Self::with_rules(tables, rules.iter().map(PartyRuleConfig::build).collect())
    }

    pub fn extract(&self, text: &str) -> PartyInfo {
        let cnpjs = CnpjExtractor::new().extract_all(text);
        let ceps = CepExtractor.extract_all(text);
        let assigned = resolve_parties(&self.rules, &cnpjs);

        debug!("Found {} CNPJs and {} CEPs", cnpjs.len(), ceps.len());

        let sender = self.sender(text, assigned.sender, &ceps);
        let recipient = self.recipient(text, assigned.recipient, &ceps);

        let (brand, loja) = if recipient.cnpj == NOT_AVAILABLE {
            (None, None)
        } else {
            let brand = classify_brand(&recipient.cnpj, &self.tables);
            (Some(brand), store_number(&recipient.cnpj, brand, &self.tables))
        };

        PartyInfo {
            sender,
            recipient,
            brand,
            loja,
        }
    }

    fn sender(&self, text: &str, cnpj: Option<String>, ceps: &[String]) -> Party {
        let tables = &self.tables;

        let nome = self
            .sender_names
            .iter()
            .find_map(|re| re.find(text))
            .map(|m| m.as_str().to_string());

        let endereco = SENDER_AVENUE
            .captures(text)
            .map(|caps| format!("AV DEZESSETE DE AGOSTO, {}", &caps[1]))
            .or_else(|| first_contained(text, &tables.sender_addresses).map(str::to_string));

        let locality = first_locality(text, &tables.sender_localities);

        let ie = first_contained(text, &tables.sender_ie)
            .map(str::to_string)
            .or_else(|| SENDER_IE.captures(text).map(|caps| caps[1].to_string()));

        Party {
            nome: or_sentinel(nome),
            cnpj: or_sentinel(cnpj),
            endereco: or_sentinel(endereco),
            bairro: or_sentinel(locality.and_then(|l| l.bairro.clone())),
            municipio: or_sentinel(locality.map(|l| l.municipio.clone())),
            uf: or_sentinel(locality.map(|l| l.uf.clone())),
            cep: or_sentinel(ceps.first().cloned()),
            ie: or_sentinel(ie),
        }
    }

    fn recipient(&self, text: &str, cnpj: Option<String>, ceps: &[String]) -> Party {
        let tables = &self.tables;
        let known = |values: &[String]| first_contained(text, values).map(str::to_string);

        let locality = first_locality(text, &tables.recipient_localities);

        // Second CEP belongs to the recipient when the document has two
        let cep = ceps
            .get(1)
            .cloned()
            .or_else(|| known(&tables.recipient_ceps))
            .or_else(|| ceps.first().cloned());

        let ie = known(&tables.recipient_ie)
            .or_else(|| RECIPIENT_IE.captures(text).map(|caps| caps[1].to_string()));

        Party {
            nome: or_sentinel(known(&tables.recipient_names)),
            cnpj: or_sentinel(cnpj),
            endereco: or_sentinel(known(&tables.recipient_addresses)),
            bairro: or_sentinel(known(&tables.recipient_neighborhoods)),
            municipio: or_sentinel(locality.map(|l| l.municipio.clone())),
            uf: or_sentinel(locality.map(|l| l.uf.clone())),
            cep: or_sentinel(cep),
            ie: or_sentinel(ie),
        }
    }
}

impl Default for PartyInfoExtractor {
    fn default() -> Self {
        Self::new(LookupTables::default())
    }
}

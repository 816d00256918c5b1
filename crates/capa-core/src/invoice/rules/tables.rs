//! Known-counterparty lookup tables.
//!
//! DANFEs from the handful of counterparties this tool serves do not lay out
//! their party blocks consistently, so most party fields are resolved by
//! checking the text for literal values known from real documents. Every
//! table here is plain data: the defaults encode the known counterparties and
//! the whole set can be replaced from the config file.
//!
//! A document from a counterparty missing from these tables does not fail;
//! the affected fields silently come out as the sentinel. Add new values here
//! (or in the config) whenever a new sender, store or layout shows up.

use serde::{Deserialize, Serialize};

/// A municipality recognised by marker substrings.
///
/// Matches when every marker occurs in the text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownLocality {
    pub markers: Vec<String>,
    pub municipio: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bairro: Option<String>,
    pub uf: String,
}

impl KnownLocality {
    fn new(markers: &[&str], municipio: &str, bairro: Option<&str>, uf: &str) -> Self {
        Self {
            markers: markers.iter().map(|m| m.to_string()).collect(),
            municipio: municipio.to_string(),
            bairro: bairro.map(str::to_string),
            uf: uf.to_string(),
        }
    }

    /// Whether all markers are present in `text`.
    pub fn matches(&self, text: &str) -> bool {
        !self.markers.is_empty() && self.markers.iter().all(|m| text.contains(m.as_str()))
    }
}

/// Literal values known from the supported counterparties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupTables {
    /// Invoice totals printed without a `VALOR TOTAL DA NOTA` label.
    pub known_totals: Vec<String>,

    /// Operation types recognised verbatim.
    pub operation_types: Vec<String>,

    /// Sender legal names, matched case-insensitively.
    pub sender_names: Vec<String>,

    /// Sender street addresses.
    pub sender_addresses: Vec<String>,

    /// Sender municipality, neighborhood and state.
    pub sender_localities: Vec<KnownLocality>,

    /// Sender state registrations (IE).
    pub sender_ie: Vec<String>,

    /// Recipient legal names.
    pub recipient_names: Vec<String>,

    /// Recipient street addresses.
    pub recipient_addresses: Vec<String>,

    /// Recipient neighborhoods.
    pub recipient_neighborhoods: Vec<String>,

    /// Recipient municipality and state.
    pub recipient_localities: Vec<KnownLocality>,

    /// Recipient postal codes used when the text has fewer than two CEPs.
    pub recipient_ceps: Vec<String>,

    /// Recipient state registrations (IE).
    pub recipient_ie: Vec<String>,

    /// CNPJ root (9 digits, zero padded) of Extrafarma stores.
    pub extrafarma_cnpj_root: String,

    /// Leading digit that replaces the first branch digit of Extrafarma stores.
    pub extrafarma_store_prefix: String,
}

impl Default for LookupTables {
    fn default() -> Self {
        let owned = |values: &[&str]| values.iter().map(|v| v.to_string()).collect::<Vec<_>>();

        Self {
            known_totals: owned(&["2374.30", "2040.00", "3812.28"]),
            operation_types: owned(&["TRANSFERENCIA DE ATIVO FIXO", "VENDA-DE-ATIVO-IMOBILIZADO"]),
            sender_names: owned(&["Empreendimentos Pague Menos S.A."]),
            sender_addresses: owned(&["Rua Senador Pompeu,1520"]),
            sender_localities: vec![
                KnownLocality::new(&["RECIFE", "PARNAMIRIM"], "RECIFE", Some("PARNAMIRIM"), "PE"),
                KnownLocality::new(&["FORTALEZA", "Centro/CE"], "FORTALEZA", Some("Centro"), "CE"),
            ],
            sender_ie: owned(&["028687175", "068451288"]),
            recipient_names: owned(&[
                "EMPREENDIMENTOS PAGUE MENOS S A",
                "EMPREENDIMENTOS PAGUE MENOS S/A",
                "IMIFARMA PROD FARMACEUTICOS E COSM",
            ]),
            recipient_addresses: owned(&[
                "R SEN POMPEU, 1520",
                "RUA R AFONSO PENA 579, LOJA, 0",
                "AV TANCREDO NEVES, 2915",
            ]),
            recipient_neighborhoods: owned(&["CENTRO", "CAMINHO DAS ARVORES"]),
            recipient_localities: vec![
                KnownLocality::new(&["FORTALEZA"], "FORTALEZA", None, "CE"),
                KnownLocality::new(&["CODO", "MA"], "CODO", None, "MA"),
                KnownLocality::new(&["SALVADOR", "BA"], "SALVADOR", None, "BA"),
            ],
            recipient_ceps: owned(&["65.400-000", "41.820-910"]),
            recipient_ie: owned(&["123510724", "136521921", "068451288"]),
            extrafarma_cnpj_root: "004899316".to_string(),
            extrafarma_store_prefix: "7".to_string(),
        }
    }
}

/// First candidate that occurs verbatim in `text`.
pub fn first_contained<'a>(text: &str, candidates: &'a [String]) -> Option<&'a str> {
    candidates
        .iter()
        .map(String::as_str)
        .find(|c| !c.is_empty() && text.contains(c))
}

/// First locality whose markers all occur in `text`.
pub fn first_locality<'a>(text: &str, localities: &'a [KnownLocality]) -> Option<&'a KnownLocality> {
    localities.iter().find(|l| l.matches(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_contained_respects_table_order() {
        let tables = LookupTables::default();
        let text = "... 136521921 ... 068451288 ...";
        assert_eq!(first_contained(text, &tables.recipient_ie), Some("136521921"));
        assert_eq!(first_contained("nothing", &tables.recipient_ie), None);
    }

    #[test]
    fn test_locality_requires_every_marker() {
        let tables = LookupTables::default();
        assert!(first_locality("RECIFE somewhere", &tables.sender_localities).is_none());

        let hit = first_locality("RECIFE PARNAMIRIM", &tables.sender_localities).unwrap();
        assert_eq!(hit.municipio, "RECIFE");
        assert_eq!(hit.bairro.as_deref(), Some("PARNAMIRIM"));
        assert_eq!(hit.uf, "PE");
    }

    #[test]
    fn test_tables_load_from_partial_json() {
        let json = r#"{"recipient_ie": ["999"]}"#;
        let tables: LookupTables = serde_json::from_str(json).unwrap();
        assert_eq!(tables.recipient_ie, vec!["999".to_string()]);
        assert_eq!(tables.extrafarma_cnpj_root, "004899316");
    }
}

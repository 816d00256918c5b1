//! Rule-based field extractors for DANFE documents.

pub mod cnpj;
pub mod currency;
pub mod dates;
pub mod parties;
pub mod patterns;
pub mod tables;

pub use cnpj::{branch_group, classify_brand, cnpj_root, store_number, CepExtractor, CnpjExtractor};
pub use currency::{format_brazilian_amount, format_currency, parse_amount, ZERO_AMOUNT};
pub use dates::format_date;
pub use parties::{
    resolve_parties, DocumentOrder, KnownSenderRoot, PartyCnpjs, PartyRule, PartyRuleConfig,
};
pub use tables::{KnownLocality, LookupTables};

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the field from text.
    fn extract(&self, text: &str) -> Option<Self::Output>;

    /// Extract all occurrences of the field.
    fn extract_all(&self, text: &str) -> Vec<Self::Output>;
}

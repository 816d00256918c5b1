//! CNPJ (Brazilian company tax ID) extraction and store derivation.

use super::patterns::{CEP, CNPJ, CNPJ_BRANCH};
use super::tables::LookupTables;
use super::FieldExtractor;
use crate::models::invoice::Brand;

/// CNPJ field extractor.
///
/// Tokens are returned in document order; party assignment relies on it.
pub struct CnpjExtractor;

impl CnpjExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CnpjExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for CnpjExtractor {
    type Output = String;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        CNPJ.captures_iter(text)
            .map(|caps| caps[1].to_string())
            .collect()
    }
}

/// Postal code (CEP) extractor, in document order.
pub struct CepExtractor;

impl FieldExtractor for CepExtractor {
    type Output = String;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        CEP.captures_iter(text)
            .map(|caps| caps[1].to_string())
            .collect()
    }
}

/// Root (company part) of a CNPJ as nine digits, zero padded.
pub fn cnpj_root(cnpj: &str) -> String {
    let root: String = cnpj
        .split('/')
        .next()
        .unwrap_or("")
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();
    format!("{:0>9}", root)
}

/// Four-digit branch group of a CNPJ (`/NNNN-`).
pub fn branch_group(cnpj: &str) -> Option<&str> {
    CNPJ_BRANCH
        .captures(cnpj)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Brand of the store owning `cnpj`.
pub fn classify_brand(cnpj: &str, tables: &LookupTables) -> Brand {
    if cnpj_root(cnpj) == tables.extrafarma_cnpj_root {
        Brand::Extrafarma
    } else {
        Brand::PagueMenos
    }
}

/// Store number printed on the cover sheet.
///
/// Extrafarma numbers its stores by swapping the first branch digit for the
/// configured prefix; every other brand uses the branch group as is.
pub fn store_number(cnpj: &str, brand: Brand, tables: &LookupTables) -> Option<String> {
    let branch = branch_group(cnpj)?;

    if brand == Brand::Extrafarma && branch.len() == 4 {
        Some(format!("{}{}", tables.extrafarma_store_prefix, &branch[1..]))
    } else {
        Some(branch.to_string())
    }
}

//! Common regex patterns for DANFE extraction.
//!
//! All patterns run against whitespace-normalized text (see
//! [`crate::invoice::normalize`]), so none of them need to span newlines.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Invoice number candidates, tried in order
    pub static ref NFE_NUMBER_PATTERNS: [Regex; 4] = [
        Regex::new(r"(?i)NF-e\s*(?:No|Nº)\s*(\d+)").unwrap(),
        Regex::new(r"(?i)(?:No|Nº)\s*(\d+)\s*SÉRIE").unwrap(),
        Regex::new(r"(?i)DANFE.*?N[oº]\s*(\d+)").unwrap(),
        Regex::new(r"(?i)\bN[oº]\s+(\d{1,8})(?:\s|SÉRIE)").unwrap(),
    ];

    pub static ref SERIE: Regex = Regex::new(
        r"SÉRIE\s+(\d+)"
    ).unwrap();

    // 44-digit access key printed as eleven groups of four
    pub static ref ACCESS_KEY: Regex = Regex::new(
        r"(\d{4}(?:\s+\d{4}){10})"
    ).unwrap();

    pub static ref DATE_TOKEN: Regex = Regex::new(
        r"(\d{2}/\d{2}/\d{4})"
    ).unwrap();

    pub static ref TOTAL_VALUE: Regex = Regex::new(
        r"VALOR TOTAL DA NOTA\s+(\d+[.,]\d+)"
    ).unwrap();

    // Operation nature runs until the next header block of the DANFE
    pub static ref OPERATION_NATURE: Regex = Regex::new(
        r"NATUREZA DA OPERAÇÃO\s+(.+?)(?:\s+(?:PROTOCOLO|INSCRIÇÃO|CNPJ)\b|$)"
    ).unwrap();

    // CNPJ, with the zero-padded three digit root some layouts print
    pub static ref CNPJ: Regex = Regex::new(
        r"(\d{2,3}\.\d{3}\.\d{3}/\d{4}-\d{2})"
    ).unwrap();

    pub static ref CNPJ_BRANCH: Regex = Regex::new(
        r"/(\d{4})-\d{2}"
    ).unwrap();

    pub static ref CEP: Regex = Regex::new(
        r"(\d{2}\.\d{3}-\d{3})"
    ).unwrap();

    pub static ref SENDER_AVENUE: Regex = Regex::new(
        r"(?i)AV DEZESSETE DE AGOSTO,\s*(\d+)"
    ).unwrap();

    pub static ref SENDER_IE: Regex = Regex::new(
        r"(?i)INSCRIÇÃO ESTADUAL\s+(\d+)"
    ).unwrap();

    pub static ref RECIPIENT_IE: Regex = Regex::new(
        r"INSCRIÇÃO\s+(\d+)"
    ).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_key_requires_eleven_groups() {
        let ten = "1111 2222 3333 4444 5555 6666 7777 8888 9999 0000";
        assert!(!ACCESS_KEY.is_match(ten));

        let eleven = format!("{} 1234", ten);
        assert!(ACCESS_KEY.is_match(&eleven));
    }

    #[test]
    fn test_cnpj_accepts_padded_root() {
        assert!(CNPJ.is_match("CNPJ 004.899.316/0042-10"));
        assert!(CNPJ.is_match("CNPJ 06.626.253/0001-51"));
        assert!(!CNPJ.is_match("CNPJ 06626253000151"));
    }

    #[test]
    fn test_operation_nature_stops_at_next_block() {
        let text = "NATUREZA DA OPERAÇÃO REMESSA PARA CONSERTO PROTOCOLO DE AUTORIZAÇÃO 123";
        let caps = OPERATION_NATURE.captures(text).unwrap();
        assert_eq!(&caps[1], "REMESSA PARA CONSERTO");

        let caps = OPERATION_NATURE.captures("NATUREZA DA OPERAÇÃO DEVOLUCAO").unwrap();
        assert_eq!(&caps[1], "DEVOLUCAO");
    }
}

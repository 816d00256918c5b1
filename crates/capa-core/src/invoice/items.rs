//! Product table recovery.
//!
//! The items table loses its columns when the PDF is flattened to text, so
//! rows are rebuilt from whitespace tokens. [`TableScan`] walks the page lines
//! through three states:
//!
//! ```text
//! BeforeTable --(table header)--> InTable --(INFORMAÇÕES COMPLEMENTARES)--> Done
//! ```
//!
//! The header line is `DADOS DO(S) PRODUTO(S)` or any line holding both
//! `CÓDIGO` and `DESCRIÇÃO`. Nothing after the complementary-info marker is
//! scanned.

use crate::models::invoice::{LineItem, NOT_AVAILABLE};

use super::rules::format_currency;

const TABLE_MARKER: &str = "DADOS DO(S) PRODUTO(S)";
const END_MARKER: &str = "INFORMAÇÕES COMPLEMENTARES";
const MIN_ROW_TOKENS: usize = 8;

/// Scanner state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    BeforeTable,
    InTable,
    Done,
}

/// One classified line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScannedLine<'a> {
    /// Line before the table header.
    Preamble(&'a str),
    /// The line that opened the table.
    Header(&'a str),
    /// Line inside the table, with the item it parsed to (if any).
    Row(&'a str, Option<LineItem>),
    /// The line that closed the table.
    End(&'a str),
}

/// Iterator over lines tagged with the table state they were read in.
pub struct TableScan<I> {
    lines: I,
    state: ScanState,
}

impl<'a, I> TableScan<I>
where
    I: Iterator<Item = &'a str>,
{
    pub fn new(lines: I) -> Self {
        Self {
            lines,
            state: ScanState::BeforeTable,
        }
    }

    pub fn state(&self) -> ScanState {
        self.state
    }
}

impl<'a, I> Iterator for TableScan<I>
where
    I: Iterator<Item = &'a str>,
{
    type Item = ScannedLine<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.state == ScanState::Done {
            return None;
        }

        let line = self.lines.next()?;

        match self.state {
            ScanState::BeforeTable => {
                if is_table_header(line) {
                    self.state = ScanState::InTable;
                    Some(ScannedLine::Header(line))
                } else {
                    Some(ScannedLine::Preamble(line))
                }
            }
            ScanState::InTable => {
                if line.contains(END_MARKER) {
                    self.state = ScanState::Done;
                    Some(ScannedLine::End(line))
                } else {
                    Some(ScannedLine::Row(line, parse_row(line)))
                }
            }
            ScanState::Done => None,
        }
    }
}

fn is_table_header(line: &str) -> bool {
    line.contains(TABLE_MARKER) || (line.contains("CÓDIGO") && line.contains("DESCRIÇÃO"))
}

fn is_amount_token(token: &str) -> bool {
    if !token.contains(',') {
        return false;
    }
    let digits: String = token.chars().filter(|c| *c != ',' && *c != '.').collect();
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

fn all_digits(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c.is_ascii_digit())
}

/// Parse one table line into an item.
///
/// Example row:
/// `999999001 NOTEBOOK 84713012 000 6552 UN 1 2374,3000 2374,30 2374,30 284,92 12,00% 0,00%`
pub fn parse_row(line: &str) -> Option<LineItem> {
    let line = line.trim();
    if line.is_empty() || line.contains("CÓDIGO") || line.contains("DESCRIÇÃO") {
        return None;
    }

    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < MIN_ROW_TOKENS {
        return None;
    }

    let codigo = all_digits(tokens[0]).then(|| tokens[0].to_string())?;
    let descricao = tokens[1..3].join(" ");
    let ncm = all_digits(tokens[2]).then(|| tokens[2].to_string());

    let mut unidade = None;
    let mut quantidade = None;
    let mut valor_unitario = None;
    let mut valor_total = None;

    for (i, token) in tokens.iter().enumerate() {
        if token.contains("UN") {
            unidade = Some(token.to_string());
            quantidade = tokens
                .get(i + 1)
                .filter(|next| all_digits(next))
                .map(|next| next.to_string());
        } else if is_amount_token(token) {
            if valor_unitario.is_none() {
                valor_unitario = Some(format_currency(token));
            } else if valor_total.is_none() {
                valor_total = Some(format_currency(token));
            }
        }
    }

    let or_na = |value: Option<String>| value.unwrap_or_else(|| NOT_AVAILABLE.to_string());

    Some(LineItem {
        codigo,
        descricao,
        ncm: or_na(ncm),
        unidade: or_na(unidade),
        quantidade: or_na(quantidade),
        valor_unitario: or_na(valor_unitario),
        valor_total: or_na(valor_total),
    })
}

/// All items of the product table, in order.
pub fn extract_line_items<'a, I>(lines: I) -> Vec<LineItem>
where
    I: IntoIterator<Item = &'a str>,
{
    TableScan::new(lines.into_iter())
        .filter_map(|line| match line {
            ScannedLine::Row(_, item) => item,
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const ROW: &str =
        "999999001 NOTEBOOK 84713012 000 6552 UN 1 2374,3000 2374,30 2374,30 284,92 12,00% 0,00%";

    #[test]
    fn test_parse_row() {
        let item = parse_row(ROW).unwrap();
        assert_eq!(
            item,
            LineItem {
                codigo: "999999001".to_string(),
                descricao: "NOTEBOOK 84713012".to_string(),
                ncm: "84713012".to_string(),
                unidade: "UN".to_string(),
                quantidade: "1".to_string(),
                valor_unitario: "23.743.000,00".to_string(),
                valor_total: "2.374,30".to_string(),
            }
        );
    }

    #[test]
    fn test_short_and_header_rows_skipped() {
        assert!(parse_row("1 2 3").is_none());
        assert!(parse_row("CÓDIGO PRODUTO DESCRIÇÃO NCM CST CFOP UN QTD").is_none());
        assert!(parse_row("ABC NOTEBOOK 84713012 000 6552 UN 1 2374,30").is_none());
    }

    #[test]
    fn test_scan_states() {
        let lines = [
            "DANFE",
            "DADOS DO(S) PRODUTO(S)",
            ROW,
            "INFORMAÇÕES COMPLEMENTARES",
            ROW,
        ];
        let mut scan = TableScan::new(lines.iter().copied());

        assert_eq!(scan.next(), Some(ScannedLine::Preamble("DANFE")));
        assert_eq!(scan.state(), ScanState::BeforeTable);
        assert_eq!(scan.next(), Some(ScannedLine::Header("DADOS DO(S) PRODUTO(S)")));
        assert_eq!(scan.state(), ScanState::InTable);
        assert!(matches!(scan.next(), Some(ScannedLine::Row(_, Some(_)))));
        assert_eq!(scan.next(), Some(ScannedLine::End("INFORMAÇÕES COMPLEMENTARES")));
        assert_eq!(scan.state(), ScanState::Done);
        assert_eq!(scan.next(), None);
    }

    #[test]
    fn test_rows_before_header_ignored() {
        let lines = [ROW, "CÓDIGO DESCRIÇÃO", ROW, ""];
        let items = extract_line_items(lines.iter().copied());
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_no_table_is_not_an_error() {
        let items = extract_line_items(["nothing here"].iter().copied());
        assert!(items.is_empty());
    }
}

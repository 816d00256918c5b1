//! Currency normalization for DANFE amounts.
//!
//! Amounts show up both in Brazilian notation (`2.374,30`) and with a dot
//! decimal point (`2374.30`). Everything is rendered back in Brazilian
//! notation with two decimals.

use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Canonical rendering of a value that could not be parsed.
pub const ZERO_AMOUNT: &str = "0,00";

/// Parse an amount whose decimal separator is ambiguous.
///
/// When both `,` and `.` occur, the one appearing last is the decimal
/// separator. A lone `,` is decimal only when exactly two digits follow
/// the last comma; otherwise it separates thousands.
pub fn parse_amount(s: &str) -> Option<Decimal> {
    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();

    let comma_pos = cleaned.rfind(',');
    let dot_pos = cleaned.rfind('.');

    let normalized = match (comma_pos, dot_pos) {
        (Some(c), Some(d)) if c > d => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (Some(c), None) => {
            if cleaned.len() - c - 1 == 2 {
                cleaned.replace(',', ".")
            } else {
                cleaned.replace(',', "")
            }
        }
        (None, _) => cleaned,
    };

    Decimal::from_str(&normalized).ok()
}

/// Format an amount in Brazilian notation (`1.234,56`).
pub fn format_brazilian_amount(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let s = format!("{:.2}", rounded);
    let (integer_part, decimal_part) = match s.split_once('.') {
        Some(parts) => parts,
        None => return s,
    };

    let (sign, digits) = match integer_part.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", integer_part),
    };

    // Add thousand separators
    let chars: Vec<char> = digits.chars().collect();
    let mut formatted = String::with_capacity(chars.len() + chars.len() / 3);

    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            formatted.push('.');
        }
        formatted.push(*c);
    }

    format!("{}{},{}", sign, formatted, decimal_part)
}

/// Normalize any amount-looking text to Brazilian notation.
///
/// Never fails: malformed input yields [`ZERO_AMOUNT`].
pub fn format_currency(value: &str) -> String {
    parse_amount(value)
        .map(format_brazilian_amount)
        .unwrap_or_else(|| ZERO_AMOUNT.to_string())
}

//! Date normalization for DANFE emission dates.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref CANONICAL_DATE: Regex = Regex::new(r"^\d{2}/\d{2}/\d{4}$").unwrap();
    static ref DIGIT_RUN: Regex = Regex::new(r"\d+").unwrap();
}

/// Normalize a date-like string to DD/MM/YYYY.
///
/// Input that cannot be read as day, month and year is returned unchanged
/// rather than replaced by the sentinel.
pub fn format_date(value: &str) -> String {
    if value.is_empty() {
        return String::new();
    }

    let cleaned: String = value
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '/' || *c == '-')
        .map(|c| if c == '-' { '/' } else { c })
        .collect();

    if CANONICAL_DATE.is_match(&cleaned) {
        return cleaned;
    }

    let parts: Vec<&str> = DIGIT_RUN.find_iter(&cleaned).map(|m| m.as_str()).collect();
    if parts.len() < 3 {
        return value.to_string();
    }

    let day = format!("{:0>2}", parts[0]);
    let month = format!("{:0>2}", parts[1]);
    let year = expand_year(parts[2]);

    format!("{}/{}/{}", day, month, year)
}

/// Two-digit years pivot at 30: `00..=30` are 20xx, the rest 19xx.
fn expand_year(year: &str) -> String {
    if year.len() != 2 {
        return year.to_string();
    }

    match year.parse::<u32>() {
        Ok(y) if y <= 30 => format!("20{}", year),
        Ok(_) => format!("19{}", year),
        Err(_) => year.to_string(),
    }
}

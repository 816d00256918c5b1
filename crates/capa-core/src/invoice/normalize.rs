//! Text normalization for extracted PDF pages.

/// Collapse the text of every page into a single line.
///
/// Pages are joined with newlines, then every whitespace run (newlines
/// included) becomes one space. Returns `None` when no page holds any text.
pub fn normalize_pages(pages: &[String]) -> Option<String> {
    let joined = pages.join("\n");
    let normalized = joined.split_whitespace().collect::<Vec<_>>().join(" ");

    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}

/// Text of one document in the two shapes the extractors need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceText {
    /// Whitespace-normalized single-line text, for pattern matching.
    pub normalized: String,
    /// Trimmed page lines in reading order, for the line-oriented scanners.
    pub lines: Vec<String>,
}

impl SourceText {
    /// Build from per-page text; `None` when every page is blank.
    pub fn from_pages(pages: &[String]) -> Option<Self> {
        let normalized = normalize_pages(pages)?;
        let lines = pages
            .iter()
            .flat_map(|page| page.lines())
            .map(|line| line.trim().to_string())
            .collect();

        Some(Self { normalized, lines })
    }

    /// Build from a single block of text, which may be empty.
    pub fn from_text(text: &str) -> Self {
        Self::from_pages(&[text.to_string()]).unwrap_or_else(|| Self {
            normalized: String::new(),
            lines: Vec::new(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.normalized.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_whitespace() {
        let pages = vec!["  DANFE\n\nNF-e  Nº 123 ".to_string(), "\tSÉRIE 1\n".to_string()];
        assert_eq!(
            normalize_pages(&pages).as_deref(),
            Some("DANFE NF-e Nº 123 SÉRIE 1")
        );
    }

    #[test]
    fn test_blank_pages_yield_no_data() {
        assert_eq!(normalize_pages(&[]), None);
        assert_eq!(normalize_pages(&["".to_string(), " \n\t".to_string()]), None);
    }

    #[test]
    fn test_source_keeps_lines_across_pages() {
        let pages = vec!["a\n  b ".to_string(), "c".to_string()];
        let source = SourceText::from_pages(&pages).unwrap();
        assert_eq!(source.normalized, "a b c");
        assert_eq!(source.lines, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_from_empty_text() {
        let source = SourceText::from_text("");
        assert!(source.is_empty());
        assert!(source.lines.is_empty());
    }
}

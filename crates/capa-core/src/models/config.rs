//! Configuration structures for extraction and rendering.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::invoice::rules::{LookupTables, PartyRuleConfig};
use crate::render::OutputFormat;

/// Main configuration for the capa pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CapaConfig {
    /// PDF loading configuration.
    pub pdf: PdfConfig,

    /// Field extraction configuration.
    pub extraction: ExtractionConfig,

    /// Cover sheet rendering configuration.
    pub render: RenderConfig,
}

/// PDF loading configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Decrypt documents protected by an empty user password.
    pub try_empty_password: bool,

    /// Maximum pages to read (0 = unlimited).
    pub max_pages: usize,

    /// Directory for spooled uploads (system temporary directory if unset).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spool_dir: Option<PathBuf>,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            try_empty_password: true,
            max_pages: 0,
            spool_dir: None,
        }
    }
}

/// Field extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Known counterparty values.
    pub tables: LookupTables,

    /// Sender/recipient assignment rules, tried in order.
    pub party_rules: Vec<PartyRuleConfig>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            tables: LookupTables::default(),
            party_rules: vec![PartyRuleConfig::DocumentOrder],
        }
    }
}

/// Cover sheet rendering configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Default output format.
    pub format: OutputFormat,

    /// Volume label printed in the footer.
    pub volume_number: String,

    /// Directory rendered files are written to.
    pub output_dir: PathBuf,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Pdf,
            volume_number: "1/1".to_string(),
            output_dir: PathBuf::from("."),
        }
    }
}

impl CapaConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let json = r#"{"render": {"format": "docx"}}"#;
        let config: CapaConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.render.format, OutputFormat::Docx);
        assert_eq!(config.render.volume_number, "1/1");
        assert!(config.pdf.try_empty_password);
        assert_eq!(config.extraction.party_rules, vec![PartyRuleConfig::DocumentOrder]);
        assert_eq!(config.extraction.tables.extrafarma_store_prefix, "7");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = CapaConfig::default();
        config.render.volume_number = "2/3".to_string();
        config.save(&path).unwrap();

        let loaded = CapaConfig::from_file(&path).unwrap();
        assert_eq!(loaded.render.volume_number, "2/3");
        assert_eq!(loaded.extraction.tables, LookupTables::default());
    }
}

//! Flow-layout DOCX cover sheet.
//!
//! The package holds only the three parts Word needs to open a document:
//! `[Content_Types].xml`, `_rels/.rels` and `word/document.xml`. Entries carry
//! a fixed timestamp so the archive bytes depend on the record alone.

use std::borrow::Cow;
use std::io::{Cursor, Write};

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use super::layout::{CoverSheet, FRAGILE, SIGNATURE, SUPPORT_TAG, TITLE};
use super::{OutputFormat, Renderer, Result};
use crate::error::RenderError;
use crate::models::invoice::ExtractedRecord;

const WORDML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

// A4 landscape in twentieths of a point, 1.5 cm margins
const PAGE_WIDTH: &str = "16838";
const PAGE_HEIGHT: &str = "11906";
const MARGIN: &str = "850";

// Footer cells: 8 cm, 6 cm, 8 cm
const CELL_WIDE: &str = "4535";
const CELL_NARROW: &str = "3402";

const RED: &str = "FF0000";
const BLUE: &str = "0000FF";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Center,
}

/// A run of text with its character formatting.
#[derive(Debug, Clone, Copy)]
struct Run<'a> {
    text: &'a str,
    bold: bool,
    /// Font size in half points.
    size: u32,
    color: Option<&'static str>,
}

impl<'a> Run<'a> {
    fn plain(text: &'a str, size: u32) -> Self {
        Self {
            text,
            bold: false,
            size,
            color: None,
        }
    }

    fn bold(text: &'a str, size: u32) -> Self {
        Self {
            bold: true,
            ..Self::plain(text, size)
        }
    }

    fn colored(self, color: &'static str) -> Self {
        Self {
            color: Some(color),
            ..self
        }
    }
}

/// Renders cover sheets as WordprocessingML documents.
#[derive(Debug, Clone, Default)]
pub struct DocxRenderer;

impl DocxRenderer {
    pub fn new() -> Self {
        Self
    }

    fn document_xml(&self, sheet: &CoverSheet) -> Result<Vec<u8>> {
        let mut xml = XmlBuilder::new();
        xml.declaration()?;
        xml.start("w:document", &[("xmlns:w", WORDML_NS)])?;
        xml.start("w:body", &[])?;

        xml.paragraph(Align::Center, &[Run::bold(TITLE, 32)], false)?;
        xml.paragraph(Align::Center, &[Run::bold(&sheet.store, 96).colored(RED)], false)?;

        for (i, line) in sheet.recipient.iter().enumerate() {
            // Separator under the last recipient line
            let last = i + 1 == sheet.recipient.len();
            xml.paragraph(Align::Left, &[Run::plain(line, 32)], last)?;
        }

        xml.paragraph(Align::Left, &[Run::bold(SUPPORT_TAG, 32).colored(RED)], false)?;
        for line in &sheet.sender {
            xml.paragraph(Align::Left, &[Run::plain(line, 32)], false)?;
        }

        xml.paragraph(Align::Left, &[], false)?;
        self.footer_table(&mut xml, sheet)?;

        xml.paragraph(Align::Center, &[Run::plain(&sheet.access_key, 22)], false)?;
        xml.paragraph(Align::Center, &[Run::plain(SIGNATURE, 24)], false)?;

        self.section_properties(&mut xml)?;
        xml.end("w:body")?;
        xml.end("w:document")?;

        Ok(xml.finish())
    }

    fn footer_table(&self, xml: &mut XmlBuilder, sheet: &CoverSheet) -> Result<()> {
        xml.start("w:tbl", &[])?;
        xml.start("w:tblPr", &[])?;
        xml.empty("w:jc", &[("w:val", "center")])?;
        xml.start("w:tblBorders", &[])?;
        for side in ["w:top", "w:left", "w:bottom", "w:right", "w:insideV"] {
            xml.empty(side, &[("w:val", "single"), ("w:sz", "8"), ("w:color", "000000")])?;
        }
        xml.end("w:tblBorders")?;
        xml.end("w:tblPr")?;

        xml.start("w:tblGrid", &[])?;
        for width in [CELL_WIDE, CELL_NARROW, CELL_WIDE] {
            xml.empty("w:gridCol", &[("w:w", width)])?;
        }
        xml.end("w:tblGrid")?;

        xml.start("w:tr", &[])?;
        xml.cell(
            CELL_WIDE,
            &[
                &[Run::plain("SOB NOTA FISCAL", 24)],
                &[Run::bold(&sheet.invoice, 36).colored(BLUE)],
                &[Run::plain(&sheet.series, 24)],
            ],
        )?;
        xml.cell(CELL_NARROW, &[&[Run::bold(FRAGILE, 72).colored(RED)]])?;
        xml.cell(
            CELL_WIDE,
            &[
                &[Run::plain("Nº DE VOLUME", 24)],
                &[Run::bold(&sheet.volume, 36).colored(RED)],
            ],
        )?;
        xml.end("w:tr")?;

        xml.end("w:tbl")
    }

    fn section_properties(&self, xml: &mut XmlBuilder) -> Result<()> {
        xml.start("w:sectPr", &[])?;
        xml.empty(
            "w:pgSz",
            &[("w:w", PAGE_WIDTH), ("w:h", PAGE_HEIGHT), ("w:orient", "landscape")],
        )?;
        xml.empty(
            "w:pgMar",
            &[
                ("w:top", MARGIN),
                ("w:right", MARGIN),
                ("w:bottom", MARGIN),
                ("w:left", MARGIN),
                ("w:header", "0"),
                ("w:footer", "0"),
                ("w:gutter", "0"),
            ],
        )?;
        xml.end("w:sectPr")
    }

    fn package(&self, document: &[u8]) -> Result<Vec<u8>> {
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(DateTime::default());

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let parts: [(&str, &[u8]); 3] = [
            ("[Content_Types].xml", CONTENT_TYPES.as_bytes()),
            ("_rels/.rels", ROOT_RELS.as_bytes()),
            ("word/document.xml", document),
        ];

        for (name, data) in parts {
            zip.start_file(name, options).map_err(zip_error)?;
            zip.write_all(data).map_err(|e| RenderError::Document(e.to_string()))?;
        }

        let cursor = zip.finish().map_err(zip_error)?;
        Ok(cursor.into_inner())
    }
}

impl Renderer for DocxRenderer {
    fn format(&self) -> OutputFormat {
        OutputFormat::Docx
    }

    fn try_render(&self, record: &ExtractedRecord, volume: &str) -> Result<Vec<u8>> {
        let sheet = CoverSheet::build(record, volume);
        let document = self.document_xml(&sheet)?;
        let bytes = self.package(&document)?;

        debug!("Rendered DOCX cover sheet ({} bytes)", bytes.len());
        Ok(bytes)
    }
}

/// Drop characters XML 1.0 does not allow in text (C0 controls other than
/// tab and line breaks, and the U+FFFE/U+FFFF noncharacters).
fn xml_safe(text: &str) -> Cow<'_, str> {
    let allowed = |c: char| {
        matches!(c, '\t' | '\n' | '\r') || (c >= ' ' && c != '\u{FFFE}' && c != '\u{FFFF}')
    };

    if text.chars().all(allowed) {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(text.chars().filter(|c| allowed(*c)).collect())
    }
}

fn zip_error(e: zip::result::ZipError) -> RenderError {
    RenderError::Document(e.to_string())
}

/// Thin wrapper over the quick-xml writer with WordprocessingML helpers.
struct XmlBuilder {
    writer: Writer<Vec<u8>>,
}

impl XmlBuilder {
    fn new() -> Self {
        Self {
            writer: Writer::new(Vec::new()),
        }
    }

    fn write(&mut self, event: Event<'_>) -> Result<()> {
        self.writer
            .write_event(event)
            .map_err(|e| RenderError::Document(e.to_string()))
    }

    fn declaration(&mut self) -> Result<()> {
        self.write(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
    }

    fn element<'a>(name: &'a str, attributes: &[(&'a str, &'a str)]) -> BytesStart<'a> {
        let mut element = BytesStart::new(name);
        for attribute in attributes {
            element.push_attribute(*attribute);
        }
        element
    }

    fn start(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<()> {
        self.write(Event::Start(Self::element(name, attributes)))
    }

    fn empty(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<()> {
        self.write(Event::Empty(Self::element(name, attributes)))
    }

    fn end(&mut self, name: &str) -> Result<()> {
        self.write(Event::End(BytesEnd::new(name)))
    }

    fn paragraph(&mut self, align: Align, runs: &[Run<'_>], border_below: bool) -> Result<()> {
        self.start("w:p", &[])?;

        if align == Align::Center || border_below {
            self.start("w:pPr", &[])?;
            if border_below {
                self.start("w:pBdr", &[])?;
                self.empty(
                    "w:bottom",
                    &[("w:val", "single"), ("w:sz", "6"), ("w:space", "1"), ("w:color", "000000")],
                )?;
                self.end("w:pBdr")?;
            }
            if align == Align::Center {
                self.empty("w:jc", &[("w:val", "center")])?;
            }
            self.end("w:pPr")?;
        }

        for run in runs {
            self.run(run)?;
        }

        self.end("w:p")
    }

    fn run(&mut self, run: &Run<'_>) -> Result<()> {
        let size = run.size.to_string();

        self.start("w:r", &[])?;
        self.start("w:rPr", &[])?;
        if run.bold {
            self.empty("w:b", &[])?;
        }
        if let Some(color) = run.color {
            self.empty("w:color", &[("w:val", color)])?;
        }
        self.empty("w:sz", &[("w:val", size.as_str())])?;
        self.end("w:rPr")?;

        self.start("w:t", &[("xml:space", "preserve")])?;
        let text = xml_safe(run.text);
        self.write(Event::Text(BytesText::new(&text)))?;
        self.end("w:t")?;
        self.end("w:r")
    }

    /// Table cell holding one centered paragraph per entry.
    fn cell(&mut self, width: &str, paragraphs: &[&[Run<'_>]]) -> Result<()> {
        self.start("w:tc", &[])?;
        self.start("w:tcPr", &[])?;
        self.empty("w:tcW", &[("w:w", width), ("w:type", "dxa")])?;
        self.empty("w:vAlign", &[("w:val", "center")])?;
        self.end("w:tcPr")?;

        for runs in paragraphs {
            self.paragraph(Align::Center, runs, false)?;
        }

        self.end("w:tc")
    }

    fn finish(self) -> Vec<u8> {
        self.writer.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use zip::ZipArchive;

    fn sample_record() -> ExtractedRecord {
        let mut record = ExtractedRecord::new();
        record.numero_nfe = "000123".to_string();
        record.loja = "7042".to_string();
        record.destinatario_nome = "EMPREENDIMENTOS PAGUE MENOS S/A".to_string();
        record.remetente_endereco = "R & D <LAB>".to_string();
        record
    }

    fn document_xml(bytes: &[u8]) -> String {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut xml = String::new();
        archive
            .by_name("word/document.xml")
            .unwrap()
            .read_to_string(&mut xml)
            .unwrap();
        xml
    }

    #[test]
    fn test_package_parts() {
        let bytes = DocxRenderer::new().try_render(&sample_record(), "1/1").unwrap();
        let mut archive = ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();

        let mut names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec!["[Content_Types].xml", "_rels/.rels", "word/document.xml"]);
    }

    #[test]
    fn test_document_holds_fields() {
        let bytes = DocxRenderer::new().try_render(&sample_record(), "2/3").unwrap();
        let xml = document_xml(&bytes);

        assert!(xml.contains("CAPA DE RECEBIMENTO DE FRETE"));
        assert!(xml.contains("LOJA 7042"));
        assert!(xml.contains("EMPREENDIMENTOS PAGUE MENOS S/A"));
        assert!(xml.contains("SUPORTE TECNICO"));
        assert!(xml.contains("NF-e Nº 000123"));
        assert!(xml.contains("VOLUME: 2/3"));
        assert!(xml.contains("CHAVE: N/A..."));
        assert!(xml.contains(r#"w:orient="landscape""#));
    }

    #[test]
    fn test_text_is_escaped() {
        let bytes = DocxRenderer::new().try_render(&sample_record(), "1/1").unwrap();
        let xml = document_xml(&bytes);
        assert!(xml.contains("R &amp; D &lt;LAB&gt;"));
    }

    #[test]
    fn test_control_characters_dropped() {
        let mut record = sample_record();
        record.destinatario_nome = "PAGUE\u{1}MENOS\u{b} LOJA".to_string();

        let bytes = DocxRenderer::new().try_render(&record, "1/1").unwrap();
        let xml = document_xml(&bytes);

        assert!(xml.contains("PAGUEMENOS LOJA"));
        assert!(!xml.chars().any(|c| c < ' ' && !matches!(c, '\t' | '\n' | '\r')));
    }

    #[test]
    fn test_xml_safe_keeps_clean_text() {
        assert!(matches!(xml_safe("FRÁGIL\tÚNICO"), Cow::Borrowed(_)));
        assert_eq!(xml_safe("A\u{0}B\u{FFFF}C"), "ABC");
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let renderer = DocxRenderer::new();
        let record = sample_record();
        assert_eq!(
            renderer.try_render(&record, "1/1").unwrap(),
            renderer.try_render(&record, "1/1").unwrap()
        );
    }
}

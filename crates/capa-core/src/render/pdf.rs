//! Fixed-layout PDF cover sheet built with lopdf.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use tracing::debug;

use super::layout::{CoverSheet, FRAGILE, SIGNATURE, SUPPORT_TAG, TITLE};
use super::{OutputFormat, Renderer, Result};
use crate::error::RenderError;
use crate::models::invoice::ExtractedRecord;

// A4 landscape, in points
const PAGE_WIDTH: f32 = 842.0;
const PAGE_HEIGHT: f32 = 595.0;
// 1.5 cm
const MARGIN: f32 = 42.52;
const PRINTABLE_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;
const MIN_FONT_SIZE: f32 = 6.0;

const BODY_SIZE: f32 = 16.0;
const BODY_LEADING: f32 = 20.0;

// Footer boxes: invoice 8 cm, fragile 6 cm, volume 8 cm
const BOX_WIDE: f32 = 226.77;
const BOX_NARROW: f32 = 170.08;
const BOX_HEIGHT: f32 = 80.0;
const BOX_BOTTOM: f32 = 112.0;

#[derive(Debug, Clone, Copy)]
enum Font {
    Regular,
    Bold,
}

impl Font {
    fn resource(self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
        }
    }

    /// Average glyph advance as a fraction of the font size.
    fn average_advance(self) -> f32 {
        match self {
            Font::Regular => 0.56,
            Font::Bold => 0.61,
        }
    }
}

type Rgb = (f32, f32, f32);

const BLACK: Rgb = (0.0, 0.0, 0.0);
const RED: Rgb = (0.85, 0.0, 0.0);
const BLUE: Rgb = (0.0, 0.0, 0.8);

/// Renders cover sheets as a single landscape A4 page.
///
/// Text uses the standard Helvetica fonts with WinAnsi encoding; characters
/// outside that code page print as `?`. Lines wider than the printable area
/// are shrunk to fit.
#[derive(Debug, Clone, Default)]
pub struct PdfRenderer;

impl PdfRenderer {
    pub fn new() -> Self {
        Self
    }

    fn page_content(&self, sheet: &CoverSheet) -> Content {
        let mut page = PageBuilder::default();
        let mut y = PAGE_HEIGHT - MARGIN - 16.0;

        page.centered(Font::Bold, 16.0, y, BLACK, TITLE, MARGIN, PRINTABLE_WIDTH);
        y -= 60.0;
        page.centered(Font::Bold, 48.0, y, RED, &sheet.store, MARGIN, PRINTABLE_WIDTH);
        y -= 44.0;

        for line in &sheet.recipient {
            page.text(Font::Regular, BODY_SIZE, MARGIN, y, BLACK, line);
            y -= BODY_LEADING;
        }

        y += BODY_LEADING / 2.0;
        page.rule(MARGIN, y, PAGE_WIDTH - MARGIN, y);
        y -= BODY_LEADING + 4.0;

        page.text(Font::Bold, BODY_SIZE, MARGIN, y, RED, SUPPORT_TAG);
        y -= BODY_LEADING * 1.5;

        for line in &sheet.sender {
            page.text(Font::Regular, BODY_SIZE, MARGIN, y, BLACK, line);
            y -= BODY_LEADING;
        }

        self.footer(&mut page, sheet);
        page.finish()
    }

    fn footer(&self, page: &mut PageBuilder, sheet: &CoverSheet) {
        let total = 2.0 * BOX_WIDE + BOX_NARROW;
        let left = (PAGE_WIDTH - total) / 2.0;
        let middle = left + BOX_WIDE;
        let right = middle + BOX_NARROW;
        let top = BOX_BOTTOM + BOX_HEIGHT;

        page.rect(left, BOX_BOTTOM, BOX_WIDE, BOX_HEIGHT);
        page.rect(right, BOX_BOTTOM, BOX_WIDE, BOX_HEIGHT);

        let inner = BOX_WIDE - 20.0;
        page.centered(Font::Regular, 12.0, top - 22.0, BLACK, "SOB NOTA FISCAL", left + 10.0, inner);
        page.centered(Font::Bold, 18.0, top - 46.0, BLUE, &sheet.invoice, left + 10.0, inner);
        page.centered(Font::Regular, 12.0, top - 68.0, BLACK, &sheet.series, left + 10.0, inner);

        page.centered(
            Font::Bold,
            36.0,
            BOX_BOTTOM + BOX_HEIGHT / 2.0 - 12.0,
            RED,
            FRAGILE,
            middle,
            BOX_NARROW,
        );

        page.centered(Font::Regular, 12.0, top - 22.0, BLACK, "Nº DE VOLUME", right + 10.0, inner);
        page.centered(Font::Bold, 18.0, top - 52.0, RED, &sheet.volume, right + 10.0, inner);

        page.centered(
            Font::Regular,
            11.0,
            BOX_BOTTOM - 22.0,
            BLACK,
            &sheet.access_key,
            MARGIN,
            PRINTABLE_WIDTH,
        );
        page.centered(
            Font::Regular,
            12.0,
            MARGIN + 8.0,
            BLACK,
            SIGNATURE,
            MARGIN,
            PRINTABLE_WIDTH,
        );
    }

    fn build_document(&self, content: Content) -> Result<Vec<u8>> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let regular_id = doc.add_object(font_dictionary("Helvetica"));
        let bold_id = doc.add_object(font_dictionary("Helvetica-Bold"));
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => regular_id,
                "F2" => bold_id,
            },
        });

        let encoded = content
            .encode()
            .map_err(|e| RenderError::Pdf(e.to_string()))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

        let media_box: Vec<Object> =
            vec![0.into(), 0.into(), (PAGE_WIDTH as i64).into(), (PAGE_HEIGHT as i64).into()];

        // Set on the page itself; some readers ignore inherited attributes
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => media_box.clone(),
        });

        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => media_box,
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer)
            .map_err(|e| RenderError::Pdf(e.to_string()))?;

        debug!("Rendered PDF cover sheet ({} bytes)", buffer.len());
        Ok(buffer)
    }
}

impl Renderer for PdfRenderer {
    fn format(&self) -> OutputFormat {
        OutputFormat::Pdf
    }

    fn try_render(&self, record: &ExtractedRecord, volume: &str) -> Result<Vec<u8>> {
        let sheet = CoverSheet::build(record, volume);
        self.build_document(self.page_content(&sheet))
    }
}

fn font_dictionary(base_font: &str) -> lopdf::Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base_font,
        "Encoding" => "WinAnsiEncoding",
    }
}

/// Collects content stream operations for one page.
#[derive(Default)]
struct PageBuilder {
    operations: Vec<Operation>,
}

impl PageBuilder {
    fn text(&mut self, font: Font, size: f32, x: f32, y: f32, color: Rgb, text: &str) {
        let size = fitted_size(text, font, size, PAGE_WIDTH - MARGIN - x);
        self.show(font, size, x, y, color, text);
    }

    /// Text centered horizontally in `[x, x + width]`.
    #[allow(clippy::too_many_arguments)]
    fn centered(&mut self, font: Font, size: f32, y: f32, color: Rgb, text: &str, x: f32, width: f32) {
        let size = fitted_size(text, font, size, width);
        let offset = ((width - estimated_width(text, font, size)) / 2.0).max(0.0);
        self.show(font, size, x + offset, y, color, text);
    }

    fn show(&mut self, font: Font, size: f32, x: f32, y: f32, color: Rgb, text: &str) {
        let (r, g, b) = color;
        self.operations.extend([
            Operation::new("BT", vec![]),
            Operation::new("rg", vec![r.into(), g.into(), b.into()]),
            Operation::new("Tf", vec![font.resource().into(), size.into()]),
            Operation::new("Td", vec![x.into(), y.into()]),
            Operation::new("Tj", vec![Object::string_literal(win_ansi(text))]),
            Operation::new("ET", vec![]),
        ]);
    }

    fn rule(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) {
        self.operations.extend([
            Operation::new("w", vec![1.into()]),
            Operation::new("m", vec![x1.into(), y1.into()]),
            Operation::new("l", vec![x2.into(), y2.into()]),
            Operation::new("S", vec![]),
        ]);
    }

    fn rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.operations.extend([
            Operation::new("w", vec![1.into()]),
            Operation::new("re", vec![x.into(), y.into(), width.into(), height.into()]),
            Operation::new("S", vec![]),
        ]);
    }

    fn finish(self) -> Content {
        Content {
            operations: self.operations,
        }
    }
}

fn estimated_width(text: &str, font: Font, size: f32) -> f32 {
    text.chars().count() as f32 * size * font.average_advance()
}

/// Largest size not above `size` at which `text` fits in `max_width`.
fn fitted_size(text: &str, font: Font, size: f32, max_width: f32) -> f32 {
    let width = estimated_width(text, font, size);
    if width <= max_width || width == 0.0 {
        size
    } else {
        (size * max_width / width).max(MIN_FONT_SIZE)
    }
}

/// Encode text for the standard fonts' WinAnsi code page.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            ' '..='~' => c as u8,
            '\u{a0}'..='\u{ff}' => c as u32 as u8,
            '–' => 0x96,
            '—' => 0x97,
            '…' => 0x85,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            _ => b'?',
        })
        .collect()
}

//! Printable checklist export.
//!
//! Layout and rendering are separate: [`ChecklistLayout`] places every line
//! on an A4 page (top-left origin, millimetres) and is fully deterministic;
//! [`render_pdf`] draws it with `printpdf`. PDF metadata such as creation
//! date and document ID differ between renders, the visible content does not.

use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference};
use service_core::error::AppError;
use thiserror::Error;

pub const CHECKLIST_FILENAME: &str = "visa_checklist.pdf";
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

pub const TITLE: &str = "Visa Application Document Checklist";
pub const SUBTITLE: &str = "Personalized roadmap based on your AI consultation:";
pub const FOOTER: &str = "Generated by Visa Helper AI Support";

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 10.0;
const BOTTOM_MARGIN_MM: f32 = 20.0;
const LINE_HEIGHT_MM: f32 = 10.0;
const PT_TO_MM: f32 = 0.3528;

// Rough Helvetica advance width as a fraction of the font size.
const AVG_GLYPH_WIDTH: f32 = 0.5;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("PDF rendering failed: {0}")]
    Render(#[from] printpdf::Error),
}

impl From<ExportError> for AppError {
    fn from(err: ExportError) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Title,
    Body,
    Footer,
}

impl LineStyle {
    fn size_pt(self) -> f32 {
        match self {
            LineStyle::Title => 16.0,
            LineStyle::Body => 12.0,
            LineStyle::Footer => 10.0,
        }
    }

    fn font(self) -> BuiltinFont {
        match self {
            LineStyle::Title => BuiltinFont::HelveticaBold,
            LineStyle::Body => BuiltinFont::Helvetica,
            LineStyle::Footer => BuiltinFont::HelveticaOblique,
        }
    }
}

/// One positioned line of text. `y_mm` is the baseline, measured from the
/// top edge of the page.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutLine {
    pub page: usize,
    pub text: String,
    pub style: LineStyle,
    pub x_mm: f32,
    pub y_mm: f32,
    pub size_pt: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChecklistLayout {
    lines: Vec<LayoutLine>,
    pages: usize,
}

/// Cursor that flows fixed-height lines down the page, starting a new page
/// when the next line would cross the bottom margin.
struct Flow {
    page: usize,
    top: f32,
    lines: Vec<LayoutLine>,
}

impl Flow {
    fn new() -> Self {
        Self {
            page: 0,
            top: MARGIN_MM,
            lines: Vec::new(),
        }
    }

    fn gap(&mut self, mm: f32) {
        self.top += mm;
    }

    fn line(&mut self, text: String, style: LineStyle, centered: bool) {
        if self.top + LINE_HEIGHT_MM > PAGE_HEIGHT_MM - BOTTOM_MARGIN_MM {
            self.page += 1;
            self.top = MARGIN_MM;
        }

        let size_pt = style.size_pt();
        let size_mm = size_pt * PT_TO_MM;
        let x_mm = if centered {
            let width = text.chars().count() as f32 * size_mm * AVG_GLYPH_WIDTH;
            ((PAGE_WIDTH_MM - width) / 2.0).max(MARGIN_MM)
        } else {
            MARGIN_MM
        };
        let y_mm = self.top + LINE_HEIGHT_MM / 2.0 + 0.3 * size_mm;

        self.lines.push(LayoutLine {
            page: self.page,
            text,
            style,
            x_mm,
            y_mm,
            size_pt,
        });
        self.top += LINE_HEIGHT_MM;
    }
}

impl ChecklistLayout {
    pub fn new<S: AsRef<str>>(items: &[S]) -> Self {
        let mut flow = Flow::new();

        flow.line(TITLE.to_string(), LineStyle::Title, true);
        flow.gap(10.0);
        flow.line(SUBTITLE.to_string(), LineStyle::Body, false);
        flow.gap(5.0);
        for item in items {
            flow.line(format!("[ ] {}", item.as_ref()), LineStyle::Body, false);
        }
        flow.gap(10.0);
        flow.line(FOOTER.to_string(), LineStyle::Footer, true);

        let pages = flow.page + 1;
        Self {
            lines: flow.lines,
            pages,
        }
    }

    pub fn lines(&self) -> &[LayoutLine] {
        &self.lines
    }

    /// The `[ ] <label>` lines, in checklist order.
    pub fn item_lines(&self) -> impl Iterator<Item = &LayoutLine> {
        let count = self.lines.len();
        self.lines
            .iter()
            .enumerate()
            .filter(move |(i, _)| *i >= 2 && *i + 1 < count)
            .map(|(_, line)| line)
    }

    pub fn page_count(&self) -> usize {
        self.pages
    }
}

struct Fonts {
    title: IndirectFontRef,
    body: IndirectFontRef,
    footer: IndirectFontRef,
}

impl Fonts {
    fn load(doc: &PdfDocumentReference) -> Result<Self, ExportError> {
        Ok(Self {
            title: doc.add_builtin_font(LineStyle::Title.font())?,
            body: doc.add_builtin_font(LineStyle::Body.font())?,
            footer: doc.add_builtin_font(LineStyle::Footer.font())?,
        })
    }

    fn for_style(&self, style: LineStyle) -> &IndirectFontRef {
        match style {
            LineStyle::Title => &self.title,
            LineStyle::Body => &self.body,
            LineStyle::Footer => &self.footer,
        }
    }
}

/// Render the checklist as a downloadable PDF. Labels are written verbatim.
pub fn render_pdf<S: AsRef<str>>(items: &[S]) -> Result<Vec<u8>, ExportError> {
    let layout = ChecklistLayout::new(items);

    let (doc, first_page, first_layer) =
        PdfDocument::new(TITLE, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
    let fonts = Fonts::load(&doc)?;

    let mut layers = vec![doc.get_page(first_page).get_layer(first_layer)];
    for n in 1..layout.page_count() {
        let (page, layer) = doc.add_page(
            Mm(PAGE_WIDTH_MM),
            Mm(PAGE_HEIGHT_MM),
            format!("Layer {}", n + 1),
        );
        layers.push(doc.get_page(page).get_layer(layer));
    }

    for line in layout.lines() {
        // printpdf measures from the bottom edge.
        layers[line.page].use_text(
            line.text.as_str(),
            line.size_pt,
            Mm(line.x_mm),
            Mm(PAGE_HEIGHT_MM - line.y_mm),
            fonts.for_style(line.style),
        );
    }

    let bytes = doc.save_to_bytes()?;
    tracing::debug!(
        items = items.len(),
        pages = layout.page_count(),
        bytes = bytes.len(),
        "Checklist PDF rendered"
    );
    Ok(bytes)
}

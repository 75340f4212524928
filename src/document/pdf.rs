//! printpdf renderer for [`InvoiceLayout`].
//!
//! Rendering runs in two passes: [`plan_pages`] assigns every block (section,
//! table header, table row) to a page and a vertical position, then
//! [`render_pdf`] draws the plan. Planning first lets every page carry a
//! `Page i of n` footer.

use std::io::BufWriter;

use printpdf::{
    path::PaintMode, BuiltinFont, Color, Image, ImageTransform, IndirectFontRef, Line, Mm,
    PdfDocument, PdfLayerReference, Point, Rect, Rgb,
};

use super::layout::{Align, Field, GridCell, InvoiceLayout, Section, Signature, TableSection};
use crate::error::{DashboardError, Result};

const PAGE_W: f32 = 210.0;
const PAGE_H: f32 = 297.0;
const PAGE_MARGIN_X: f32 = 15.0;
const PAGE_MARGIN_TOP: f32 = 12.0;
const PAGE_MARGIN_BOTTOM: f32 = 12.0;
const FOOTER_H: f32 = 8.0;

const CONTENT_LEFT: f32 = PAGE_MARGIN_X;
const CONTENT_RIGHT: f32 = PAGE_W - PAGE_MARGIN_X;
const CONTENT_TOP: f32 = PAGE_H - PAGE_MARGIN_TOP;
const CONTENT_BOTTOM: f32 = PAGE_MARGIN_BOTTOM + FOOTER_H;

const LINE_H: f32 = 4.2;
const CELL_PAD: f32 = 2.0;
const ROW_PAD: f32 = 2.4;
const SECTION_GAP: f32 = 4.0;

const TITLE_H: f32 = 16.0;
const TABLE_HEADER_H: f32 = 7.0;
const SUMMARY_ROW_H: f32 = 6.0;
const SIGNATURE_H: f32 = 28.0;

const TEXT_SIZE: f32 = 8.3;
const HEADING_SIZE: f32 = 9.2;
const GRID_WRAP_CHARS: usize = 52;
const TEXT_WRAP_CHARS: usize = 105;

const LOGO_BOX_W: f32 = 40.0;
const LOGO_BOX_H: f32 = 14.0;
const LOGO_DPI: f32 = 300.0;

const PT_TO_MM: f32 = 25.4 / 72.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Block {
    Section(usize),
    TableHeader(usize),
    TableRow(usize, usize),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub page: usize,
    pub y_top: f32,
    pub height: f32,
    pub block: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PagePlan {
    pub placements: Vec<Placement>,
    pub page_count: usize,
}

impl PagePlan {
    pub fn rows_on_page(&self, page: usize) -> usize {
        self.placements
            .iter()
            .filter(|p| p.page == page && matches!(p.block, Block::TableRow(..)))
            .count()
    }
}

/// Greedy word wrap; words longer than a line are split.
pub(crate) fn wrap_text_lines(input: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut out: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in input.split_whitespace() {
        let word_len = word.chars().count();
        if word_len > max_chars {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
            let chars: Vec<char> = word.chars().collect();
            for chunk in chars.chunks(max_chars) {
                out.push(chunk.iter().collect());
            }
            if let Some(last) = out.pop() {
                current = last;
            }
            continue;
        }

        if current.is_empty() {
            current.push_str(word);
        } else if current.chars().count() + 1 + word_len <= max_chars {
            current.push(' ');
            current.push_str(word);
        } else {
            out.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }

    if !current.is_empty() {
        out.push(current);
    }
    if out.is_empty() {
        out.push(String::new());
    }
    out
}

fn field_lines(field: &Field, max_chars: usize) -> Vec<String> {
    wrap_text_lines(&format!("{}: {}", field.label, field.value), max_chars)
}

fn grid_cell_height(cell: &GridCell) -> f32 {
    let lines: usize = cell
        .fields
        .iter()
        .map(|f| field_lines(f, GRID_WRAP_CHARS).len())
        .sum();
    (1 + lines) as f32 * LINE_H + 2.0 * CELL_PAD
}

fn grid_row_heights(cells: &[GridCell]) -> Vec<f32> {
    cells
        .chunks(2)
        .map(|pair| pair.iter().map(grid_cell_height).fold(0.0, f32::max))
        .collect()
}

fn table_row_height(table: &TableSection, row: &[String]) -> f32 {
    let lines = table
        .columns
        .iter()
        .zip(row)
        .map(|(col, cell)| wrap_text_lines(cell, col.max_chars).len())
        .max()
        .unwrap_or(1);
    lines as f32 * LINE_H + ROW_PAD
}

fn section_height(section: &Section) -> f32 {
    match section {
        Section::Title { .. } => TITLE_H,
        Section::Grid { cells } => grid_row_heights(cells).iter().sum::<f32>() + SECTION_GAP,
        Section::Table(_) => 0.0,
        Section::Summary { rows } => rows.len() as f32 * SUMMARY_ROW_H + SECTION_GAP,
        Section::Text { lines, .. } => {
            let wrapped: usize = lines
                .iter()
                .map(|l| wrap_text_lines(l, TEXT_WRAP_CHARS).len())
                .sum();
            (1 + wrapped) as f32 * LINE_H + SECTION_GAP
        }
        Section::Fields { rows, .. } => (1 + rows.len()) as f32 * LINE_H + SECTION_GAP,
        Section::Signatures { .. } => SIGNATURE_H,
    }
}

struct Cursor {
    page: usize,
    y: f32,
    placements: Vec<Placement>,
}

impl Cursor {
    fn fits(&self, height: f32) -> bool {
        self.y - height >= CONTENT_BOTTOM
    }

    fn page_is_empty(&self) -> bool {
        (self.y - CONTENT_TOP).abs() < f32::EPSILON
    }

    fn new_page(&mut self) {
        self.page += 1;
        self.y = CONTENT_TOP;
    }

    /// Blocks taller than a whole page are placed anyway and clipped by the page edge.
    fn place(&mut self, block: Block, height: f32) {
        if !self.fits(height) && !self.page_is_empty() {
            self.new_page();
        }
        self.placements.push(Placement {
            page: self.page,
            y_top: self.y,
            height,
            block,
        });
        self.y -= height;
    }
}

/// Assigns every block of the layout to a page.
///
/// Item rows flow over as many pages as needed; the table header is repeated
/// at the top of each page that continues the table.
pub fn plan_pages(layout: &InvoiceLayout) -> PagePlan {
    let mut cursor = Cursor {
        page: 0,
        y: CONTENT_TOP,
        placements: Vec::new(),
    };

    for (idx, section) in layout.sections.iter().enumerate() {
        match section {
            Section::Table(table) => {
                let first_row_h = table
                    .rows
                    .first()
                    .map(|r| table_row_height(table, r))
                    .unwrap_or(0.0);
                if !cursor.fits(TABLE_HEADER_H + first_row_h) && !cursor.page_is_empty() {
                    cursor.new_page();
                }
                cursor.place(Block::TableHeader(idx), TABLE_HEADER_H);

                for (row_idx, row) in table.rows.iter().enumerate() {
                    let h = table_row_height(table, row);
                    if !cursor.fits(h) {
                        cursor.new_page();
                        cursor.place(Block::TableHeader(idx), TABLE_HEADER_H);
                    }
                    cursor.place(Block::TableRow(idx, row_idx), h);
                }
                cursor.y -= SECTION_GAP;
            }
            other => cursor.place(Block::Section(idx), section_height(other)),
        }
    }

    PagePlan {
        page_count: cursor.page + 1,
        placements: cursor.placements,
    }
}

fn text_width_mm(text: &str, font_size_pt: f32) -> f32 {
    // Builtin Helvetica exposes no metrics here; half an em per glyph is close
    // enough for right-aligned numbers and centered headings.
    text.chars().count() as f32 * font_size_pt * 0.53 * PT_TO_MM
}

fn push_line(layer: &PdfLayerReference, font: &IndirectFontRef, text: &str, font_size: f32, x: f32, y: f32) {
    layer.use_text(text, font_size, Mm(x), Mm(y), font);
}

fn push_line_right(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    text: &str,
    font_size: f32,
    x_right: f32,
    y: f32,
) {
    let x = (x_right - text_width_mm(text, font_size)).max(0.0);
    push_line(layer, font, text, font_size, x, y);
}

fn draw_rule_with_thickness(layer: &PdfLayerReference, x1: f32, x2: f32, y: f32, thickness: f32) {
    layer.set_outline_thickness(thickness);
    layer.add_line(Line {
        points: vec![
            (Point::new(Mm(x1), Mm(y)), false),
            (Point::new(Mm(x2), Mm(y)), false),
        ],
        is_closed: false,
    });
}

fn fill_rect_gray(layer: &PdfLayerReference, x: f32, y_top: f32, w: f32, h: f32, gray: f32) {
    layer.set_fill_color(Color::Rgb(Rgb::new(gray, gray, gray, None)));
    let rect = Rect::new(Mm(x), Mm(y_top - h), Mm(x + w), Mm(y_top)).with_mode(PaintMode::Fill);
    layer.add_rect(rect);
    layer.set_fill_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
}

fn stroke_rect(layer: &PdfLayerReference, x: f32, y_top: f32, w: f32, h: f32) {
    layer.set_outline_thickness(0.4);
    let rect = Rect::new(Mm(x), Mm(y_top - h), Mm(x + w), Mm(y_top)).with_mode(PaintMode::Stroke);
    layer.add_rect(rect);
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

/// Decodes a `data:image/*;base64,...` logo.
fn decode_logo(data_url: &str) -> Option<printpdf::image_crate::DynamicImage> {
    use base64::Engine as _;

    let s = data_url.trim();
    if !s.to_ascii_lowercase().starts_with("data:") {
        return None;
    }
    let comma = s.find(',')?;
    let (meta, data) = s.split_at(comma);
    if !meta.to_ascii_lowercase().contains(";base64") {
        return None;
    }
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(&data[1..])
        .ok()?;
    printpdf::image_crate::load_from_memory(&bytes).ok()
}

fn draw_logo(layer: &PdfLayerReference, data_url: &str) {
    let Some(img) = decode_logo(data_url) else {
        tracing::debug!("issuer logo is not a decodable data URL; skipping");
        return;
    };
    let natural_w = img.width().max(1) as f32 / LOGO_DPI * 25.4;
    let natural_h = img.height().max(1) as f32 / LOGO_DPI * 25.4;
    let scale = (LOGO_BOX_W / natural_w).min(LOGO_BOX_H / natural_h).max(0.01);

    let x = CONTENT_RIGHT - natural_w * scale;
    let y = CONTENT_TOP - natural_h * scale;
    Image::from_dynamic_image(&img).add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm(x)),
            translate_y: Some(Mm(y)),
            rotate: None,
            scale_x: Some(scale),
            scale_y: Some(scale),
            dpi: Some(LOGO_DPI),
        },
    );
}

fn draw_title(layer: &PdfLayerReference, fonts: &Fonts, text: &str, subtitle: &str, y_top: f32) {
    let title_size = 16.0;
    let width = CONTENT_RIGHT - CONTENT_LEFT;
    let x = CONTENT_LEFT + (width - text_width_mm(text, title_size)) / 2.0;
    push_line(layer, &fonts.bold, text, title_size, x, y_top - 6.0);
    push_line(layer, &fonts.regular, subtitle, 9.0, CONTENT_LEFT, y_top - 12.0);
    draw_rule_with_thickness(layer, CONTENT_LEFT, CONTENT_RIGHT, y_top - TITLE_H + 1.5, 0.85);
}

fn draw_grid(layer: &PdfLayerReference, fonts: &Fonts, cells: &[GridCell], y_top: f32) {
    let half = (CONTENT_RIGHT - CONTENT_LEFT) / 2.0;
    let mut y = y_top;
    for (pair, row_h) in cells.chunks(2).zip(grid_row_heights(cells)) {
        for (col, cell) in pair.iter().enumerate() {
            let x = CONTENT_LEFT + col as f32 * half;
            stroke_rect(layer, x, y, half, row_h);

            let text_x = x + CELL_PAD;
            let mut line_y = y - CELL_PAD - LINE_H + 1.0;
            push_line(layer, &fonts.bold, &cell.heading, HEADING_SIZE, text_x, line_y);
            for field in &cell.fields {
                for line in field_lines(field, GRID_WRAP_CHARS) {
                    line_y -= LINE_H;
                    push_line(layer, &fonts.regular, &line, TEXT_SIZE, text_x, line_y);
                }
            }
        }
        y -= row_h;
    }
}

fn column_edges(table: &TableSection) -> Vec<(f32, f32)> {
    let mut x = CONTENT_LEFT;
    table
        .columns
        .iter()
        .map(|c| {
            let left = x;
            x += c.width_mm;
            (left, x)
        })
        .collect()
}

fn draw_table_header(layer: &PdfLayerReference, fonts: &Fonts, table: &TableSection, y_top: f32) {
    fill_rect_gray(layer, CONTENT_LEFT, y_top, CONTENT_RIGHT - CONTENT_LEFT, TABLE_HEADER_H, 0.92);
    let baseline = y_top - TABLE_HEADER_H + 2.2;
    for (col, (left, right)) in table.columns.iter().zip(column_edges(table)) {
        match col.align {
            Align::Left => push_line(layer, &fonts.bold, &col.title, TEXT_SIZE, left + 1.2, baseline),
            Align::Right => {
                push_line_right(layer, &fonts.bold, &col.title, TEXT_SIZE, right - 1.2, baseline)
            }
        }
    }
    draw_rule_with_thickness(layer, CONTENT_LEFT, CONTENT_RIGHT, y_top, 0.45);
    draw_rule_with_thickness(layer, CONTENT_LEFT, CONTENT_RIGHT, y_top - TABLE_HEADER_H, 0.6);
}

fn draw_table_row(
    layer: &PdfLayerReference,
    fonts: &Fonts,
    table: &TableSection,
    row: &[String],
    y_top: f32,
    height: f32,
) {
    let first_baseline = y_top - LINE_H + 0.6;
    for ((col, cell), (left, right)) in table.columns.iter().zip(row).zip(column_edges(table)) {
        for (i, line) in wrap_text_lines(cell, col.max_chars).iter().enumerate() {
            let y = first_baseline - i as f32 * LINE_H;
            match col.align {
                Align::Left => push_line(layer, &fonts.regular, line, TEXT_SIZE, left + 1.2, y),
                Align::Right => push_line_right(layer, &fonts.regular, line, TEXT_SIZE, right - 1.2, y),
            }
        }
    }
    draw_rule_with_thickness(layer, CONTENT_LEFT, CONTENT_RIGHT, y_top - height, 0.2);
}

fn draw_summary(layer: &PdfLayerReference, fonts: &Fonts, rows: &[Field], y_top: f32) {
    let label_x = CONTENT_RIGHT - 75.0;
    let value_right = CONTENT_RIGHT - 1.2;
    for (i, row) in rows.iter().enumerate() {
        let y = y_top - (i as f32 + 1.0) * SUMMARY_ROW_H + 1.8;
        // Total and balance are emphasized.
        let font = if i + 2 >= rows.len() { &fonts.bold } else { &fonts.regular };
        push_line(layer, font, &row.label, 9.0, label_x, y);
        push_line_right(layer, font, &row.value, 9.0, value_right, y);
    }
    let bottom = y_top - rows.len() as f32 * SUMMARY_ROW_H;
    draw_rule_with_thickness(layer, label_x, CONTENT_RIGHT, bottom, 0.85);
}

fn draw_text(layer: &PdfLayerReference, fonts: &Fonts, heading: &str, lines: &[String], y_top: f32) {
    let mut y = y_top - LINE_H + 0.6;
    push_line(layer, &fonts.bold, heading, HEADING_SIZE, CONTENT_LEFT, y);
    for line in lines.iter().flat_map(|l| wrap_text_lines(l, TEXT_WRAP_CHARS)) {
        y -= LINE_H;
        push_line(layer, &fonts.regular, &line, TEXT_SIZE, CONTENT_LEFT, y);
    }
}

fn draw_fields(layer: &PdfLayerReference, fonts: &Fonts, heading: &str, rows: &[Field], y_top: f32) {
    let mut y = y_top - LINE_H + 0.6;
    push_line(layer, &fonts.bold, heading, HEADING_SIZE, CONTENT_LEFT, y);
    for row in rows {
        y -= LINE_H;
        push_line(layer, &fonts.regular, &format!("{}: {}", row.label, row.value), TEXT_SIZE, CONTENT_LEFT, y);
    }
}

fn draw_signatures(layer: &PdfLayerReference, fonts: &Fonts, blocks: &[Signature], prepared_on: &str, y_top: f32) {
    let block_w = 60.0;
    let slots = blocks.len().max(1) as f32;
    let spacing = (CONTENT_RIGHT - CONTENT_LEFT - block_w) / (slots - 1.0).max(1.0);
    for (i, sig) in blocks.iter().enumerate() {
        let x = CONTENT_LEFT + i as f32 * spacing;
        let rule_y = y_top - 14.0;
        draw_rule_with_thickness(layer, x, x + block_w, rule_y, 0.4);
        push_line(layer, &fonts.bold, &sig.title, TEXT_SIZE, x, rule_y - LINE_H);
        push_line(layer, &fonts.regular, &sig.name, TEXT_SIZE, x, rule_y - 2.0 * LINE_H);
        if sig.dated {
            push_line(layer, &fonts.regular, &format!("Date: {}", prepared_on), TEXT_SIZE, x, rule_y - 3.0 * LINE_H);
        }
    }
}

fn draw_footer(layer: &PdfLayerReference, fonts: &Fonts, invoice_no: &str, page: usize, page_count: usize) {
    draw_rule_with_thickness(layer, CONTENT_LEFT, CONTENT_RIGHT, PAGE_MARGIN_BOTTOM + 4.0, 0.3);
    push_line(layer, &fonts.regular, &format!("Invoice {}", invoice_no), 7.0, CONTENT_LEFT, PAGE_MARGIN_BOTTOM);
    push_line_right(
        layer,
        &fonts.regular,
        &format!("Page {} of {}", page + 1, page_count),
        7.0,
        CONTENT_RIGHT,
        PAGE_MARGIN_BOTTOM,
    );
}

#[derive(Debug, Clone)]
pub struct RenderedPdf {
    pub bytes: Vec<u8>,
    pub page_count: usize,
}

pub fn render_pdf(layout: &InvoiceLayout) -> Result<RenderedPdf> {
    let plan = plan_pages(layout);

    let (doc, page1, layer1) = PdfDocument::new(
        format!("Invoice {}", layout.invoice_no),
        Mm(PAGE_W),
        Mm(PAGE_H),
        "Layer 1",
    );
    let mut layers = vec![doc.get_page(page1).get_layer(layer1)];
    for _ in 1..plan.page_count {
        let (page, layer) = doc.add_page(Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
        layers.push(doc.get_page(page).get_layer(layer));
    }

    let fonts = Fonts {
        regular: doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| DashboardError::Document(e.to_string()))?,
        bold: doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| DashboardError::Document(e.to_string()))?,
    };

    if let Some(logo) = layout.logo.as_deref() {
        draw_logo(&layers[0], logo);
    }

    let prepared_on = layout.prepared_on.display();
    for placement in &plan.placements {
        let layer = &layers[placement.page];
        match placement.block {
            Block::TableHeader(idx) => {
                if let Section::Table(table) = &layout.sections[idx] {
                    draw_table_header(layer, &fonts, table, placement.y_top);
                }
            }
            Block::TableRow(idx, row) => {
                if let Section::Table(table) = &layout.sections[idx] {
                    draw_table_row(layer, &fonts, table, &table.rows[row], placement.y_top, placement.height);
                }
            }
            Block::Section(idx) => match &layout.sections[idx] {
                Section::Title { text, subtitle } => draw_title(layer, &fonts, text, subtitle, placement.y_top),
                Section::Grid { cells } => draw_grid(layer, &fonts, cells, placement.y_top),
                Section::Summary { rows } => draw_summary(layer, &fonts, rows, placement.y_top),
                Section::Text { heading, lines } => draw_text(layer, &fonts, heading, lines, placement.y_top),
                Section::Fields { heading, rows } => draw_fields(layer, &fonts, heading, rows, placement.y_top),
                Section::Signatures { blocks } => {
                    draw_signatures(layer, &fonts, blocks, &prepared_on, placement.y_top)
                }
                Section::Table(_) => {}
            },
        }
    }

    for (page, layer) in layers.iter().enumerate() {
        draw_footer(layer, &fonts, &layout.invoice_no, page, plan.page_count);
    }

    let mut writer = BufWriter::new(Vec::<u8>::new());
    doc.save(&mut writer)
        .map_err(|e| DashboardError::Document(e.to_string()))?;
    let bytes = writer
        .into_inner()
        .map_err(|e| DashboardError::Document(e.to_string()))?;

    Ok(RenderedPdf {
        bytes,
        page_count: plan.page_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::layout::PreparedOn;
    use crate::models::{InvoiceRecord, IssuerProfile, LineItem, ProductRef};
    use time::macros::date;

    fn invoice_with(n: usize) -> InvoiceRecord {
        let items = (0..n)
            .map(|i| LineItem {
                product: Some(ProductRef {
                    name: Some(format!("Part {i}")),
                    ..ProductRef::default()
                }),
                quantity: 1,
                amount: 10.0,
            })
            .collect::<Vec<_>>();
        let json = serde_json::json!({"invoice_no": "INV-9", "subtotal": 10.0 * n as f64, "total": 10.0 * n as f64});
        let mut inv: InvoiceRecord = serde_json::from_value(json).unwrap();
        inv.items = items;
        inv
    }

    fn layout(n: usize) -> InvoiceLayout {
        InvoiceLayout::build(&invoice_with(n), &IssuerProfile::default(), PreparedOn(date!(2024 - 05 - 01)))
    }

    #[test]
    fn wrap_splits_on_words_and_long_tokens() {
        assert_eq!(wrap_text_lines("alpha beta gamma", 10), vec!["alpha beta", "gamma"]);
        assert_eq!(wrap_text_lines("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
        assert_eq!(wrap_text_lines("", 4), vec![String::new()]);
    }

    #[test]
    fn small_invoice_fits_one_page() {
        let plan = plan_pages(&layout(3));
        assert_eq!(plan.page_count, 1);
        assert_eq!(plan.rows_on_page(0), 3);
        let headers = plan
            .placements
            .iter()
            .filter(|p| matches!(p.block, Block::TableHeader(_)))
            .count();
        assert_eq!(headers, 1);
    }

    #[test]
    fn long_invoice_flows_over_pages_with_repeated_header() {
        let plan = plan_pages(&layout(120));
        assert!(plan.page_count > 1);

        let mut seen: Vec<usize> = plan
            .placements
            .iter()
            .filter_map(|p| match p.block {
                Block::TableRow(_, r) => Some(r),
                _ => None,
            })
            .collect();
        assert_eq!(seen, (0..120).collect::<Vec<_>>());
        seen.dedup();
        assert_eq!(seen.len(), 120);

        for page in 0..plan.page_count {
            if plan.rows_on_page(page) > 0 {
                assert!(plan.placements.iter().any(|p| p.page == page && matches!(p.block, Block::TableHeader(_))));
            }
        }
        for p in &plan.placements {
            assert!(p.y_top - p.height >= CONTENT_BOTTOM - 0.01, "{p:?} overflows");
        }
    }

    #[test]
    fn renders_pdf_bytes() {
        let rendered = render_pdf(&layout(0)).unwrap();
        assert_eq!(rendered.page_count, 1);
        assert!(rendered.bytes.starts_with(b"%PDF"));
    }
}

//! PDF invoice rendering.
//!
//! The byte output is a deterministic function of the order snapshot apart
//! from the document metadata timestamp, so tests assert against the
//! geometry in [`layout`] rather than raw bytes.

pub mod layout;

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use printpdf::image_crate::codecs::png::PngDecoder;
use printpdf::{
    BuiltinFont, Color, Image, ImageTransform, IndirectFontRef, Line, Mm, PdfDocument,
    PdfDocumentReference, PdfLayerReference, Point, Rgb,
};
use tracing::warn;

use crate::domain::order::Order;
use crate::error::{AppError, Result};
use layout::{Rule, BODY_FONT_SIZE, ROW_HEIGHT};

const PAGE_WIDTH_PT: f32 = 595.28;
const PAGE_HEIGHT_PT: f32 = 841.89;
const MARGIN_PT: f32 = 50.0;
const PT_TO_MM: f32 = 25.4 / 72.0;

const TITLE_FONT_SIZE: f32 = 20.0;
const HEADING_FONT_SIZE: f32 = 14.0;
const LINE_HEIGHT: f32 = 15.0;
const TITLE_TOP: f32 = 50.0;
const META_TOP: f32 = 90.0;
const LOGO_LEFT: f32 = 50.0;
const LOGO_TOP: f32 = 30.0;
const LOGO_WIDTH_PT: f32 = 100.0;

/// Optional branding resources. Either may be absent or unreadable without
/// failing a render.
#[derive(Clone, Debug, Default)]
pub struct InvoiceAssets {
    pub font_path: Option<PathBuf>,
    pub logo_path: Option<PathBuf>,
}

pub fn render(order: &Order, assets: &InvoiceAssets) -> Result<Vec<u8>> {
    let (doc, page, layer) = PdfDocument::new(
        format!("invoice-{}", order.id()),
        Mm(PAGE_WIDTH_PT * PT_TO_MM),
        Mm(PAGE_HEIGHT_PT * PT_TO_MM),
        "invoice",
    );
    let font = load_font(&doc, assets.font_path.as_deref())?;
    let mut layer = doc.get_page(page).get_layer(layer);
    prepare_layer(&layer);

    place_logo(&layer, assets.logo_path.as_deref());

    let title = "INVOICE";
    draw_text(
        &layer,
        &font,
        title,
        TITLE_FONT_SIZE,
        centered_x(title, TITLE_FONT_SIZE),
        TITLE_TOP,
    );

    let mut y = META_TOP;
    for line in metadata_lines(order) {
        draw_text(&layer, &font, &line, BODY_FONT_SIZE, MARGIN_PT, y);
        y += LINE_HEIGHT;
    }

    y += LINE_HEIGHT;
    let heading = "Order Details:";
    draw_text(&layer, &font, heading, HEADING_FONT_SIZE, MARGIN_PT, y);
    draw_rule(
        &layer,
        &Rule {
            x1: MARGIN_PT,
            y1: y + HEADING_FONT_SIZE + 2.0,
            x2: MARGIN_PT + layout::text_width(heading, HEADING_FONT_SIZE),
            y2: y + HEADING_FONT_SIZE + 2.0,
        },
    );
    y += HEADING_FONT_SIZE + LINE_HEIGHT;

    // Table rows continue on fresh pages when they would cross the bottom
    // margin; the header row is repeated per page.
    let mut remaining = order.line_items();
    let mut first_index = 0usize;
    let mut table_top = y;
    let table_bottom = loop {
        let take = remaining.len().min(rows_that_fit(table_top));
        let table = layout::table_layout(&remaining[..take], first_index, table_top);
        draw_table(&layer, &font, &table);
        remaining = &remaining[take..];
        first_index += take;
        if remaining.is_empty() {
            break table_top + (take as f32 + 1.0) * ROW_HEIGHT;
        }
        layer = add_page(&doc);
        table_top = MARGIN_PT;
    };

    let footer_height = 7.0 * LINE_HEIGHT;
    let mut fy = table_bottom + 2.0 * LINE_HEIGHT;
    if fy + footer_height > PAGE_HEIGHT_PT - MARGIN_PT {
        layer = add_page(&doc);
        fy = MARGIN_PT;
    }

    let total_line = format!("Total: {}", layout::format_vnd(order.amounts().total));
    draw_text(
        &layer,
        &font,
        &total_line,
        BODY_FONT_SIZE,
        right_x(&total_line, BODY_FONT_SIZE),
        fy,
    );
    fy += LINE_HEIGHT;
    let payment_line = format!("Payment method: {}", order.payment_method());
    draw_text(
        &layer,
        &font,
        &payment_line,
        BODY_FONT_SIZE,
        right_x(&payment_line, BODY_FONT_SIZE),
        fy,
    );

    fy += 3.0 * LINE_HEIGHT;
    let thanks = "Thank you for purchasing!";
    draw_text(
        &layer,
        &font,
        thanks,
        BODY_FONT_SIZE,
        centered_x(thanks, BODY_FONT_SIZE),
        fy,
    );
    fy += LINE_HEIGHT;
    let contact = "Contact with us: 0123456789";
    draw_text(
        &layer,
        &font,
        contact,
        BODY_FONT_SIZE,
        centered_x(contact, BODY_FONT_SIZE),
        fy,
    );

    doc.save_to_bytes().map_err(|e| AppError::Pdf(e.to_string()))
}

fn metadata_lines(order: &Order) -> [String; 6] {
    let ship = order.shipping();
    [
        format!("Order ID: {}", order.id()),
        format!("Order date: {}", order.created_at().format("%d/%m/%Y")),
        format!("Customer: {}", ship.full_name),
        format!("Email: {}", ship.email),
        format!("Phone Number: {}", ship.phone),
        format!("Address: {}", ship.address),
    ]
}

/// Table rows (header excluded) that fit between `table_top` and the bottom
/// margin. At least one, so a pathologically low start still makes progress.
fn rows_that_fit(table_top: f32) -> usize {
    let available = ((PAGE_HEIGHT_PT - MARGIN_PT - table_top) / ROW_HEIGHT).floor() as usize;
    available.saturating_sub(1).max(1)
}

fn draw_table(layer: &PdfLayerReference, font: &IndirectFontRef, table: &layout::TableLayout) {
    for cell in &table.cells {
        let x = layout::aligned_x(cell, BODY_FONT_SIZE);
        let y = cell.y + (ROW_HEIGHT - BODY_FONT_SIZE) / 2.0;
        draw_text(layer, font, &cell.text, BODY_FONT_SIZE, x, y);
    }
    for rule in &table.rules {
        draw_rule(layer, rule);
    }
}

fn add_page(doc: &PdfDocumentReference) -> PdfLayerReference {
    let (page, layer) = doc.add_page(
        Mm(PAGE_WIDTH_PT * PT_TO_MM),
        Mm(PAGE_HEIGHT_PT * PT_TO_MM),
        "invoice",
    );
    let layer = doc.get_page(page).get_layer(layer);
    prepare_layer(&layer);
    layer
}

fn prepare_layer(layer: &PdfLayerReference) {
    layer.set_outline_thickness(0.5);
    layer.set_outline_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
}

fn centered_x(text: &str, font_size: f32) -> f32 {
    let content = PAGE_WIDTH_PT - 2.0 * MARGIN_PT;
    MARGIN_PT + ((content - layout::text_width(text, font_size)) / 2.0).max(0.0)
}

fn right_x(text: &str, font_size: f32) -> f32 {
    PAGE_WIDTH_PT - MARGIN_PT - layout::text_width(text, font_size)
}

fn mm_x(x_pt: f32) -> Mm {
    Mm(x_pt * PT_TO_MM)
}

/// Flips a top-down y to the PDF's bottom-left origin.
fn mm_y(y_pt: f32) -> Mm {
    Mm((PAGE_HEIGHT_PT - y_pt) * PT_TO_MM)
}

fn draw_text(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    text: &str,
    font_size: f32,
    x_pt: f32,
    top_y_pt: f32,
) {
    layer.use_text(text, font_size, mm_x(x_pt), mm_y(top_y_pt + font_size), font);
}

fn draw_rule(layer: &PdfLayerReference, rule: &Rule) {
    layer.add_line(Line {
        points: vec![
            (Point::new(mm_x(rule.x1), mm_y(rule.y1)), false),
            (Point::new(mm_x(rule.x2), mm_y(rule.y2)), false),
        ],
        is_closed: false,
    });
}

fn load_font(doc: &PdfDocumentReference, path: Option<&Path>) -> Result<IndirectFontRef> {
    if let Some(path) = path {
        match File::open(path) {
            Ok(file) => match doc.add_external_font(file) {
                Ok(font) => return Ok(font),
                Err(err) => warn!(
                    path = %path.display(),
                    error = %err,
                    "invoice font could not be embedded, using builtin Helvetica"
                ),
            },
            Err(err) => warn!(
                path = %path.display(),
                error = %err,
                "invoice font missing, using builtin Helvetica"
            ),
        }
    }
    doc.add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| AppError::Pdf(e.to_string()))
}

fn place_logo(layer: &PdfLayerReference, path: Option<&Path>) {
    let Some(path) = path else {
        return;
    };
    let Some(image) = load_png(path) else {
        return;
    };
    let px_width = image.image.width.0 as f32;
    let px_height = image.image.height.0 as f32;
    if px_width <= 0.0 {
        return;
    }
    // Images land at 300 dpi natural size; scale to a 100 pt wide logo.
    let natural_width_mm = px_width * 25.4 / 300.0;
    let scale = (LOGO_WIDTH_PT * PT_TO_MM) / natural_width_mm;
    let height_pt = (px_height * 25.4 / 300.0) * scale / PT_TO_MM;
    image.add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(mm_x(LOGO_LEFT)),
            translate_y: Some(mm_y(LOGO_TOP + height_pt)),
            scale_x: Some(scale),
            scale_y: Some(scale),
            ..Default::default()
        },
    );
}

fn load_png(path: &Path) -> Option<Image> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "invoice logo unavailable, skipping");
            return None;
        }
    };
    let decoder = match PngDecoder::new(BufReader::new(file)) {
        Ok(decoder) => decoder,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "invoice logo unreadable, skipping");
            return None;
        }
    };
    match Image::try_from(decoder) {
        Ok(image) => Some(image),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "invoice logo undecodable, skipping");
            None
        }
    }
}

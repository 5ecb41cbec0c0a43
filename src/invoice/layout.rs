//! Pure invoice table geometry. Everything here is a deterministic function
//! of the order snapshot; the PDF pass in the parent module only draws what
//! these functions compute.
//!
//! Coordinates are in points with the origin at the top-left of the page,
//! y growing downward.

use crate::domain::order::LineItem;

pub const COLUMN_WIDTHS: [f32; 5] = [50.0, 200.0, 70.0, 100.0, 100.0];
pub const ROW_HEIGHT: f32 = 20.0;
pub const TABLE_LEFT: f32 = 50.0;
pub const BODY_FONT_SIZE: f32 = 12.0;

pub const TABLE_HEADER: [&str; 5] = ["STT", "Product Name", "Quantity", "Price", "Total"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub align: Align,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rule {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct TableLayout {
    pub cells: Vec<Cell>,
    pub rules: Vec<Rule>,
}

pub fn table_width() -> f32 {
    COLUMN_WIDTHS.iter().sum()
}

/// Header row plus one row per item, with the border grid. `first_index` is
/// the zero-based position of `items[0]` within the whole order, so row
/// numbering stays continuous across page breaks.
pub fn table_layout(items: &[LineItem], first_index: usize, top_y: f32) -> TableLayout {
    let mut cells = Vec::with_capacity((items.len() + 1) * COLUMN_WIDTHS.len());
    push_row(&mut cells, top_y, TABLE_HEADER.map(str::to_string));
    for (offset, item) in items.iter().enumerate() {
        let y = top_y + ROW_HEIGHT * (offset + 1) as f32;
        push_row(
            &mut cells,
            y,
            [
                (first_index + offset + 1).to_string(),
                item.product_name.clone(),
                item.quantity.to_string(),
                format_vnd(item.unit_price),
                format_vnd(item.line_total()),
            ],
        );
    }
    TableLayout {
        cells,
        rules: border_rules(top_y, items.len() + 1),
    }
}

fn push_row(cells: &mut Vec<Cell>, y: f32, texts: [String; 5]) {
    let mut x = TABLE_LEFT;
    for (i, text) in texts.into_iter().enumerate() {
        let align = if i == 0 { Align::Left } else { Align::Center };
        cells.push(Cell {
            text,
            x,
            y,
            width: COLUMN_WIDTHS[i],
            align,
        });
        x += COLUMN_WIDTHS[i];
    }
}

/// Grid spanning `row_count` rows (header included): `row_count + 1`
/// horizontal rules and one vertical rule per column boundary.
pub fn border_rules(top_y: f32, row_count: usize) -> Vec<Rule> {
    let width = table_width();
    let height = row_count as f32 * ROW_HEIGHT;
    let mut rules = Vec::with_capacity(row_count + COLUMN_WIDTHS.len() + 2);
    for i in 0..=row_count {
        let y = top_y + i as f32 * ROW_HEIGHT;
        rules.push(Rule {
            x1: TABLE_LEFT,
            y1: y,
            x2: TABLE_LEFT + width,
            y2: y,
        });
    }
    let mut x = TABLE_LEFT;
    for w in COLUMN_WIDTHS {
        rules.push(Rule {
            x1: x,
            y1: top_y,
            x2: x,
            y2: top_y + height,
        });
        x += w;
    }
    rules.push(Rule {
        x1: x,
        y1: top_y,
        x2: x,
        y2: top_y + height,
    });
    rules
}

/// `25000` -> `"25,000 VND"`.
pub fn format_vnd(amount: i64) -> String {
    format!("{} VND", grouped(amount))
}

pub fn grouped(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if amount < 0 {
        out.push('-');
    }
    let lead = digits.len() % 3;
    for (i, c) in digits.chars().enumerate() {
        if i != 0 && i % 3 == lead % 3 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Approximate text width: Helvetica averages about half an em per glyph.
pub fn text_width(text: &str, font_size: f32) -> f32 {
    text.chars().count() as f32 * font_size * 0.5
}

pub fn aligned_x(cell: &Cell, font_size: f32) -> f32 {
    match cell.align {
        Align::Left => cell.x,
        Align::Center => {
            cell.x + ((cell.width - text_width(&cell.text, font_size)) / 2.0).max(0.0)
        }
    }
}

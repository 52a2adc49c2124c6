//! Receipt rendering.
//!
//! Turns a fetched [`Receipt`] into PDF bytes: a header block with the store
//! name and buyer, a ruled table of lines (quantity, product, unit price,
//! subtotal) that flows onto extra pages as needed, and a footer printing the
//! STORED order total - the renderer never recomputes it, so what the shopper
//! sees is exactly what was committed at checkout.

use printpdf::{
    BuiltinFont, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
    Point,
};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::Receipt;

/// Errors that can occur while rendering a receipt.
#[derive(Debug, Error)]
pub enum ReceiptError {
    /// PDF generation failed.
    #[error("pdf generation failed: {0}")]
    Pdf(#[from] printpdf::Error),
}

// A4 page with generous margins.
const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN_LEFT: f32 = 18.0;
const MARGIN_RIGHT: f32 = 18.0;
const MARGIN_TOP: f32 = 20.0;
const MARGIN_BOTTOM: f32 = 25.0;

// Table column x positions (mm).
const COL_QTY: f32 = MARGIN_LEFT;
const COL_NAME: f32 = 32.0;
const COL_UNIT: f32 = 130.0;
const COL_SUBTOTAL: f32 = 162.0;

const ROW_HEIGHT: f32 = 7.0;
const NAME_MAX_CHARS: usize = 48;

/// Render a receipt to PDF bytes.
///
/// # Errors
///
/// Returns `ReceiptError::Pdf` if the document cannot be assembled.
pub fn render(receipt: &Receipt, store_name: &str) -> Result<Vec<u8>, ReceiptError> {
    let (doc, page, layer) = PdfDocument::new(
        format!("Receipt #{}", receipt.order.id),
        Mm(PAGE_WIDTH),
        Mm(PAGE_HEIGHT),
        "Layer 1",
    );
    let regular = doc.add_builtin_font(BuiltinFont::Helvetica)?;
    let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;

    // The writer borrows the document; scope it so the document can be
    // consumed for serialization afterwards.
    {
        let mut writer = PageWriter {
            doc: &doc,
            layer: doc.get_page(page).get_layer(layer),
            y: PAGE_HEIGHT - MARGIN_TOP,
        };
        write_pages(&mut writer, receipt, store_name, &regular, &bold);
    }

    Ok(doc.save_to_bytes()?)
}

/// Lay the receipt out across as many pages as it needs.
fn write_pages(
    writer: &mut PageWriter<'_>,
    receipt: &Receipt,
    store_name: &str,
    regular: &IndirectFontRef,
    bold: &IndirectFontRef,
) {
    // Header block
    writer.text(store_name, 20.0, MARGIN_LEFT, bold);
    writer.advance(8.0);
    writer.text("Purchase receipt", 14.0, MARGIN_LEFT, regular);
    writer.advance(10.0);

    writer.text(&format!("Order #{}", receipt.order.id), 11.0, MARGIN_LEFT, regular);
    writer.advance(5.5);
    let placed = receipt.order.created_at.format("%B %e, %Y at %H:%M UTC");
    writer.text(&format!("Date: {placed}"), 11.0, MARGIN_LEFT, regular);
    writer.advance(5.5);
    writer.text(
        &format!("Customer: {}", receipt.buyer.name),
        11.0,
        MARGIN_LEFT,
        regular,
    );
    writer.advance(5.5);
    writer.text(
        &format!("Email: {}", receipt.buyer.email),
        11.0,
        MARGIN_LEFT,
        regular,
    );
    writer.advance(8.0);

    writer.rule();
    writer.advance(8.0);

    // Table body, paginating as rows run out of room.
    table_headings(writer, bold);
    for (index, line) in receipt.lines.iter().enumerate() {
        if writer.y < MARGIN_BOTTOM + ROW_HEIGHT {
            writer.new_page();
            table_headings(writer, bold);
        }

        let name = display_name(&line.name, index);
        writer.text(&line.quantity.to_string(), 10.0, COL_QTY, regular);
        writer.text_at(&name, 10.0, COL_NAME, regular);
        writer.text_at(&format_money(line.price), 10.0, COL_UNIT, regular);
        writer.text_at(&format_money(line.subtotal()), 10.0, COL_SUBTOTAL, regular);
        writer.advance(ROW_HEIGHT);
    }

    writer.advance(4.0);
    if writer.y < MARGIN_BOTTOM + 2.0 * ROW_HEIGHT {
        writer.new_page();
    }
    writer.rule();
    writer.advance(9.0);

    // Stored total, right-hand column.
    writer.text(
        &format!("TOTAL: {}", format_money(receipt.order.total)),
        14.0,
        COL_UNIT,
        bold,
    );
    writer.advance(14.0);

    writer.text("Thank you for your purchase!", 10.0, MARGIN_LEFT, regular);
}

/// Numbered display name, truncated to its column.
fn display_name(name: &str, index: usize) -> String {
    let numbered = format!("{}. {name}", index + 1);
    if numbered.chars().count() <= NAME_MAX_CHARS {
        return numbered;
    }
    // Built-in PDF fonts are safest with plain ASCII, so truncate with dots.
    let truncated: String = numbered.chars().take(NAME_MAX_CHARS - 3).collect();
    format!("{truncated}...")
}

/// Format a money amount as `$12.34`.
fn format_money(amount: Decimal) -> String {
    format!("${amount:.2}")
}

fn table_headings(writer: &mut PageWriter<'_>, bold: &IndirectFontRef) {
    writer.text("Qty", 10.0, COL_QTY, bold);
    writer.text_at("Product", 10.0, COL_NAME, bold);
    writer.text_at("Unit price", 10.0, COL_UNIT, bold);
    writer.text_at("Subtotal", 10.0, COL_SUBTOTAL, bold);
    writer.advance(ROW_HEIGHT);
}

/// Cursor over the current page; `new_page` resets it below the top margin.
struct PageWriter<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    y: f32,
}

impl PageWriter<'_> {
    /// Write text at the cursor row, given an x position.
    fn text(&mut self, text: &str, size: f32, x: f32, font: &IndirectFontRef) {
        self.layer.use_text(text, size, Mm(x), Mm(self.y), font);
    }

    /// Same as [`Self::text`] but reads as "another column of this row".
    fn text_at(&mut self, text: &str, size: f32, x: f32, font: &IndirectFontRef) {
        self.text(text, size, x, font);
    }

    /// Move the cursor down.
    fn advance(&mut self, dy: f32) {
        self.y -= dy;
    }

    /// Draw a horizontal rule across the content width at the cursor.
    fn rule(&mut self) {
        let rule = Line {
            points: vec![
                (Point::new(Mm(MARGIN_LEFT), Mm(self.y)), false),
                (Point::new(Mm(PAGE_WIDTH - MARGIN_RIGHT), Mm(self.y)), false),
            ],
            is_closed: false,
        };
        self.layer.set_outline_thickness(0.5);
        self.layer.add_line(rule);
    }

    /// Start a fresh page and reset the cursor.
    fn new_page(&mut self) {
        let (page, layer) = self
            .doc
            .add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = PAGE_HEIGHT - MARGIN_TOP;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::str::FromStr;

    use chrono::Utc;

    use mercado_core::{Email, OrderId, ProductId, UserId};

    use crate::models::{CurrentUser, Order, OrderLine};

    fn receipt_with_lines(count: usize) -> Receipt {
        let lines: Vec<OrderLine> = (0..count)
            .map(|i| OrderLine {
                product_id: ProductId::new(i32::try_from(i).unwrap() + 1),
                name: format!("Collectible #{i}"),
                description: String::new(),
                quantity: 1,
                price: Decimal::from_str("5.00").unwrap(),
            })
            .collect();
        let total = lines.iter().map(OrderLine::subtotal).sum();

        Receipt {
            order: Order {
                id: OrderId::new(42),
                user_id: UserId::new(7),
                total,
                created_at: Utc::now(),
            },
            buyer: CurrentUser {
                id: UserId::new(7),
                name: "Ada".to_string(),
                email: Email::parse("ada@example.com").unwrap(),
            },
            lines,
        }
    }

    #[test]
    fn test_render_produces_pdf_magic() {
        let bytes = render(&receipt_with_lines(2), "Mercado").unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_render_paginates_long_orders() {
        let short = render(&receipt_with_lines(2), "Mercado").unwrap();
        let long = render(&receipt_with_lines(120), "Mercado").unwrap();

        assert!(long.starts_with(b"%PDF"));
        // 120 rows cannot fit one A4 page; the long receipt must carry
        // at least one extra page object.
        assert!(long.len() > short.len());
        assert!(page_count(&long) > page_count(&short));
    }

    #[test]
    fn test_format_money_pads_cents() {
        assert_eq!(format_money(Decimal::from_str("25").unwrap()), "$25.00");
        assert_eq!(format_money(Decimal::from_str("5.5").unwrap()), "$5.50");
    }

    #[test]
    fn test_display_name_truncates() {
        let long = "x".repeat(100);
        let shown = display_name(&long, 0);
        assert_eq!(shown.chars().count(), NAME_MAX_CHARS);
        assert!(shown.ends_with("..."));

        assert_eq!(display_name("Poster", 1), "2. Poster");
    }

    /// Count page objects in the PDF object tree. Page dictionaries are
    /// written uncompressed; tolerate either name-spacing convention.
    fn page_count(bytes: &[u8]) -> usize {
        let text = String::from_utf8_lossy(bytes);
        let pages = text.matches("/Type /Page").count() + text.matches("/Type/Page").count();
        let trees = text.matches("/Type /Pages").count() + text.matches("/Type/Pages").count();
        pages - trees
    }
}
